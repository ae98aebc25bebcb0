use crate::error::{HelperError, Result};
use crate::trace_if_enabled;
use std::collections::HashMap;
use std::process::Output;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Сколько ждать утилиту окон. `windowactivate --sync` может висеть вечно,
/// если оконный менеджер не отдаёт фокус, а тик наблюдателя ждёт её целиком.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(3);

/// Если нас запустили через sudo (uinput обычно требует root), инструменты X11
/// должны работать от имени исходного пользователя и видеть его сессию.
async fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            let mut id = Command::new("id");
            id.args(["-u", &sudo_user]).kill_on_drop(true);
            if let Ok(Ok(output)) = timeout(TOOL_TIMEOUT, id.output()).await {
                if let Ok(uid_str) = String::from_utf8(output.stdout) {
                    let uid = uid_str.trim();
                    let user_runtime_dir = format!("/run/user/{}", uid);
                    let dbus_address = format!("unix:path={}/bus", user_runtime_dir);

                    debug!("Подставляем переменные окружения для пользователя {}: uid={}", sudo_user, uid);
                    env_vars.insert("DBUS_SESSION_BUS_ADDRESS".to_string(), dbus_address);
                    env_vars.insert("XDG_RUNTIME_DIR".to_string(), user_runtime_dir);
                    env_vars.insert("USER".to_string(), sudo_user);
                }
            }
        }
    }

    if let Ok(display_var) = std::env::var("DISPLAY") {
        env_vars.insert("DISPLAY".to_string(), display_var);
    }

    env_vars
}

async fn create_command(program: &str, args: &[&str]) -> Command {
    let mut cmd = match std::env::var("SUDO_USER") {
        Ok(sudo_user) => {
            let mut cmd = Command::new("sudo");
            cmd.args(["-E", "-u", &sudo_user, program]);
            cmd.args(args);
            cmd
        }
        Err(_) => {
            let mut cmd = Command::new(program);
            cmd.args(args);
            cmd
        }
    };

    for (key, value) in build_env_overrides().await {
        cmd.env(key, value);
    }

    // Зависший процесс убивается, когда future вывода отброшен по таймауту
    cmd.kill_on_drop(true);
    cmd
}

/// Запустить утилиту и вернуть её вывод как есть, код возврата проверяет вызывающий
pub async fn run_raw(program: &str, args: &[&str]) -> Result<Output> {
    run_raw_within(program, args, TOOL_TIMEOUT).await
}

/// Запустить утилиту и вернуть stdout, если она завершилась успешно
pub async fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    run_tool_within(program, args, TOOL_TIMEOUT).await
}

pub async fn run_raw_within(program: &str, args: &[&str], limit: Duration) -> Result<Output> {
    trace_if_enabled!("Запуск {} {:?}", program, args);
    let mut cmd = create_command(program, args).await;

    match timeout(limit, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            debug!("{} не найден или не запускается: {}", program, e);
            Err(HelperError::ServiceUnavailable(format!("{} не найден: {}", program, e)))
        }
        Err(_) => {
            debug!("{} {:?} не ответил за {:?}, процесс остановлен", program, args, limit);
            Err(HelperError::ServiceUnavailable(format!(
                "{} не ответил за {} мс",
                program,
                limit.as_millis()
            )))
        }
    }
}

pub async fn run_tool_within(program: &str, args: &[&str], limit: Duration) -> Result<String> {
    let output = run_raw_within(program, args, limit).await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} {:?} вернул ошибку: {}", program, args, stderr.trim());
        return Err(HelperError::ServiceUnavailable(format!(
            "{} вернул ошибку: {}",
            program,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
