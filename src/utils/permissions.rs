use crate::error::Result;
use crate::helper_error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{info, warn};

const UINPUT_DEVICE: &str = "/dev/uinput";

/// Проверить доступ к ресурсам, без которых не получится отправить сочетание клавиш.
/// Проблемы только логируются: фатальной будет ошибка создания виртуального устройства.
pub fn check_permissions(dry_run: bool) {
    info!("Проверка прав доступа...");

    if let Err(e) = check_uinput_access(Path::new(UINPUT_DEVICE)) {
        if dry_run {
            warn!("{} (не мешает сухому запуску)", e);
        } else {
            warn!("{}", e);
            for line in setup_commands() {
                warn!("   {}", line);
            }
        }
    }

    check_not_root();

    info!("Проверка прав доступа завершена");
}

fn check_uinput_access(uinput_device: &Path) -> Result<()> {
    if !uinput_device.exists() {
        warn!("{} не существует, возможно модуль uinput не загружен", uinput_device.display());
        return Ok(()); // модуль могут загрузить позже, ошибку покажет само создание устройства
    }

    let metadata = fs::metadata(uinput_device).map_err(|e| {
        helper_error!(permission, "Не удалось проверить права доступа к {}: {}", uinput_device.display(), e)
    })?;

    let mode = metadata.permissions().mode();
    // Для root права не важны, иначе нужен доступ группе или всем
    if !is_root() && mode & 0o006 == 0 && mode & 0o060 == 0 {
        return Err(helper_error!(
            permission,
            "Нет прав доступа к {}. Добавьте пользователя в группу 'uinput' или 'input'",
            uinput_device.display()
        ));
    }

    info!("Доступ к {} подтвержден", uinput_device.display());
    Ok(())
}

fn is_root() -> bool {
    std::env::var("USER").map(|user| user == "root").unwrap_or(false)
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            match std::env::var("SUDO_USER") {
                Ok(sudo_user) => warn!("   xdotool/wmctrl будут запускаться от имени {}", sudo_user),
                Err(_) => warn!("   Без SUDO_USER утилиты окон могут не увидеть сессию X11"),
            }
            warn!("   Рекомендуется добавить пользователя в группу 'uinput' и запускать без sudo");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}

/// Получить рекомендуемые команды для настройки прав доступа
pub fn setup_commands() -> Vec<String> {
    vec![
        "# Добавить пользователя в группу uinput:".to_string(),
        "sudo usermod -a -G uinput $USER".to_string(),
        "# Загрузить модуль uinput:".to_string(),
        "sudo modprobe uinput".to_string(),
        "# Автоматическая загрузка модуля при загрузке системы:".to_string(),
        "echo 'uinput' | sudo tee /etc/modules-load.d/uinput.conf".to_string(),
        "# Утилиты окон:".to_string(),
        "sudo apt install xdotool wmctrl x11-utils x11-xserver-utils".to_string(),
    ]
}
