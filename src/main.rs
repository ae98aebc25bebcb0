use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod settings;
mod utils;

use config::Config;
use services::{
    create_window_platform,
    FullscreenWatcher,
    Notifier,
    PresentationShell,
    WatcherCommand,
};
use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "fullscreen-helper")]
#[command(about = "Возвращает окно игры в полноэкранный режим, когда оно из него выпадает")]
struct Args {
    /// Путь к файлу конфигурации приложения (TOML)
    #[arg(short, long, default_value = "fullscreen-helper.toml")]
    config: String,

    /// Путь к файлу настроек окна и счётчика (JSON)
    #[arg(short, long, default_value = "config.json")]
    settings: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает значение из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
        config.validate()?;
    }

    // Инициализация системы логирования
    init_tracing(&config.logging.level, &config.logging.format)?;

    info!("Запуск Fullscreen Helper v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    let settings = Settings::load(&args.settings);
    info!(
        "Настройки загружены из {}: окно '{}' ({}), восстановлений {}",
        args.settings, settings.window_title, settings.executable, settings.restore_count
    );

    // Проверка прав доступа
    utils::permissions::check_permissions(args.dry_run);

    // Инициализация компонентов
    let virtual_device = Arc::new(services::VirtualDevice::new("Fullscreen Helper Virtual Keyboard", args.dry_run)?);
    let platform = create_window_platform(&config, virtual_device, args.dry_run)?;

    let watcher = FullscreenWatcher::new(platform, settings, &args.settings, config.watcher.policy());
    info!("Цель: окно '{}', начальная фаза: {}", watcher.settings().window_title, watcher.phase());
    let status = watcher.subscribe();
    let (command_tx, command_rx) = mpsc::channel(16);

    let notifier = if config.shell.notifications {
        match Notifier::connect().await {
            Ok(notifier) => Some(Arc::new(notifier)),
            Err(e) => {
                warn!("Уведомления недоступны: {}", e);
                None
            }
        }
    } else {
        None
    };

    let shell = PresentationShell::new(command_tx.clone(), status, notifier);

    info!("Все компоненты инициализированы");

    // Запуск наблюдателя и оболочки
    let mut watcher_handle = tokio::spawn(watcher.run(command_rx));
    let shell_handles = shell.spawn(config.shell.console);

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения или команды quit из меню
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
        }
        result = &mut watcher_handle => {
            if let Err(e) = result {
                error!("Наблюдатель завершился с ошибкой: {}", e);
            }
        }
    }

    info!("Завершение работы...");

    // Наблюдатель мог уже остановиться, тогда отправка просто не удастся
    let _ = command_tx.send(WatcherCommand::Quit).await;

    for handle in &shell_handles {
        handle.abort();
    }

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        if !watcher_handle.is_finished() {
            let _ = (&mut watcher_handle).await;
        }
        for handle in shell_handles {
            let _ = handle.await;
        }
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("Fullscreen Helper завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "compact" => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    Ok(())
}
