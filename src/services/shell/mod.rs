//! Presentation shell: everything the user touches.
//!
//! The shell never mutates watcher state directly. Toggle/reset/quit are sent to
//! the watcher as commands; status text and the About dialog are rendered from the
//! snapshot the watcher publishes.

pub mod about;
pub mod menu;
pub mod notifier;

pub use about::{AboutInfo, APP_NAME};
pub use menu::MenuAction;
pub use notifier::Notifier;

use crate::services::fullscreen_watcher::{WatcherCommand, WatcherStatus};
use crate::services::watcher_state::WatcherPhase;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::io::BufRead;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct PresentationShell {
    commands: mpsc::Sender<WatcherCommand>,
    status: watch::Receiver<WatcherStatus>,
    notifier: Option<Arc<Notifier>>,
}

impl PresentationShell {
    pub fn new(
        commands: mpsc::Sender<WatcherCommand>,
        status: watch::Receiver<WatcherStatus>,
        notifier: Option<Arc<Notifier>>,
    ) -> Self {
        Self {
            commands,
            status,
            notifier,
        }
    }

    /// Текст статуса, как в подсказке значка в трее
    pub fn status_line(&self) -> String {
        format!("{} ({})", APP_NAME, *self.status.borrow())
    }

    pub fn about(&self) -> AboutInfo {
        AboutInfo::new(self.status.borrow().restore_count)
    }

    pub async fn dispatch(&self, action: MenuAction) -> ControlFlow<()> {
        debug!("Пункт меню: {}", action.label());

        if let Some(command) = action.watcher_command() {
            if self.commands.send(command).await.is_err() {
                warn!("Наблюдатель уже остановлен, команда {:?} пропущена", command);
            }
        }

        match action {
            MenuAction::About => {
                let about = self.about();
                println!("{}", about);
                self.notify(&format!("О программе {}", APP_NAME), &about.to_string()).await;
            }
            MenuAction::Status => println!("{}", self.status_line()),
            MenuAction::Help => println!("{}", menu::help_text()),
            MenuAction::Quit => return ControlFlow::Break(()),
            MenuAction::Toggle | MenuAction::Reset => {}
        }

        ControlFlow::Continue(())
    }

    async fn notify(&self, summary: &str, body: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(summary, body).await {
                warn!("Не удалось показать уведомление: {}", e);
            }
        }
    }

    /// Запустить задачи оболочки: консольное меню, сигналы и строку статуса
    pub fn spawn(self, console: bool) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        if console {
            let shell = self.clone();
            handles.push(tokio::spawn(async move { shell.run_console().await }));
        }

        let shell = self.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = shell.run_signals().await {
                error!("Ошибка в обработчике сигналов: {}", e);
            }
        }));

        handles.push(tokio::spawn(async move { self.run_status_updates().await }));

        handles
    }

    async fn run_console(self) {
        println!("{}", self.status_line());
        println!("{}", menu::help_text());

        let mut lines = spawn_stdin_reader();
        while let Some(line) = lines.recv().await {
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<MenuAction>() {
                Ok(action) => {
                    if self.dispatch(action).await.is_break() {
                        return;
                    }
                }
                Err(e) => println!("{}\n{}", e, menu::help_text()),
            }
        }
        debug!("stdin закрыт, консольное меню отключено");
    }

    async fn run_signals(self) -> std::io::Result<()> {
        let mut toggle = signal(SignalKind::user_defined1())?;
        let mut reset = signal(SignalKind::user_defined2())?;

        loop {
            let action = tokio::select! {
                Some(()) = toggle.recv() => MenuAction::Toggle,
                Some(()) = reset.recv() => MenuAction::Reset,
                else => return Ok(()),
            };
            info!("Получен сигнал: {}", action.label());
            self.dispatch(action).await;
        }
    }

    async fn run_status_updates(mut self) {
        let mut last_phase = self.status.borrow().phase;

        while self.status.changed().await.is_ok() {
            let phase = self.status.borrow_and_update().phase;
            info!("{}", self.status_line());

            let paused_changed = (phase == WatcherPhase::Inactive) != (last_phase == WatcherPhase::Inactive);
            if paused_changed {
                let summary = if phase == WatcherPhase::Inactive { "Paused" } else { "Active" };
                self.notify(&format!("{} ({})", APP_NAME, summary), &self.status_line()).await;
            }
            last_phase = phase;
        }
    }
}

/// Чтение stdin в отдельном потоке: блокирующее чтение в пуле tokio
/// не дало бы рантайму завершиться, пока пользователь не нажмёт Enter.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    let spawned = std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("Ошибка чтения stdin: {}", e);
                        return;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Не удалось запустить чтение консоли: {}", e);
    }
    rx
}
