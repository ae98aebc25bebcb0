use crate::debug_if_enabled;
use crate::events::WindowState;
use crate::services::watcher_state::{Decision, Observation, WatcherPhase, WatcherPolicy, WatcherState};
use crate::services::window_detector::WindowPlatform;
use crate::settings::Settings;
use std::fmt;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

/// Команды от оболочки (меню, сигналы, консоль)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherCommand {
    Toggle,
    Reset,
    Quit,
}

/// Снимок состояния для строки статуса
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherStatus {
    pub phase: WatcherPhase,
    pub restore_count: u64,
    pub window_title: String,
}

impl fmt::Display for WatcherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, окно \"{}\", восстановлений: {}",
            self.phase, self.window_title, self.restore_count
        )
    }
}

/// Единственный владелец состояния наблюдения и настроек.
///
/// Тики таймера и команды оболочки обрабатываются одной задачей по очереди,
/// поэтому счётчик, его сохранение и публикация статуса всегда согласованы.
pub struct FullscreenWatcher {
    platform: Arc<dyn WindowPlatform>,
    state: WatcherState,
    settings: Settings,
    settings_path: PathBuf,
    status_tx: watch::Sender<WatcherStatus>,
}

impl FullscreenWatcher {
    pub fn new(
        platform: Arc<dyn WindowPlatform>,
        settings: Settings,
        settings_path: impl Into<PathBuf>,
        policy: WatcherPolicy,
    ) -> Self {
        let state = WatcherState::new(policy);
        let (status_tx, _) = watch::channel(WatcherStatus {
            phase: state.phase(),
            restore_count: settings.restore_count,
            window_title: settings.window_title.clone(),
        });

        Self {
            platform,
            state,
            settings,
            settings_path: settings_path.into(),
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WatcherStatus> {
        self.status_tx.subscribe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> WatcherPhase {
        self.state.phase()
    }

    pub async fn run(mut self, mut commands: mpsc::Receiver<WatcherCommand>) {
        let period = Duration::from_millis(self.settings.check_interval_ms.max(1));
        let policy = self.state.policy();
        info!(
            "Наблюдение за окном '{}' запущено: интервал {}мс, пауза между восстановлениями {}мс",
            self.settings.window_title,
            period.as_millis(),
            policy.cooldown.as_millis()
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                tick = ticker.tick() => {
                    self.tick(tick.into_std()).await;
                }
                command = commands.recv() => {
                    let command = command.unwrap_or(WatcherCommand::Quit);
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
            }
        }

        info!("Наблюдение остановлено, всего восстановлений: {}", self.settings.restore_count);
    }

    /// Один тик опроса. Окно ищется заново каждый раз: процесс игры мог перезапуститься.
    pub async fn tick(&mut self, now: Instant) -> Decision {
        if !self.state.is_active() {
            return Decision::Idle;
        }

        let title = self.settings.window_title.as_str();
        let handle = match self.platform.find_window(title).await {
            Ok(handle) => handle,
            Err(e) => {
                debug!("Поиск окна '{}' не удался: {}", title, e);
                None
            }
        };

        let observation = match handle {
            Some(handle) => match self.platform.classify(handle).await {
                WindowState::Windowed => Observation::Windowed,
                WindowState::Fullscreen => Observation::Fullscreen,
            },
            None => Observation::NotFound,
        };
        debug_if_enabled!("Тик: {:?} в фазе {:?}", observation, self.state.phase());

        let decision = self.state.observe(observation, now);
        match (decision, handle) {
            (Decision::Restore, Some(handle)) => {
                info!("Окно {} выпало из полноэкранного режима, восстанавливаем", handle);
                self.platform.restore(handle).await;
                self.record_restore();
            }
            (Decision::Armed, _) => {
                info!("Окно '{}' в полноэкранном режиме, начинаем следить", self.settings.window_title);
                self.publish_status();
            }
            (Decision::CoolingDown, _) => {
                debug!("Окно снова в оконном режиме, но пауза между восстановлениями ещё не истекла");
            }
            _ => {}
        }

        decision
    }

    pub fn handle_command(&mut self, command: WatcherCommand) -> ControlFlow<()> {
        match command {
            WatcherCommand::Toggle => {
                let active = self.state.toggle_active();
                info!("Наблюдение {}", if active { "возобновлено" } else { "приостановлено" });
                self.publish_status();
            }
            WatcherCommand::Reset => self.reset_counter(),
            WatcherCommand::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn record_restore(&mut self) {
        self.settings.restore_count = self.settings.restore_count.saturating_add(1);
        self.settings.save(&self.settings_path);
        info!("Восстановлений всего: {}", self.settings.restore_count);
        self.publish_status();
    }

    fn reset_counter(&mut self) {
        self.settings.restore_count = 0;
        self.settings.save(&self.settings_path);
        self.state.rearm();
        info!("Счётчик восстановлений сброшен");
        self.publish_status();
    }

    fn publish_status(&self) {
        let status = WatcherStatus {
            phase: self.state.phase(),
            restore_count: self.settings.restore_count,
            window_title: self.settings.window_title.clone(),
        };
        debug!("Статус: {}", status);
        self.status_tx.send_replace(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::events::WindowHandle;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    const HANDLE: WindowHandle = WindowHandle(0x42);

    /// Платформа, которая проигрывает заранее заданную последовательность наблюдений
    #[derive(Default)]
    struct ScriptedPlatform {
        script: Mutex<VecDeque<Option<WindowState>>>,
        current: Mutex<Option<WindowState>>,
        lookups: AtomicUsize,
        restores: AtomicUsize,
    }

    impl ScriptedPlatform {
        fn new(script: impl IntoIterator<Item = Option<WindowState>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                ..Default::default()
            })
        }

        fn restores(&self) -> usize {
            self.restores.load(Ordering::SeqCst)
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl WindowPlatform for ScriptedPlatform {
        async fn find_window(&self, _title: &str) -> Result<Option<WindowHandle>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().pop_front().flatten();
            *self.current.lock() = next;
            Ok(next.map(|_| HANDLE))
        }

        async fn classify(&self, handle: WindowHandle) -> WindowState {
            assert_eq!(handle, HANDLE);
            self.current.lock().unwrap_or(WindowState::Fullscreen)
        }

        async fn restore(&self, handle: WindowHandle) {
            assert_eq!(handle, HANDLE);
            self.restores.fetch_add(1, Ordering::SeqCst);
        }
    }

    use WindowState::{Fullscreen, Windowed};

    fn watcher(platform: Arc<ScriptedPlatform>) -> (FullscreenWatcher, TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let watcher = FullscreenWatcher::new(platform, Settings::default(), &path, WatcherPolicy::default());
        (watcher, dir, path)
    }

    fn at(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[tokio::test]
    async fn test_target_never_found_keeps_counter_at_zero() {
        let platform = ScriptedPlatform::new(vec![None; 10]);
        let (mut watcher, _dir, _path) = watcher(platform.clone());
        let start = Instant::now();

        for tick in 0..10 {
            assert_eq!(watcher.tick(at(start, tick * 1000)).await, Decision::Idle);
        }

        assert_eq!(watcher.settings().restore_count, 0);
        assert_eq!(platform.restores(), 0);
        assert_eq!(platform.lookups(), 10);
    }

    #[tokio::test]
    async fn test_windowed_only_never_restores() {
        let platform = ScriptedPlatform::new(vec![Some(Windowed); 20]);
        let (mut watcher, _dir, _path) = watcher(platform.clone());
        let start = Instant::now();

        for tick in 0..20 {
            watcher.tick(at(start, tick * 5000)).await;
        }

        assert_eq!(platform.restores(), 0);
        assert_eq!(watcher.phase(), WatcherPhase::WaitingForTarget);
    }

    #[tokio::test]
    async fn test_restore_once_within_cooldown() {
        let platform = ScriptedPlatform::new(vec![Some(Fullscreen), Some(Windowed), Some(Windowed)]);
        let (mut watcher, _dir, path) = watcher(platform.clone());
        let status = watcher.subscribe();
        let start = Instant::now();

        assert_eq!(watcher.tick(at(start, 0)).await, Decision::Armed);
        assert_eq!(watcher.tick(at(start, 1000)).await, Decision::Restore);
        assert_eq!(watcher.settings().restore_count, 1);

        assert_eq!(watcher.tick(at(start, 2000)).await, Decision::CoolingDown);
        assert_eq!(watcher.settings().restore_count, 1);
        assert_eq!(platform.restores(), 1);

        assert_eq!(Settings::load(&path).restore_count, 1);
        assert_eq!(status.borrow().restore_count, 1);
        assert_eq!(status.borrow().phase, WatcherPhase::Monitoring);
    }

    #[tokio::test]
    async fn test_reset_while_monitoring_rearms_guard() {
        let platform = ScriptedPlatform::new(vec![Some(Fullscreen), Some(Windowed), Some(Windowed)]);
        let (mut watcher, _dir, path) = watcher(platform.clone());
        let start = Instant::now();

        watcher.tick(at(start, 0)).await;
        watcher.tick(at(start, 1000)).await;
        assert_eq!(watcher.settings().restore_count, 1);

        assert!(watcher.handle_command(WatcherCommand::Reset).is_continue());
        assert_eq!(watcher.settings().restore_count, 0);
        assert_eq!(watcher.phase(), WatcherPhase::WaitingForTarget);
        assert_eq!(Settings::load(&path).restore_count, 0);

        // После сброса оконный режим снова не трогаем, пока не увидим полноэкранный
        assert_eq!(watcher.tick(at(start, 10_000)).await, Decision::Idle);
        assert_eq!(platform.restores(), 1);
    }

    #[tokio::test]
    async fn test_paused_watcher_does_not_query_platform() {
        let platform = ScriptedPlatform::new(vec![Some(Fullscreen), Some(Windowed), Some(Windowed)]);
        let (mut watcher, _dir, _path) = watcher(platform.clone());
        let status = watcher.subscribe();
        let start = Instant::now();

        watcher.tick(at(start, 0)).await;
        watcher.handle_command(WatcherCommand::Toggle);
        assert_eq!(status.borrow().phase, WatcherPhase::Inactive);

        assert_eq!(watcher.tick(at(start, 5000)).await, Decision::Idle);
        assert_eq!(platform.lookups(), 1);

        watcher.handle_command(WatcherCommand::Toggle);
        assert_eq!(watcher.phase(), WatcherPhase::WaitingForTarget);
        assert_eq!(watcher.tick(at(start, 10_000)).await, Decision::Idle);
        assert_eq!(platform.restores(), 0);
    }

    #[tokio::test]
    async fn test_restored_counter_continues_from_settings() {
        let platform = ScriptedPlatform::new(vec![Some(Fullscreen), Some(Windowed)]);
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings {
            restore_count: 41,
            ..Settings::default()
        };
        let mut watcher = FullscreenWatcher::new(platform, settings, &path, WatcherPolicy::default());
        let start = Instant::now();

        watcher.tick(at(start, 0)).await;
        watcher.tick(at(start, 1000)).await;

        assert_eq!(Settings::load(&path).restore_count, 42);
    }

    #[tokio::test]
    async fn test_run_stops_on_quit() {
        let platform = ScriptedPlatform::new(Vec::new());
        let dir = tempdir().unwrap();
        let settings = Settings {
            check_interval_ms: 10,
            ..Settings::default()
        };
        let watcher = FullscreenWatcher::new(
            platform.clone(),
            settings,
            dir.path().join("config.json"),
            WatcherPolicy::default(),
        );
        let mut status = watcher.subscribe();
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(watcher.run(rx));

        tx.send(WatcherCommand::Toggle).await.unwrap();
        status.changed().await.unwrap();
        assert_eq!(status.borrow().phase, WatcherPhase::Inactive);

        tx.send(WatcherCommand::Quit).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }

    /// Окно всё время в оконном режиме, а активация зависает, как `windowactivate --sync`
    /// при оконном менеджере, который не отдаёт фокус
    struct HangingActivationPlatform {
        restore_started: tokio::sync::Notify,
        seen_fullscreen: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl WindowPlatform for HangingActivationPlatform {
        async fn find_window(&self, _title: &str) -> Result<Option<WindowHandle>> {
            Ok(Some(HANDLE))
        }

        async fn classify(&self, _handle: WindowHandle) -> WindowState {
            if self.seen_fullscreen.fetch_add(1, Ordering::SeqCst) == 0 {
                Fullscreen
            } else {
                Windowed
            }
        }

        async fn restore(&self, _handle: WindowHandle) {
            self.restore_started.notify_one();
            let result = crate::services::window_detector::command::run_tool_within(
                "sleep",
                &["30"],
                Duration::from_millis(300),
            )
            .await;
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn test_quit_is_handled_while_activation_hangs() {
        let platform = Arc::new(HangingActivationPlatform {
            restore_started: tokio::sync::Notify::new(),
            seen_fullscreen: AtomicUsize::new(0),
        });
        let dir = tempdir().unwrap();
        let settings = Settings {
            check_interval_ms: 10,
            ..Settings::default()
        };
        let watcher = FullscreenWatcher::new(
            platform.clone(),
            settings,
            dir.path().join("config.json"),
            WatcherPolicy::default(),
        );
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(watcher.run(rx));

        tokio::time::timeout(Duration::from_secs(5), platform.restore_started.notified())
            .await
            .expect("restore was not attempted");
        tx.send(WatcherCommand::Quit).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }

    #[test]
    fn test_counter_saturates_instead_of_overflowing() {
        let platform = ScriptedPlatform::new(Vec::new());
        let dir = tempdir().unwrap();
        let settings = Settings {
            restore_count: u64::MAX,
            ..Settings::default()
        };
        let mut watcher = FullscreenWatcher::new(platform, settings, dir.path().join("config.json"), WatcherPolicy::default());

        watcher.record_restore();
        assert_eq!(watcher.settings().restore_count, u64::MAX);
    }

    #[test]
    fn test_status_display() {
        let status = WatcherStatus {
            phase: WatcherPhase::Monitoring,
            restore_count: 3,
            window_title: "Arena".to_string(),
        };
        assert_eq!(status.to_string(), "Active, окно \"Arena\", восстановлений: 3");
    }
}
