//! Pure restore policy: no I/O, no clocks of its own.
//!
//! The watcher feeds one [`Observation`] per poll tick together with the tick's
//! timestamp and acts on the returned [`Decision`]. Keeping the policy free of
//! side effects lets the whole state machine run in tests with synthetic time.

use std::fmt;
use std::time::{Duration, Instant};

/// Настройки политики восстановления
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherPolicy {
    pub cooldown: Duration,
    pub require_fullscreen_first: bool,
}

impl Default for WatcherPolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(2),
            require_fullscreen_first: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatcherPhase {
    /// Пользователь поставил наблюдение на паузу
    Inactive,
    /// Активен, но окно ещё не было в полноэкранном режиме в этой сессии
    WaitingForTarget,
    Monitoring,
}

impl fmt::Display for WatcherPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WatcherPhase::Inactive => "Paused",
            WatcherPhase::WaitingForTarget => "Waiting",
            WatcherPhase::Monitoring => "Active",
        };
        write!(f, "{}", text)
    }
}

/// Что увидел один тик опроса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    NotFound,
    Fullscreen,
    Windowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Ничего не делать
    Idle,
    /// Окно впервые замечено в полноэкранном режиме, начинаем следить
    Armed,
    /// Окно выпало из полноэкранного режима, но пауза ещё не истекла
    CoolingDown,
    /// Нужно восстановить окно
    Restore,
}

#[derive(Debug, Clone)]
pub struct WatcherState {
    policy: WatcherPolicy,
    active: bool,
    has_seen_fullscreen_once: bool,
    last_restore: Option<Instant>,
}

impl WatcherState {
    pub fn new(policy: WatcherPolicy) -> Self {
        Self {
            policy,
            active: true,
            has_seen_fullscreen_once: !policy.require_fullscreen_first,
            last_restore: None,
        }
    }

    pub fn policy(&self) -> WatcherPolicy {
        self.policy
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> WatcherPhase {
        match (self.active, self.has_seen_fullscreen_once) {
            (false, _) => WatcherPhase::Inactive,
            (true, false) => WatcherPhase::WaitingForTarget,
            (true, true) => WatcherPhase::Monitoring,
        }
    }

    pub fn observe(&mut self, observation: Observation, now: Instant) -> Decision {
        match (self.phase(), observation) {
            (WatcherPhase::Inactive, _) | (_, Observation::NotFound) => Decision::Idle,
            (WatcherPhase::WaitingForTarget, Observation::Fullscreen) => {
                self.has_seen_fullscreen_once = true;
                Decision::Armed
            }
            // Игра ещё загружается, окно само перейдёт в полноэкранный режим
            (WatcherPhase::WaitingForTarget, Observation::Windowed) => Decision::Idle,
            (WatcherPhase::Monitoring, Observation::Fullscreen) => Decision::Idle,
            (WatcherPhase::Monitoring, Observation::Windowed) => {
                if self.cooldown_elapsed(now) {
                    self.last_restore = Some(now);
                    Decision::Restore
                } else {
                    Decision::CoolingDown
                }
            }
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_restore {
            Some(last) => now.saturating_duration_since(last) >= self.policy.cooldown,
            None => true,
        }
    }

    /// Переключить паузу. Возобновление снова требует увидеть окно в полноэкранном режиме:
    /// пока мы стояли на паузе, процесс игры мог смениться.
    pub fn toggle_active(&mut self) -> bool {
        self.active = !self.active;
        if self.active {
            self.rearm();
        }
        self.active
    }

    pub fn rearm(&mut self) {
        self.has_seen_fullscreen_once = !self.policy.require_fullscreen_first;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[test]
    fn test_initial_phase_is_waiting() {
        let state = WatcherState::new(WatcherPolicy::default());
        assert_eq!(state.phase(), WatcherPhase::WaitingForTarget);
        assert!(state.is_active());
    }

    #[test]
    fn test_never_restores_before_fullscreen_seen() {
        let start = Instant::now();
        let mut state = WatcherState::new(WatcherPolicy::default());

        for tick in 0..50 {
            let observation = if tick % 3 == 0 { Observation::NotFound } else { Observation::Windowed };
            assert_ne!(state.observe(observation, at(start, tick * 1000)), Decision::Restore);
        }
        assert_eq!(state.phase(), WatcherPhase::WaitingForTarget);
    }

    #[test]
    fn test_fullscreen_arms_monitoring() {
        let start = Instant::now();
        let mut state = WatcherState::new(WatcherPolicy::default());

        assert_eq!(state.observe(Observation::Fullscreen, start), Decision::Armed);
        assert_eq!(state.phase(), WatcherPhase::Monitoring);
        assert_eq!(state.observe(Observation::Fullscreen, at(start, 1000)), Decision::Idle);
        assert_eq!(state.phase(), WatcherPhase::Monitoring);
    }

    #[test]
    fn test_windowed_twice_within_cooldown_restores_once() {
        let start = Instant::now();
        let mut state = WatcherState::new(WatcherPolicy::default());
        state.observe(Observation::Fullscreen, start);

        assert_eq!(state.observe(Observation::Windowed, at(start, 1000)), Decision::Restore);
        assert_eq!(state.observe(Observation::Windowed, at(start, 1500)), Decision::CoolingDown);
        assert_eq!(state.observe(Observation::Windowed, at(start, 2999)), Decision::CoolingDown);
        assert_eq!(state.observe(Observation::Windowed, at(start, 3000)), Decision::Restore);
    }

    #[test]
    fn test_not_found_keeps_phase() {
        let start = Instant::now();
        let mut state = WatcherState::new(WatcherPolicy::default());
        state.observe(Observation::Fullscreen, start);

        assert_eq!(state.observe(Observation::NotFound, at(start, 1000)), Decision::Idle);
        assert_eq!(state.phase(), WatcherPhase::Monitoring);
    }

    #[test]
    fn test_pause_and_resume_rearms_guard() {
        let start = Instant::now();
        let mut state = WatcherState::new(WatcherPolicy::default());
        state.observe(Observation::Fullscreen, start);

        assert!(!state.toggle_active());
        assert_eq!(state.phase(), WatcherPhase::Inactive);
        assert_eq!(state.observe(Observation::Windowed, at(start, 5000)), Decision::Idle);

        assert!(state.toggle_active());
        assert_eq!(state.phase(), WatcherPhase::WaitingForTarget);
        assert_eq!(state.observe(Observation::Windowed, at(start, 6000)), Decision::Idle);
    }

    #[test]
    fn test_rearm_while_monitoring() {
        let start = Instant::now();
        let mut state = WatcherState::new(WatcherPolicy::default());
        state.observe(Observation::Fullscreen, start);

        state.rearm();
        assert_eq!(state.phase(), WatcherPhase::WaitingForTarget);
    }

    #[test]
    fn test_rearm_keeps_paused_watcher_paused() {
        let mut state = WatcherState::new(WatcherPolicy::default());
        state.toggle_active();
        state.rearm();
        assert_eq!(state.phase(), WatcherPhase::Inactive);
    }

    #[test]
    fn test_guard_can_be_disabled() {
        let start = Instant::now();
        let policy = WatcherPolicy {
            cooldown: Duration::from_millis(500),
            require_fullscreen_first: false,
        };
        let mut state = WatcherState::new(policy);

        assert_eq!(state.phase(), WatcherPhase::Monitoring);
        assert_eq!(state.observe(Observation::Windowed, start), Decision::Restore);
        assert_eq!(state.observe(Observation::Windowed, at(start, 499)), Decision::CoolingDown);
        assert_eq!(state.observe(Observation::Windowed, at(start, 500)), Decision::Restore);

        state.rearm();
        assert_eq!(state.phase(), WatcherPhase::Monitoring);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(WatcherPhase::Inactive.to_string(), "Paused");
        assert_eq!(WatcherPhase::Monitoring.to_string(), "Active");
    }
}
