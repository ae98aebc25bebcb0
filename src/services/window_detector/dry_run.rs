use crate::error::Result;
use crate::events::{KeyChord, WindowHandle, WindowState};
use crate::services::VirtualDevice;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use super::r#trait::WindowPlatform;

const DRY_RUN_HANDLE: WindowHandle = WindowHandle(0xd1d1);
// Игра «запускается» после этого тика
const STARTUP_TICKS: u64 = 2;
// Окно загружается в оконном режиме ещё столько тиков
const LOADING_TICKS: u64 = 2;
// Раз в столько тиков окно выпадает из полноэкранного режима
const DROP_EVERY: u64 = 10;

#[derive(Debug, Default)]
struct DryRunState {
    tick: u64,
    fullscreen: bool,
}

/// Эмуляция игры: появляется, загружается в окне, уходит в полноэкранный режим
/// и периодически из него выпадает.
pub struct DryRunPlatform {
    state: Mutex<DryRunState>,
    virtual_device: Arc<VirtualDevice>,
    chord: KeyChord,
}

impl DryRunPlatform {
    pub fn new(virtual_device: Arc<VirtualDevice>, chord: KeyChord) -> Self {
        info!("Dry-run режим - WindowPlatform работает в режиме эмуляции");
        Self {
            state: Mutex::new(DryRunState::default()),
            virtual_device,
            chord,
        }
    }
}

#[async_trait::async_trait]
impl WindowPlatform for DryRunPlatform {
    async fn find_window(&self, title: &str) -> Result<Option<WindowHandle>> {
        let mut state = self.state.lock();
        state.tick += 1;

        if state.tick <= STARTUP_TICKS {
            info!("Dry-run: окно '{}' ещё не появилось", title);
            return Ok(None);
        }
        Ok(Some(DRY_RUN_HANDLE))
    }

    async fn classify(&self, handle: WindowHandle) -> WindowState {
        let mut state = self.state.lock();
        let since_start = state.tick.saturating_sub(STARTUP_TICKS);

        if since_start == LOADING_TICKS + 1 {
            info!("Dry-run: окно {} перешло в полноэкранный режим", handle);
            state.fullscreen = true;
        } else if since_start > LOADING_TICKS && since_start % DROP_EVERY == 0 && state.fullscreen {
            info!("Dry-run: эмулируем выпадение окна {} из полноэкранного режима", handle);
            state.fullscreen = false;
        }

        if state.fullscreen {
            WindowState::Fullscreen
        } else {
            WindowState::Windowed
        }
    }

    async fn restore(&self, handle: WindowHandle) {
        info!("[DRY RUN] Активируем окно {} и отправляем {}", handle, self.chord);

        if let Err(e) = self.virtual_device.send_chord(&self.chord).await {
            warn!("Не удалось отправить сочетание {}: {}", self.chord, e);
        }
        self.state.lock().fullscreen = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn observe(platform: &DryRunPlatform) -> Option<WindowState> {
        match platform.find_window("Game").await.unwrap() {
            Some(handle) => Some(platform.classify(handle).await),
            None => None,
        }
    }

    #[tokio::test]
    async fn test_dry_run_cycle() {
        let device = Arc::new(VirtualDevice::new("test", true).unwrap());
        let platform = DryRunPlatform::new(device, KeyChord::parse("alt+enter").unwrap());

        assert_eq!(observe(&platform).await, None);
        assert_eq!(observe(&platform).await, None);
        assert_eq!(observe(&platform).await, Some(WindowState::Windowed));
        assert_eq!(observe(&platform).await, Some(WindowState::Windowed));
        assert_eq!(observe(&platform).await, Some(WindowState::Fullscreen));

        let mut states = Vec::new();
        for _ in 0..10 {
            states.push(observe(&platform).await);
        }
        assert!(states.contains(&Some(WindowState::Windowed)));

        platform.restore(DRY_RUN_HANDLE).await;
        assert_eq!(observe(&platform).await, Some(WindowState::Fullscreen));
    }
}
