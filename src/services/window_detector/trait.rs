use crate::config::Config;
use crate::error::Result;
use crate::events::{WindowHandle, WindowState};
use crate::services::VirtualDevice;
use std::sync::Arc;

/// Capability interface between the watcher and the desktop.
///
/// `find_window` reports "not found" as `Ok(None)`; an `Err` means the backend
/// itself is unusable right now and the watcher treats it like a missed tick.
/// `classify` and `restore` never fail: they degrade to a safe answer or log.
#[async_trait::async_trait]
pub trait WindowPlatform: Send + Sync {
    async fn find_window(&self, title: &str) -> Result<Option<WindowHandle>>;

    async fn classify(&self, handle: WindowHandle) -> WindowState;

    async fn restore(&self, handle: WindowHandle);
}

/// Factory function to create an appropriate window platform based on the dry_run flag
pub fn create_window_platform(
    config: &Config,
    virtual_device: Arc<VirtualDevice>,
    dry_run: bool,
) -> Result<Arc<dyn WindowPlatform>> {
    let chord = config.watcher.chord()?;

    if dry_run {
        Ok(Arc::new(super::dry_run::DryRunPlatform::new(
            virtual_device,
            chord,
        )))
    } else {
        Ok(Arc::new(super::window_detector::RealWindowPlatform::new(
            &config.platform.backend,
            virtual_device,
            chord,
        )?))
    }
}
