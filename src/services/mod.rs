pub mod fullscreen_watcher;
pub mod keycode_map;
pub mod shell;
pub mod virtual_device;
pub mod watcher_state;
pub mod window_detector;

pub use fullscreen_watcher::{FullscreenWatcher, WatcherCommand};
pub use shell::{Notifier, PresentationShell};
pub use virtual_device::VirtualDevice;
pub use window_detector::create_window_platform;
