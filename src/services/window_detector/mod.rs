//! WindowDetector service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for talking to the desktop:
//! finding the target window by title, classifying it as windowed or fullscreen,
//! and performing the restore action (focus + key chord). It MUST NOT contain any
//! policy: cooldowns, the "seen fullscreen once" guard and the restore counter
//! belong exclusively to the watcher.

pub mod classifier;
pub(crate) mod command;
mod dry_run;
mod window_detector;
mod wmctrl;
mod x11;
mod xdotool;
mod r#trait;

pub use self::r#trait::{create_window_platform, WindowPlatform};
