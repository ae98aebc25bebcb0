pub mod keyboard;
pub mod window;

pub use keyboard::{KeyChord, KeyCode, KeyState};
pub use window::{ScreenBounds, WindowGeometry, WindowHandle, WindowState};

/// События для виртуальной клавиатуры
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualKeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
}

impl VirtualKeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState) -> Self {
        Self { key_code, state }
    }

    pub fn press(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Pressed)
    }

    pub fn release(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Released)
    }
}
