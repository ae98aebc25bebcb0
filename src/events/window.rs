use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор окна X11. Не владеет окном и не кэшируется между тиками:
/// процесс игры может перезапуститься и получить новое окно.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Разобрать идентификатор в десятичном (`xdotool`) или шестнадцатеричном (`wmctrl`) виде
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => raw.parse().ok(),
        };
        parsed.map(Self)
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Геометрия окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }
}

impl fmt::Display for WindowGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Прямоугольник основного монитора. Если известен только общий размер
/// дисплея, начало координат равно (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenBounds {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }
}

/// Результат классификации окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowState {
    Fullscreen,
    Windowed,
}

/// Заголовок окна совпадает, если содержит настроенную строку (с учётом регистра).
/// Пустой шаблон не совпадает ни с чем: следить «за любым окном» нельзя.
pub fn title_matches(window_title: &str, pattern: &str) -> bool {
    !pattern.is_empty() && window_title.contains(pattern)
}
