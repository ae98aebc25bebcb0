use crate::error::{HelperError, Result};
use crate::services::keycode_map::KeycodeMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
}

impl KeyState {
    /// Значение поля `value` для события EV_KEY
    pub fn value(&self) -> i32 {
        match self {
            KeyState::Pressed => 1,
            KeyState::Released => 0,
        }
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KeycodeMap::get_key_name(self.0) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "KEY_{}", self.0),
        }
    }
}

/// Сочетание клавиш вида `alt+enter`.
///
/// Клавиши нажимаются в порядке записи и отпускаются в обратном порядке,
/// поэтому модификаторы пишутся первыми.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    keys: SmallVec<[KeyCode; 4]>,
}

impl KeyChord {
    pub fn parse(chord: &str) -> Result<Self> {
        let mut keys = SmallVec::new();

        for part in chord.split('+') {
            let name = part.trim();
            if name.is_empty() {
                return Err(HelperError::InvalidKey(format!(
                    "Пустая клавиша в сочетании '{}'",
                    chord
                )));
            }
            let code = KeycodeMap::get_keycode(name).map_err(HelperError::InvalidKey)?;
            keys.push(KeyCode::new(code));
        }

        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[KeyCode] {
        &self.keys
    }

    /// Нажатия в прямом порядке
    pub fn presses(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys().iter().copied()
    }

    /// Отпускания в обратном порядке
    pub fn releases(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys().iter().rev().copied()
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.keys.iter().map(|key| key.to_string()).collect();
        write!(f, "{}", names.join("+"))
    }
}
