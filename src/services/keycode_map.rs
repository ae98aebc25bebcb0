use std::collections::HashMap;
use once_cell::sync::Lazy;

/// Маппинг между именами клавиш и кодами evdev
pub struct KeycodeMap;

// Канонические имена клавиш, допустимые в сочетании
const CANONICAL_KEYS: &[(&str, u16)] = &[
    // Буквенные клавиши
    ("a", 30), ("b", 48), ("c", 46), ("d", 32), ("e", 18), ("f", 33), ("g", 34),
    ("h", 35), ("i", 23), ("j", 36), ("k", 37), ("l", 38), ("m", 50), ("n", 49),
    ("o", 24), ("p", 25), ("q", 16), ("r", 19), ("s", 31), ("t", 20), ("u", 22),
    ("v", 47), ("w", 17), ("x", 45), ("y", 21), ("z", 44),

    // Цифровые клавиши (верхний ряд)
    ("1", 2), ("2", 3), ("3", 4), ("4", 5), ("5", 6),
    ("6", 7), ("7", 8), ("8", 9), ("9", 10), ("0", 11),

    // Специальные клавиши
    ("space", 57),      // KEY_SPACE
    ("enter", 28),      // KEY_ENTER
    ("escape", 1),      // KEY_ESC
    ("backspace", 14),  // KEY_BACKSPACE
    ("tab", 15),        // KEY_TAB

    // Функциональные клавиши
    ("f1", 59), ("f2", 60), ("f3", 61), ("f4", 62), ("f5", 63), ("f6", 64),
    ("f7", 65), ("f8", 66), ("f9", 67), ("f10", 68), ("f11", 87), ("f12", 88),

    // Модификаторы
    ("ctrl", 29),       // KEY_LEFTCTRL
    ("alt", 56),        // KEY_LEFTALT
    ("shift", 42),      // KEY_LEFTSHIFT
    ("super", 125),     // KEY_LEFTMETA
    ("altgr", 100),     // KEY_RIGHTALT
];

// Синонимы, которые встречаются в привычной записи сочетаний
const ALIASES: &[(&str, u16)] = &[
    ("return", 28),
    ("esc", 1),
    ("control", 29),
    ("meta", 125),
    ("win", 125),
];

static KEY_NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    CANONICAL_KEYS.iter().chain(ALIASES.iter()).copied().collect()
});

static CODE_TO_KEY_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    CANONICAL_KEYS.iter().map(|&(name, code)| (code, name)).collect()
});

impl KeycodeMap {
    /// Получить код клавиши по её имени
    pub fn get_keycode(key_name: &str) -> Result<u16, String> {
        let normalized = key_name.to_lowercase();
        KEY_NAME_TO_CODE.get(normalized.as_str())
            .copied()
            .ok_or_else(|| format!("Unknown key: {}", key_name))
    }

    /// Получить имя клавиши по её коду
    pub fn get_key_name(keycode: u16) -> Option<&'static str> {
        CODE_TO_KEY_NAME.get(&keycode).copied()
    }
}
