//! Persistent settings record: target window, poll interval and restore counter.
//!
//! The file is a small JSON document with PascalCase keys. Loading never fails:
//! a missing file is created with defaults, an unreadable or broken one is
//! replaced by defaults in memory. Saving is best-effort.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "WindowTitle")]
    pub window_title: String,
    /// Имя исполняемого файла; хранится для справки и в поиске окна не участвует
    #[serde(rename = "Executable")]
    pub executable: String,
    #[serde(rename = "CheckIntervalMs")]
    pub check_interval_ms: u64,
    #[serde(rename = "RestoreCount")]
    pub restore_count: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_title: "Magic The Gatherin".to_string(),
            executable: "mtga.exe".to_string(),
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            restore_count: 0,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Файл настроек {:?} не найден, создаём настройки по умолчанию", path);
            let settings = Settings::default();
            settings.save(path);
            return settings;
        }

        match Self::read(path) {
            Ok(settings) => {
                debug!("Настройки загружены из {:?}: {:?}", path, settings);
                settings
            }
            Err(e) => {
                warn!("Не удалось прочитать настройки {:?}: {}. Используем значения по умолчанию", path, e);
                Settings::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&json)?;

        if settings.check_interval_ms == 0 {
            warn!(
                "CheckIntervalMs должно быть больше 0, используем {}",
                DEFAULT_CHECK_INTERVAL_MS
            );
            settings.check_interval_ms = DEFAULT_CHECK_INTERVAL_MS;
        }

        Ok(settings)
    }

    /// Сохранить настройки; ошибка записи только логируется
    pub fn save<P: AsRef<Path>>(&self, path: P) {
        let path = path.as_ref();
        if let Err(e) = self.write(path) {
            warn!("Не удалось сохранить настройки в {:?}: {}", path, e);
        }
    }

    fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        debug!("Настройки сохранены в {:?}", path);
        Ok(())
    }
}
