use crate::events::KeyChord;
use crate::services::watcher_state::WatcherPolicy;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub watcher: WatcherConfig,
    pub platform: PlatformConfig,
    pub shell: ShellConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Минимальная пауза между двумя восстановлениями
    pub cooldown_ms: u64,
    /// Не восстанавливать окно, пока оно хотя бы раз не побывало в полноэкранном режиме
    pub require_fullscreen_first: bool,
    pub key_chord: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellConfig {
    pub console: bool,
    pub notifications: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 2000,
            require_fullscreen_first: true,
            key_chord: "alt+enter".to_string(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            console: true,
            notifications: true,
        }
    }
}

impl WatcherConfig {
    pub fn policy(&self) -> WatcherPolicy {
        WatcherPolicy {
            cooldown: Duration::from_millis(self.cooldown_ms),
            require_fullscreen_first: self.require_fullscreen_first,
        }
    }

    pub fn chord(&self) -> Result<KeyChord> {
        KeyChord::parse(&self.key_chord)
            .with_context(|| format!("Неверное сочетание клавиш: {}", self.key_chord))
    }
}

impl Config {
    /// Встроенные значения → TOML файл (если есть) → переменные окружения `FSH_*`
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("FSH_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек наблюдателя
        if self.watcher.cooldown_ms == 0 {
            anyhow::bail!("cooldown_ms должно быть больше 0");
        }

        self.watcher.chord()?;

        match self.platform.backend.as_str() {
            "auto" | "xdotool" | "wmctrl" => {}
            _ => anyhow::bail!("Неверный backend окон: {}", self.platform.backend),
        }

        Ok(())
    }
}
