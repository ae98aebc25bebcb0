use std::fmt;

pub const APP_NAME: &str = "Fullscreen Helper";

// Шуточная статистика: сколько времени и нажатий сэкономило одно восстановление
const SECONDS_SAVED_PER_RESTORE: u64 = 5;
const KEYSTROKES_PER_RESTORE: u64 = 2;
// Работа одного нажатия клавиши (~0.6 Н на 4 мм), в миллиджоулях
const KEYSTROKE_ENERGY_MJ: f64 = 2.4;

/// Данные окна «О программе»
#[derive(Debug, Clone, PartialEq)]
pub struct AboutInfo {
    pub version: &'static str,
    pub restore_count: u64,
}

impl AboutInfo {
    pub fn new(restore_count: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            restore_count,
        }
    }

    pub fn seconds_saved(&self) -> u64 {
        self.restore_count.saturating_mul(SECONDS_SAVED_PER_RESTORE)
    }

    pub fn keystrokes_saved(&self) -> u64 {
        self.restore_count.saturating_mul(KEYSTROKES_PER_RESTORE)
    }

    pub fn energy_saved_mj(&self) -> f64 {
        self.keystrokes_saved() as f64 * KEYSTROKE_ENERGY_MJ
    }

    pub fn time_saved(&self) -> String {
        let seconds = self.seconds_saved();
        match (seconds / 3600, seconds % 3600 / 60, seconds % 60) {
            (0, 0, s) => format!("{} с", s),
            (0, m, s) => format!("{} мин {} с", m, s),
            (h, m, _) => format!("{} ч {} мин", h, m),
        }
    }
}

impl fmt::Display for AboutInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} v{}", APP_NAME, self.version)?;
        writeln!(f, "Автоматически возвращает окно игры в полноэкранный режим")?;
        writeln!(f, "Восстановлений полноэкранного режима: {}", self.restore_count)?;
        writeln!(f, "Сэкономлено времени: {}", self.time_saved())?;
        write!(
            f,
            "Сэкономлено нажатий: {} ({:.1} мДж)",
            self.keystrokes_saved(),
            self.energy_saved_mj()
        )
    }
}
