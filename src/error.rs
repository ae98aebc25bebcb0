use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelperError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Неизвестная клавиша: {0}")]
    InvalidKey(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl HelperError {
    pub fn service_unavailable<T>(msg: impl Into<String>) -> Result<T> {
        Err(HelperError::ServiceUnavailable(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, HelperError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! helper_error {
    (invalid_key, $($arg:tt)*) => {
        $crate::error::HelperError::InvalidKey(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::HelperError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::HelperError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::HelperError::Internal(format!($($arg)*))
    };
}
