use thiserror::Error;

#[derive(Error, Debug)]
pub enum GestureError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Цель действия не найдена: {0}")]
    Resolution(String),

    #[error("Ошибка поверхности отрисовки: {0}")]
    Surface(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl GestureError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(GestureError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, GestureError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! gesture_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::GestureError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::GestureError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::GestureError::ServiceUnavailable(format!($($arg)*))
    };
    (resolution, $($arg:tt)*) => {
        $crate::error::GestureError::Resolution(format!($($arg)*))
    };
    (surface, $($arg:tt)*) => {
        $crate::error::GestureError::Surface(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::GestureError::Internal(format!($($arg)*))
    };
}
