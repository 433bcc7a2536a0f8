use crate::error::{GestureError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти сенсорное устройство (тачскрин)
    pub fn find_touch_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                GestureError::device_not_found(format!(
                    "Указанное устройство не найдено: {:?}",
                    path
                ))
            };
        }

        Self::auto_find_touch()
    }

    fn auto_find_touch() -> Result<PathBuf> {
        info!("Начинаем автопоиск сенсорного устройства...");

        if let Ok(device) = Self::find_by_id() {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices() {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        GestureError::device_not_found(
            "Не удалось найти сенсорное устройство. \
             Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    fn find_by_id() -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");

        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return GestureError::device_not_found("Директория by-id не найдена");
        }

        let entries = fs::read_dir(by_id_dir).map_err(|e| {
            GestureError::Permission(format!("Нет доступа к /dev/input/by-id: {}", e))
        })?;

        for entry in entries {
            let entry = entry.map_err(GestureError::Io)?;
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            if (name.contains("touchscreen") || name.contains("touch")) && name.contains("event") {
                debug!("Найдено потенциальное сенсорное устройство: {:?}", path);

                if !Self::is_device_accessible(&path) {
                    warn!("Устройство {:?} недоступно", path);
                    continue;
                }

                if Self::is_touch_device(&path)? {
                    return Ok(path);
                }
            }
        }

        GestureError::device_not_found("Сенсорное устройство не найдено в by-id")
    }

    fn find_by_event_devices() -> Result<PathBuf> {
        let input_dir = Path::new("/dev/input");

        let entries = fs::read_dir(input_dir)
            .map_err(|e| GestureError::Permission(format!("Нет доступа к /dev/input: {}", e)))?;

        let mut event_devices = Vec::new();

        for entry in entries {
            let entry = entry.map_err(GestureError::Io)?;
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            if name.starts_with("event") {
                event_devices.push(path);
            }
        }

        event_devices.sort();

        for device_path in event_devices {
            debug!("Проверяем устройство: {:?}", device_path);

            if Self::is_touch_device(&device_path)? && Self::is_device_accessible(&device_path) {
                return Ok(device_path);
            }
        }

        GestureError::device_not_found(
            "Не найдено доступное сенсорное устройство среди event устройств",
        )
    }

    fn is_touch_device(device_path: &Path) -> Result<bool> {
        match evdev::Device::open(device_path) {
            Ok(device) => {
                let device_name = device.name().unwrap_or("Unknown").to_lowercase();

                // Тачпады и мыши репортят относительные оси либо указательные кнопки
                if device_name.contains("mouse") || device_name.contains("touchpad") {
                    debug!(
                        "Исключаем устройство как мышь/тачпад: {:?} ({})",
                        device_path, device_name
                    );
                    return Ok(false);
                }

                // У тачскрина есть абсолютные оси X/Y и кнопка BTN_TOUCH
                let has_abs_axes = device.supported_absolute_axes().map_or(false, |axes| {
                    axes.contains(evdev::AbsoluteAxisCode::ABS_X)
                        && axes.contains(evdev::AbsoluteAxisCode::ABS_Y)
                });

                let has_btn_touch = device
                    .supported_keys()
                    .map_or(false, |keys| keys.contains(evdev::KeyCode::BTN_TOUCH));

                let is_touch = has_abs_axes && has_btn_touch;

                if is_touch {
                    info!("Устройство {:?} подходит как тачскрин", device_path);
                    debug!("Имя устройства: {:?}", device.name());
                } else {
                    debug!(
                        "Устройство {:?} не подходит как тачскрин (имя: {})",
                        device_path, device_name
                    );
                }

                Ok(is_touch)
            }
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                Ok(false)
            }
        }
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("Устройство {:?} недоступно: {}", device_path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_touch_device_with_specific_path() {
        let result = DeviceFinder::find_touch_device("/non/existent/path");
        assert!(result.is_err());
    }
}
