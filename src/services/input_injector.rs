use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{GestureError, Result};

/// evdev-код KEY_BACK
pub const KEY_BACK: i32 = 158;

/// Виртуальная клавиатура для выполнения глобального "назад".
pub struct InputInjector {
    device: Option<Mutex<uinput::Device>>,
    device_name: String,
    dry_run: bool,
}

impl InputInjector {
    pub fn new(device_name: &str, dry_run: bool) -> Result<Self> {
        info!("Инициализация InputInjector '{}' (dry_run: {})", device_name, dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Mutex::new(Self::create_virtual_device(device_name)?))
        };

        Ok(Self {
            device,
            device_name: device_name.to_string(),
            dry_run,
        })
    }

    fn create_virtual_device(device_name: &str) -> Result<uinput::Device> {
        info!("Создание виртуального устройства uinput '{}' для инъекции клавиш", device_name);

        let virtual_device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()
            .map_err(|e| GestureError::Internal(format!(
                "Не удалось создать виртуальное устройство '{}': {}",
                device_name, e
            )))?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(virtual_device)
    }

    /// Нажатие + отпускание клавиши одним вызовом
    pub fn tap_key(&self, keycode: i32) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Инъекция клавиши {}", keycode);
            return Ok(());
        }

        debug!("Инъекция клавиши {}", keycode);

        let device = self.device.as_ref().ok_or_else(|| {
            GestureError::Internal("Виртуальное устройство недоступно".to_string())
        })?;
        let mut device = device.lock();

        for value in [1, 0] {
            if let Err(e) = device.write(1, keycode, value) {
                return Err(GestureError::Internal(format!(
                    "Не удалось отправить событие клавиши {}: {}",
                    keycode, e
                )));
            }
            // Синхронизируем события
            if let Err(e) = device.write(0, 0, 0) {
                return Err(GestureError::Internal(format!(
                    "Не удалось синхронизировать события: {}",
                    e
                )));
            }
        }

        Ok(())
    }
}

impl Drop for InputInjector {
    fn drop(&mut self) {
        if !self.dry_run {
            info!("Закрытие виртуального устройства '{}'", self.device_name);
        }
    }
}
