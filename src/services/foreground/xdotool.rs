use crate::error::{GestureError, Result};
use std::process::Command;

/// Запрос класса активного окна через xdotool (X11)
pub struct XdotoolProbe;

impl XdotoolProbe {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("xdotool").arg("getactivewindow").output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(GestureError::Internal("xdotool failed".to_string()))
        }
    }

    pub async fn get_active_package(&self) -> Result<String> {
        let output = Command::new("xdotool")
            .args(["getactivewindow", "getwindowclassname"])
            .output()
            .map_err(|e| GestureError::Internal(format!("xdotool не найден: {}", e)))?;

        if !output.status.success() {
            return Err(GestureError::Internal("xdotool вернул ошибку".to_string()));
        }

        let package = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if package.is_empty() {
            return Err(GestureError::Internal(
                "xdotool вернул пустой класс окна".to_string(),
            ));
        }

        Ok(package)
    }
}
