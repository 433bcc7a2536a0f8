use crate::error::{GestureError, Result};
use std::process::Command;

/// Запрос активного приложения у sway через swaymsg
pub struct SwayProbe;

impl SwayProbe {
    pub fn new() -> Self {
        Self
    }

    pub async fn test(&self) -> Result<()> {
        let output = Command::new("swaymsg").args(["-t", "get_tree"]).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(GestureError::Internal("sway failed".to_string()))
        }
    }

    pub async fn get_active_package(&self) -> Result<String> {
        let output = Command::new("swaymsg")
            .args(["-t", "get_tree"])
            .output()
            .map_err(|e| GestureError::Internal(format!("swaymsg не найден: {}", e)))?;

        if !output.status.success() {
            return Err(GestureError::Internal("swaymsg вернул ошибку".to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        // app_id лежит в том же объекте узла, что и "focused":true;
        // ищем ближайшее вхождение с обеих сторон
        if let Some(focus_pos) = stdout.find("\"focused\":true") {
            let before = &stdout[..focus_pos];
            let after = &stdout[focus_pos..];

            if let Some(package) = Self::extract_app_id_backward(before) {
                return Ok(package);
            }
            if let Some(package) = Self::extract_app_id_forward(after) {
                return Ok(package);
            }
        }

        Err(GestureError::Internal(
            "Активное приложение в sway не найдено".to_string(),
        ))
    }

    fn extract_app_id_backward(before: &str) -> Option<String> {
        let start = before.rfind("\"app_id\":\"")?;
        let rest = &before[start + 10..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    }

    fn extract_app_id_forward(after: &str) -> Option<String> {
        let start = after.find("\"app_id\":\"")?;
        let rest = &after[start + 10..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_app_id_near_focused_node() {
        let json = r#"{"name":"firefox","app_id":"org.mozilla.firefox","focused":true}"#;
        let pos = json.find("\"focused\":true").unwrap();
        assert_eq!(
            SwayProbe::extract_app_id_backward(&json[..pos]).as_deref(),
            Some("org.mozilla.firefox")
        );

        let json_after = r#"{"focused":true,"app_id":"org.gnome.Nautilus"}"#;
        let pos = json_after.find("\"focused\":true").unwrap();
        assert_eq!(
            SwayProbe::extract_app_id_forward(&json_after[pos..]).as_deref(),
            Some("org.gnome.Nautilus")
        );
    }
}
