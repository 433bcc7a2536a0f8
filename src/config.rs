use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::events::GestureDirection;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub zone: ZoneConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub foreground: ForegroundConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
    #[serde(default)]
    pub bindings: Vec<GestureBinding>,
    // Оптимизационные индексы - не сериализуются, строятся после загрузки
    #[serde(skip)]
    blocked_set_lower: HashSet<String>,
    #[serde(skip)]
    home_set_lower: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            filter: "gesture_rust=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub device_path: String,
    /// Размеры экрана в пикселях для геометрии зон
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: "auto".to_string(),
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneConfig {
    pub width: u32,
    pub height: u32,
    pub show_animation: bool,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            show_animation: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverlayConfig {
    /// Пользовательский переключатель видимости зон
    pub user_visible: bool,
    pub game_mode_enabled: bool,
    /// Собственный id приложения: поверх него зоны всегда подавлены
    pub own_package: String,
    /// Рабочие столы / лаунчеры, поверх которых зоны затемняются
    pub home_packages: Vec<String>,
    pub blocked_packages: Vec<String>,
    /// Дополнительные префиксы игровых пакетов к встроенному списку
    pub game_package_prefixes: Vec<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            user_visible: true,
            game_mode_enabled: false,
            own_package: "gesture-rust".to_string(),
            home_packages: vec![
                "gnome-shell".to_string(),
                "plasmashell".to_string(),
                "sway".to_string(),
            ],
            blocked_packages: Vec::new(),
            game_package_prefixes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForegroundConfig {
    pub detection_mode: String,
    pub polling_interval_ms: u64,
}

impl Default for ForegroundConfig {
    fn default() -> Self {
        Self {
            detection_mode: "auto".to_string(),
            polling_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionsConfig {
    pub screenshot_command: String,
    pub launch_command: String,
    /// Пакеты, которые останавливает очистка фона
    pub cleanup_packages: Vec<String>,
    /// Системные пакеты, которые очистка никогда не трогает
    pub system_packages: Vec<String>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            screenshot_command: "grim".to_string(),
            launch_command: "gtk-launch".to_string(),
            cleanup_packages: Vec::new(),
            system_packages: vec!["systemd".to_string(), "dbus".to_string()],
        }
    }
}

/// Вид действия, привязанного к жесту
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Back,
    Screenshot,
    LaunchApp,
    Clean,
}

/// Привязка направления жеста к действию
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GestureBinding {
    pub gesture: GestureDirection,
    pub action: ActionKind,
    #[serde(default)]
    pub package: Option<String>,
}

/// Разрешённая привязка: действие + целевой пакет (только для launch_app)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBinding {
    pub action: ActionKind,
    pub package: Option<String>,
}

impl ActionBinding {
    pub fn back() -> Self {
        Self {
            action: ActionKind::Back,
            package: None,
        }
    }
}

/// Неизменяемый снимок политики оверлея. Снимается целиком за одно чтение:
/// машина состояний никогда не смешивает поля двух разных снимков.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPolicy {
    pub blocked_packages: HashSet<String>,
    pub game_mode_enabled: bool,
    pub user_visible: bool,
    pub zone_width: u32,
    pub zone_height: u32,
    pub home_packages: HashSet<String>,
    pub own_package: String,
}

impl OverlayPolicy {
    pub fn is_blocked(&self, package: &str) -> bool {
        self.blocked_packages.contains(&package.to_lowercase())
    }

    pub fn is_home(&self, package: &str) -> bool {
        self.home_packages.contains(&package.to_lowercase())
    }

    pub fn is_own(&self, package: &str) -> bool {
        package.eq_ignore_ascii_case(&self.own_package)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig::default(),
            input: InputConfig::default(),
            zone: ZoneConfig::default(),
            overlay: OverlayConfig::default(),
            foreground: ForegroundConfig::default(),
            actions: ActionsConfig::default(),
            bindings: Vec::new(),
            blocked_set_lower: HashSet::new(),
            home_set_lower: HashSet::new(),
        };
        config.build_optimization_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("GESTURE_"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_optimization_indexes();

        Ok(config)
    }

    /// Строит оптимизационные индексы для быстрых проверок принадлежности
    pub fn build_optimization_indexes(&mut self) {
        self.blocked_set_lower = self
            .overlay
            .blocked_packages
            .iter()
            .map(|package| package.to_lowercase())
            .collect();

        self.home_set_lower = self
            .overlay
            .home_packages
            .iter()
            .map(|package| package.to_lowercase())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация геометрии
        if self.input.screen_width == 0 || self.input.screen_height == 0 {
            anyhow::bail!("Размеры экрана должны быть больше 0");
        }

        if !(100..=350).contains(&self.zone.width) {
            anyhow::bail!("Ширина зоны {} вне диапазона 100..=350", self.zone.width);
        }

        if !(50..=1800).contains(&self.zone.height) {
            anyhow::bail!("Высота зоны {} вне диапазона 50..=1800", self.zone.height);
        }

        if self.zone.width * 2 >= self.input.screen_width {
            anyhow::bail!("Зоны шириной {} перекрывают весь экран", self.zone.width);
        }

        // Валидация детекции активного приложения
        match self.foreground.detection_mode.as_str() {
            "auto" | "sway" | "xdotool" => {}
            _ => anyhow::bail!(
                "Неверный режим детекции активного приложения: {}",
                self.foreground.detection_mode
            ),
        }

        if self.foreground.polling_interval_ms < 100 {
            anyhow::bail!("polling_interval_ms должно быть минимум 100");
        }

        if self.overlay.own_package.is_empty() {
            anyhow::bail!("own_package не может быть пустым");
        }

        // Валидация привязок: ровно одна привязка на направление
        let mut seen = HashSet::new();
        for (i, binding) in self.bindings.iter().enumerate() {
            if !seen.insert(binding.gesture) {
                anyhow::bail!(
                    "Повторная привязка для жеста '{}' в записи #{}",
                    binding.gesture,
                    i + 1
                );
            }
        }

        Ok(())
    }

    /// Снимок политики для машины состояний: одно чтение - один снимок
    pub fn policy(&self) -> OverlayPolicy {
        OverlayPolicy {
            blocked_packages: self.blocked_set_lower.clone(),
            game_mode_enabled: self.overlay.game_mode_enabled,
            user_visible: self.overlay.user_visible,
            zone_width: self.zone.width,
            zone_height: self.zone.height,
            home_packages: self.home_set_lower.clone(),
            own_package: self.overlay.own_package.clone(),
        }
    }

    /// Карта привязок: каждое из шести направлений присутствует всегда,
    /// отсутствующие в конфигурации заполняются действием "назад"
    pub fn bindings_map(&self) -> HashMap<GestureDirection, ActionBinding> {
        let mut map: HashMap<GestureDirection, ActionBinding> = GestureDirection::ALL
            .iter()
            .map(|direction| (*direction, ActionBinding::back()))
            .collect();

        for binding in &self.bindings {
            map.insert(
                binding.gesture,
                ActionBinding {
                    action: binding.action,
                    package: binding.package.clone(),
                },
            );
        }

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bindings_default_to_back_for_all_directions() {
        let config = Config::default();
        let bindings = config.bindings_map();

        assert_eq!(bindings.len(), 6);
        for direction in GestureDirection::ALL {
            assert_eq!(bindings[&direction], ActionBinding::back());
        }
    }

    #[test]
    fn test_bindings_map_overrides_configured_direction() {
        let mut config = Config::default();
        config.bindings = vec![GestureBinding {
            gesture: GestureDirection::RightUp,
            action: ActionKind::LaunchApp,
            package: Some("org.mozilla.firefox".to_string()),
        }];

        let bindings = config.bindings_map();
        assert_eq!(bindings[&GestureDirection::RightUp].action, ActionKind::LaunchApp);
        assert_eq!(
            bindings[&GestureDirection::RightUp].package.as_deref(),
            Some("org.mozilla.firefox")
        );
        // Остальные направления остаются с действием "назад"
        assert_eq!(bindings[&GestureDirection::LeftUp], ActionBinding::back());
    }

    #[test]
    fn test_duplicate_binding_fails_validation() {
        let mut config = Config::default();
        config.bindings = vec![
            GestureBinding {
                gesture: GestureDirection::LeftUp,
                action: ActionKind::Back,
                package: None,
            },
            GestureBinding {
                gesture: GestureDirection::LeftUp,
                action: ActionKind::Screenshot,
                package: None,
            },
        ];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zone_range_validation() {
        let mut config = Config::default();
        config.zone.width = 50;
        assert!(config.validate().is_err());

        config.zone.width = 200;
        config.zone.height = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_matching_is_case_insensitive() {
        let mut config = Config::default();
        config.overlay.blocked_packages = vec!["Org.Videolan.VLC".to_string()];
        config.build_optimization_indexes();

        let policy = config.policy();
        assert!(policy.is_blocked("org.videolan.vlc"));
        assert!(policy.is_blocked("ORG.VIDEOLAN.VLC"));
        assert!(!policy.is_blocked("org.gnome.Nautilus"));
        assert!(policy.is_home("gnome-shell"));
        assert!(policy.is_own("Gesture-Rust"));
    }
}
