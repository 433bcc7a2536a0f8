use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{ActionBinding, ActionKind, Config, GestureBinding, OverlayPolicy};
use crate::events::{GestureDirection, OverlaySignal};

/// Хранилище политики оверлея.
///
/// Единственный путь мутации настроек. Каждый сеттер после изменения
/// снимка излучает сигнал в канал машины состояний; сама машина хранилище
/// никогда не мутирует и читает только атомарные снимки.
pub struct PolicyStore {
    config: RwLock<Config>,
    config_path: PathBuf,
    signal_tx: mpsc::Sender<OverlaySignal>,
}

impl PolicyStore {
    pub fn new(config: Config, config_path: PathBuf, signal_tx: mpsc::Sender<OverlaySignal>) -> Self {
        Self {
            config: RwLock::new(config),
            config_path,
            signal_tx,
        }
    }

    /// Снимок политики за одно взятие блокировки: поля двух разных
    /// изменений конфигурации смешаться не могут
    pub fn snapshot(&self) -> OverlayPolicy {
        self.config.read().policy()
    }

    /// Привязки жестов; все шесть направлений присутствуют всегда
    pub fn bindings(&self) -> HashMap<GestureDirection, ActionBinding> {
        self.config.read().bindings_map()
    }

    fn emit(&self, signal: OverlaySignal) {
        if let Err(e) = self.signal_tx.try_send(signal) {
            // Переполненный канал не должен блокировать вызывающего
            warn!("Не удалось отправить сигнал политики: {}", e);
        }
    }

    /// Пользовательский переключатель видимости: меняет флаг и сразу
    /// инициирует пересчёт состояния, не дожидаясь события окна
    pub fn toggle_user_visible(&self) {
        let visible = {
            let mut config = self.config.write();
            config.overlay.user_visible = !config.overlay.user_visible;
            config.overlay.user_visible
        };
        info!("Видимость зон переключена пользователем: {}", visible);
        self.emit(OverlaySignal::UserToggle);
    }

    pub fn set_user_visible(&self, visible: bool) {
        self.config.write().overlay.user_visible = visible;
        self.emit(OverlaySignal::PolicyChanged);
    }

    pub fn set_game_mode_enabled(&self, enabled: bool) {
        self.config.write().overlay.game_mode_enabled = enabled;
        self.emit(OverlaySignal::PolicyChanged);
    }

    pub fn set_zone_size(&self, width: u32, height: u32) {
        {
            let mut config = self.config.write();
            config.zone.width = width;
            config.zone.height = height;
        }
        self.emit(OverlaySignal::PolicyChanged);
    }

    pub fn set_blocked_packages(&self, packages: Vec<String>) {
        {
            let mut config = self.config.write();
            config.overlay.blocked_packages = packages;
            config.build_optimization_indexes();
        }
        self.emit(OverlaySignal::PolicyChanged);
    }

    /// Заменяет привязку направления, сохраняя инвариант
    /// "ровно одна привязка на направление"
    pub fn set_binding(&self, gesture: GestureDirection, action: ActionKind, package: Option<String>) {
        {
            let mut config = self.config.write();
            config.bindings.retain(|binding| binding.gesture != gesture);
            config.bindings.push(GestureBinding {
                gesture,
                action,
                package,
            });
        }
        self.emit(OverlaySignal::PolicyChanged);
    }

    /// Перечитывает конфигурацию с диска (внешнее редактирование настроек)
    pub fn reload(&self) -> anyhow::Result<()> {
        let fresh = Config::load(&self.config_path)?;
        *self.config.write() = fresh;
        info!("Конфигурация перечитана из {:?}", self.config_path);
        self.emit(OverlaySignal::PolicyChanged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_channel() -> (PolicyStore, mpsc::Receiver<OverlaySignal>) {
        let (tx, rx) = mpsc::channel(16);
        let store = PolicyStore::new(Config::default(), PathBuf::from("gesture.toml"), tx);
        (store, rx)
    }

    #[test]
    fn test_toggle_flips_and_emits_user_toggle() {
        let (store, mut rx) = store_with_channel();
        assert!(store.snapshot().user_visible);

        store.toggle_user_visible();
        assert!(!store.snapshot().user_visible);
        assert_eq!(rx.try_recv().unwrap(), OverlaySignal::UserToggle);

        store.toggle_user_visible();
        assert!(store.snapshot().user_visible);
    }

    #[test]
    fn test_setters_emit_policy_changed() {
        let (store, mut rx) = store_with_channel();

        store.set_zone_size(250, 300);
        assert_eq!(rx.try_recv().unwrap(), OverlaySignal::PolicyChanged);

        let policy = store.snapshot();
        assert_eq!(policy.zone_width, 250);
        assert_eq!(policy.zone_height, 300);
    }

    #[test]
    fn test_set_blocked_packages_rebuilds_index() {
        let (store, _rx) = store_with_channel();
        store.set_blocked_packages(vec!["Org.Videolan.VLC".to_string()]);

        assert!(store.snapshot().is_blocked("org.videolan.vlc"));
    }

    #[test]
    fn test_set_binding_keeps_single_entry_per_direction() {
        let (store, _rx) = store_with_channel();

        store.set_binding(GestureDirection::LeftUp, ActionKind::Screenshot, None);
        store.set_binding(
            GestureDirection::LeftUp,
            ActionKind::LaunchApp,
            Some("org.gnome.Calculator".to_string()),
        );

        let bindings = store.bindings();
        assert_eq!(bindings[&GestureDirection::LeftUp].action, ActionKind::LaunchApp);
        // Остальные направления по умолчанию "назад"
        assert_eq!(bindings[&GestureDirection::RightDown], ActionBinding::back());
        assert_eq!(bindings.len(), 6);
    }
}
