use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{ActionBinding, ActionKind};
use crate::error::Result;
use crate::events::GestureDirection;
use crate::services::policy_store::PolicyStore;
use crate::services::system_actions::SystemActions;

/// Диспетчер действий: классифицированный жест -> ровно одна системная
/// операция. Разрешение привязки происходит синхронно, сама операция
/// уходит в отдельную задачу - вызывающий путь ввода не блокируется
/// дольше, чем на выдачу запроса.
pub struct ActionDispatcher {
    policy_store: Arc<PolicyStore>,
    actions: Arc<dyn SystemActions>,
}

impl ActionDispatcher {
    pub fn new(policy_store: Arc<PolicyStore>, actions: Arc<dyn SystemActions>) -> Self {
        Self {
            policy_store,
            actions,
        }
    }

    pub fn dispatch(&self, direction: GestureDirection) {
        let bindings = self.policy_store.bindings();
        // Отсутствующая привязка по умолчанию - "назад"
        let binding = bindings
            .get(&direction)
            .cloned()
            .unwrap_or_else(ActionBinding::back);
        let own_package = self.policy_store.snapshot().own_package;

        info!("Жест {}: действие {:?}", direction, binding.action);

        let actions = Arc::clone(&self.actions);
        tokio::spawn(async move {
            if let Err(e) = execute(actions.as_ref(), &binding, &own_package).await {
                error!("Действие {:?} не выполнено: {}", binding.action, e);
            }
        });
    }
}

/// Выполнение разрешённой привязки: исчерпывающее сопоставление вместо
/// выбора функции по порядковому номеру
async fn execute(
    actions: &dyn SystemActions,
    binding: &ActionBinding,
    own_package: &str,
) -> Result<()> {
    match binding.action {
        ActionKind::Back => actions.request_back().await,
        ActionKind::Screenshot => actions.request_screenshot().await,
        ActionKind::LaunchApp => match &binding.package {
            Some(package) => actions.request_launch(package).await,
            None => {
                // Не ошибка: привязка без цели просто ничего не делает
                warn!("launch_app без целевого пакета - пропускаем");
                Ok(())
            }
        },
        ActionKind::Clean => actions.request_cleanup(own_package).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::OverlaySignal;
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Back,
        Screenshot,
        Launch(String),
        Cleanup(String),
    }

    struct RecordingActions {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingActions {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn take(&self) -> Vec<Call> {
            std::mem::take(&mut self.calls.lock())
        }
    }

    #[async_trait::async_trait]
    impl SystemActions for RecordingActions {
        async fn request_back(&self) -> Result<()> {
            self.calls.lock().push(Call::Back);
            Ok(())
        }

        async fn request_screenshot(&self) -> Result<()> {
            self.calls.lock().push(Call::Screenshot);
            Ok(())
        }

        async fn request_launch(&self, package: &str) -> Result<()> {
            self.calls.lock().push(Call::Launch(package.to_string()));
            Ok(())
        }

        async fn request_cleanup(&self, excluding: &str) -> Result<()> {
            self.calls.lock().push(Call::Cleanup(excluding.to_string()));
            Ok(())
        }
    }

    fn store(config: Config) -> Arc<PolicyStore> {
        let (tx, _rx): (mpsc::Sender<OverlaySignal>, _) = mpsc::channel(16);
        Arc::new(PolicyStore::new(config, PathBuf::from("gesture.toml"), tx))
    }

    #[tokio::test]
    async fn test_scenario_a_default_binding_is_back() {
        // Пустое хранилище политики при первом запуске
        let actions = RecordingActions::new();
        let store = store(Config::default());
        let bindings = store.bindings();

        execute(
            actions.as_ref(),
            &bindings[&GestureDirection::LeftUp],
            "gesture-rust",
        )
        .await
        .unwrap();

        assert_eq!(actions.take(), vec![Call::Back]);
    }

    #[tokio::test]
    async fn test_launch_without_package_is_noop() {
        let actions = RecordingActions::new();
        let binding = ActionBinding {
            action: ActionKind::LaunchApp,
            package: None,
        };

        execute(actions.as_ref(), &binding, "gesture-rust")
            .await
            .unwrap();

        assert!(actions.take().is_empty());
    }

    #[tokio::test]
    async fn test_launch_with_package() {
        let actions = RecordingActions::new();
        let binding = ActionBinding {
            action: ActionKind::LaunchApp,
            package: Some("org.gnome.Calculator".to_string()),
        };

        execute(actions.as_ref(), &binding, "gesture-rust")
            .await
            .unwrap();

        assert_eq!(
            actions.take(),
            vec![Call::Launch("org.gnome.Calculator".to_string())]
        );
    }

    #[tokio::test]
    async fn test_cleanup_excludes_own_package() {
        let actions = RecordingActions::new();
        let binding = ActionBinding {
            action: ActionKind::Clean,
            package: None,
        };

        execute(actions.as_ref(), &binding, "gesture-rust")
            .await
            .unwrap();

        assert_eq!(actions.take(), vec![Call::Cleanup("gesture-rust".to_string())]);
    }

    #[tokio::test]
    async fn test_dispatch_resolves_configured_binding() {
        let actions = RecordingActions::new();
        let store = store(Config::default());
        store.set_binding(GestureDirection::RightDown, ActionKind::Screenshot, None);

        let dispatcher = ActionDispatcher::new(store, actions.clone());
        dispatcher.dispatch(GestureDirection::RightDown);

        // Действие уходит в отдельную задачу
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(actions.take(), vec![Call::Screenshot]);
    }
}
