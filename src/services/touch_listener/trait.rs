use crate::config::Config;
use crate::error::Result;
use crate::services::dispatcher::ActionDispatcher;
use crate::services::policy_store::PolicyStore;
use crate::services::session::OverlaySession;
use std::sync::Arc;

/// Слушатель касаний в зонах у краёв экрана
#[async_trait::async_trait]
pub trait TouchListenerTrait {
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Фабрика: боевой слушатель сенсорного устройства или эмуляция
pub fn create_touch_listener(
    config: Arc<Config>,
    session: Arc<OverlaySession>,
    dispatcher: Arc<ActionDispatcher>,
    policy_store: Arc<PolicyStore>,
    dry_run: bool,
) -> Result<Box<dyn TouchListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_touch_listener::DryTouchListener::new(
            session, dispatcher,
        )))
    } else {
        Ok(Box::new(super::touch_listener::RealTouchListener::new(
            config,
            session,
            dispatcher,
            policy_store,
        )?))
    }
}
