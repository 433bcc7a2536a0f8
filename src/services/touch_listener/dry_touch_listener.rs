use crate::error::Result;
use crate::events::GestureDirection;
use crate::services::dispatcher::ActionDispatcher;
use crate::services::session::OverlaySession;
use std::sync::Arc;
use tracing::info;

use super::r#trait::TouchListenerTrait;

/// Эмуляция сенсора: циклически "проводит" свайпы по всем направлениям,
/// уважая текущее состояние touch_enabled зон
pub struct DryTouchListener {
    session: Arc<OverlaySession>,
    dispatcher: Arc<ActionDispatcher>,
}

impl DryTouchListener {
    pub fn new(session: Arc<OverlaySession>, dispatcher: Arc<ActionDispatcher>) -> Self {
        info!("Создан DryTouchListener (dry-run режим)");
        Self {
            session,
            dispatcher,
        }
    }
}

#[async_trait::async_trait]
impl TouchListenerTrait for DryTouchListener {
    async fn run(self: Box<Self>) -> Result<()> {
        info!("DryTouchListener запущен, эмулируем жесты каждые 15 секунд");

        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(15));
        let mut cycle = GestureDirection::ALL.iter().cycle();

        loop {
            interval.tick().await;

            let direction = match cycle.next() {
                Some(direction) => *direction,
                None => continue,
            };

            let zone = direction.side();

            if !self.session.is_touch_enabled(zone) {
                info!("[DRY-RUN] Зона {} отключена, свайп {} пропущен", zone, direction);
                continue;
            }

            info!("[DRY-RUN] Эмуляция свайпа {}", direction);
            self.dispatcher.dispatch(direction);
        }
    }
}
