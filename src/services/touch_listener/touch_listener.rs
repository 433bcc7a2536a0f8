use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::{GestureError, Result};
use crate::events::{TouchOutcome, TouchSample, ZoneSide};
use crate::services::classifier::{classify, GestureGate};
use crate::services::dispatcher::ActionDispatcher;
use crate::services::policy_store::PolicyStore;
use crate::services::session::OverlaySession;
use crate::utils::DeviceFinder;
use evdev::{Device, EventType};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::r#trait::TouchListenerTrait;

const BTN_TOUCH: u16 = 330;
const ABS_X: u16 = 0;
const ABS_Y: u16 = 1;
const ABS_MT_POSITION_X: u16 = 53;
const ABS_MT_POSITION_Y: u16 = 54;

/// Текущая последовательность касаний внутри одной зоны
struct ActiveTouch {
    zone: ZoneSide,
    start: TouchSample,
}

pub struct RealTouchListener {
    device: Device,
    session: Arc<OverlaySession>,
    dispatcher: Arc<ActionDispatcher>,
    policy_store: Arc<PolicyStore>,
    epoch: Instant,
    last_x: f32,
    last_y: f32,
    active: Option<ActiveTouch>,
    gate: GestureGate,
}

impl RealTouchListener {
    pub fn new(
        config: Arc<Config>,
        session: Arc<OverlaySession>,
        dispatcher: Arc<ActionDispatcher>,
        policy_store: Arc<PolicyStore>,
    ) -> Result<Self> {
        info!("Инициализация RealTouchListener");

        let device_path = DeviceFinder::find_touch_device(&config.input.device_path)?;

        let device = Device::open(&device_path).map_err(|e| {
            GestureError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        // Без эксклюзивного захвата: зоны делят сенсор с остальной
        // системой, перехват решается геометрией и touch_enabled
        info!("Сенсорное устройство: {}", device.name().unwrap_or("Unknown"));

        Ok(Self {
            device,
            session,
            dispatcher,
            policy_store,
            epoch: Instant::now(),
            last_x: 0.0,
            last_y: 0.0,
            active: None,
            gate: GestureGate::new(),
        })
    }

    async fn run_impl(mut self) -> Result<()> {
        info!("RealTouchListener запущен, начинаем чтение событий");

        loop {
            // Обработка событий касаний (неблокирующая)
            let events_vec = match self.device.fetch_events() {
                Ok(events) => events.collect::<Vec<_>>(),
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                    continue;
                }
            };

            for event in events_vec {
                self.handle_event(event);
            }

            // Небольшая задержка для предотвращения 100% загрузки CPU
            tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn handle_event(&mut self, event: evdev::InputEvent) {
        if event.event_type() == EventType::ABSOLUTE {
            match event.code() {
                ABS_X | ABS_MT_POSITION_X => self.last_x = event.value() as f32,
                ABS_Y | ABS_MT_POSITION_Y => self.last_y = event.value() as f32,
                _ => {}
            }
        } else if event.event_type() == EventType::KEY && event.code() == BTN_TOUCH {
            match event.value() {
                1 => self.on_touch_down(),
                0 => self.on_touch_up(),
                _ => debug_if_enabled!("Неизвестное значение BTN_TOUCH: {}", event.value()),
            }
        }
    }

    fn on_touch_down(&mut self) {
        let layout = self.session.layout();
        let zone = match layout.hit_test(self.last_x, self.last_y) {
            Some(zone) => zone,
            None => return,
        };

        // touch_enabled=false полностью отключает доставку касаний в зону
        if !self.session.is_touch_enabled(zone) {
            debug_if_enabled!("Зона {} не принимает касания, пропускаем", zone);
            return;
        }

        self.gate.begin();
        self.active = Some(ActiveTouch {
            zone,
            start: TouchSample::new(self.last_x, self.last_y, self.now_ms()),
        });
    }

    fn on_touch_up(&mut self) {
        let active = match self.active.take() {
            Some(active) => active,
            None => return,
        };

        let end = TouchSample::new(self.last_x, self.last_y, self.now_ms());

        match classify(active.zone, &active.start, &end) {
            TouchOutcome::Tap => {
                // Клик по зоне - переключатель показа
                debug!("Клик в зоне {}", active.zone);
                self.policy_store.toggle_user_visible();
            }
            TouchOutcome::Gesture(direction) => {
                // На один физический свайп - не более одного жеста
                if !self.gate.try_emit() {
                    debug_if_enabled!("Повторный триггер свайпа подавлен: {}", direction);
                    return;
                }
                if self.session.show_animation() {
                    debug!("Анимация направления {} (рисует внешняя поверхность)", direction);
                }
                self.dispatcher.dispatch(direction);
            }
            TouchOutcome::Ignore => {
                debug_if_enabled!("Подпороговое касание в зоне {}", active.zone);
            }
        }
    }
}

#[async_trait::async_trait]
impl TouchListenerTrait for RealTouchListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

impl Drop for RealTouchListener {
    fn drop(&mut self) {
        info!("RealTouchListener завершает работу");
    }
}
