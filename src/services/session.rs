use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{RenderCommand, ZoneSide};
use crate::gesture_error;

/// Поверхность отрисовки зон. Команды идемпотентны; левая и правая зоны -
/// независимые цели, обновляемые вместе.
pub trait RenderSurface: Send + Sync {
    fn apply(&self, zone: ZoneSide, command: &RenderCommand) -> Result<()>;
}

/// Геометрия зон на экране: две вертикальные полосы у краёв,
/// центрированные по высоте.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneLayout {
    pub screen_width: u32,
    pub screen_height: u32,
    pub zone_width: u32,
    pub zone_height: u32,
}

impl ZoneLayout {
    pub fn new(screen_width: u32, screen_height: u32, zone_width: u32, zone_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
            zone_width,
            zone_height,
        }
    }

    /// В какую зону попадает точка касания (если попадает)
    pub fn hit_test(&self, x: f32, y: f32) -> Option<ZoneSide> {
        let band_top = (self.screen_height.saturating_sub(self.zone_height)) as f32 / 2.0;
        let band_bottom = band_top + self.zone_height as f32;
        if y < band_top || y > band_bottom {
            return None;
        }

        if x >= 0.0 && x < self.zone_width as f32 {
            Some(ZoneSide::Left)
        } else if x <= self.screen_width as f32
            && x > (self.screen_width - self.zone_width) as f32
        {
            Some(ZoneSide::Right)
        } else {
            None
        }
    }
}

/// Визуальное состояние одной зоны
#[derive(Debug, Clone, Copy)]
struct ZoneVisual {
    touch_enabled: bool,
    dimmed: bool,
}

impl Default for ZoneVisual {
    fn default() -> Self {
        // До первой команды зоны не принимают касания
        Self {
            touch_enabled: false,
            dimmed: true,
        }
    }
}

/// Явный объект сессии оверлея. Владеет состоянием обеих зон, раздаётся
/// по ссылке всем участникам: машина состояний пишет команды, слушатель
/// касаний читает `is_touch_enabled` и геометрию. Никаких глобальных
/// статических ссылок.
pub struct OverlaySession {
    zones: RwLock<[ZoneVisual; 2]>,
    layout: RwLock<ZoneLayout>,
    torn_down: AtomicBool,
    show_animation: bool,
}

impl OverlaySession {
    pub fn new(layout: ZoneLayout, show_animation: bool) -> Self {
        info!(
            "Создание сессии оверлея: экран {}x{}, зона {}x{}",
            layout.screen_width, layout.screen_height, layout.zone_width, layout.zone_height
        );
        Self {
            zones: RwLock::new([ZoneVisual::default(), ZoneVisual::default()]),
            layout: RwLock::new(layout),
            torn_down: AtomicBool::new(false),
            show_animation,
        }
    }

    fn zone_index(zone: ZoneSide) -> usize {
        match zone {
            ZoneSide::Left => 0,
            ZoneSide::Right => 1,
        }
    }

    /// Принимает ли зона касания прямо сейчас
    pub fn is_touch_enabled(&self, zone: ZoneSide) -> bool {
        !self.torn_down.load(Ordering::Acquire)
            && self.zones.read()[Self::zone_index(zone)].touch_enabled
    }

    pub fn layout(&self) -> ZoneLayout {
        *self.layout.read()
    }

    pub fn show_animation(&self) -> bool {
        self.show_animation
    }

    /// Принудительное снятие оверлея при завершении сессии: обе зоны
    /// полностью отключаются независимо от незавершённых анимаций
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut zones = self.zones.write();
        for zone in zones.iter_mut() {
            zone.touch_enabled = false;
            zone.dimmed = true;
        }
        info!("Сессия оверлея завершена, зоны убраны");
    }
}

impl RenderSurface for OverlaySession {
    fn apply(&self, zone: ZoneSide, command: &RenderCommand) -> Result<()> {
        if self.torn_down.load(Ordering::Acquire) {
            return Err(gesture_error!(
                surface,
                "Поверхность уже снята, команда {} для зоны {} отброшена",
                command,
                zone
            ));
        }

        match command {
            RenderCommand::SetTouchEnabled(on) => {
                self.zones.write()[Self::zone_index(zone)].touch_enabled = *on;
            }
            RenderCommand::SetDimmed(on) => {
                // Затемнение оставляет касания включёнными: зона рисуется
                // почти невидимой, но продолжает их принимать
                self.zones.write()[Self::zone_index(zone)].dimmed = *on;
            }
            RenderCommand::Resize { width, height } => {
                let mut layout = self.layout.write();
                layout.zone_width = *width;
                layout.zone_height = *height;
            }
        }

        debug!("Зона {}: применена команда {}", zone, command);
        Ok(())
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        if !self.torn_down.load(Ordering::Acquire) {
            warn!("Сессия оверлея уничтожена без явного teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ZoneLayout {
        ZoneLayout::new(1920, 1080, 200, 400)
    }

    #[test]
    fn test_hit_test_left_and_right_bands() {
        let layout = layout();
        // Вертикальная полоса: (1080-400)/2 = 340 .. 740
        assert_eq!(layout.hit_test(50.0, 500.0), Some(ZoneSide::Left));
        assert_eq!(layout.hit_test(1900.0, 500.0), Some(ZoneSide::Right));
        assert_eq!(layout.hit_test(960.0, 500.0), None);
    }

    #[test]
    fn test_hit_test_outside_vertical_band() {
        let layout = layout();
        assert_eq!(layout.hit_test(50.0, 100.0), None);
        assert_eq!(layout.hit_test(50.0, 1000.0), None);
    }

    #[test]
    fn test_touch_disabled_until_first_command() {
        let session = OverlaySession::new(layout(), false);
        assert!(!session.is_touch_enabled(ZoneSide::Left));

        session
            .apply(ZoneSide::Left, &RenderCommand::SetTouchEnabled(true))
            .unwrap();
        assert!(session.is_touch_enabled(ZoneSide::Left));
        // Правая зона - независимая цель
        assert!(!session.is_touch_enabled(ZoneSide::Right));
        session.teardown();
    }

    #[test]
    fn test_resize_updates_layout() {
        let session = OverlaySession::new(layout(), false);
        session
            .apply(
                ZoneSide::Left,
                &RenderCommand::Resize {
                    width: 250,
                    height: 600,
                },
            )
            .unwrap();

        let updated = session.layout();
        assert_eq!(updated.zone_width, 250);
        assert_eq!(updated.zone_height, 600);
        session.teardown();
    }

    #[test]
    fn test_apply_after_teardown_fails_but_does_not_panic() {
        let session = OverlaySession::new(layout(), false);
        session.teardown();

        let result = session.apply(ZoneSide::Right, &RenderCommand::SetDimmed(false));
        assert!(result.is_err());
        assert!(!session.is_touch_enabled(ZoneSide::Right));
    }
}
