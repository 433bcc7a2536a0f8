use crate::events::{GestureDirection, SwipeAxis, TouchOutcome, TouchSample, ZoneSide};

/// Порог смещения для клика: меньше - это не свайп
pub const TAP_SLOP_PX: f32 = 10.0;
/// Порог длительности для клика
pub const TAP_MAX_DURATION_MS: u64 = 200;
/// Минимальная скорость свайпа; медленное перетаскивание не жест
pub const MIN_FLING_SPEED_PX_S: f32 = 200.0;

/// Классификация пары касаний из одной зоны.
///
/// Чистая функция, выполняется синхронно на пути доставки ввода.
pub fn classify(side: ZoneSide, start: &TouchSample, end: &TouchSample) -> TouchOutcome {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    // Нулевая длительность прижимается к 1мс (деление на ноль)
    let dt = end.timestamp_ms.saturating_sub(start.timestamp_ms).max(1);

    if dx.abs() < TAP_SLOP_PX && dy.abs() < TAP_SLOP_PX && dt < TAP_MAX_DURATION_MS {
        return TouchOutcome::Tap;
    }

    let speed_x = dx.abs() * 1000.0 / dt as f32;
    let speed_y = dy.abs() * 1000.0 / dt as f32;

    if speed_x < MIN_FLING_SPEED_PX_S && speed_y < MIN_FLING_SPEED_PX_S {
        return TouchOutcome::Ignore;
    }

    TouchOutcome::Gesture(classify_fling(side, dx, dy))
}

/// Альтернативный путь срабатывания: fling-колбэк платформенного трекера
/// скоростей. Обязан давать то же направление, что и `classify`, при тех
/// же (dx, dy).
pub fn classify_fling(side: ZoneSide, dx: f32, dy: f32) -> GestureDirection {
    let axis = if dx.abs() > dy.abs() {
        SwipeAxis::Horizontal
    } else if dy < 0.0 {
        // Ничья |dx| == |dy| разрешается в пользу вертикали
        SwipeAxis::Up
    } else {
        SwipeAxis::Down
    };

    GestureDirection::from_parts(side, axis)
}

/// Защита от двойного срабатывания: на один физический свайп излучается
/// не более одного жеста, каким бы путём он ни был классифицирован
/// (отпускание пальца или fling-колбэк).
#[derive(Debug, Default)]
pub struct GestureGate {
    fired: bool,
}

impl GestureGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Новая последовательность касаний началась - защёлка сбрасывается
    pub fn begin(&mut self) {
        self.fired = false;
    }

    /// true ровно один раз между вызовами `begin`
    pub fn try_emit(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f32, y: f32, t: u64) -> TouchSample {
        TouchSample::new(x, y, t)
    }

    #[test]
    fn test_small_fast_touch_is_tap() {
        // Любое направление внутри порогов остаётся кликом
        for (dx, dy) in [(0.0, 0.0), (5.0, -5.0), (-9.0, 9.0), (9.9, 0.0)] {
            let outcome = classify(
                ZoneSide::Left,
                &sample(100.0, 500.0, 0),
                &sample(100.0 + dx, 500.0 + dy, 150),
            );
            assert_eq!(outcome, TouchOutcome::Tap, "dx={} dy={}", dx, dy);
        }
    }

    #[test]
    fn test_small_but_slow_touch_is_not_tap() {
        // Смещение в пределах порога, но время больше 200мс
        let outcome = classify(
            ZoneSide::Left,
            &sample(100.0, 500.0, 0),
            &sample(104.0, 503.0, 400),
        );
        assert_eq!(outcome, TouchOutcome::Ignore);
    }

    #[test]
    fn test_slow_drag_is_ignored() {
        // 150px за 1000мс = 150px/с по обеим осям - ниже порога скорости
        let outcome = classify(
            ZoneSide::Right,
            &sample(100.0, 500.0, 0),
            &sample(250.0, 650.0, 1000),
        );
        assert_eq!(outcome, TouchOutcome::Ignore);
    }

    #[test]
    fn test_horizontal_dominance() {
        let outcome = classify(
            ZoneSide::Left,
            &sample(0.0, 500.0, 0),
            &sample(300.0, 550.0, 200),
        );
        assert_eq!(
            outcome,
            TouchOutcome::Gesture(GestureDirection::LeftHorizontal)
        );
    }

    #[test]
    fn test_vertical_up_and_down() {
        let up = classify(
            ZoneSide::Right,
            &sample(50.0, 800.0, 0),
            &sample(60.0, 400.0, 200),
        );
        assert_eq!(up, TouchOutcome::Gesture(GestureDirection::RightUp));

        let down = classify(
            ZoneSide::Right,
            &sample(50.0, 400.0, 0),
            &sample(60.0, 800.0, 200),
        );
        assert_eq!(down, TouchOutcome::Gesture(GestureDirection::RightDown));
    }

    #[test]
    fn test_tie_resolves_to_vertical() {
        // |dx| == |dy| - побеждает вертикаль
        assert_eq!(
            classify_fling(ZoneSide::Left, 300.0, 300.0),
            GestureDirection::LeftDown
        );
        assert_eq!(
            classify_fling(ZoneSide::Left, 300.0, -300.0),
            GestureDirection::LeftUp
        );
    }

    #[test]
    fn test_zero_duration_is_clamped() {
        // Одинаковые таймстампы не должны приводить к делению на ноль
        let outcome = classify(
            ZoneSide::Left,
            &sample(0.0, 500.0, 100),
            &sample(300.0, 500.0, 100),
        );
        assert_eq!(
            outcome,
            TouchOutcome::Gesture(GestureDirection::LeftHorizontal)
        );
    }

    #[test]
    fn test_fling_matches_touch_path() {
        let start = sample(0.0, 500.0, 0);
        let end = sample(280.0, 350.0, 180);
        let dx = end.x - start.x;
        let dy = end.y - start.y;

        let touch = classify(ZoneSide::Right, &start, &end);
        let fling = classify_fling(ZoneSide::Right, dx, dy);

        assert_eq!(touch, TouchOutcome::Gesture(fling));
    }

    #[test]
    fn test_gate_emits_once_per_sequence() {
        let mut gate = GestureGate::new();

        gate.begin();
        assert!(gate.try_emit());
        // Второй путь срабатывания того же свайпа подавляется
        assert!(!gate.try_emit());

        gate.begin();
        assert!(gate.try_emit());
    }
}
