use serde::{Deserialize, Serialize};
use std::fmt;

/// Сторона зоны: левый или правый край экрана
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSide {
    Left,
    Right,
}

impl ZoneSide {
    /// Обе зоны обновляются вместе, но являются независимыми целями отрисовки
    pub const BOTH: [ZoneSide; 2] = [ZoneSide::Left, ZoneSide::Right];
}

impl fmt::Display for ZoneSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneSide::Left => write!(f, "left"),
            ZoneSide::Right => write!(f, "right"),
        }
    }
}

/// Доминирующая ось свайпа (со знаком для вертикали)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAxis {
    Up,
    Down,
    Horizontal,
}

/// Направление жеста: сторона зоны + ось свайпа.
/// "Left"/"Right" фиксирует зону, из которой пришло касание,
/// а не направление движения пальца.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureDirection {
    LeftUp,
    LeftHorizontal,
    LeftDown,
    RightUp,
    RightHorizontal,
    RightDown,
}

impl GestureDirection {
    pub const ALL: [GestureDirection; 6] = [
        GestureDirection::LeftUp,
        GestureDirection::LeftHorizontal,
        GestureDirection::LeftDown,
        GestureDirection::RightUp,
        GestureDirection::RightHorizontal,
        GestureDirection::RightDown,
    ];

    pub fn from_parts(side: ZoneSide, axis: SwipeAxis) -> Self {
        match (side, axis) {
            (ZoneSide::Left, SwipeAxis::Up) => GestureDirection::LeftUp,
            (ZoneSide::Left, SwipeAxis::Horizontal) => GestureDirection::LeftHorizontal,
            (ZoneSide::Left, SwipeAxis::Down) => GestureDirection::LeftDown,
            (ZoneSide::Right, SwipeAxis::Up) => GestureDirection::RightUp,
            (ZoneSide::Right, SwipeAxis::Horizontal) => GestureDirection::RightHorizontal,
            (ZoneSide::Right, SwipeAxis::Down) => GestureDirection::RightDown,
        }
    }

    pub fn side(&self) -> ZoneSide {
        match self {
            GestureDirection::LeftUp
            | GestureDirection::LeftHorizontal
            | GestureDirection::LeftDown => ZoneSide::Left,
            GestureDirection::RightUp
            | GestureDirection::RightHorizontal
            | GestureDirection::RightDown => ZoneSide::Right,
        }
    }
}

impl fmt::Display for GestureDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GestureDirection::LeftUp => "left_up",
            GestureDirection::LeftHorizontal => "left_horizontal",
            GestureDirection::LeftDown => "left_down",
            GestureDirection::RightUp => "right_up",
            GestureDirection::RightHorizontal => "right_horizontal",
            GestureDirection::RightDown => "right_down",
        };
        write!(f, "{}", name)
    }
}

/// Одна точка касания, снятая в начале или конце жеста внутри зоны
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl TouchSample {
    pub fn new(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self { x, y, timestamp_ms }
    }
}

/// Результат классификации пары касаний
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Подпороговый шум или слишком медленное перетаскивание
    Ignore,
    /// Клик по содержимому зоны (малое смещение, короткое время)
    Tap,
    Gesture(GestureDirection),
}
