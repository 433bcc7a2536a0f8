pub mod gesture;
pub mod signal;

pub use gesture::{GestureDirection, SwipeAxis, TouchOutcome, TouchSample, ZoneSide};
pub use signal::{OverlayRenderState, OverlaySignal, RenderCommand};
