//! Источник сигналов об активном приложении: зона ответственности
//!
//! Этот модуль и его подмодули отвечают ТОЛЬКО за определение активного
//! приложения (app_id / класс окна) и отправку `ForegroundChanged` в канал
//! машины состояний, строго в порядке обнаружения. Здесь НЕ ДОЛЖНО быть
//! логики видимости, блокировок или игрового режима - все решения о
//! состоянии оверлея принимает исключительно OverlayStateMachine.

mod dry_run;
mod source;
mod sway;
mod xdotool;
mod r#trait;

pub use self::r#trait::{create_foreground_source, ForegroundProbe, ForegroundSourceTrait};
