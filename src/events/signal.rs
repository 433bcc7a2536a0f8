use smallvec::SmallVec;
use std::fmt;

/// Входные сигналы машины состояний оверлея.
/// Доставляются строго по порядку через единственный mpsc-канал.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlaySignal {
    /// Сменилось активное приложение (id пакета / app_id окна)
    ForegroundChanged { package: String },
    /// Настройки изменились; получатель сам перечитывает полный снимок
    PolicyChanged,
    /// Пользователь переключил видимость зон
    UserToggle,
}

impl fmt::Display for OverlaySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlaySignal::ForegroundChanged { package } => {
                write!(f, "foreground_changed({})", package)
            }
            OverlaySignal::PolicyChanged => write!(f, "policy_changed"),
            OverlaySignal::UserToggle => write!(f, "user_toggle"),
        }
    }
}

/// Команды к поверхности отрисовки. Идемпотентны для каждой зоны.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCommand {
    SetTouchEnabled(bool),
    SetDimmed(bool),
    Resize { width: u32, height: u32 },
}

impl fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderCommand::SetTouchEnabled(on) => write!(f, "set_touch_enabled({})", on),
            RenderCommand::SetDimmed(on) => write!(f, "set_dimmed({})", on),
            RenderCommand::Resize { width, height } => write!(f, "resize({}x{})", width, height),
        }
    }
}

/// Внешне наблюдаемое обязательство машины состояний.
///
/// Две независимые оси видимости: `touch_enabled = false` полностью
/// отключает доставку касаний в зоны; `visually_dimmed = true` оставляет
/// касания включёнными, но рисует зону почти невидимой. Оси нельзя
/// сворачивать в один флаг.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayRenderState {
    pub touch_enabled: bool,
    pub visually_dimmed: bool,
    pub zone_width: u32,
    pub zone_height: u32,
}

impl OverlayRenderState {
    /// Состояние при завершении сессии: зоны полностью убраны
    pub fn disabled() -> Self {
        Self {
            touch_enabled: false,
            visually_dimmed: true,
            zone_width: 0,
            zone_height: 0,
        }
    }

    /// Минимальный набор команд для перехода от `self` к `next`.
    /// Повтор того же состояния даёт пустой набор - это гасит мерцание
    /// от переизлучения неизменившихся команд.
    pub fn diff(&self, next: &OverlayRenderState) -> SmallVec<[RenderCommand; 3]> {
        let mut commands = SmallVec::new();

        if self.zone_width != next.zone_width || self.zone_height != next.zone_height {
            commands.push(RenderCommand::Resize {
                width: next.zone_width,
                height: next.zone_height,
            });
        }
        if self.touch_enabled != next.touch_enabled {
            commands.push(RenderCommand::SetTouchEnabled(next.touch_enabled));
        }
        if self.visually_dimmed != next.visually_dimmed {
            commands.push(RenderCommand::SetDimmed(next.visually_dimmed));
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(width: u32, height: u32) -> OverlayRenderState {
        OverlayRenderState {
            touch_enabled: true,
            visually_dimmed: false,
            zone_width: width,
            zone_height: height,
        }
    }

    #[test]
    fn test_diff_identical_states_is_empty() {
        let state = active(200, 150);
        assert!(state.diff(&state).is_empty());
    }

    #[test]
    fn test_diff_resize_only() {
        let before = active(200, 150);
        let after = active(250, 150);

        let commands = before.diff(&after);
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0],
            RenderCommand::Resize {
                width: 250,
                height: 150
            }
        );
    }

    #[test]
    fn test_diff_touch_and_dim_changed() {
        let before = active(200, 150);
        let after = OverlayRenderState {
            touch_enabled: false,
            visually_dimmed: true,
            zone_width: 200,
            zone_height: 150,
        };

        let commands = before.diff(&after);
        assert_eq!(commands.len(), 2);
        assert!(commands.contains(&RenderCommand::SetTouchEnabled(false)));
        assert!(commands.contains(&RenderCommand::SetDimmed(true)));
    }

    #[test]
    fn test_disabled_state_blocks_touch() {
        let state = OverlayRenderState::disabled();
        assert!(!state.touch_enabled);
        assert!(state.visually_dimmed);
    }
}
