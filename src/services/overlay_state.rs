use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::OverlayPolicy;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{OverlayRenderState, OverlaySignal, ZoneSide};
use crate::services::foreground::ForegroundProbe;
use crate::services::game_detect::GameHeuristic;
use crate::services::policy_store::PolicyStore;
use crate::services::session::RenderSurface;

/// Четыре взаимоисключающих состояния оверлея.
/// Вычисляются строго в порядке приоритета:
/// Suppressed > UserHidden > Dimmed > Active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayMode {
    /// Активно своё приложение, заблокированный пакет или игра при
    /// включённом игровом режиме: касания полностью отключены
    Suppressed,
    /// Пользователь скрыл зоны: касания работают, зона почти невидима
    UserHidden,
    /// Активен рабочий стол: касания работают, зона затемнена
    Dimmed,
    Active,
}

/// Детерминированное отображение (активное приложение, политика) -> режим
pub fn evaluate(
    foreground: Option<&str>,
    policy: &OverlayPolicy,
    game: &dyn GameHeuristic,
) -> OverlayMode {
    if let Some(package) = foreground {
        if policy.is_own(package)
            || policy.is_blocked(package)
            || (policy.game_mode_enabled && game.is_game(package))
        {
            return OverlayMode::Suppressed;
        }
    }

    if !policy.user_visible {
        return OverlayMode::UserHidden;
    }

    if let Some(package) = foreground {
        if policy.is_home(package) {
            return OverlayMode::Dimmed;
        }
    }

    OverlayMode::Active
}

impl OverlayMode {
    pub fn render_state(&self, policy: &OverlayPolicy) -> OverlayRenderState {
        let (touch_enabled, visually_dimmed) = match self {
            OverlayMode::Suppressed => (false, true),
            OverlayMode::UserHidden | OverlayMode::Dimmed => (true, true),
            OverlayMode::Active => (true, false),
        };

        OverlayRenderState {
            touch_enabled,
            visually_dimmed,
            zone_width: policy.zone_width,
            zone_height: policy.zone_height,
        }
    }
}

/// Машина состояний оверлея.
///
/// Единственный потребитель канала сигналов: каждый сигнал обрабатывается
/// до конца (пересчёт + команды) прежде, чем будет взят следующий. Это
/// инвариант, который не даёт быстрой паре "смена окна + смена настроек"
/// показать пользователю промежуточное неверное состояние.
pub struct OverlayStateMachine {
    policy_store: Arc<PolicyStore>,
    game: Arc<dyn GameHeuristic>,
    surface: Arc<dyn RenderSurface>,
    signal_rx: mpsc::Receiver<OverlaySignal>,
    /// Единственный владелец сведений об активном приложении;
    /// обновляется только из сигналов, никогда не опрашивается
    foreground: Option<String>,
    /// Текущее внешне наблюдаемое обязательство
    committed: OverlayRenderState,
}

impl OverlayStateMachine {
    pub fn new(
        policy_store: Arc<PolicyStore>,
        game: Arc<dyn GameHeuristic>,
        surface: Arc<dyn RenderSurface>,
        signal_rx: mpsc::Receiver<OverlaySignal>,
    ) -> Self {
        Self {
            policy_store,
            game,
            surface,
            signal_rx,
            foreground: None,
            committed: OverlayRenderState::disabled(),
        }
    }

    /// Главный цикл. `probe` опрашивается один раз до первого сигнала,
    /// чтобы оверлей стартовал сразу в правильном состоянии, а не мигал
    /// из Active.
    pub async fn run(mut self, probe: Option<Arc<dyn ForegroundProbe>>) -> Result<()> {
        if let Some(probe) = probe {
            match probe.current_package().await {
                Ok(package) if !package.trim().is_empty() => {
                    info!("Начальное активное приложение: {}", package);
                    self.foreground = Some(package);
                }
                Ok(_) => warn!("Начальный запрос вернул пустой пакет"),
                Err(e) => warn!("Не удалось запросить начальное приложение: {}", e),
            }
        }
        self.recompute_and_apply("initial");

        while let Some(signal) = self.signal_rx.recv().await {
            self.handle_signal(signal);
        }

        // Канал закрыт: сессия завершается, зоны принудительно убираются
        info!("Канал сигналов закрыт, оверлей снимается");
        self.apply_commands(OverlayRenderState::disabled());
        Ok(())
    }

    /// Обработка одного сигнала. Выполняется до конца, без чередования
    /// с другими сигналами.
    pub fn handle_signal(&mut self, signal: OverlaySignal) {
        debug_if_enabled!("Сигнал оверлея: {}", signal);

        match signal {
            OverlaySignal::ForegroundChanged { package } => {
                // Пустой пакет - повреждённое событие: игнорируем,
                // состояние сохраняется
                if package.trim().is_empty() {
                    warn!("Пустой id пакета в событии смены окна, игнорируем");
                    return;
                }
                self.foreground = Some(package);
                self.recompute_and_apply("foreground_changed");
            }
            OverlaySignal::PolicyChanged => {
                self.recompute_and_apply("policy_changed");
            }
            OverlaySignal::UserToggle => {
                self.recompute_and_apply("user_toggle");
            }
        }
    }

    /// Полный пересчёт из текущих foreground + свежего снимка политики
    /// и выпуск только изменившихся команд
    fn recompute_and_apply(&mut self, trigger: &str) {
        let policy = self.policy_store.snapshot();
        let mode = evaluate(self.foreground.as_deref(), &policy, self.game.as_ref());
        let next = mode.render_state(&policy);

        if self.committed == next {
            debug_if_enabled!("Пересчёт ({}): состояние не изменилось", trigger);
            return;
        }

        info!(
            "Пересчёт ({}): {:?}, foreground={}",
            trigger,
            mode,
            self.foreground.as_deref().unwrap_or("<unknown>")
        );
        self.apply_commands(next);
    }

    fn apply_commands(&mut self, next: OverlayRenderState) {
        let commands = self.committed.diff(&next);

        for command in &commands {
            for zone in ZoneSide::BOTH {
                if let Err(e) = self.surface.apply(zone, command) {
                    // Отказ поверхности логируется и не искажает
                    // внутренний учёт состояния
                    warn!("Команда {} для зоны {} не применена: {}", command, zone, e);
                }
            }
        }

        self.committed = next;
    }

    #[cfg(test)]
    pub fn committed_state(&self) -> OverlayRenderState {
        self.committed
    }
}
