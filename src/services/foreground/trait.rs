use crate::config::Config;
use crate::error::Result;
use crate::events::OverlaySignal;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Источник событий смены активного приложения
#[async_trait::async_trait]
pub trait ForegroundSourceTrait {
    /// Запустить наблюдение за активным приложением
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Однократный запрос текущего активного приложения. Машина состояний
/// использует его один раз на старте сессии, чтобы не стартовать в
/// заведомо неверном состоянии.
#[async_trait::async_trait]
pub trait ForegroundProbe: Send + Sync {
    async fn current_package(&self) -> Result<String>;
}

/// Фабрика: боевой источник или эмуляция для сухого прогона
pub fn create_foreground_source(
    config: Arc<Config>,
    signal_tx: mpsc::Sender<OverlaySignal>,
    dry_run: bool,
) -> Result<(Box<dyn ForegroundSourceTrait + Send>, Arc<dyn ForegroundProbe>)> {
    if dry_run {
        let source = super::dry_run::DryForegroundSource::new(signal_tx);
        let probe = Arc::new(super::dry_run::DryForegroundProbe);
        Ok((Box::new(source), probe))
    } else {
        let source = super::source::RealForegroundSource::new(config, signal_tx)?;
        let probe = source.probe();
        Ok((Box::new(source), probe))
    }
}
