use crate::error::Result;
use crate::events::OverlaySignal;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::{ForegroundProbe, ForegroundSourceTrait};

/// Эмуляция источника для сухого прогона: по кругу перебирает
/// обычное приложение, игру, рабочий стол и собственный пакет
pub struct DryForegroundSource {
    signal_tx: mpsc::Sender<OverlaySignal>,
}

const FAKE_PACKAGES: [&str; 4] = [
    "org.mozilla.firefox",
    "com.tencent.tmgp.sgame",
    "gnome-shell",
    "gesture-rust",
];

impl DryForegroundSource {
    pub fn new(signal_tx: mpsc::Sender<OverlaySignal>) -> Self {
        Self { signal_tx }
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - ForegroundSource работает в режиме эмуляции");

        let mut package_index = 0;
        let mut interval = interval(Duration::from_secs(10));

        loop {
            interval.tick().await;

            let package = FAKE_PACKAGES[package_index];
            info!("Dry-run: эмулируем смену активного приложения на: {}", package);

            if self
                .signal_tx
                .send(OverlaySignal::ForegroundChanged {
                    package: package.to_string(),
                })
                .await
                .is_err()
            {
                // Канал закрыт - сессия завершена
                return Ok(());
            }

            package_index = (package_index + 1) % FAKE_PACKAGES.len();
        }
    }
}

#[async_trait::async_trait]
impl ForegroundSourceTrait for DryForegroundSource {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}

/// Стартовый запрос в сухом прогоне всегда отвечает обычным приложением
pub struct DryForegroundProbe;

#[async_trait::async_trait]
impl ForegroundProbe for DryForegroundProbe {
    async fn current_package(&self) -> Result<String> {
        Ok(FAKE_PACKAGES[0].to_string())
    }
}
