use crate::config::Config;
use crate::error::{GestureError, Result};
use crate::events::OverlaySignal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};
use zbus::Connection;

use super::r#trait::{ForegroundProbe, ForegroundSourceTrait};
use super::sway::SwayProbe;
use super::xdotool::XdotoolProbe;

#[derive(Debug, Clone)]
enum SessionEnvironment {
    Sway,
    Gnome,
    X11Generic,
    Unknown,
}

#[derive(Debug, Clone)]
enum WorkingMethod {
    Sway,
    Xdotool,
}

/// Боевой источник: опрашивает композитор и отправляет смены активного
/// приложения в канал машины состояний в порядке обнаружения.
pub struct RealForegroundSource {
    config: Arc<Config>,
    signal_tx: mpsc::Sender<OverlaySignal>,
    environment: SessionEnvironment,
    last_package: Option<String>,
    dbus_connection: Option<Connection>,
    working_method: Option<WorkingMethod>,
    probes: Arc<ProbeSet>,
}

/// Набор методов опроса; как однократный probe используется машиной
/// состояний для стартового запроса
pub struct ProbeSet {
    sway: SwayProbe,
    xdotool: XdotoolProbe,
}

#[async_trait::async_trait]
impl ForegroundProbe for ProbeSet {
    async fn current_package(&self) -> Result<String> {
        if let Ok(package) = self.sway.get_active_package().await {
            return Ok(package);
        }
        self.xdotool.get_active_package().await
    }
}

impl RealForegroundSource {
    pub fn new(config: Arc<Config>, signal_tx: mpsc::Sender<OverlaySignal>) -> Result<Self> {
        info!("Инициализация RealForegroundSource");

        let environment = match config.foreground.detection_mode.as_str() {
            "sway" => SessionEnvironment::Sway,
            "xdotool" => SessionEnvironment::X11Generic,
            _ => Self::detect_session_environment(),
        };
        info!("Окружение сессии: {:?}", environment);

        Ok(Self {
            config,
            signal_tx,
            environment,
            last_package: None,
            dbus_connection: None,
            working_method: None,
            probes: Arc::new(ProbeSet {
                sway: SwayProbe::new(),
                xdotool: XdotoolProbe::new(),
            }),
        })
    }

    pub fn probe(&self) -> Arc<dyn ForegroundProbe> {
        self.probes.clone()
    }

    fn detect_session_environment() -> SessionEnvironment {
        if std::env::var("SWAYSOCK").is_ok() {
            return SessionEnvironment::Sway;
        }

        if let Ok(desktop) = std::env::var("XDG_CURRENT_DESKTOP") {
            let desktop = desktop.to_lowercase();
            if desktop.contains("gnome") {
                return SessionEnvironment::Gnome;
            }
            if desktop.contains("sway") {
                return SessionEnvironment::Sway;
            }
        }

        if let Ok(session) = std::env::var("XDG_SESSION_TYPE") {
            match session.as_str() {
                "x11" => return SessionEnvironment::X11Generic,
                "wayland" => return SessionEnvironment::Sway,
                _ => {}
            }
        }

        SessionEnvironment::Unknown
    }

    async fn run_impl(mut self) -> Result<()> {
        info!("RealForegroundSource запущен для окружения: {:?}", self.environment);

        // В GNOME сначала убеждаемся, что сессионная шина доступна:
        // без неё опрос утилит почти наверняка тоже не работает
        if matches!(self.environment, SessionEnvironment::Gnome) {
            match Connection::session().await {
                Ok(connection) => {
                    debug!("Сессионная шина D-Bus доступна");
                    self.dbus_connection = Some(connection);
                }
                Err(e) => warn!("Сессионная шина D-Bus недоступна: {}", e),
            }
        }

        let mut interval = interval(Duration::from_millis(
            self.config.foreground.polling_interval_ms,
        ));

        loop {
            interval.tick().await;

            let working_method = match &self.working_method {
                Some(method) => method.clone(),
                None => match self.detect_working_method().await {
                    Ok(method) => {
                        self.working_method = Some(method.clone());
                        method
                    }
                    Err(_) => {
                        error!("Ни один метод детекции не работает. Пауза 10 секунд");
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        continue;
                    }
                },
            };

            match self.get_package_by_method(&working_method).await {
                Ok(package) => {
                    if let Err(e) = self.maybe_send(package).await {
                        error!("Канал сигналов закрыт: {}", e);
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!(
                        "Рабочий метод {:?} перестал работать: {}. Переопределяем...",
                        working_method, e
                    );
                    self.working_method = None;
                }
            }
        }
    }

    async fn detect_working_method(&self) -> Result<WorkingMethod> {
        info!("Определяем рабочий метод детекции активного приложения...");

        if self.probes.sway.test().await.is_ok() {
            info!("Используем swaymsg");
            return Ok(WorkingMethod::Sway);
        }

        if self.probes.xdotool.test().await.is_ok() {
            info!("Используем xdotool");
            return Ok(WorkingMethod::Xdotool);
        }

        Err(GestureError::Internal(
            "Ни один метод детекции активного приложения не работает".to_string(),
        ))
    }

    async fn get_package_by_method(&self, method: &WorkingMethod) -> Result<String> {
        match method {
            WorkingMethod::Sway => self.probes.sway.get_active_package().await,
            WorkingMethod::Xdotool => self.probes.xdotool.get_active_package().await,
        }
    }

    /// Отправляет событие только при реальной смене пакета.
    /// Пустые значения отбрасываются здесь же, не доходя до машины.
    async fn maybe_send(&mut self, package: String) -> Result<()> {
        if package.trim().is_empty() {
            debug!("Пустой пакет от метода детекции, пропускаем");
            return Ok(());
        }

        if self.last_package.as_deref() == Some(package.as_str()) {
            return Ok(());
        }

        info!(
            "Смена активного приложения: {} -> {}",
            self.last_package.as_deref().unwrap_or("<none>"),
            package
        );

        self.signal_tx
            .send(OverlaySignal::ForegroundChanged {
                package: package.clone(),
            })
            .await
            .map_err(|e| GestureError::Internal(format!("Ошибка отправки сигнала: {}", e)))?;

        self.last_package = Some(package);
        Ok(())
    }
}

impl Drop for RealForegroundSource {
    fn drop(&mut self) {
        info!("RealForegroundSource завершает работу");
    }
}

#[async_trait::async_trait]
impl ForegroundSourceTrait for RealForegroundSource {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
