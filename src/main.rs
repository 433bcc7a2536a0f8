use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use events::OverlaySignal;
use services::game_detect::{DesktopEntryProvider, PrefixGameHeuristic};
use services::session::{RenderSurface, ZoneLayout};
use services::{
    create_foreground_source, create_system_actions, create_touch_listener, ActionDispatcher,
    OverlaySession, OverlayStateMachine, PolicyStore,
};

#[derive(Parser, Debug)]
#[command(name = "gesture-rust")]
#[command(about = "Жестовые зоны у краёв экрана: свайпы, оверлей, системные действия")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "gesture.toml")]
    config: String,

    /// Режим сухого запуска (без реальных устройств и действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (переопределяет конфигурацию)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации до инициализации логирования:
    // уровень и формат берутся оттуда
    let config = Arc::new(Config::load(&args.config)?);

    init_tracing(&config, args.log_level.as_deref())?;

    info!("Запуск Gesture Rust v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    } else {
        // Проверка прав доступа (в сухом режиме устройства не нужны)
        utils::permissions::check_permissions()?;
    }

    // Единственный канал сигналов машины состояний: порядок отправки
    // равен порядку обработки
    let (signal_tx, signal_rx) = mpsc::channel::<OverlaySignal>(64);

    // Инициализация компонентов
    let policy_store = Arc::new(PolicyStore::new(
        (*config).clone(),
        PathBuf::from(&args.config),
        signal_tx.clone(),
    ));

    let layout = ZoneLayout::new(
        config.input.screen_width,
        config.input.screen_height,
        config.zone.width,
        config.zone.height,
    );
    let session = Arc::new(OverlaySession::new(layout, config.zone.show_animation));

    let game_heuristic = Arc::new(PrefixGameHeuristic::new(
        &config.overlay.game_package_prefixes,
        Some(Box::new(DesktopEntryProvider::new())),
    ));

    let system_actions = create_system_actions(&config, args.dry_run)?;
    let dispatcher = Arc::new(ActionDispatcher::new(
        policy_store.clone(),
        system_actions,
    ));

    let (foreground_source, foreground_probe) =
        create_foreground_source(config.clone(), signal_tx.clone(), args.dry_run)?;

    let surface: Arc<dyn RenderSurface> = session.clone();
    let state_machine = OverlayStateMachine::new(
        policy_store.clone(),
        game_heuristic,
        surface,
        signal_rx,
    );

    let touch_listener = create_touch_listener(
        config.clone(),
        session.clone(),
        dispatcher.clone(),
        policy_store.clone(),
        args.dry_run,
    )?;

    // Свой экземпляр отправителя больше не нужен: живут только клоны
    // в PolicyStore и источнике активного приложения
    drop(signal_tx);

    info!("Все компоненты инициализированы");

    // Запуск всех сервисов параллельно
    let machine_handle = tokio::spawn(async move {
        if let Err(e) = state_machine.run(Some(foreground_probe)).await {
            error!("Ошибка в OverlayStateMachine: {}", e);
        }
    });
    let foreground_handle = tokio::spawn(async move {
        if let Err(e) = foreground_source.run().await {
            error!("Ошибка в источнике активного приложения: {}", e);
        }
    });
    let touch_handle = tokio::spawn(async move {
        if let Err(e) = touch_listener.run().await {
            error!("Ошибка в слушателе касаний: {}", e);
        }
    });

    // Перечитывание конфигурации по SIGHUP (внешнее редактирование настроек)
    let reload_store = policy_store.clone();
    tokio::spawn(async move {
        let mut hangup = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Не удалось подписаться на SIGHUP: {}", e);
                return;
            }
        };
        while hangup.recv().await.is_some() {
            if let Err(e) = reload_store.reload() {
                error!("Не удалось перечитать конфигурацию: {}", e);
            }
        }
    });

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Сначала останавливаем производителей событий
    touch_handle.abort();
    foreground_handle.abort();

    // Снимаем зоны с экрана до остановки машины состояний
    session.teardown();
    machine_handle.abort();

    // Ожидаем завершения задач (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = touch_handle.await;
        let _ = foreground_handle.await;
        let _ = machine_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("Gesture Rust завершил работу");
    Ok(())
}

fn init_tracing(config: &Config, cli_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Приоритет: окружение > флаг CLI > конфигурация
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match cli_level {
            Some(level) => EnvFilter::try_new(level)?,
            None => EnvFilter::try_new(&config.logging.filter)
                .or_else(|_| EnvFilter::try_new(&config.logging.level))?,
        },
    };

    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format.as_str() {
        "full" => registry.with(tracing_subscriber::fmt::layer()).init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
    }

    Ok(())
}
