use std::collections::HashSet;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::gesture_error;
use crate::services::input_injector::{InputInjector, KEY_BACK};

/// Четыре системные операции, доступные действиям жестов.
/// Каждая независимо может отказать; все вызываются в режиме
/// "запустил и забыл" относительно обработчика жеста.
#[async_trait::async_trait]
pub trait SystemActions: Send + Sync {
    async fn request_back(&self) -> Result<()>;
    async fn request_screenshot(&self) -> Result<()>;
    async fn request_launch(&self, package: &str) -> Result<()>;
    async fn request_cleanup(&self, excluding: &str) -> Result<()>;
}

/// Фабрика: боевая реализация или сухой прогон
pub fn create_system_actions(config: &Config, dry_run: bool) -> Result<Arc<dyn SystemActions>> {
    if dry_run {
        Ok(Arc::new(DrySystemActions))
    } else {
        Ok(Arc::new(RealSystemActions::new(config, dry_run)?))
    }
}

pub struct RealSystemActions {
    injector: InputInjector,
    screenshot_command: String,
    launch_command: String,
    cleanup_packages: Vec<String>,
    system_packages_lower: HashSet<String>,
}

impl RealSystemActions {
    pub fn new(config: &Config, dry_run: bool) -> Result<Self> {
        Ok(Self {
            injector: InputInjector::new("gesture-rust Back Injector", dry_run)?,
            screenshot_command: config.actions.screenshot_command.clone(),
            launch_command: config.actions.launch_command.clone(),
            cleanup_packages: config.actions.cleanup_packages.clone(),
            system_packages_lower: config
                .actions
                .system_packages
                .iter()
                .map(|package| package.to_lowercase())
                .collect(),
        })
    }

    fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
        Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| {
                gesture_error!(
                    service_unavailable,
                    "Не удалось запустить '{}': {}. Проверьте, что утилита установлена",
                    program,
                    e
                )
            })
    }
}

/// Пакеты, которые остановит очистка: без собственного приложения
/// и без системных
pub fn cleanup_targets<'a>(
    candidates: &'a [String],
    excluding: &str,
    system_lower: &HashSet<String>,
) -> Vec<&'a String> {
    candidates
        .iter()
        .filter(|package| !package.eq_ignore_ascii_case(excluding))
        .filter(|package| !system_lower.contains(&package.to_lowercase()))
        .collect()
}

#[async_trait::async_trait]
impl SystemActions for RealSystemActions {
    async fn request_back(&self) -> Result<()> {
        self.injector.tap_key(KEY_BACK)
    }

    async fn request_screenshot(&self) -> Result<()> {
        info!("Запрос скриншота через '{}'", self.screenshot_command);
        Self::spawn_detached(&self.screenshot_command, &[])
    }

    async fn request_launch(&self, package: &str) -> Result<()> {
        info!("Запуск приложения '{}'", package);
        Self::spawn_detached(&self.launch_command, &[package]).map_err(|e| {
            gesture_error!(resolution, "Приложение '{}' не запущено: {}", package, e)
        })
    }

    async fn request_cleanup(&self, excluding: &str) -> Result<()> {
        let targets = cleanup_targets(&self.cleanup_packages, excluding, &self.system_packages_lower);

        if targets.is_empty() {
            info!("Очистка фона: нет целей для остановки");
            return Ok(());
        }

        let mut stopped = 0usize;
        for package in &targets {
            match Self::spawn_detached("pkill", &["-f", package.as_str()]) {
                Ok(()) => stopped += 1,
                Err(e) => warn!("Не удалось остановить '{}': {}", package, e),
            }
        }

        info!("Очистка фона завершена: {} из {} целей", stopped, targets.len());
        Ok(())
    }
}

/// Сухой прогон: только логирование, без реальных действий
pub struct DrySystemActions;

#[async_trait::async_trait]
impl SystemActions for DrySystemActions {
    async fn request_back(&self) -> Result<()> {
        info!("[DRY RUN] Глобальное действие 'назад'");
        Ok(())
    }

    async fn request_screenshot(&self) -> Result<()> {
        info!("[DRY RUN] Запрос скриншота");
        Ok(())
    }

    async fn request_launch(&self, package: &str) -> Result<()> {
        info!("[DRY RUN] Запуск приложения '{}'", package);
        Ok(())
    }

    async fn request_cleanup(&self, excluding: &str) -> Result<()> {
        info!("[DRY RUN] Очистка фона (кроме '{}')", excluding);
        Ok(())
    }
}
