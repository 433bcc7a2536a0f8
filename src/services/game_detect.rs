use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::debug_if_enabled;

/// Известные префиксы издателей игр (регистронезависимое вхождение)
static KNOWN_GAME_PREFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "com.tencent.tmgp", // Tencent Games
        "com.mihoyo",       // miHoYo Games
        "com.netease",      // NetEase Games
        "com.supercell",    // Supercell Games
        "com.activision",   // Activision
        "com.ea.gp",        // EA
        "com.nianticlabs",  // Niantic
        "com.epicgames",    // Epic Games
        "com.gameloft",     // Gameloft
        "com.nintendo",     // Nintendo
        "com.ubisoft",      // Ubisoft
        "unity.wa",         // Некоторые Unity-игры
        "com.unity3d",      // Unity
        "com.mojang",       // Minecraft
        "com.roblox",       // Roblox
        "com.king",         // King (Candy Crush)
        "com.lilith",       // Lilith Games
        "com.mobile.legends", // Mobile Legends
        "com.dts.freefireth", // Free Fire
        "com.igame.atom",
        "com.ngame.allstar",
        "com.vng",
        "com.garena",
        "jp.konami",
        "com.square_enix",
    ]
});

/// Метаданные приложения, относящиеся к эвристике
#[derive(Debug, Clone, Copy, Default)]
pub struct AppMetadata {
    /// Категория приложения помечена как игра
    pub category_game: bool,
    /// Устаревший флаг "is-game"
    pub legacy_game_flag: bool,
}

/// Источник метаданных установленных приложений.
/// Чтение может требовать I/O, поэтому вызывающая сторона кэширует вердикты.
pub trait MetadataProvider: Send + Sync {
    fn metadata(&self, package: &str) -> Option<AppMetadata>;
}

/// Провайдер на основе desktop-файлов: Categories=...Game... и X-Game=true
pub struct DesktopEntryProvider {
    search_dirs: Vec<PathBuf>,
}

impl DesktopEntryProvider {
    pub fn new() -> Self {
        let mut search_dirs = vec![PathBuf::from("/usr/share/applications")];
        if let Ok(home) = std::env::var("HOME") {
            search_dirs.push(PathBuf::from(home).join(".local/share/applications"));
        }
        Self { search_dirs }
    }
}

impl Default for DesktopEntryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider for DesktopEntryProvider {
    fn metadata(&self, package: &str) -> Option<AppMetadata> {
        for dir in &self.search_dirs {
            let path = dir.join(format!("{}.desktop", package));
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(_) => continue,
            };

            let mut meta = AppMetadata::default();
            for line in content.lines() {
                if let Some(categories) = line.strip_prefix("Categories=") {
                    meta.category_game = categories
                        .split(';')
                        .any(|category| category.eq_ignore_ascii_case("Game"));
                } else if let Some(value) = line.strip_prefix("X-Game=") {
                    meta.legacy_game_flag = value.trim().eq_ignore_ascii_case("true");
                }
            }

            debug!("Метаданные {} из {:?}: {:?}", package, path, meta);
            return Some(meta);
        }

        None
    }
}

/// Подключаемый предикат "это игра?". Используется машиной состояний
/// только при включённом игровом режиме.
pub trait GameHeuristic: Send + Sync {
    fn is_game(&self, package: &str) -> bool;
}

/// Эвристика по умолчанию: объединение списка известных префиксов
/// издателей, дополнительных префиксов из конфигурации и метаданных
/// платформы. Ложноотрицательные допустимы, ложноположительные редки.
pub struct PrefixGameHeuristic {
    extra_prefixes_lower: Vec<String>,
    metadata: Option<Box<dyn MetadataProvider>>,
    verdict_cache: DashMap<String, bool>,
}

impl PrefixGameHeuristic {
    pub fn new(
        extra_prefixes: &[String],
        metadata: Option<Box<dyn MetadataProvider>>,
    ) -> Self {
        Self {
            extra_prefixes_lower: extra_prefixes
                .iter()
                .map(|prefix| prefix.to_lowercase())
                .collect(),
            metadata,
            verdict_cache: DashMap::new(),
        }
    }

    fn compute(&self, package: &str) -> bool {
        let package_lower = package.to_lowercase();

        if KNOWN_GAME_PREFIXES
            .iter()
            .any(|prefix| package_lower.contains(prefix))
        {
            return true;
        }

        if self
            .extra_prefixes_lower
            .iter()
            .any(|prefix| package_lower.contains(prefix.as_str()))
        {
            return true;
        }

        // Ошибки чтения метаданных трактуются как "не игра"
        if let Some(provider) = &self.metadata {
            if let Some(meta) = provider.metadata(package) {
                return meta.category_game || meta.legacy_game_flag;
            }
        }

        false
    }
}

impl GameHeuristic for PrefixGameHeuristic {
    fn is_game(&self, package: &str) -> bool {
        if let Some(verdict) = self.verdict_cache.get(package) {
            return *verdict;
        }

        let verdict = self.compute(package);
        debug_if_enabled!("Вердикт игровой эвристики для '{}': {}", package, verdict);
        self.verdict_cache.insert(package.to_string(), verdict);
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubProvider {
        meta: Option<AppMetadata>,
        calls: Arc<AtomicUsize>,
    }

    impl MetadataProvider for StubProvider {
        fn metadata(&self, _package: &str) -> Option<AppMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.meta
        }
    }

    #[test]
    fn test_known_prefix_substring_match() {
        let heuristic = PrefixGameHeuristic::new(&[], None);
        assert!(heuristic.is_game("com.tencent.tmgp.sgame"));
        assert!(heuristic.is_game("COM.TENCENT.TMGP.PUBGMHD"));
        assert!(!heuristic.is_game("org.mozilla.firefox"));
    }

    #[test]
    fn test_extra_prefixes_from_config() {
        let extras = vec!["io.itch".to_string()];
        let heuristic = PrefixGameHeuristic::new(&extras, None);
        assert!(heuristic.is_game("io.itch.somegame"));
        assert!(!heuristic.is_game("io.other.app"));
    }

    #[test]
    fn test_metadata_union() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider {
            meta: Some(AppMetadata {
                category_game: true,
                legacy_game_flag: false,
            }),
            calls: calls.clone(),
        };
        let heuristic = PrefixGameHeuristic::new(&[], Some(Box::new(provider)));

        assert!(heuristic.is_game("org.some.title"));
    }

    #[test]
    fn test_legacy_flag_counts() {
        let provider = StubProvider {
            meta: Some(AppMetadata {
                category_game: false,
                legacy_game_flag: true,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let heuristic = PrefixGameHeuristic::new(&[], Some(Box::new(provider)));
        assert!(heuristic.is_game("org.legacy.title"));
    }

    #[test]
    fn test_verdict_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider {
            meta: None,
            calls: calls.clone(),
        };
        let heuristic = PrefixGameHeuristic::new(&[], Some(Box::new(provider)));

        assert!(!heuristic.is_game("org.plain.app"));
        assert!(!heuristic.is_game("org.plain.app"));
        // Повторный запрос не обращается к метаданным
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_metadata_is_not_a_game() {
        let heuristic = PrefixGameHeuristic::new(&[], None);
        assert!(!heuristic.is_game("org.unknown.app"));
    }
}
