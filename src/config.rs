//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--remote-url`, `--no-watcher`)
//! 2. `$HANGAR_CONFIG` environment variable (path to config file)
//! 3. Project-local `.hangar.toml` in the current working directory
//! 4. Global `~/.config/hangar/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::browser::filter::DEFAULT_MAX_DEPTH;
use crate::browser::node::ExclusionRules;
use crate::browser::watcher::DEFAULT_DEBOUNCE_MS;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Extra local roots shown alongside the project root.
    pub extra_roots: Option<Vec<String>>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Command files are handed to on activation (platform opener when
    /// unset).
    pub open_command: Option<String>,
}

/// Exclusion rules applied when listing local directories.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExclusionsConfig {
    /// Directory names hidden regardless of location (case-insensitive).
    pub artifact_dirs: Option<Vec<String>>,
    /// File-name substring marking generated assets.
    pub generated_marker: Option<String>,
    /// File-name suffix for sidecar metadata.
    pub meta_suffix: Option<String>,
    /// Suffix of compiled twins hidden when the source file is present.
    pub compiled_suffix: Option<String>,
}

/// Search settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Recursion bound for filter scans.
    pub max_depth: Option<usize>,
}

/// One remote category shown in the cloud panel.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub tag: String,
    pub label: String,
}

/// Remote package service settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the package service.
    pub url: Option<String>,
    /// Packages fetched per load-more page.
    pub page_size: Option<usize>,
    /// Categories listed in the cloud panel.
    pub categories: Option<Vec<CategoryConfig>>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Enable filesystem watcher for auto-refresh.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark" or "light".
    pub scheme: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub exclusions: ExclusionsConfig,
    pub search: SearchConfig,
    pub remote: RemoteConfig,
    pub watcher: WatcherConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_REMOTE_URL: &str = "http://localhost:8700";
pub const DEFAULT_PAGE_SIZE: usize = 20;

fn default_categories() -> Vec<CategoryConfig> {
    [
        ("model", "Models"),
        ("material", "Materials"),
        ("sound", "Sounds"),
    ]
    .iter()
    .map(|(tag, label)| CategoryConfig {
        tag: tag.to_string(),
        label: label.to_string(),
    })
    .collect()
}

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path — that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("HANGAR_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".hangar.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("hangar").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                extra_roots: other
                    .general
                    .extra_roots
                    .clone()
                    .or(self.general.extra_roots),
                mouse: other.general.mouse.or(self.general.mouse),
                open_command: other
                    .general
                    .open_command
                    .clone()
                    .or(self.general.open_command),
            },
            exclusions: ExclusionsConfig {
                artifact_dirs: other
                    .exclusions
                    .artifact_dirs
                    .clone()
                    .or(self.exclusions.artifact_dirs),
                generated_marker: other
                    .exclusions
                    .generated_marker
                    .clone()
                    .or(self.exclusions.generated_marker),
                meta_suffix: other
                    .exclusions
                    .meta_suffix
                    .clone()
                    .or(self.exclusions.meta_suffix),
                compiled_suffix: other
                    .exclusions
                    .compiled_suffix
                    .clone()
                    .or(self.exclusions.compiled_suffix),
            },
            search: SearchConfig {
                max_depth: other.search.max_depth.or(self.search.max_depth),
            },
            remote: RemoteConfig {
                url: other.remote.url.clone().or(self.remote.url),
                page_size: other.remote.page_size.or(self.remote.page_size),
                categories: other.remote.categories.clone().or(self.remote.categories),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk candidates in reverse so that highest-priority overwrites lower.
        let paths = candidate_paths();
        for path in paths.iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Extra local roots beyond the project root.
    pub fn extra_roots(&self) -> Vec<PathBuf> {
        self.general
            .extra_roots
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(PathBuf::from)
            .collect()
    }

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    /// Configured file opener, when one is set.
    pub fn open_command(&self) -> Option<&str> {
        self.general.open_command.as_deref()
    }

    /// Exclusion rules assembled from the `[exclusions]` section.
    pub fn rules(&self) -> ExclusionRules {
        let defaults = ExclusionRules::default();
        ExclusionRules {
            artifact_dirs: self
                .exclusions
                .artifact_dirs
                .clone()
                .unwrap_or(defaults.artifact_dirs),
            generated_marker: self
                .exclusions
                .generated_marker
                .clone()
                .unwrap_or(defaults.generated_marker),
            meta_suffix: self
                .exclusions
                .meta_suffix
                .clone()
                .unwrap_or(defaults.meta_suffix),
            compiled_suffix: self
                .exclusions
                .compiled_suffix
                .clone()
                .unwrap_or(defaults.compiled_suffix),
        }
    }

    /// Recursion bound for filter scans.
    pub fn search_max_depth(&self) -> usize {
        self.search.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    /// Base URL of the package service.
    pub fn remote_url(&self) -> &str {
        self.remote.url.as_deref().unwrap_or(DEFAULT_REMOTE_URL)
    }

    /// Packages fetched per load-more page.
    pub fn page_size(&self) -> usize {
        self.remote.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Categories listed in the cloud panel.
    pub fn categories(&self) -> Vec<CategoryConfig> {
        self.remote
            .categories
            .clone()
            .unwrap_or_else(default_categories)
    }

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Watcher debounce interval in milliseconds.
    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Theme scheme: "dark" or "light".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
