//! Configuration loading for sitetrack.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.sitetrack/config.toml`)
//! 3. User config (`~/.sitetrack/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. A tracker built from the defaults reports
//! under page `"page"` and site `"site"` with no watchers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackError};

/// Name of the per-project and per-user config directory.
pub const CONFIG_DIR: &str = ".sitetrack";

/// Main configuration struct for sitetrack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Tracker naming and built-in watchers.
    pub tracker: TrackerConfig,
    /// Analytics backend detection.
    pub backends: BackendsConfig,
    /// Watch declarations registered at construction.
    pub watch: Vec<WatchConfig>,
}

/// Tracker naming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Page name reported by the tracker.
    pub page_name: String,
    /// Site name reported by the tracker.
    pub site_name: String,
    /// Whether to register the `.js-track` click watcher.
    pub track_links: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            page_name: "page".to_string(),
            site_name: "site".to_string(),
            track_links: false,
        }
    }
}

/// Analytics backend detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendsConfig {
    /// Ordered list of backends to probe.
    pub discovery: Vec<String>,
    /// Per-backend enable/disable overrides.
    pub overrides: HashMap<String, bool>,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            discovery: vec!["ga".to_string(), "gaq".to_string()],
            overrides: HashMap::new(),
        }
    }
}

/// A watch declaration: which events to watch and how to turn them into
/// event data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    /// DOM event type, e.g. `click`.
    pub event: String,
    /// Delegation selector.
    pub selector: String,
    /// How event data is extracted.
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl WatchConfig {
    /// Create a watch declaration.
    pub fn new(
        event: impl Into<String>,
        selector: impl Into<String>,
        extractor: ExtractorConfig,
    ) -> Self {
        Self {
            event: event.into(),
            selector: selector.into(),
            extractor,
        }
    }
}

/// Extractors that can be declared in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractorConfig {
    /// Read `data-*` attributes from the event target.
    #[default]
    Dataset,
    /// Report fixed values; unset fields fall back to the defaults.
    Fixed {
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        action: Option<String>,
        #[serde(default)]
        label: Option<String>,
    },
    /// Report the event type as action and the cleaned id (or tag) of the
    /// matched element as label.
    Element {
        #[serde(default)]
        category: Option<String>,
    },
}

impl Config {
    /// Load configuration with full precedence chain from the current directory.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.sitetrack/config.toml`.
    fn load_user_config() -> Option<Config> {
        let path = sitetrack_home()?.join("config.toml");
        Self::load_if_present(&path)
    }

    /// Load project config from the nearest `.sitetrack/config.toml`.
    ///
    /// The walk up from `cwd` can reach the user directory itself; that file
    /// is already the user layer and is not loaded a second time.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let dir = project_config_dir(cwd);
        if sitetrack_home().is_some_and(|home| same_dir(&home, &dir)) {
            tracing::debug!(dir = %dir.display(), "project config dir is the user config dir");
            return None;
        }
        Self::load_if_present(&dir.join("config.toml"))
    }

    fn load_if_present(path: &Path) -> Option<Config> {
        if !path.is_file() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| TrackError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| TrackError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("SITETRACK_PAGE_NAME") {
            self.tracker.page_name = val;
        }

        if let Ok(val) = env::var("SITETRACK_SITE_NAME") {
            self.tracker.site_name = val;
        }

        if let Ok(val) = env::var("SITETRACK_TRACK_LINKS") {
            self.tracker.track_links = val == "true" || val == "1";
        }

        if let Ok(val) = env::var("SITETRACK_BACKENDS") {
            let discovery: Vec<String> = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if discovery.is_empty() {
                eprintln!(
                    "Warning: Invalid SITETRACK_BACKENDS value '{}'. \
                    Expected a comma-separated list. Using {:?}.",
                    val, self.backends.discovery
                );
            } else {
                self.backends.discovery = discovery;
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// Non-default fields from `other` win. Backend overrides merge
    /// additively, and watch declarations from `other` are appended after
    /// the ones already present.
    fn merge(mut self, other: Config) -> Self {
        let default_tracker = TrackerConfig::default();
        if other.tracker.page_name != default_tracker.page_name {
            self.tracker.page_name = other.tracker.page_name;
        }
        if other.tracker.site_name != default_tracker.site_name {
            self.tracker.site_name = other.tracker.site_name;
        }
        if other.tracker.track_links != default_tracker.track_links {
            self.tracker.track_links = other.tracker.track_links;
        }

        if other.backends.discovery != BackendsConfig::default().discovery {
            self.backends.discovery = other.backends.discovery;
        }
        for (k, v) in other.backends.overrides {
            self.backends.overrides.insert(k, v);
        }

        self.watch.extend(other.watch);

        self
    }
}

/// Get the sitetrack home directory.
///
/// `SITETRACK_HOME` wins when set and non-empty; otherwise `~/.sitetrack`.
pub fn sitetrack_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("SITETRACK_HOME") {
        if home.is_empty() {
            tracing::warn!("SITETRACK_HOME is empty, using default");
        } else {
            return Some(PathBuf::from(home));
        }
    }

    dirs::home_dir().map(|home| home.join(CONFIG_DIR))
}

/// Get the project config directory for a working directory.
///
/// Walks up from `cwd` to the nearest ancestor holding a `.sitetrack/`
/// directory, falling back to `cwd/.sitetrack`.
pub fn project_config_dir(cwd: &Path) -> PathBuf {
    cwd.ancestors()
        .map(|ancestor| ancestor.join(CONFIG_DIR))
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| cwd.join(CONFIG_DIR))
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write_project_config(dir: &Path, content: &str) {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.tracker.page_name, "page");
        assert_eq!(config.tracker.site_name, "site");
        assert!(!config.tracker.track_links);
        assert_eq!(config.backends.discovery, vec!["ga", "gaq"]);
        assert!(config.backends.overrides.is_empty());
        assert!(config.watch.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[tracker]
page_name = "docs"
track_links = true

[backends]
discovery = ["gaq"]

[[watch]]
event = "submit"
selector = "form.newsletter"
extractor = { kind = "fixed", category = "newsletter", action = "subscribe" }

[[watch]]
event = "click"
selector = "nav a"
"#;
        fs::write(&path, toml_content).unwrap();

        let config = Config::load_from_file(&path).unwrap();

        assert_eq!(config.tracker.page_name, "docs");
        assert_eq!(config.tracker.site_name, "site");
        assert!(config.tracker.track_links);
        assert_eq!(config.backends.discovery, vec!["gaq"]);
        assert_eq!(config.watch.len(), 2);
        assert_eq!(
            config.watch[0].extractor,
            ExtractorConfig::Fixed {
                category: Some("newsletter".to_string()),
                action: Some("subscribe".to_string()),
                label: None,
            }
        );
        assert_eq!(config.watch[1].extractor, ExtractorConfig::Dataset);
    }

    #[test]
    fn test_element_extractor_parsing() {
        let config: Config = toml::from_str(
            r#"
[[watch]]
event = "click"
selector = "button"
extractor = { kind = "element", category = "cta" }
"#,
        )
        .unwrap();

        assert_eq!(
            config.watch[0].extractor,
            ExtractorConfig::Element {
                category: Some("cta".to_string())
            }
        );
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(TrackError::Storage { .. })));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&path);
        assert!(matches!(result, Err(TrackError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        let home = TempDir::new().unwrap();
        env::set_var("SITETRACK_HOME", home.path());
        fs::write(
            home.path().join("config.toml"),
            "[tracker]\nsite_name = \"user-site\"\npage_name = \"user-page\"\n",
        )
        .unwrap();

        let dir = TempDir::new().unwrap();
        write_project_config(dir.path(), "[tracker]\npage_name = \"project-page\"\n");

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.tracker.page_name, "project-page");
        assert_eq!(config.tracker.site_name, "user-site");

        env::remove_var("SITETRACK_HOME");
    }

    #[test]
    #[serial]
    fn test_project_config_found_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        write_project_config(dir.path(), "[tracker]\nsite_name = \"nested\"\n");
        let sub = dir.path().join("site").join("docs");
        fs::create_dir_all(&sub).unwrap();

        assert_eq!(project_config_dir(&sub), dir.path().join(CONFIG_DIR));
        assert_eq!(Config::load_from_cwd(&sub).tracker.site_name, "nested");
    }

    #[test]
    #[serial]
    fn test_user_dir_above_cwd_loaded_once() {
        let root = TempDir::new().unwrap();
        let user_dir = root.path().join(CONFIG_DIR);
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(
            user_dir.join("config.toml"),
            "[[watch]]\nevent = \"click\"\nselector = \"a.cta\"\n",
        )
        .unwrap();
        env::set_var("SITETRACK_HOME", &user_dir);

        let cwd = root.path().join("projects").join("site");
        fs::create_dir_all(&cwd).unwrap();

        let config = Config::load_from_cwd(&cwd);
        assert_eq!(config.watch.len(), 1);
        assert_eq!(config.watch[0].selector, "a.cta");

        env::remove_var("SITETRACK_HOME");
    }

    #[test]
    #[serial]
    fn test_project_dir_below_user_dir_still_loads() {
        let root = TempDir::new().unwrap();
        let user_dir = root.path().join(CONFIG_DIR);
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(user_dir.join("config.toml"), "[tracker]\nsite_name = \"user-site\"\n").unwrap();
        env::set_var("SITETRACK_HOME", &user_dir);

        let project = root.path().join("projects").join("site");
        write_project_config(&project, "[tracker]\npage_name = \"project-page\"\n");

        let config = Config::load_from_cwd(&project);
        assert_eq!(config.tracker.site_name, "user-site");
        assert_eq!(config.tracker.page_name, "project-page");

        env::remove_var("SITETRACK_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        let dir = TempDir::new().unwrap();
        write_project_config(dir.path(), "[tracker]\npage_name = \"project-page\"\n");

        env::set_var("SITETRACK_PAGE_NAME", "env-page");
        env::set_var("SITETRACK_TRACK_LINKS", "1");
        env::set_var("SITETRACK_BACKENDS", "gaq, ga");

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.tracker.page_name, "env-page");
        assert!(config.tracker.track_links);
        assert_eq!(config.backends.discovery, vec!["gaq", "ga"]);

        env::remove_var("SITETRACK_PAGE_NAME");
        env::remove_var("SITETRACK_TRACK_LINKS");
        env::remove_var("SITETRACK_BACKENDS");
    }

    #[test]
    #[serial]
    fn test_env_var_empty_backends_ignored() {
        let dir = TempDir::new().unwrap();
        env::set_var("SITETRACK_BACKENDS", " , ");

        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config.backends.discovery, vec!["ga", "gaq"]);

        env::remove_var("SITETRACK_BACKENDS");
    }

    #[test]
    #[serial]
    fn test_invalid_project_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        write_project_config(dir.path(), "not = [valid");

        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_merge_configs() {
        let mut base = Config::default();
        base.backends.overrides.insert("ga".to_string(), true);
        base.watch.push(WatchConfig::new("click", "a", ExtractorConfig::Dataset));

        let mut other = Config::default();
        other.tracker.site_name = "boba".to_string();
        other.backends.overrides.insert("ga".to_string(), false);
        other.watch.push(WatchConfig::new(
            "submit",
            "form",
            ExtractorConfig::Dataset,
        ));

        let merged = base.merge(other);

        assert_eq!(merged.tracker.site_name, "boba");
        assert_eq!(merged.tracker.page_name, "page");
        assert_eq!(merged.backends.overrides.get("ga"), Some(&false));
        assert_eq!(merged.watch.len(), 2);
        assert_eq!(merged.watch[1].event, "submit");
    }

    #[test]
    #[serial]
    fn test_sitetrack_home_with_env() {
        env::set_var("SITETRACK_HOME", "/custom/home");
        assert_eq!(sitetrack_home(), Some(PathBuf::from("/custom/home")));
        env::remove_var("SITETRACK_HOME");
    }

    #[test]
    #[serial]
    fn test_sitetrack_home_empty_env() {
        env::set_var("SITETRACK_HOME", "");
        let home = sitetrack_home();
        if let Some(path) = home {
            assert!(path.ends_with(CONFIG_DIR));
        }
        env::remove_var("SITETRACK_HOME");
    }
}
