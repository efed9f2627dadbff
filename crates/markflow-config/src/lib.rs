//! Configuration management for markflow.
//!
//! Parses `markflow.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [front_matter]
//! strip = true
//!
//! [headings]
//! inject_ids = false
//! breadcrumbs = true
//! max_level = 6
//!
//! [inline]
//! enabled = true
//!
//! [collection]
//! root = "docs"
//! include = ["**/*.md"]
//! exclude = ["drafts/**"]
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "markflow.toml";

/// Deepest heading level.
const MAX_HEADING_LEVEL: u8 = 6;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Front matter handling.
    pub front_matter: FrontMatterSettings,
    /// Heading anchors and breadcrumbs.
    pub headings: HeadingsSettings,
    /// Inline embedded blocks.
    pub inline: InlineSettings,
    /// Document collection (paths are relative strings from TOML).
    collection: CollectionConfigRaw,

    /// Resolved collection configuration (set after loading).
    #[serde(skip)]
    pub collection_resolved: CollectionConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Front matter settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrontMatterSettings {
    /// Remove the front matter before rendering.
    pub strip: bool,
}

impl Default for FrontMatterSettings {
    fn default() -> Self {
        Self { strip: true }
    }
}

/// Heading settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeadingsSettings {
    /// Rewrite headings with explicit `{#id}` anchors.
    pub inject_ids: bool,
    /// Publish breadcrumbs for the document path.
    pub breadcrumbs: bool,
    /// Deepest heading level to index (1-6).
    pub max_level: u8,
}

impl Default for HeadingsSettings {
    fn default() -> Self {
        Self {
            inject_ids: false,
            breadcrumbs: true,
            max_level: MAX_HEADING_LEVEL,
        }
    }
}

/// Inline embed settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InlineSettings {
    /// Render `<Composable inline>` blocks inside the surrounding text.
    pub enabled: bool,
}

impl Default for InlineSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Raw collection configuration as parsed from TOML (root as string).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CollectionConfigRaw {
    root: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
}

/// Resolved collection configuration with an absolute root.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Directory the document paths are relative to.
    pub root: PathBuf,
    /// Glob patterns of documents to include. Empty means every `*.md` file.
    pub include: Vec<String>,
    /// Glob patterns of documents to leave out.
    pub exclude: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require every pattern of a list to be non-empty.
fn require_patterns(patterns: &[String], field: &str) -> Result<(), ConfigError> {
    if patterns.iter().any(|pattern| pattern.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain empty patterns"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `markflow.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        let cwd = std::env::current_dir()?;
        match Self::discover_from(&cwd) {
            Some(discovered) => Self::load_from_file(&discovered),
            None => {
                tracing::debug!(cwd = %cwd.display(), "No config file found, using defaults");
                Ok(Self::default_with_base(&cwd))
            }
        }
    }

    /// Search for a config file in `start` and its parents.
    #[must_use]
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            front_matter: FrontMatterSettings::default(),
            headings: HeadingsSettings::default(),
            inline: InlineSettings::default(),
            collection: CollectionConfigRaw::default(),
            collection_resolved: CollectionConfig {
                root: base.to_path_buf(),
                include: Vec::new(),
                exclude: Vec::new(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Resolve relative paths against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let root = match &self.collection.root {
            Some(root) => config_dir.join(root),
            None => config_dir.to_path_buf(),
        };
        self.collection_resolved = CollectionConfig {
            root,
            include: self.collection.include.clone(),
            exclude: self.collection.exclude.clone(),
        };
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_headings()?;
        self.validate_collection()?;
        Ok(())
    }

    fn validate_headings(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HEADING_LEVEL).contains(&self.headings.max_level) {
            return Err(ConfigError::Validation(format!(
                "headings.max_level must be between 1 and {MAX_HEADING_LEVEL}"
            )));
        }
        Ok(())
    }

    fn validate_collection(&self) -> Result<(), ConfigError> {
        require_patterns(&self.collection_resolved.include, "collection.include")?;
        require_patterns(&self.collection_resolved.exclude, "collection.exclude")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));

        assert!(config.front_matter.strip);
        assert_eq!(config.headings, HeadingsSettings::default());
        assert!(config.inline.enabled);
        assert_eq!(config.collection_resolved.root, PathBuf::from("/test"));
        assert!(config.collection_resolved.include.is_empty());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.front_matter.strip);
        assert_eq!(config.headings.max_level, 6);
    }

    #[test]
    fn test_parse_plugin_sections() {
        let toml = r"
[front_matter]
strip = false

[headings]
inject_ids = true
breadcrumbs = false
max_level = 3

[inline]
enabled = false
";
        let config: Config = toml::from_str(toml).unwrap();

        assert!(!config.front_matter.strip);
        assert_eq!(
            config.headings,
            HeadingsSettings {
                inject_ids: true,
                breadcrumbs: false,
                max_level: 3,
            }
        );
        assert!(!config.inline.enabled);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[collection]
root = "docs"
include = ["**/*.md"]
exclude = ["drafts/**"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.collection_resolved,
            CollectionConfig {
                root: PathBuf::from("/project/docs"),
                include: vec!["**/*.md".to_owned()],
                exclude: vec!["drafts/**".to_owned()],
            }
        );
    }

    #[test]
    fn test_resolve_paths_without_root() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.collection_resolved.root, PathBuf::from("/project"));
    }

    // ── Validation ──

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_max_level_zero() {
        let mut config = Config::default();
        config.headings.max_level = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("headings.max_level"));
    }

    #[test]
    fn test_validate_max_level_too_high() {
        let mut config = Config::default();
        config.headings.max_level = 7;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_pattern() {
        let mut config = Config::default();
        config.collection_resolved.exclude = vec![" ".to_owned()];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("collection.exclude"));
    }

    // ── Loading ──

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[headings]\nmax_level = 2\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.headings.max_level, 2);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.collection_resolved.root, dir.path());
    }

    #[test]
    fn test_load_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[headings\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[headings]\nmax_level = 9\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_from(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("site");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_from(&nested),
            Some(nested.join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("x");
        std::fs::create_dir_all(nested.join(CONFIG_FILENAME)).unwrap();

        let found = Config::discover_from(&nested);
        assert_ne!(found, Some(nested.join(CONFIG_FILENAME)));
    }
}
