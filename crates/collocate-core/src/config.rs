//! Configuration loading and discovery.
//!
//! Configuration is merged from, lowest precedence first:
//! 1. built-in defaults
//! 2. `~/.config/collocate/config.<ext>` (user config)
//! 3. `.collocate.<ext>` then `collocate.<ext>` in the closest directory,
//!    walking up from the search root until a `.git` boundary
//! 4. explicit files, in the order given
//! 5. `COLLOCATE_*` environment variables (`COLLOCATE_LOG_LEVEL=debug`,
//!    `COLLOCATE_COLLOCATION__MODE=textual-sentence`)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use collocate_core::LemmaDictionary;
//! use collocate_core::config::ConfigLoader;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! let lemmas = config.collocation.lemma_list();
//! let options = config
//!     .collocation
//!     .options(lemmas.as_ref().map(|l| l as &dyn LemmaDictionary));
//! ```

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analyzer::{TokenAnalyzer, TokenClasses};
use crate::collocate::CollocationOptions;
use crate::error::{ConfigError, ConfigResult};
use crate::index::{DEFAULT_BATCH_SIZE, IndexStorage};
use crate::lemma::{LemmaDictionary, LemmaList};
use crate::measure::{Measure, Thresholds};
use crate::window::{DEFAULT_SPAN_SIZE, WindowMode};

/// Input size limit applied when `max_input_bytes` is not set (64 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 64 * 1024 * 1024;

/// Windowing mode as written in configuration and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum WindowKind {
    /// Fixed token spans around each node.
    #[default]
    Surface,
    /// Sentences containing the node.
    TextualSentence,
    /// Paragraphs containing the node.
    TextualParagraph,
}

impl WindowKind {
    /// The kebab-case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::TextualSentence => "textual-sentence",
            Self::TextualParagraph => "textual-paragraph",
        }
    }
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `[collocation]` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct CollocationSettings {
    /// Windowing mode.
    pub mode: WindowKind,
    /// Context terms kept left of the node (surface mode).
    pub left_span_size: usize,
    /// Context terms kept right of the node (surface mode).
    pub right_span_size: usize,
    /// Clip surface windows at the sentence containing the node.
    pub within_sentence: bool,
    /// Keep `_POS_` payloads on terms.
    pub show_part_of_speech: bool,
    /// Lowercase terms and ignore case in queries.
    pub lowercase: bool,
    /// Words removed from context windows.
    pub stop_words: Vec<String>,
    /// Which character classes may start a term.
    pub token_classes: TokenClasses,
    /// Fold alternate forms onto their lemma.
    pub lemma_enabled: bool,
    /// Lemma to alternate forms.
    pub lemmas: BTreeMap<String, Vec<String>>,
    /// Explicit minimum per measure.
    pub thresholds: Thresholds,
    /// Measures required to reach their default cutoff.
    pub default_thresholds: Vec<Measure>,
    /// Where the positional index keeps its batches.
    pub index_storage: IndexStorage,
    /// Windows per committed index batch.
    pub batch_size: usize,
    /// Word/tag separator used by the tagger that produced the corpus.
    pub pos_tagger_separator: Option<String>,
}

impl Default for CollocationSettings {
    fn default() -> Self {
        Self {
            mode: WindowKind::default(),
            left_span_size: DEFAULT_SPAN_SIZE,
            right_span_size: DEFAULT_SPAN_SIZE,
            within_sentence: false,
            show_part_of_speech: false,
            lowercase: false,
            stop_words: Vec::new(),
            token_classes: TokenClasses::default(),
            lemma_enabled: false,
            lemmas: BTreeMap::new(),
            thresholds: Thresholds::new(),
            default_thresholds: Vec::new(),
            index_storage: IndexStorage::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            pos_tagger_separator: None,
        }
    }
}

impl CollocationSettings {
    /// The windowing policy these settings describe.
    pub const fn window_mode(&self) -> WindowMode {
        match self.mode {
            WindowKind::Surface => WindowMode::Surface {
                left_span: self.left_span_size,
                right_span: self.right_span_size,
                within_sentence: self.within_sentence,
            },
            WindowKind::TextualSentence => WindowMode::TextualSentence,
            WindowKind::TextualParagraph => WindowMode::TextualParagraph,
        }
    }

    /// The lemma dictionary, when lemma folding is enabled.
    pub fn lemma_list(&self) -> Option<LemmaList> {
        self.lemma_enabled.then(|| {
            self.lemmas
                .iter()
                .map(|(lemma, forms)| (lemma.as_str(), forms.iter().map(String::as_str)))
                .collect::<LemmaList>()
                .ignore_case(self.lowercase)
        })
    }

    /// Explicit thresholds plus default cutoffs for `default_thresholds`.
    ///
    /// An explicit value wins over a default cutoff for the same measure.
    pub fn effective_thresholds(&self) -> Thresholds {
        let mut thresholds = Thresholds::new();
        for measure in &self.default_thresholds {
            thresholds.enable(*measure);
        }
        for (measure, value) in self.thresholds.iter() {
            thresholds.set(measure, value);
        }
        thresholds
    }

    /// Analyzer configured from these settings.
    pub fn analyzer<'l>(&self, lemmas: Option<&'l dyn LemmaDictionary>) -> TokenAnalyzer<'l> {
        TokenAnalyzer::new()
            .with_part_of_speech(self.show_part_of_speech)
            .with_token_classes(self.token_classes)
            .with_lowercase(self.lowercase)
            .with_stop_words(self.stop_words.iter().cloned())
            .with_lemmas(lemmas)
    }

    /// Everything a collocation run needs.
    pub fn options<'l>(&self, lemmas: Option<&'l dyn LemmaDictionary>) -> CollocationOptions<'l> {
        CollocationOptions::new(self.window_mode())
            .with_analyzer(self.analyzer(lemmas))
            .with_thresholds(self.effective_thresholds())
            .with_storage(self.index_storage)
            .with_batch_size(self.batch_size)
    }
}

/// The configuration for collocate.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files. No log file is written when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// Maximum size of a corpus input file in bytes.
    ///
    /// Omit to use [`DEFAULT_MAX_INPUT_BYTES`].
    pub max_input_bytes: Option<usize>,
    /// Ignore `max_input_bytes` entirely.
    pub disable_input_limit: bool,
    /// Collocation analysis settings.
    pub collocation: CollocationSettings,
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Which configuration files were loaded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project config files found by walking up, ordered low→high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file from XDG config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit config files loaded (e.g., from `--config` flag).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// Returns the highest-precedence config file that was loaded.
    ///
    /// Precedence: explicit files > project files > user file.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .map(Utf8PathBuf::as_path)
            .or_else(|| self.project_files.last().map(Utf8PathBuf::as_path))
            .or(self.user_file.as_deref())
    }
}

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "collocate";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    boundary_marker: Option<String>,
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for project config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/collocate/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward search at a directory containing `marker`.
    /// Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Search all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file; later files take precedence.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(ref root) = self.project_search_root {
            let project_configs = self.find_project_configs(root);
            for pc in &project_configs {
                figment = Self::merge_file(figment, pc);
            }
            sources.project_files = project_configs;
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        figment = figment.merge(Env::prefixed("COLLOCATE_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            mode = config.collocation.mode.as_str(),
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Load configuration, returning an error if no config file is found.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        let has_user = self.include_user_config && self.find_user_config().is_some();
        let has_project = self
            .project_search_root
            .as_ref()
            .is_some_and(|root| !self.find_project_configs(root).is_empty());
        let has_explicit = !self.explicit_files.is_empty();

        if !has_user && !has_project && !has_explicit {
            return Err(ConfigError::NotFound);
        }

        self.load()
    }

    /// Config files of the closest directory that has any, ordered low to
    /// high precedence: dotfiles before regular files.
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let mut found = Vec::new();
            for prefix in [".", ""] {
                for ext in CONFIG_EXTENSIONS {
                    let candidate = dir.join(format!("{prefix}{APP_NAME}.{ext}"));
                    if candidate.is_file() {
                        found.push(candidate);
                    }
                }
            }

            if !found.is_empty() {
                return found;
            }

            // A config next to the marker still counts.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
                && dir != start
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        Vec::new()
    }

    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the user config directory path.
///
/// Returns `~/.config/collocate/` on Linux, `~/Library/Application Support/collocate/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes tests that mutate environment variables via `set_var`/`remove_var`.
    static TEST_ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn load_file(name: &str, contents: &str) -> Config {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(name);
        fs::write(&config_path, contents).unwrap();
        let config_path = Utf8PathBuf::try_from(config_path).unwrap();

        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&config_path)
            .load()
            .unwrap();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert!(!config.disable_input_limit);
        assert_eq!(config.collocation.mode, WindowKind::Surface);
        assert_eq!(config.collocation.left_span_size, 10);
        assert_eq!(config.collocation.right_span_size, 10);
        assert_eq!(config.collocation.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_loader_builds_with_defaults() {
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(sources.primary_file().is_none());
    }

    #[test]
    fn collocation_table_from_toml() {
        let config = load_file(
            "config.toml",
            r#"
log_level = "debug"

[collocation]
mode = "textual-paragraph"
left_span_size = 3
lowercase = true
stop_words = ["the", "a"]
index_storage = "disk"

[collocation.token_classes]
numbers = false

[collocation.thresholds]
MI = 3.0
LogLikelihood = 10.83
"#,
        );
        assert_eq!(config.log_level, LogLevel::Debug);
        let c = &config.collocation;
        assert_eq!(c.mode, WindowKind::TextualParagraph);
        assert_eq!(c.left_span_size, 3);
        assert_eq!(c.right_span_size, 10);
        assert!(c.lowercase);
        assert_eq!(c.stop_words, vec!["the", "a"]);
        assert_eq!(c.index_storage, IndexStorage::Disk);
        assert!(c.token_classes.letters);
        assert!(!c.token_classes.numbers);
        assert_eq!(c.thresholds.get(Measure::Mi), Some(3.0));
        assert_eq!(c.thresholds.get(Measure::LogLikelihood), Some(10.83));
    }

    #[test]
    fn collocation_table_from_yaml() {
        let yaml = r"
collocation:
  mode: surface
  within_sentence: true
  lemma_enabled: true
  lemmas:
    go: [goes, went, gone]
  default_thresholds: [Dice, TScore]
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let c = &config.collocation;
        assert!(c.within_sentence);
        assert_eq!(c.lemmas["go"], vec!["goes", "went", "gone"]);
        assert_eq!(c.default_thresholds, vec![Measure::Dice, Measure::TScore]);
    }

    #[test]
    fn window_mode_from_settings() {
        let mut settings = CollocationSettings {
            left_span_size: 2,
            right_span_size: 4,
            within_sentence: true,
            ..CollocationSettings::default()
        };
        assert_eq!(
            settings.window_mode(),
            WindowMode::Surface {
                left_span: 2,
                right_span: 4,
                within_sentence: true,
            }
        );
        settings.mode = WindowKind::TextualSentence;
        assert_eq!(settings.window_mode(), WindowMode::TextualSentence);
    }

    #[test]
    fn lemma_list_only_when_enabled() {
        let mut settings = CollocationSettings::default();
        settings
            .lemmas
            .insert("go".to_string(), vec!["went".to_string()]);
        assert!(settings.lemma_list().is_none());

        settings.lemma_enabled = true;
        settings.lowercase = true;
        let lemmas = settings.lemma_list().unwrap();
        assert_eq!(lemmas.canonical("Went"), Some("go"));
    }

    #[test]
    fn explicit_threshold_wins_over_default_cutoff() {
        let settings = CollocationSettings {
            thresholds: Thresholds::new().with(Measure::Mi, 5.0),
            default_thresholds: vec![Measure::Mi, Measure::Dice],
            ..CollocationSettings::default()
        };
        let t = settings.effective_thresholds();
        assert_eq!(t.get(Measure::Mi), Some(5.0));
        assert_eq!(t.get(Measure::Dice), Some(Measure::Dice.default_cutoff()));
        assert_eq!(t.get(Measure::TScore), None);
    }

    #[test]
    fn options_carry_settings() {
        let settings = CollocationSettings {
            lowercase: true,
            show_part_of_speech: true,
            batch_size: 7,
            index_storage: IndexStorage::Disk,
            ..CollocationSettings::default()
        };
        let options = settings.options(None);
        assert!(options.analyzer.lowercases());
        assert!(options.analyzer.shows_part_of_speech());
        assert_eq!(options.batch_size, 7);
        assert_eq!(options.storage, IndexStorage::Disk);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[collocation]\nmode = \"diagonal\"\n").unwrap();
        let config_path = Utf8PathBuf::try_from(config_path).unwrap();

        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&config_path)
            .load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn test_later_file_overrides_earlier() {
        let tmp = TempDir::new().unwrap();

        let base_config = tmp.path().join("base.toml");
        fs::write(&base_config, "log_level = \"warn\"\n[collocation]\nleft_span_size = 4\n").unwrap();

        let override_config = tmp.path().join("override.json");
        fs::write(&override_config, r#"{"log_level": "error"}"#).unwrap();

        let base_config = Utf8PathBuf::try_from(base_config).unwrap();
        let override_config = Utf8PathBuf::try_from(override_config).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&base_config)
            .with_file(&override_config)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.collocation.left_span_size, 4);
        assert_eq!(sources.primary_file(), Some(override_config.as_path()));
    }

    #[test]
    fn test_project_config_discovery() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        let sub_dir = project_dir.join("corpus").join("deep");
        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(project_dir.join(".collocate.toml"), r#"log_level = "debug""#).unwrap();

        let sub_dir = Utf8PathBuf::try_from(sub_dir).unwrap();
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(&sub_dir)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(sources.project_files.len(), 1);
    }

    #[test]
    fn test_boundary_marker_stops_search() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        let work = child.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(parent.join(".collocate.toml"), r#"log_level = "warn""#).unwrap();
        fs::create_dir(child.join(".git")).unwrap();

        let work = Utf8PathBuf::try_from(work).unwrap();
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_boundary_marker(".git")
            .with_project_search(&work)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
        assert!(sources.project_files.is_empty());
    }

    #[test]
    fn dotfile_before_regular_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".collocate.toml"), r#"log_level = "debug""#).unwrap();
        fs::write(tmp.path().join("collocate.yaml"), "log_level: error\n").unwrap();

        let tmp_path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(&tmp_path)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(sources.project_files.len(), 2);
    }

    #[test]
    fn only_closest_directory_contributes() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        fs::create_dir_all(&child).unwrap();
        fs::write(parent.join(".collocate.toml"), "[collocation]\nlowercase = true\n").unwrap();
        fs::write(child.join(".collocate.toml"), r#"log_level = "error""#).unwrap();

        let child_path = Utf8PathBuf::try_from(child).unwrap();
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(&child_path)
            .load()
            .unwrap();

        assert_eq!(config.log_level, LogLevel::Error);
        assert!(!config.collocation.lowercase);
        assert_eq!(sources.project_files.len(), 1);
    }

    #[test]
    fn test_load_or_error_fails_when_no_config() {
        let result = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load_or_error();
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn disable_input_limit_keeps_max_bytes() {
        let config = load_file(
            "config.toml",
            "max_input_bytes = 1024\ndisable_input_limit = true\n",
        );
        assert!(config.disable_input_limit);
        assert_eq!(config.max_input_bytes, Some(1024));
    }

    #[test]
    fn test_user_config_dir() {
        if let Some(path) = user_config_dir() {
            assert!(path.as_str().contains("collocate"));
        }
    }

    #[test]
    #[allow(unsafe_code)]
    fn test_env_var_overrides_file_config() {
        let _lock = TEST_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[collocation]\nbatch_size = 5\n").unwrap();
        let config_path = Utf8PathBuf::try_from(config_path).unwrap();

        // SAFETY: Test environment, mutex serializes env access across tests.
        unsafe {
            std::env::set_var("COLLOCATE_COLLOCATION__BATCH_SIZE", "17");
        }

        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(&config_path)
            .load();

        // SAFETY: Cleanup after test.
        unsafe {
            std::env::remove_var("COLLOCATE_COLLOCATION__BATCH_SIZE");
        }

        let (config, _sources) = result.unwrap();
        assert_eq!(config.collocation.batch_size, 17);
    }
}
