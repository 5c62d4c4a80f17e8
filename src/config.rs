//! Sorter configuration.
//!
//! This module loads optional TOML configuration that tunes a sorting run:
//! - Whether the miscellaneous sweep runs without asking
//! - Which source entries are left alone (hidden files, exact names, globs, regex)
//! - Extra extensions per category, or a full replacement of the built-in sets
//!
//! # Configuration File Format
//!
//! ```toml
//! use_misc = true
//!
//! [filters]
//! include_hidden = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part"]
//! regex = ['^~\$']
//!
//! [extensions]
//! replace_defaults = false
//! movies = ["m4v"]
//! documents = ["md"]
//! ```

use crate::file_category::{Category, ClassificationTable, TableError};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
    /// The configured extensions do not form a valid table.
    Table(TableError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::Table(err) => write!(f, "Invalid extension table: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<TableError> for ConfigError {
    fn from(err: TableError) -> Self {
        ConfigError::Table(err)
    }
}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SorterConfig {
    /// Answer to the misc sweep question. `None` means ask.
    #[serde(default)]
    pub use_misc: Option<bool>,

    /// Rules for leaving source entries in place.
    #[serde(default)]
    pub filters: FilterRules,

    /// Extension set overrides.
    #[serde(default)]
    pub extensions: ExtensionRules,
}

/// Rules deciding which source entries take part in a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether entries starting with "." are sorted. Defaults to false.
    #[serde(default)]
    pub include_hidden: bool,

    /// Rules for excluding entries.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Entries matching any of these rules stay in the source directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names (e.g., "Thumbs.db", "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Per-category extension additions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionRules {
    /// Start from empty sets instead of the built-in ones.
    #[serde(default)]
    pub replace_defaults: bool,
    #[serde(default)]
    pub movies: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub audio: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub applications: Vec<String>,
}

impl ExtensionRules {
    fn entries(&self) -> [(Category, &[String]); 5] {
        [
            (Category::Movies, self.movies.as_slice()),
            (Category::Photos, self.photos.as_slice()),
            (Category::Audio, self.audio.as_slice()),
            (Category::Documents, self.documents.as_slice()),
            (Category::Applications, self.applications.as_slice()),
        ]
    }

    /// Builds the classification table these rules describe.
    ///
    /// # Errors
    ///
    /// Returns `TableError` if an extension would land in two categories.
    pub fn build_table(&self) -> Result<ClassificationTable, TableError> {
        let mut table = if self.replace_defaults {
            ClassificationTable::empty()
        } else {
            ClassificationTable::new()
        };

        for (category, extensions) in self.entries() {
            for ext in extensions {
                table.add_extension(category, ext)?;
            }
        }

        Ok(table)
    }
}

impl SorterConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.sorthatrc.toml` in the current directory
    /// 3. Look for `~/.config/sorthat/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".sorthatrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sorthat")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        log::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        log::debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile configuration into the structures a sorter runs with.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid, or if the
    /// extension sets overlap.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let table = self.extensions.build_table()?;
        let filters = CompiledFilters::new(self.filters)?;
        Ok(CompiledConfig {
            use_misc: self.use_misc,
            table,
            filters,
        })
    }
}

/// Validated configuration, ready to hand to a [`crate::sorter::Sorter`].
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub use_misc: Option<bool>,
    pub table: ClassificationTable,
    pub filters: CompiledFilters,
}

/// Pre-compiled entry filters.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a source entry takes part in sorting.
    ///
    /// Checks run in order, stopping at the first exclusion:
    /// 1. Hidden entries, unless enabled
    /// 2. Exact file name
    /// 3. Glob patterns
    /// 4. Regex patterns
    pub fn should_include(&self, file_name: &str) -> bool {
        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            include_hidden: false,
            exclude_filenames: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(rules: FilterRules) -> CompiledFilters {
        SorterConfig {
            filters: rules,
            ..Default::default()
        }
        .compile()
        .unwrap()
        .filters
    }

    #[test]
    fn test_default_config() {
        let config = SorterConfig::default();
        assert!(config.use_misc.is_none());
        assert!(!config.filters.include_hidden);
        assert!(!config.extensions.replace_defaults);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = SorterConfig::parse("").unwrap();
        assert!(config.use_misc.is_none());
        assert!(config.compile().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config = SorterConfig::parse(
            r#"
            use_misc = true

            [filters]
            include_hidden = true

            [filters.exclude]
            filenames = ["Thumbs.db"]
            patterns = ["*.part"]
            regex = ['^~\$']

            [extensions]
            movies = ["m4v"]
            documents = [".md"]
            "#,
        )
        .unwrap();

        assert_eq!(config.use_misc, Some(true));
        assert_eq!(config.filters.exclude.filenames, vec!["Thumbs.db"]);

        let compiled = config.compile().unwrap();
        assert_eq!(compiled.table.classify("a.m4v"), Some(Category::Movies));
        assert_eq!(compiled.table.classify("README.md"), Some(Category::Documents));
        assert_eq!(compiled.table.classify("a.mp3"), Some(Category::Audio));
        assert!(compiled.filters.should_include(".hidden"));
        assert!(!compiled.filters.should_include("Thumbs.db"));
        assert!(!compiled.filters.should_include("video.mkv.part"));
        assert!(!compiled.filters.should_include("~$report.docx"));
        assert!(compiled.filters.should_include("report.docx"));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = SorterConfig::parse("use_misc = maybe");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_replace_defaults() {
        let config = SorterConfig::parse(
            r#"
            [extensions]
            replace_defaults = true
            audio = ["opus"]
            "#,
        )
        .unwrap();
        let table = config.compile().unwrap().table;

        assert_eq!(table.classify("a.opus"), Some(Category::Audio));
        assert_eq!(table.classify("a.mp3"), None);
        assert!(table.extensions(Category::Movies).is_empty());
    }

    #[test]
    fn test_overlapping_extension_rejected() {
        let config = SorterConfig::parse(
            r#"
            [extensions]
            documents = ["sh"]
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.compile(),
            Err(ConfigError::Table(TableError::OverlappingExtension { .. }))
        ));
    }

    #[test]
    fn test_dot_only_extension_rejected() {
        let config = SorterConfig::parse(
            r#"
            [extensions]
            documents = ["."]
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.compile(),
            Err(ConfigError::Table(TableError::EmptyExtension))
        ));
    }

    #[test]
    fn test_hidden_file_excluded_by_default() {
        let compiled = CompiledFilters::default();
        assert!(!compiled.should_include(".DS_Store"));
        assert!(compiled.should_include("photo.jpg"));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let compiled = filters(FilterRules {
            include_hidden: false,
            exclude: ExcludeRules {
                patterns: vec!["*.crdownload".to_string(), "draft_?.txt".to_string()],
                ..Default::default()
            },
        });

        assert!(!compiled.should_include("movie.mp4.crdownload"));
        assert!(!compiled.should_include("draft_1.txt"));
        assert!(compiled.should_include("draft_12.txt"));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let config = SorterConfig {
            filters: FilterRules {
                include_hidden: false,
                exclude: ExcludeRules {
                    patterns: vec!["[invalid".to_string()],
                    ..Default::default()
                },
            },
            ..Default::default()
        };

        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let config = SorterConfig {
            filters: FilterRules {
                include_hidden: false,
                exclude: ExcludeRules {
                    regex: vec!["[invalid(".to_string()],
                    ..Default::default()
                },
            },
            ..Default::default()
        };

        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = SorterConfig::load(Some(Path::new("/non/existent/sorthat.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sorthat.toml");
        fs::write(&path, "use_misc = false\n").unwrap();

        let config = SorterConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.use_misc, Some(false));
    }
}
