//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Project config file, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "neo.yaml";

const DEFAULT_NEOFILE: &str = "data/neos.csv";
const DEFAULT_CADFILE: &str = "data/cad.json";
const DEFAULT_LIMIT: usize = 10;

/// NEO Explorer configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the NEO catalog CSV
    pub neofile: Option<PathBuf>,

    /// Path to the close approach JSON
    pub cadfile: Option<PathBuf>,

    /// Fail on malformed rows and unresolved approaches
    pub strict: Option<bool>,

    /// Default result limit for queries and ranked views
    pub limit: Option<usize>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (applied by the accessors)

        // 2. Global user config (~/.config/neo/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (./neo.yaml)
        if let Some(project) = Self::read_file(Path::new(PROJECT_CONFIG_FILE)) {
            config.merge(project);
        }

        // 4. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        config
    }

    /// Parse a YAML config document
    pub fn from_yaml(contents: &str) -> Option<Self> {
        serde_yml::from_str::<Config>(contents).ok()
    }

    /// Read overrides from environment variables using `lookup`
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            neofile: lookup("NEO_NEOFILE").map(PathBuf::from),
            cadfile: lookup("NEO_CADFILE").map(PathBuf::from),
            strict: lookup("NEO_STRICT").and_then(|v| parse_bool(&v)),
            limit: lookup("NEO_LIMIT").and_then(|v| v.trim().parse().ok()),
            default_format: lookup("NEO_FORMAT"),
        }
    }

    fn read_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        Self::from_yaml(&contents)
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "neo")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.neofile.is_some() {
            self.neofile = other.neofile;
        }
        if other.cadfile.is_some() {
            self.cadfile = other.cadfile;
        }
        if other.strict.is_some() {
            self.strict = other.strict;
        }
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    pub fn neofile(&self) -> PathBuf {
        self.neofile
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NEOFILE))
    }

    pub fn cadfile(&self) -> PathBuf {
        self.cadfile
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CADFILE))
    }

    pub fn strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
