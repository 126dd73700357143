use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Options handed to the selected syntax highlighter.
///
/// Keys this crate doesn't know about are kept in `extra` so that a
/// highlighter registered by a third party can still read its own settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlighterOpts {
    /// Directory holding compiled tree-sitter grammars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_sitter_parsers_dir: Option<PathBuf>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl HighlighterOpts {
    pub fn with_parsers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tree_sitter_parsers_dir = Some(dir.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.extra.get(key)
    }

    /// Resolve `~` and `$VAR` in the parsers directory. A path naming an
    /// unset variable is kept as written.
    pub fn expand_parsers_dir(&mut self) {
        let Some(dir) = &self.tree_sitter_parsers_dir else {
            return;
        };
        let written = dir.to_string_lossy().into_owned();
        if let Ok(expanded) = shellexpand::full(&written) {
            self.tree_sitter_parsers_dir = Some(PathBuf::from(expanded.as_ref()));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Registered name of the highlighter to use, e.g. `tree-sitter`.
    /// `None` renders code without any highlighter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_highlighter: Option<String>,

    #[serde(default)]
    pub syntax_highlighter_opts: HighlighterOpts,
}

impl Config {
    const APP_DIR: &'static str = "~/.config/markdown-tree-sitter";
    const FILE_NAME: &'static str = "config.toml";

    /// Load the config at `config_path`; a missing file is not an error.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let path = config_path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: path.to_path_buf(),
                source,
            }
        })?;

        Self::parse(&content)
            .map(Some)
            .map_err(|source| ConfigError::ConfigParseError {
                config_path: path.to_path_buf(),
                source,
            })
    }

    /// Parse TOML text, expanding the parsers directory.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        config.syntax_highlighter_opts.expand_parsers_dir();
        Ok(config)
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let path = config_path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(Self::APP_DIR).into_owned()).join(Self::FILE_NAME)
    }
}
