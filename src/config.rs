//! Lowercheck Configuration
//!
//! Handles parsing and management of lowercheck.toml configuration files.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{CatalogSource, FMA4_FEATURE};
use crate::lowering::{CommandLowering, LoweringEngine, LoweringError, ReferenceLowering};

/// Name of the configuration file searched for by [`LowercheckConfig::find_and_load`].
pub const CONFIG_FILE_NAME: &str = "lowercheck.toml";

/// Prefix a lowered operation must carry unless configured otherwise.
pub const DEFAULT_TARGET_PREFIX: &str = "llvm.x86.";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config")]
    Render(#[from] toml::ser::Error),

    #[error("config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching lowercheck.toml.
///
/// Relative paths inside the file are resolved against the directory the
/// file was loaded from, not the current directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LowercheckConfig {
    /// Target features and operation prefix
    #[serde(default)]
    pub target: TargetConfig,

    /// Where the builtin table comes from
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Lowering engine selection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Report output
    #[serde(default)]
    pub report: ReportConfig,

    /// Directory holding the loaded file; `None` for built-in defaults
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl LowercheckConfig {
    /// Parse the config file at `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Io(e),
        })?;
        let mut config: LowercheckConfig = toml::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Search for lowercheck.toml from the current directory upwards.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::find_and_load(&cwd)
    }

    /// Load the nearest lowercheck.toml in `start_dir` or one of its
    /// ancestors, falling back to defaults when there is none.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let found = start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => {
                log::debug!("using config {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Write the configuration as TOML.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Directory the config was loaded from.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Catalog source named by the config. A relative file path is taken
    /// relative to the config file's directory.
    pub fn catalog_source(&self) -> CatalogSource {
        match CatalogSource::from_arg(&self.catalog.source) {
            CatalogSource::File(path) if path.is_relative() => match &self.base_dir {
                Some(dir) => CatalogSource::File(dir.join(path)),
                None => CatalogSource::File(path),
            },
            source => source,
        }
    }
}

/// Target feature configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Enabled target features
    #[serde(default = "default_features")]
    pub features: Vec<String>,

    /// Feature required by catalog lines that do not name one
    #[serde(default = "default_feature")]
    pub default_feature: String,

    /// Prefix at least one lowered operation must start with
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_features() -> Vec<String> {
    vec![FMA4_FEATURE.to_string()]
}

fn default_feature() -> String {
    FMA4_FEATURE.to_string()
}

fn default_prefix() -> String {
    DEFAULT_TARGET_PREFIX.to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            features: default_features(),
            default_feature: default_feature(),
            prefix: default_prefix(),
        }
    }
}

/// Catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// `embedded` or a path to a catalog file
    #[serde(default = "default_catalog_source")]
    pub source: String,
}

fn default_catalog_source() -> String {
    "embedded".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: default_catalog_source(),
        }
    }
}

/// Which lowering engine to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Built-in FMA4 lowering table
    #[default]
    Reference,
    /// External program
    Command,
}

/// Lowering engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,

    /// Program to run for the command engine
    #[serde(default)]
    pub program: Option<String>,

    /// Argument templates for the command engine
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineConfig {
    /// Build the configured engine.
    pub fn build(&self, kind: EngineKind) -> Result<Box<dyn LoweringEngine>, LoweringError> {
        match kind {
            EngineKind::Reference => Ok(Box::new(ReferenceLowering::new())),
            EngineKind::Command => {
                let program = self.program.as_deref().ok_or_else(|| {
                    LoweringError::NotConfigured(
                        "command".to_string(),
                        "[engine] program is not set".to_string(),
                    )
                })?;
                Ok(Box::new(CommandLowering::new(program, self.args.clone())))
            }
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// FAIL lines and a PASSED summary
    #[default]
    Text,
    /// One JSON document with summary and per-case results
    Json,
}

/// Report configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Also print passing cases
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub format: ReportFormat,
}
