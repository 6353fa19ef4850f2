use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TRICRUNCH_DIR_NAME: &str = ".tricrunch";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_DELIMITER: &str = "|";
pub const DEFAULT_PERSON_PREFIX: &str = "person";
pub const DEFAULT_INTEREST_PREFIX: &str = "interest";
pub const DEFAULT_KNOWS_PREFIX: &str = "knows";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    #[default]
    Sequential,
    Parallel,
}

impl EvaluationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TricrunchConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_person_prefix")]
    pub person_prefix: String,
    #[serde(default = "default_interest_prefix")]
    pub interest_prefix: String,
    #[serde(default = "default_knows_prefix")]
    pub knows_prefix: String,
}

impl DatasetConfig {
    /// The field separator. Only the first character of `delimiter` counts;
    /// `validate_config` warns about anything longer.
    pub fn delimiter_char(&self) -> char {
        self.delimiter.chars().next().unwrap_or('|')
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            person_prefix: default_person_prefix(),
            interest_prefix: default_interest_prefix(),
            knows_prefix: default_knows_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub mode: EvaluationMode,
    /// Worker threads for parallel evaluation; 0 leaves the choice to rayon.
    #[serde(default)]
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub fn tricrunch_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(TRICRUNCH_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    tricrunch_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<TricrunchConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(TricrunchConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: TricrunchConfig = toml::from_str(&raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<TricrunchConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(tricrunch_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = TricrunchConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

pub fn validate_config(config: &TricrunchConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if config.dataset.delimiter.chars().count() > 1 {
        warnings.push(ConfigWarning {
            code: "dataset_delimiter_truncated",
            message: format!(
                "dataset.delimiter '{}' is longer than one character; only '{}' is used",
                config.dataset.delimiter,
                config.dataset.delimiter_char()
            ),
        });
    }

    let prefixes = [
        &config.dataset.person_prefix,
        &config.dataset.interest_prefix,
        &config.dataset.knows_prefix,
    ];
    for (index, prefix) in prefixes.iter().enumerate() {
        let clashes = prefixes
            .iter()
            .enumerate()
            .any(|(other, candidate)| other != index && candidate.starts_with(prefix.as_str()));
        if clashes {
            warnings.push(ConfigWarning {
                code: "dataset_prefix_overlap",
                message: format!(
                    "dataset prefix '{prefix}' also matches files of another record kind"
                ),
            });
        }
    }

    if config.evaluation.mode == EvaluationMode::Sequential && config.evaluation.threads > 0 {
        warnings.push(ConfigWarning {
            code: "evaluation_threads_ignored",
            message: format!(
                "evaluation.threads = {} has no effect while evaluation.mode = \"sequential\"",
                config.evaluation.threads
            ),
        });
    }

    warnings
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_owned()
}

fn default_person_prefix() -> String {
    DEFAULT_PERSON_PREFIX.to_owned()
}

fn default_interest_prefix() -> String {
    DEFAULT_INTEREST_PREFIX.to_owned()
}

fn default_knows_prefix() -> String {
    DEFAULT_KNOWS_PREFIX.to_owned()
}

fn normalize_required(input: String, fallback: fn() -> String) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_owned()
    }
}

fn normalize_config(mut config: TricrunchConfig) -> TricrunchConfig {
    let dataset = &mut config.dataset;
    dataset.person_prefix =
        normalize_required(std::mem::take(&mut dataset.person_prefix), default_person_prefix);
    dataset.interest_prefix = normalize_required(
        std::mem::take(&mut dataset.interest_prefix),
        default_interest_prefix,
    );
    dataset.knows_prefix =
        normalize_required(std::mem::take(&mut dataset.knows_prefix), default_knows_prefix);

    // Tab is a valid delimiter; only an empty value falls back.
    if dataset.delimiter.is_empty() {
        dataset.delimiter = default_delimiter();
    }

    config
}
