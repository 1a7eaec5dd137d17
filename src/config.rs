//! Configuration loading.
//!
//! Settings come from an optional TOML file; analysis settings can then be
//! overridden through the environment (see [`AnalysisConfig::with_env_overrides`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::AnalysisConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// OCR backend settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Directory containing the detection/recognition ONNX models.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub ocr: OcrSettings,
}

impl Settings {
    /// Load settings from an optional TOML file, then apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings: Settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };
        settings.analysis = settings.analysis.with_env_overrides();
        Ok(settings)
    }
}
