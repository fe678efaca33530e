use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared::RunningMode;

use super::base_options::{BaseOptions, Delegate};
use super::options::{ImageClassifierOptions, ImageClassifierOptionsBuilder};
use crate::error::{ClassifierError, ClassifierResult};
use crate::processors::classifier_options::ClassifierOptions;

pub const CONFIG_PATH_ENV: &str = "CLASSIFIER_CONFIG";

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub running_mode: RunningMode,
    #[serde(default)]
    pub classifier: ClassifierOptions,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub asset_path: PathBuf,
    #[serde(default)]
    pub delegate: Delegate,
}

impl ClassifierConfig {
    pub fn load(path: impl AsRef<Path>) -> ClassifierResult<Self> {
        let path = path.as_ref();
        log::info!("Loading classifier config from {}", path.display());
        let config_str = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&config_str)
    }

    /// Loads the file named by the `CLASSIFIER_CONFIG` environment variable.
    pub fn from_env() -> ClassifierResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).map_err(|_| {
            ClassifierError::Configuration(format!("{} is not set", CONFIG_PATH_ENV))
        })?;
        Self::load(path)
    }

    pub fn from_yaml_str(config_str: &str) -> ClassifierResult<Self> {
        let config: ClassifierConfig = serde_yaml::from_str(config_str)?;
        Ok(config)
    }

    /// Options builder pre-filled from the file. Listeners are attached in code.
    pub fn to_options_builder(&self) -> ImageClassifierOptionsBuilder {
        ImageClassifierOptions::builder()
            .base_options(
                BaseOptions::from_path(&self.model.asset_path).with_delegate(self.model.delegate),
            )
            .running_mode(self.running_mode)
            .classifier_options(self.classifier.clone())
    }
}
