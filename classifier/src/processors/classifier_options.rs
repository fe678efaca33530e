use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, ClassifierResult};

pub const DEFAULT_DISPLAY_NAMES_LOCALE: &str = "en";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    pub display_names_locale: Option<String>,
    pub max_results: Option<usize>,
    pub score_threshold: Option<f32>,
    pub category_allowlist: Vec<String>,
    pub category_denylist: Vec<String>,
}

impl ClassifierOptions {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = Some(score_threshold);
        self
    }

    pub fn with_allowlist<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_allowlist = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_denylist<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_denylist = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_display_names_locale(mut self, locale: impl Into<String>) -> Self {
        self.display_names_locale = Some(locale.into());
        self
    }

    pub fn locale(&self) -> &str {
        self.display_names_locale
            .as_deref()
            .unwrap_or(DEFAULT_DISPLAY_NAMES_LOCALE)
    }

    pub fn validate(&self) -> ClassifierResult<()> {
        if self.max_results == Some(0) {
            return Err(ClassifierError::Configuration(
                "Invalid `max_results` option: value must be greater than 0".to_string(),
            ));
        }
        if let Some(threshold) = self.score_threshold {
            if threshold.is_nan() {
                return Err(ClassifierError::Configuration(
                    "Invalid `score_threshold` option: value must be a number".to_string(),
                ));
            }
        }
        if !self.category_allowlist.is_empty() && !self.category_denylist.is_empty() {
            return Err(ClassifierError::Configuration(
                "`category_allowlist` and `category_denylist` are mutually exclusive options"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
