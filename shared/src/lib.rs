use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// How a task is driven: single images, ordered video frames or a live stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunningMode {
    #[default]
    Image,
    Video,
    LiveStream,
}

impl RunningMode {
    /// Every mode except `Image` feeds the graph a timestamped stream.
    pub fn is_stream_mode(&self) -> bool {
        !matches!(self, RunningMode::Image)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub score: f32,
    pub index: i32,
    pub category_name: String,
    pub display_name: String,
}

impl Category {
    pub fn new(
        score: f32,
        index: i32,
        category_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            score,
            index,
            category_name: category_name.into(),
            display_name: display_name.into(),
        }
    }
}

/// Categories produced by one output head of the model, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifications {
    pub head_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_name: Option<String>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classifications: Vec<Classifications>,
    pub timestamp_ms: u64,
}

impl ClassificationResult {
    pub fn new(classifications: Vec<Classifications>, timestamp_ms: u64) -> Self {
        Self {
            classifications,
            timestamp_ms,
        }
    }

    /// Highest scoring category of the first head, if any survived post-processing.
    pub fn top_category(&self) -> Option<&Category> {
        self.classifications
            .first()
            .and_then(|head| head.categories.first())
    }
}
