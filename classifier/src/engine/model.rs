use std::collections::HashMap;

use ndarray::{Array1, ArrayView4};

use crate::task::engine::EngineError;

/// Shape and normalization of the tensor a model expects, NHWC with 3 channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub mean: f32,
    pub std: f32,
}

impl InputSpec {
    /// Input scaled to `[0, 1]`.
    pub fn unit_range(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mean: 0.0,
            std: 255.0,
        }
    }
}

/// Label metadata for one classification head.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadSpec {
    pub name: Option<String>,
    pub labels: Vec<String>,
    /// Display names keyed by locale, indexed like `labels`.
    pub display_names: HashMap<String, Vec<String>>,
}

impl HeadSpec {
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            labels: labels.into_iter().map(Into::into).collect(),
            display_names: HashMap::new(),
        }
    }
}

pub trait Model: Send {
    fn input_spec(&self) -> InputSpec;

    fn heads(&self) -> Vec<HeadSpec>;

    /// Runs inference on a `[1, height, width, 3]` tensor, one score vector per head.
    fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<Vec<Array1<f32>>, EngineError>;
}

/// Builds a model from the raw bytes of a model asset.
pub trait ModelLoader: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Model>, EngineError>;
}

impl<F> ModelLoader for F
where
    F: Fn(&[u8]) -> Result<Box<dyn Model>, EngineError> + Send + Sync,
{
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Model>, EngineError> {
        self(bytes)
    }
}
