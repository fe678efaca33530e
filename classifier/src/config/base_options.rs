use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Where the model file comes from.
#[derive(Clone)]
pub enum ModelAsset {
    Path(PathBuf),
    Buffer(Arc<[u8]>),
}

impl fmt::Debug for ModelAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelAsset::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ModelAsset::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delegate {
    #[default]
    Cpu,
    Gpu,
}

#[derive(Debug, Clone)]
pub struct BaseOptions {
    pub model_asset: ModelAsset,
    pub delegate: Delegate,
}

impl BaseOptions {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            model_asset: ModelAsset::Path(path.into()),
            delegate: Delegate::default(),
        }
    }

    pub fn from_buffer(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            model_asset: ModelAsset::Buffer(bytes.into()),
            delegate: Delegate::default(),
        }
    }

    pub fn with_delegate(mut self, delegate: Delegate) -> Self {
        self.delegate = delegate;
        self
    }
}
