//! Image classification task with image, video and live stream running modes.
//!
//! An [`ImageClassifier`] is created from [`ImageClassifierOptions`] against an
//! [`Engine`]. The crate ships [`LocalEngine`], which runs a [`Model`] in
//! process; other engines plug in through the same trait.

pub mod config;
pub mod engine;
pub mod error;
pub mod processors;
pub mod task;
pub mod vision;

pub use config::base_options::{BaseOptions, Delegate, ModelAsset};
pub use config::loader::ClassifierConfig;
pub use config::options::{ImageClassifierOptions, ImageClassifierOptionsBuilder};
pub use engine::local_engine::LocalEngine;
pub use engine::model::{HeadSpec, InputSpec, Model, ModelLoader};
pub use error::{ClassifierError, ClassifierResult};
pub use processors::classifier_options::ClassifierOptions;
pub use task::engine::{Engine, EngineError, EngineHandle, PacketSink};
pub use task::packet::Image;
pub use vision::image_classifier::ImageClassifier;
pub use vision::processing_options::{ImageProcessingOptions, RectF};
pub use vision::vision_task::Lifecycle;

pub use shared::{Category, ClassificationResult, Classifications, RunningMode};
