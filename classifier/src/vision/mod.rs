pub mod image_classifier;
pub mod processing_options;
pub mod vision_task;
