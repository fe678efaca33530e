pub mod classifier_options;
pub mod postprocess;
