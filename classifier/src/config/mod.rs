pub mod base_options;
pub mod loader;
pub mod options;
