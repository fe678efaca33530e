pub mod local_engine;
pub mod model;
pub mod preprocess;
