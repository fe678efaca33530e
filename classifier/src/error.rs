use shared::RunningMode;

use crate::task::engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Config file error: {0}")]
    ConfigFile(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(
        "{operation} called but task was not initialized with the {required} mode (configured: {configured})"
    )]
    InvalidMode {
        operation: &'static str,
        required: RunningMode,
        configured: RunningMode,
    },
    #[error(
        "Input timestamp {timestamp} ms must be greater than the processed timestamp {last_timestamp} ms"
    )]
    OutOfOrderTimestamp { timestamp: u64, last_timestamp: u64 },
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Task is closed")]
    Closed,
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
