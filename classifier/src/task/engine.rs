use std::sync::Arc;

use super::packet::{InputPackets, OutputPackets};
use super::task_info::TaskInfo;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Unable to open model asset {path}: {reason}")]
    ModelAsset { path: String, reason: String },
    #[error("Model error: {0}")]
    Model(String),
    #[error("Graph error: {0}")]
    Graph(String),
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),
    #[error("Engine handle is closed")]
    Closed,
}

/// Receives the outputs of stream-mode submissions, on an engine-owned thread.
pub type PacketSink = Arc<dyn Fn(Result<OutputPackets, EngineError>) + Send + Sync>;

/// Execution engine that runs a task graph.
pub trait Engine {
    /// Builds and starts the graph described by `task_info`.
    ///
    /// `sink` is only provided for tasks that submit asynchronously; every
    /// accepted `submit_async` call must eventually be answered through it.
    fn initialize(
        &self,
        task_info: &TaskInfo,
        sink: Option<PacketSink>,
    ) -> Result<Box<dyn EngineHandle>, EngineError>;
}

/// A running graph instance.
pub trait EngineHandle: Send + Sync {
    /// Runs the inputs through the graph and waits for the outputs.
    fn submit_sync(
        &self,
        inputs: InputPackets,
        timestamp_ms: u64,
    ) -> Result<OutputPackets, EngineError>;

    /// Queues the inputs; the outputs are delivered to the packet sink.
    fn submit_async(&self, inputs: InputPackets, timestamp_ms: u64) -> Result<(), EngineError>;

    /// Releases the graph. Calling it more than once has no further effect.
    fn close(&self);
}
