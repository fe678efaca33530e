use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};

use super::engine::{Engine, EngineError, EngineHandle, PacketSink};
use super::output_handler::OutputHandler;
use super::packet::{InputPackets, OutputPackets};
use super::task_info::TaskInfo;
use crate::error::{ClassifierError, ClassifierResult};

/// Owns an engine handle and routes its outputs through an `OutputHandler`.
pub struct TaskRunner<R> {
    handle: Box<dyn EngineHandle>,
    output_handler: Arc<OutputHandler<R>>,
    closed: AtomicBool,
}

impl<R: 'static> TaskRunner<R> {
    pub fn create(
        engine: &dyn Engine,
        task_info: &TaskInfo,
        output_handler: OutputHandler<R>,
    ) -> ClassifierResult<Self> {
        let output_handler = Arc::new(output_handler);
        let sink: Option<PacketSink> = if output_handler.has_result_listener() {
            let handler = output_handler.clone();
            Some(Arc::new(move |output: Result<OutputPackets, EngineError>| {
                handler.run(output)
            }))
        } else {
            None
        };

        let handle = engine.initialize(task_info, sink)?;
        info!(
            "Task runner created for {} with {} input and {} output streams",
            task_info.task_graph_name,
            task_info.input_streams.len(),
            task_info.output_streams.len()
        );
        Ok(Self {
            handle,
            output_handler,
            closed: AtomicBool::new(false),
        })
    }

    /// Runs the inputs synchronously and converts the outputs.
    pub fn process(&self, inputs: InputPackets, timestamp_ms: u64) -> ClassifierResult<R> {
        if self.is_closed() {
            return Err(ClassifierError::Closed);
        }
        debug!("Processing packets at {} ms", timestamp_ms);
        let packets = self
            .handle
            .submit_sync(inputs, timestamp_ms)
            .map_err(closed_or_engine)?;
        self.output_handler.convert(&packets)
    }

    /// Hands the inputs to the engine; the result reaches the result listener.
    pub fn send(&self, inputs: InputPackets, timestamp_ms: u64) -> ClassifierResult<()> {
        if self.is_closed() {
            return Err(ClassifierError::Closed);
        }
        debug!("Sending packets at {} ms", timestamp_ms);
        self.handle
            .submit_async(inputs, timestamp_ms)
            .map_err(closed_or_engine)?;
        Ok(())
    }

    pub fn report_error(&self, error: ClassifierError) {
        self.output_handler.report_error(error);
    }
}

impl<R> TaskRunner<R> {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Releases the engine handle. Returns false if it was already released.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.handle.close();
        true
    }
}

/// A handle closed underneath a call reports the task as closed.
fn closed_or_engine(error: EngineError) -> ClassifierError {
    match error {
        EngineError::Closed => ClassifierError::Closed,
        other => ClassifierError::Engine(other),
    }
}

impl<R> Drop for TaskRunner<R> {
    fn drop(&mut self) {
        self.close();
    }
}
