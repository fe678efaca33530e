use std::sync::Arc;

use log::{debug, error};

use super::engine::EngineError;
use super::packet::{Image, OutputPackets};
use crate::error::{ClassifierError, ClassifierResult};

/// Called with each stream-mode result and the input image it was computed from.
pub type ResultListener<R> = Arc<dyn Fn(R, &Image) + Send + Sync>;

/// Called with errors raised while processing stream-mode input.
pub type ErrorListener = Arc<dyn Fn(ClassifierError) + Send + Sync>;

/// Maps the engine's output streams onto a task's typed result.
pub trait OutputPacketConverter<R>: Send + Sync {
    fn convert_to_task_result(&self, packets: &OutputPackets) -> ClassifierResult<R>;

    fn convert_to_task_input(&self, packets: &OutputPackets) -> ClassifierResult<Image>;
}

pub struct OutputHandler<R> {
    converter: Box<dyn OutputPacketConverter<R>>,
    result_listener: Option<ResultListener<R>>,
    error_listener: Option<ErrorListener>,
}

impl<R> OutputHandler<R> {
    pub fn new(converter: impl OutputPacketConverter<R> + 'static) -> Self {
        Self {
            converter: Box::new(converter),
            result_listener: None,
            error_listener: None,
        }
    }

    pub fn with_result_listener(mut self, listener: Option<ResultListener<R>>) -> Self {
        self.result_listener = listener;
        self
    }

    pub fn with_error_listener(mut self, listener: Option<ErrorListener>) -> Self {
        self.error_listener = listener;
        self
    }

    pub fn has_result_listener(&self) -> bool {
        self.result_listener.is_some()
    }

    pub fn convert(&self, packets: &OutputPackets) -> ClassifierResult<R> {
        self.converter.convert_to_task_result(packets)
    }

    /// Delivers one stream-mode output to the listeners.
    pub fn run(&self, output: Result<OutputPackets, EngineError>) {
        let delivered = output.map_err(ClassifierError::from).and_then(|packets| {
            let result = self.converter.convert_to_task_result(&packets)?;
            let input = self.converter.convert_to_task_input(&packets)?;
            Ok((result, input))
        });
        match delivered {
            Ok((result, input)) => match &self.result_listener {
                Some(listener) => listener(result, &input),
                None => debug!("Dropping stream result, no result listener registered"),
            },
            Err(e) => self.report_error(e),
        }
    }

    pub fn report_error(&self, error: ClassifierError) {
        match &self.error_listener {
            Some(listener) => listener(error),
            None => error!("Stream processing failed: {}", error),
        }
    }
}
