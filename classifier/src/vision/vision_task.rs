use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use shared::RunningMode;
use uuid::Uuid;

use super::processing_options::ImageProcessingOptions;
use crate::error::{ClassifierError, ClassifierResult};
use crate::task::packet::{Image, InputPackets, Packet};
use crate::task::task_runner::TaskRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Configured,
    Active,
    Closed,
}

#[derive(Debug)]
struct TaskState {
    lifecycle: Lifecycle,
    last_timestamp_ms: Option<u64>,
}

impl TaskState {
    fn ensure_open(&self) -> ClassifierResult<()> {
        match self.lifecycle {
            Lifecycle::Closed => Err(ClassifierError::Closed),
            _ => Ok(()),
        }
    }

    fn check_timestamp(&self, timestamp_ms: u64) -> ClassifierResult<()> {
        match self.last_timestamp_ms {
            Some(last_timestamp) if timestamp_ms <= last_timestamp => {
                Err(ClassifierError::OutOfOrderTimestamp {
                    timestamp: timestamp_ms,
                    last_timestamp,
                })
            }
            _ => Ok(()),
        }
    }

    fn accept(&mut self, timestamp_ms: Option<u64>) {
        if let Some(timestamp_ms) = timestamp_ms {
            self.last_timestamp_ms = Some(timestamp_ms);
        }
        // a close that raced with the dispatch wins
        if self.lifecycle == Lifecycle::Configured {
            self.lifecycle = Lifecycle::Active;
        }
    }
}

/// Running-mode and timestamp bookkeeping shared by vision tasks.
///
/// Every call is first matched against the configured running mode, then
/// rejected if the task is closed, then (for video and live stream input)
/// checked against the last accepted timestamp. The watermark only moves once
/// the engine has accepted the input.
///
/// Submissions are serialized by `submission`, held from the timestamp check
/// until the watermark is updated. `state` is only held for short reads and
/// writes, never across an engine call, so listeners running on the engine
/// thread may close the task or read its state while a submitter is blocked
/// on engine backpressure.
pub struct VisionTask<R> {
    id: Uuid,
    runner: TaskRunner<R>,
    running_mode: RunningMode,
    image_stream: String,
    norm_rect_stream: String,
    submission: Mutex<()>,
    state: Mutex<TaskState>,
}

impl<R: 'static> VisionTask<R> {
    pub fn new(
        runner: TaskRunner<R>,
        running_mode: RunningMode,
        image_stream: impl Into<String>,
        norm_rect_stream: impl Into<String>,
    ) -> Self {
        let id = Uuid::new_v4();
        info!("Vision task {} created in {} mode", id, running_mode);
        Self {
            id,
            runner,
            running_mode,
            image_stream: image_stream.into(),
            norm_rect_stream: norm_rect_stream.into(),
            submission: Mutex::new(()),
            state: Mutex::new(TaskState {
                lifecycle: Lifecycle::Configured,
                last_timestamp_ms: None,
            }),
        }
    }

    pub fn process_image_data(
        &self,
        operation: &'static str,
        image: &Image,
        options: &ImageProcessingOptions,
    ) -> ClassifierResult<R> {
        self.check_mode(operation, RunningMode::Image)?;
        let _submission = self.lock_submission();
        self.lock_state().ensure_open()?;
        let inputs = self.build_inputs(image, options)?;
        let result = self.runner.process(inputs, 0)?;
        self.lock_state().accept(None);
        Ok(result)
    }

    pub fn process_video_data(
        &self,
        operation: &'static str,
        image: &Image,
        options: &ImageProcessingOptions,
        timestamp_ms: u64,
    ) -> ClassifierResult<R> {
        self.check_mode(operation, RunningMode::Video)?;
        let _submission = self.lock_submission();
        self.check_open_and_timestamp(timestamp_ms)?;
        let inputs = self.build_inputs(image, options)?;
        let result = self.runner.process(inputs, timestamp_ms)?;
        self.lock_state().accept(Some(timestamp_ms));
        Ok(result)
    }

    /// Submits live stream input. Engine failures go to the error listener.
    pub fn send_live_stream_data(
        &self,
        operation: &'static str,
        image: &Image,
        options: &ImageProcessingOptions,
        timestamp_ms: u64,
    ) -> ClassifierResult<()> {
        self.check_mode(operation, RunningMode::LiveStream)?;
        let _submission = self.lock_submission();
        self.check_open_and_timestamp(timestamp_ms)?;
        let inputs = self.build_inputs(image, options)?;
        // may block on engine backpressure; the state lock is not held here
        match self.runner.send(inputs, timestamp_ms) {
            Ok(()) => self.lock_state().accept(Some(timestamp_ms)),
            Err(e @ ClassifierError::Engine(_)) => {
                warn!(
                    "Task {} failed to submit input at {} ms: {}",
                    self.id, timestamp_ms, e
                );
                self.runner.report_error(e);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

impl<R> VisionTask<R> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn running_mode(&self) -> RunningMode {
        self.running_mode
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lock_state().lifecycle
    }

    pub fn last_timestamp_ms(&self) -> Option<u64> {
        self.lock_state().last_timestamp_ms
    }

    /// Releases the engine exactly once. Later calls are no-ops.
    ///
    /// Does not wait for an in-flight submission, so it may be called from a
    /// result listener.
    pub fn close(&self) {
        {
            let mut state = self.lock_state();
            if state.lifecycle == Lifecycle::Closed {
                return;
            }
            state.lifecycle = Lifecycle::Closed;
        }
        if self.runner.close() {
            info!("Vision task {} closed", self.id);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_submission(&self) -> MutexGuard<'_, ()> {
        self.submission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_open_and_timestamp(&self, timestamp_ms: u64) -> ClassifierResult<()> {
        let state = self.lock_state();
        state.ensure_open()?;
        self.guard_timestamp(&state, timestamp_ms)
    }

    fn check_mode(&self, operation: &'static str, required: RunningMode) -> ClassifierResult<()> {
        if self.running_mode == required {
            return Ok(());
        }
        warn!(
            "Task {} rejected {}: configured for {} mode",
            self.id, operation, self.running_mode
        );
        Err(ClassifierError::InvalidMode {
            operation,
            required,
            configured: self.running_mode,
        })
    }

    fn guard_timestamp(&self, state: &TaskState, timestamp_ms: u64) -> ClassifierResult<()> {
        state.check_timestamp(timestamp_ms).inspect_err(|e| {
            warn!("Task {} rejected input: {}", self.id, e);
        })
    }

    fn build_inputs(
        &self,
        image: &Image,
        options: &ImageProcessingOptions,
    ) -> ClassifierResult<InputPackets> {
        let rect = options.to_normalized_rect()?;
        debug!(
            "Task {} input {}x{} with region {:?}",
            self.id,
            image.width(),
            image.height(),
            rect
        );
        let mut inputs = InputPackets::new();
        inputs.insert(self.image_stream.clone(), Packet::Image(image.clone()));
        inputs.insert(self.norm_rect_stream.clone(), Packet::NormalizedRect(rect));
        Ok(inputs)
    }
}

impl<R> Drop for VisionTask<R> {
    fn drop(&mut self) {
        self.close();
    }
}
