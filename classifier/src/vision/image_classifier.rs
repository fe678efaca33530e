use std::path::PathBuf;
use std::sync::Arc;

use shared::{ClassificationResult, RunningMode};

use super::processing_options::ImageProcessingOptions;
use super::vision_task::{Lifecycle, VisionTask};
use crate::config::base_options::BaseOptions;
use crate::config::options::ImageClassifierOptions;
use crate::error::{ClassifierError, ClassifierResult};
use crate::task::engine::{Engine, EngineError};
use crate::task::output_handler::{OutputHandler, OutputPacketConverter};
use crate::task::packet::{Image, OutputPackets, Packet};
use crate::task::task_info::{GraphOptions, IMAGE_CLASSIFIER_GRAPH_NAME, TaskInfo};
use crate::task::task_runner::TaskRunner;

const IMAGE_IN_STREAM_NAME: &str = "image_in";
const NORM_RECT_IN_STREAM_NAME: &str = "norm_rect_in";
const INPUT_STREAMS: [&str; 2] = ["IMAGE:image_in", "NORM_RECT:norm_rect_in"];
const OUTPUT_STREAMS: [&str; 2] = ["CLASSIFICATION_RESULT:classification_result_out", "IMAGE:image_out"];
const CLASSIFICATION_RESULT_OUT_STREAM_INDEX: usize = 0;
const IMAGE_OUT_STREAM_INDEX: usize = 1;

struct ClassificationConverter;

impl OutputPacketConverter<ClassificationResult> for ClassificationConverter {
    fn convert_to_task_result(
        &self,
        packets: &OutputPackets,
    ) -> ClassifierResult<ClassificationResult> {
        match packets.get(CLASSIFICATION_RESULT_OUT_STREAM_INDEX) {
            Some(Packet::Classifications(classifications)) => Ok(ClassificationResult::new(
                classifications.clone(),
                packets.timestamp_ms,
            )),
            other => Err(unexpected_packet("Classifications", other)),
        }
    }

    fn convert_to_task_input(&self, packets: &OutputPackets) -> ClassifierResult<Image> {
        match packets.get(IMAGE_OUT_STREAM_INDEX) {
            Some(Packet::Image(image)) => Ok(image.clone()),
            other => Err(unexpected_packet("Image", other)),
        }
    }
}

fn unexpected_packet(expected: &str, found: Option<&Packet>) -> ClassifierError {
    let found = found.map(Packet::type_name).unwrap_or("nothing");
    ClassifierError::Engine(EngineError::InvalidPacket(format!(
        "expected {} output packet, found {}",
        expected, found
    )))
}

/// Classifies images into a set of categories.
///
/// The running mode chosen at construction decides which entry point may be
/// used: [`classify`](Self::classify) for single images,
/// [`classify_for_video`](Self::classify_for_video) for decoded video frames
/// and [`classify_async`](Self::classify_async) for live input, whose results
/// are delivered to the result listener on an engine thread. Video and live
/// stream timestamps must be strictly increasing.
pub struct ImageClassifier {
    task: VisionTask<ClassificationResult>,
}

impl ImageClassifier {
    pub fn create_from_file(
        engine: &dyn Engine,
        model_path: impl Into<PathBuf>,
    ) -> ClassifierResult<Self> {
        let options = ImageClassifierOptions::builder()
            .base_options(BaseOptions::from_path(model_path))
            .build()?;
        Self::create_from_options(engine, options)
    }

    pub fn create_from_buffer(
        engine: &dyn Engine,
        model_buffer: impl Into<Arc<[u8]>>,
    ) -> ClassifierResult<Self> {
        let options = ImageClassifierOptions::builder()
            .base_options(BaseOptions::from_buffer(model_buffer))
            .build()?;
        Self::create_from_options(engine, options)
    }

    pub fn create_from_options(
        engine: &dyn Engine,
        options: ImageClassifierOptions,
    ) -> ClassifierResult<Self> {
        let ImageClassifierOptions {
            base_options,
            running_mode,
            classifier_options,
            result_listener,
            error_listener,
        } = options;

        let task_info = TaskInfo {
            task_graph_name: IMAGE_CLASSIFIER_GRAPH_NAME.to_string(),
            input_streams: INPUT_STREAMS.iter().map(|s| s.to_string()).collect(),
            output_streams: OUTPUT_STREAMS.iter().map(|s| s.to_string()).collect(),
            enable_flow_limiting: running_mode == RunningMode::LiveStream,
            options: GraphOptions {
                base_options,
                use_stream_mode: running_mode.is_stream_mode(),
                classifier_options,
            },
        };
        let handler = OutputHandler::new(ClassificationConverter)
            .with_result_listener(result_listener)
            .with_error_listener(error_listener);
        let runner = TaskRunner::create(engine, &task_info, handler)?;

        Ok(Self {
            task: VisionTask::new(
                runner,
                running_mode,
                IMAGE_IN_STREAM_NAME,
                NORM_RECT_IN_STREAM_NAME,
            ),
        })
    }

    pub fn classify(&self, image: &Image) -> ClassifierResult<ClassificationResult> {
        self.classify_with_options(image, &ImageProcessingOptions::default())
    }

    pub fn classify_with_options(
        &self,
        image: &Image,
        options: &ImageProcessingOptions,
    ) -> ClassifierResult<ClassificationResult> {
        self.task.process_image_data("classify", image, options)
    }

    pub fn classify_for_video(
        &self,
        image: &Image,
        timestamp_ms: u64,
    ) -> ClassifierResult<ClassificationResult> {
        self.classify_for_video_with_options(image, &ImageProcessingOptions::default(), timestamp_ms)
    }

    pub fn classify_for_video_with_options(
        &self,
        image: &Image,
        options: &ImageProcessingOptions,
        timestamp_ms: u64,
    ) -> ClassifierResult<ClassificationResult> {
        self.task
            .process_video_data("classify_for_video", image, options, timestamp_ms)
    }

    /// Submits a live stream frame and returns without waiting for the result.
    pub fn classify_async(&self, image: &Image, timestamp_ms: u64) -> ClassifierResult<()> {
        self.classify_async_with_options(image, &ImageProcessingOptions::default(), timestamp_ms)
    }

    pub fn classify_async_with_options(
        &self,
        image: &Image,
        options: &ImageProcessingOptions,
        timestamp_ms: u64,
    ) -> ClassifierResult<()> {
        self.task
            .send_live_stream_data("classify_async", image, options, timestamp_ms)
    }

    pub fn running_mode(&self) -> RunningMode {
        self.task.running_mode()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.task.lifecycle()
    }

    /// Last timestamp accepted in video or live stream mode.
    pub fn last_timestamp_ms(&self) -> Option<u64> {
        self.task.last_timestamp_ms()
    }

    pub fn close(&self) {
        self.task.close();
    }
}
