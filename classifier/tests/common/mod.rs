#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use classifier::task::packet::{InputPackets, OutputPackets, Packet};
use classifier::task::task_info::TaskInfo;
use classifier::{
    BaseOptions, Category, Classifications, Engine, EngineError, EngineHandle, HeadSpec, Image,
    ImageClassifier, ImageClassifierOptions, InputSpec, LocalEngine, Model, PacketSink,
    RunningMode,
};
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::{Array1, ArrayView4};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_image(width: u32, height: u32) -> Image {
    Image::new(DynamicImage::new_rgb8(width, height))
}

/// Black left half, white right half.
pub fn split_image(width: u32, height: u32) -> Image {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    Image::new(DynamicImage::ImageRgb8(img))
}

pub fn model_bytes() -> Vec<u8> {
    b"fake-model".to_vec()
}

/// Always scores `cat`, `dog` and `bird` the same way.
pub struct ConstantModel;

impl Model for ConstantModel {
    fn input_spec(&self) -> InputSpec {
        InputSpec::unit_range(4, 4)
    }

    fn heads(&self) -> Vec<HeadSpec> {
        let mut head = HeadSpec::new("animals", ["cat", "dog", "bird"]);
        head.display_names.insert(
            "fr".to_string(),
            vec!["chat".to_string(), "chien".to_string(), "oiseau".to_string()],
        );
        vec![head]
    }

    fn forward(&mut self, _input: ArrayView4<'_, f32>) -> Result<Vec<Array1<f32>>, EngineError> {
        Ok(vec![Array1::from(vec![0.1, 0.7, 0.2])])
    }
}

/// Scores `dark` and `bright` from the mean intensity of the input tensor.
pub struct BrightnessModel;

impl Model for BrightnessModel {
    fn input_spec(&self) -> InputSpec {
        InputSpec::unit_range(2, 2)
    }

    fn heads(&self) -> Vec<HeadSpec> {
        vec![HeadSpec::new("brightness", ["dark", "bright"])]
    }

    fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<Vec<Array1<f32>>, EngineError> {
        let mean = input.mean().unwrap_or(0.0);
        Ok(vec![Array1::from(vec![1.0 - mean, mean])])
    }
}

/// Fails every inference.
pub struct FailingModel;

impl Model for FailingModel {
    fn input_spec(&self) -> InputSpec {
        InputSpec::unit_range(2, 2)
    }

    fn heads(&self) -> Vec<HeadSpec> {
        vec![HeadSpec::new("animals", ["cat"])]
    }

    fn forward(&mut self, _input: ArrayView4<'_, f32>) -> Result<Vec<Array1<f32>>, EngineError> {
        Err(EngineError::Model("inference failed".to_string()))
    }
}

/// `ConstantModel` that takes `delay` per inference.
pub struct SlowModel {
    pub delay: Duration,
}

impl Model for SlowModel {
    fn input_spec(&self) -> InputSpec {
        ConstantModel.input_spec()
    }

    fn heads(&self) -> Vec<HeadSpec> {
        ConstantModel.heads()
    }

    fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<Vec<Array1<f32>>, EngineError> {
        std::thread::sleep(self.delay);
        ConstantModel.forward(input)
    }
}

/// `ConstantModel` that panics on its first inference.
#[derive(Default)]
pub struct PanicOnceModel {
    panicked: bool,
}

impl Model for PanicOnceModel {
    fn input_spec(&self) -> InputSpec {
        ConstantModel.input_spec()
    }

    fn heads(&self) -> Vec<HeadSpec> {
        ConstantModel.heads()
    }

    fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<Vec<Array1<f32>>, EngineError> {
        if !self.panicked {
            self.panicked = true;
            panic!("model blew up");
        }
        ConstantModel.forward(input)
    }
}

pub fn slow_engine(delay: Duration, queue_capacity: usize) -> LocalEngine {
    LocalEngine::new(move |_bytes: &[u8]| Ok(Box::new(SlowModel { delay }) as Box<dyn Model>))
        .with_queue_capacity(queue_capacity)
}

pub fn panic_once_engine() -> LocalEngine {
    LocalEngine::new(|_bytes: &[u8]| Ok(Box::new(PanicOnceModel::default()) as Box<dyn Model>))
}

pub fn constant_engine() -> LocalEngine {
    LocalEngine::new(|_bytes: &[u8]| Ok(Box::new(ConstantModel) as Box<dyn Model>))
}

pub fn brightness_engine() -> LocalEngine {
    LocalEngine::new(|_bytes: &[u8]| Ok(Box::new(BrightnessModel) as Box<dyn Model>))
}

pub fn failing_engine() -> LocalEngine {
    LocalEngine::new(|_bytes: &[u8]| Ok(Box::new(FailingModel) as Box<dyn Model>))
}

/// What a `RecordingEngine` has seen.
#[derive(Default)]
pub struct EngineLog {
    pub initialized: AtomicUsize,
    pub closed: AtomicUsize,
    pub submitted: Mutex<Vec<u64>>,
    pub last_task_info: Mutex<Option<TaskInfo>>,
}

impl EngineLog {
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<u64> {
        self.submitted.lock().unwrap().clone()
    }
}

/// Engine double that answers every submission with a fixed result, on the
/// calling thread, and can be told to reject submissions.
#[derive(Default)]
pub struct RecordingEngine {
    log: Arc<EngineLog>,
    reject: Arc<AtomicBool>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Arc<EngineLog> {
        self.log.clone()
    }

    pub fn reject_submissions(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

impl Engine for RecordingEngine {
    fn initialize(
        &self,
        task_info: &TaskInfo,
        sink: Option<PacketSink>,
    ) -> Result<Box<dyn EngineHandle>, EngineError> {
        self.log.initialized.fetch_add(1, Ordering::SeqCst);
        *self.log.last_task_info.lock().unwrap() = Some(task_info.clone());
        let image_stream = task_info
            .input_stream("IMAGE")
            .ok_or_else(|| EngineError::Graph("missing IMAGE stream".to_string()))?
            .to_string();
        Ok(Box::new(RecordingHandle {
            log: self.log.clone(),
            reject: self.reject.clone(),
            sink,
            image_stream,
        }))
    }
}

struct RecordingHandle {
    log: Arc<EngineLog>,
    reject: Arc<AtomicBool>,
    sink: Option<PacketSink>,
    image_stream: String,
}

impl RecordingHandle {
    fn outputs(&self, inputs: &InputPackets, timestamp_ms: u64) -> Result<OutputPackets, EngineError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(EngineError::Graph("submission rejected".to_string()));
        }
        let image = match inputs.get(&self.image_stream) {
            Some(Packet::Image(image)) => image.clone(),
            _ => return Err(EngineError::InvalidPacket("no image".to_string())),
        };
        self.log.submitted.lock().unwrap().push(timestamp_ms);
        let classifications = Classifications {
            head_index: 0,
            head_name: None,
            categories: vec![Category::new(0.9, 0, "cat", "")],
        };
        Ok(OutputPackets::new(
            timestamp_ms,
            vec![Packet::Classifications(vec![classifications]), Packet::Image(image)],
        ))
    }
}

impl EngineHandle for RecordingHandle {
    fn submit_sync(
        &self,
        inputs: InputPackets,
        timestamp_ms: u64,
    ) -> Result<OutputPackets, EngineError> {
        self.outputs(&inputs, timestamp_ms)
    }

    fn submit_async(&self, inputs: InputPackets, timestamp_ms: u64) -> Result<(), EngineError> {
        let output = self.outputs(&inputs, timestamp_ms)?;
        match &self.sink {
            Some(sink) => {
                sink(Ok(output));
                Ok(())
            }
            None => Err(EngineError::Graph("no packet sink".to_string())),
        }
    }

    fn close(&self) {
        self.log.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Classifier in `mode` backed by `engine`, with a no-op listener for live streams.
pub fn classifier_for(engine: &dyn Engine, mode: RunningMode) -> ImageClassifier {
    let mut builder = ImageClassifierOptions::builder()
        .base_options(BaseOptions::from_buffer(model_bytes()))
        .running_mode(mode);
    if mode == RunningMode::LiveStream {
        builder = builder.result_listener(|_, _| {});
    }
    let options = builder.build().expect("valid options");
    ImageClassifier::create_from_options(engine, options).expect("classifier")
}
