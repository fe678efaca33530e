use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, error, info};
use tokio::sync::mpsc;

use super::model::{HeadSpec, InputSpec, Model, ModelLoader};
use super::preprocess::prepare_input;
use crate::config::base_options::{Delegate, ModelAsset};
use crate::processors::classifier_options::ClassifierOptions;
use crate::processors::postprocess::classify_head;
use crate::task::engine::{Engine, EngineError, EngineHandle, PacketSink};
use crate::task::packet::{InputPackets, NormalizedRect, OutputPackets, Packet};
use crate::task::task_info::{IMAGE_CLASSIFIER_GRAPH_NAME, TaskInfo, split_stream};

const DEFAULT_QUEUE_CAPACITY: usize = 4;

/// In-process engine running classification graphs on the calling thread,
/// or on a dedicated worker thread for stream submissions.
pub struct LocalEngine {
    loader: Arc<dyn ModelLoader>,
    queue_capacity: usize,
}

impl LocalEngine {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Number of stream submissions that may wait for the worker before
    /// `submit_async` blocks.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity.max(1);
        self
    }

    fn read_model_asset(asset: &ModelAsset) -> Result<Vec<u8>, EngineError> {
        match asset {
            ModelAsset::Path(path) => std::fs::read(path).map_err(|e| EngineError::ModelAsset {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
            ModelAsset::Buffer(bytes) if bytes.is_empty() => Err(EngineError::ModelAsset {
                path: "<buffer>".to_string(),
                reason: "model buffer is empty".to_string(),
            }),
            ModelAsset::Buffer(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl Engine for LocalEngine {
    fn initialize(
        &self,
        task_info: &TaskInfo,
        sink: Option<PacketSink>,
    ) -> Result<Box<dyn EngineHandle>, EngineError> {
        if task_info.task_graph_name != IMAGE_CLASSIFIER_GRAPH_NAME {
            return Err(EngineError::Graph(format!(
                "unsupported task graph {}",
                task_info.task_graph_name
            )));
        }
        let base_options = &task_info.options.base_options;
        if base_options.delegate != Delegate::Cpu {
            return Err(EngineError::Graph(format!(
                "{:?} delegate is not supported by the local engine",
                base_options.delegate
            )));
        }

        let bytes = Self::read_model_asset(&base_options.model_asset)?;
        let model = self.loader.load(&bytes)?;
        let graph = ClassificationGraph::new(task_info, model)?;
        let graph = Arc::new(graph);

        let worker = match sink {
            Some(sink) => Some(Worker::spawn(graph.clone(), sink, self.queue_capacity)?),
            None => None,
        };
        info!(
            "Local engine started {} (stream mode: {}, flow limiting: {})",
            task_info.task_graph_name,
            task_info.options.use_stream_mode,
            task_info.enable_flow_limiting
        );

        Ok(Box::new(LocalHandle {
            graph,
            worker: Mutex::new(worker),
            closed: AtomicBool::new(false),
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum OutputKind {
    Classifications,
    Image,
}

struct ClassificationGraph {
    model: Mutex<Box<dyn Model>>,
    input_spec: InputSpec,
    heads: Vec<HeadSpec>,
    classifier_options: ClassifierOptions,
    image_stream: String,
    rect_stream: Option<String>,
    outputs: Vec<OutputKind>,
}

impl ClassificationGraph {
    fn new(task_info: &TaskInfo, model: Box<dyn Model>) -> Result<Self, EngineError> {
        let image_stream = task_info
            .input_stream("IMAGE")
            .ok_or_else(|| EngineError::Graph("missing IMAGE input stream".to_string()))?
            .to_string();
        let rect_stream = task_info.input_stream("NORM_RECT").map(str::to_string);

        let outputs = task_info
            .output_streams
            .iter()
            .map(|stream| match split_stream(stream).0 {
                "CLASSIFICATION_RESULT" | "CLASSIFICATIONS" => Ok(OutputKind::Classifications),
                "IMAGE" => Ok(OutputKind::Image),
                _ => Err(EngineError::Graph(format!(
                    "unsupported output stream {}",
                    stream
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let heads = model.heads();
        if heads.is_empty() {
            return Err(EngineError::Model("model declares no output heads".to_string()));
        }

        Ok(Self {
            input_spec: model.input_spec(),
            model: Mutex::new(model),
            heads,
            classifier_options: task_info.options.classifier_options.clone().unwrap_or_default(),
            image_stream,
            rect_stream,
            outputs,
        })
    }

    /// Like `run`, with panics from the model reported as `EngineError::Model`.
    fn run_guarded(
        &self,
        inputs: &InputPackets,
        timestamp_ms: u64,
    ) -> Result<OutputPackets, EngineError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.run(inputs, timestamp_ms))).unwrap_or_else(
            |_| {
                error!("Model panicked while processing timestamp {} ms", timestamp_ms);
                Err(EngineError::Model(format!(
                    "model panicked while processing timestamp {} ms",
                    timestamp_ms
                )))
            },
        )
    }

    fn run(&self, inputs: &InputPackets, timestamp_ms: u64) -> Result<OutputPackets, EngineError> {
        let image = match inputs.get(&self.image_stream) {
            Some(Packet::Image(image)) => image,
            Some(other) => {
                return Err(EngineError::InvalidPacket(format!(
                    "expected Image on stream {}, got {}",
                    self.image_stream,
                    other.type_name()
                )));
            }
            None => {
                return Err(EngineError::InvalidPacket(format!(
                    "no packet on stream {}",
                    self.image_stream
                )));
            }
        };
        let rect = match self.rect_stream.as_ref().and_then(|stream| inputs.get(stream)) {
            Some(Packet::NormalizedRect(rect)) => *rect,
            Some(other) => {
                return Err(EngineError::InvalidPacket(format!(
                    "expected NormalizedRect, got {}",
                    other.type_name()
                )));
            }
            None => NormalizedRect::default(),
        };

        let tensor = prepare_input(image.as_dynamic(), &rect, &self.input_spec)?;
        let scores = {
            let mut model = self.model.lock().unwrap_or_else(|e| e.into_inner());
            model.forward(tensor.view())?
        };
        if scores.len() != self.heads.len() {
            return Err(EngineError::Model(format!(
                "model produced {} heads, expected {}",
                scores.len(),
                self.heads.len()
            )));
        }

        let classifications = scores
            .iter()
            .zip(&self.heads)
            .enumerate()
            .map(|(index, (head_scores, head))| {
                classify_head(head_scores.view(), index, head, &self.classifier_options)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let packets = self
            .outputs
            .iter()
            .map(|kind| match kind {
                OutputKind::Classifications => Packet::Classifications(classifications.clone()),
                OutputKind::Image => Packet::Image(image.clone()),
            })
            .collect();
        Ok(OutputPackets::new(timestamp_ms, packets))
    }
}

struct Job {
    inputs: InputPackets,
    timestamp_ms: u64,
}

struct Worker {
    sender: mpsc::Sender<Job>,
    thread: JoinHandle<()>,
}

impl Worker {
    fn spawn(
        graph: Arc<ClassificationGraph>,
        sink: PacketSink,
        queue_capacity: usize,
    ) -> Result<Self, EngineError> {
        let (sender, mut receiver) = mpsc::channel::<Job>(queue_capacity);
        let thread = thread::Builder::new()
            .name("local-engine".to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    let output = graph.run_guarded(&job.inputs, job.timestamp_ms);
                    if panic::catch_unwind(AssertUnwindSafe(|| sink(output))).is_err() {
                        error!(
                            "Packet sink panicked while handling timestamp {} ms",
                            job.timestamp_ms
                        );
                    }
                }
                debug!("Local engine worker stopped");
            })
            .map_err(|e| EngineError::Graph(format!("failed to spawn worker: {}", e)))?;
        Ok(Self { sender, thread })
    }
}

struct LocalHandle {
    graph: Arc<ClassificationGraph>,
    worker: Mutex<Option<Worker>>,
    closed: AtomicBool,
}

impl EngineHandle for LocalHandle {
    fn submit_sync(
        &self,
        inputs: InputPackets,
        timestamp_ms: u64,
    ) -> Result<OutputPackets, EngineError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        self.graph.run_guarded(&inputs, timestamp_ms)
    }

    fn submit_async(&self, inputs: InputPackets, timestamp_ms: u64) -> Result<(), EngineError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Closed);
        }
        let sender = {
            let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
            match worker.as_ref() {
                Some(worker) => worker.sender.clone(),
                None => {
                    return Err(EngineError::Graph(
                        "graph was started without a packet sink".to_string(),
                    ));
                }
            }
        };
        sender
            .blocking_send(Job {
                inputs,
                timestamp_ms,
            })
            .map_err(|_| EngineError::Closed)
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(Worker { sender, thread }) = worker {
            drop(sender);
            // a listener closing its own task runs on the worker thread
            if thread.thread().id() != thread::current().id() && thread.join().is_err() {
                error!("Local engine worker panicked");
            }
        }
        info!("Local engine closed");
    }
}

impl Drop for LocalHandle {
    fn drop(&mut self) {
        self.close();
    }
}
