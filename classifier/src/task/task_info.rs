use crate::config::base_options::BaseOptions;
use crate::processors::classifier_options::ClassifierOptions;

/// Graph that classifies an image into categories per model output head.
pub const IMAGE_CLASSIFIER_GRAPH_NAME: &str =
    "mediapipe.tasks.vision.image_classifier.ImageClassifierGraph";

/// Configuration payload handed to the engine at graph construction.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub base_options: BaseOptions,
    pub use_stream_mode: bool,
    pub classifier_options: Option<ClassifierOptions>,
}

#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub task_graph_name: String,
    pub input_streams: Vec<String>,
    pub output_streams: Vec<String>,
    pub enable_flow_limiting: bool,
    pub options: GraphOptions,
}

impl TaskInfo {
    /// Stream name bound to `tag` among the input streams.
    pub fn input_stream(&self, tag: &str) -> Option<&str> {
        find_stream(&self.input_streams, tag)
    }

    pub fn output_stream_index(&self, tag: &str) -> Option<usize> {
        self.output_streams
            .iter()
            .position(|stream| split_stream(stream).0 == tag)
    }
}

/// Splits a `TAG:name` stream declaration. Untagged streams have an empty tag.
pub fn split_stream(stream: &str) -> (&str, &str) {
    match stream.split_once(':') {
        Some((tag, name)) => (tag, name),
        None => ("", stream),
    }
}

fn find_stream<'a>(streams: &'a [String], tag: &str) -> Option<&'a str> {
    streams
        .iter()
        .map(|stream| split_stream(stream))
        .find(|(stream_tag, _)| *stream_tag == tag)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_tagged_and_untagged_streams() {
        assert_eq!(split_stream("IMAGE:image_in"), ("IMAGE", "image_in"));
        assert_eq!(split_stream("image_in"), ("", "image_in"));
    }
}
