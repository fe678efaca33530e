use std::fmt;
use std::sync::Arc;

use shared::{ClassificationResult, RunningMode};

use super::base_options::BaseOptions;
use crate::error::{ClassifierError, ClassifierResult};
use crate::processors::classifier_options::ClassifierOptions;
use crate::task::output_handler::{ErrorListener, ResultListener};
use crate::task::packet::Image;

/// Validated configuration of an image classifier. Built with
/// [`ImageClassifierOptions::builder`].
#[derive(Clone)]
pub struct ImageClassifierOptions {
    pub(crate) base_options: BaseOptions,
    pub(crate) running_mode: RunningMode,
    pub(crate) classifier_options: Option<ClassifierOptions>,
    pub(crate) result_listener: Option<ResultListener<ClassificationResult>>,
    pub(crate) error_listener: Option<ErrorListener>,
}

impl ImageClassifierOptions {
    pub fn builder() -> ImageClassifierOptionsBuilder {
        ImageClassifierOptionsBuilder::default()
    }

    pub fn base_options(&self) -> &BaseOptions {
        &self.base_options
    }

    pub fn running_mode(&self) -> RunningMode {
        self.running_mode
    }

    pub fn classifier_options(&self) -> Option<&ClassifierOptions> {
        self.classifier_options.as_ref()
    }

    pub fn has_result_listener(&self) -> bool {
        self.result_listener.is_some()
    }

    pub fn has_error_listener(&self) -> bool {
        self.error_listener.is_some()
    }
}

impl fmt::Debug for ImageClassifierOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageClassifierOptions")
            .field("base_options", &self.base_options)
            .field("running_mode", &self.running_mode)
            .field("classifier_options", &self.classifier_options)
            .field("result_listener", &self.result_listener.is_some())
            .field("error_listener", &self.error_listener.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct ImageClassifierOptionsBuilder {
    base_options: Option<BaseOptions>,
    running_mode: RunningMode,
    classifier_options: Option<ClassifierOptions>,
    result_listener: Option<ResultListener<ClassificationResult>>,
    error_listener: Option<ErrorListener>,
}

impl ImageClassifierOptionsBuilder {
    pub fn base_options(mut self, base_options: BaseOptions) -> Self {
        self.base_options = Some(base_options);
        self
    }

    pub fn running_mode(mut self, running_mode: RunningMode) -> Self {
        self.running_mode = running_mode;
        self
    }

    pub fn classifier_options(mut self, classifier_options: ClassifierOptions) -> Self {
        self.classifier_options = Some(classifier_options);
        self
    }

    pub fn result_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(ClassificationResult, &Image) + Send + Sync + 'static,
    {
        self.result_listener = Some(Arc::new(listener));
        self
    }

    pub fn error_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(ClassifierError) + Send + Sync + 'static,
    {
        self.error_listener = Some(Arc::new(listener));
        self
    }

    pub fn build(self) -> ClassifierResult<ImageClassifierOptions> {
        let base_options = self.base_options.ok_or_else(|| {
            ClassifierError::Configuration("base options with a model asset are required".to_string())
        })?;

        match (self.running_mode, &self.result_listener) {
            (RunningMode::LiveStream, None) => {
                return Err(ClassifierError::Configuration(
                    "The image classifier is in the live stream mode, a user-defined result \
                     listener must be provided"
                        .to_string(),
                ));
            }
            (RunningMode::Image | RunningMode::Video, Some(_)) => {
                return Err(ClassifierError::Configuration(
                    "The image classifier is in the image or video mode, a user-defined result \
                     listener shouldn't be provided"
                        .to_string(),
                ));
            }
            _ => {}
        }

        if let Some(classifier_options) = &self.classifier_options {
            classifier_options.validate()?;
        }

        Ok(ImageClassifierOptions {
            base_options,
            running_mode: self.running_mode,
            classifier_options: self.classifier_options,
            result_listener: self.result_listener,
            error_listener: self.error_listener,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ImageClassifierOptionsBuilder {
        ImageClassifierOptions::builder().base_options(BaseOptions::from_path("model.tflite"))
    }

    #[test]
    fn defaults_to_image_mode() {
        let options = builder().build().unwrap();
        assert_eq!(options.running_mode(), RunningMode::Image);
        assert!(!options.has_result_listener());
    }

    #[test]
    fn rejects_result_listener_outside_live_stream() {
        for mode in [RunningMode::Image, RunningMode::Video] {
            let err = builder()
                .running_mode(mode)
                .result_listener(|_, _| {})
                .build()
                .unwrap_err();
            assert!(
                matches!(&err, ClassifierError::Configuration(msg) if msg.contains("shouldn't be provided")),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn requires_result_listener_in_live_stream() {
        let err = builder()
            .running_mode(RunningMode::LiveStream)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Configuration(msg) if msg.contains("must be provided")));
    }

    #[test]
    fn accepts_every_valid_combination() {
        assert!(builder().running_mode(RunningMode::Video).build().is_ok());
        assert!(builder()
            .running_mode(RunningMode::Video)
            .error_listener(|_| {})
            .build()
            .is_ok());
        let options = builder()
            .running_mode(RunningMode::LiveStream)
            .result_listener(|_, _| {})
            .build()
            .unwrap();
        assert!(options.has_result_listener());
        assert!(!options.has_error_listener());
    }

    #[test]
    fn requires_base_options() {
        let err = ImageClassifierOptions::builder().build().unwrap_err();
        assert!(matches!(err, ClassifierError::Configuration(_)));
    }

    #[test]
    fn validates_classifier_options() {
        let err = builder()
            .classifier_options(ClassifierOptions::default().with_max_results(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Configuration(msg) if msg.contains("max_results")));
    }
}
