use std::path::PathBuf;
use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to load model {path:?}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
    #[error("Failed to load labels {path:?}: {reason}")]
    LabelsLoad { path: PathBuf, reason: String },
    #[error("Model produces {outputs} scores but {labels} labels were loaded")]
    LabelCountMismatch { labels: usize, outputs: usize },
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("Error decoding image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("Orientation must be a multiple of 90 degrees, got {0}")]
    InvalidOrientation(i32),
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl From<ort::Error> for ClassifierError {
    fn from(e: ort::Error) -> Self {
        ClassifierError::Inference(e.to_string())
    }
}

impl From<ClassifierError> for Status {
    fn from(e: ClassifierError) -> Self {
        match e {
            ClassifierError::ImageDecode(_)
            | ClassifierError::EmptyImage { .. }
            | ClassifierError::InvalidOrientation(_) => Status::invalid_argument(e.to_string()),
            _ => Status::internal(e.to_string()),
        }
    }
}
