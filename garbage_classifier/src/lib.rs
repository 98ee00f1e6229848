mod inference_service;
mod ort_service;
mod server;

pub mod category;
pub mod classifier;
pub mod config;
pub mod error;
pub mod labels;
pub mod model_service;
pub mod preprocessing;
pub mod recognition;

pub use category::{Category, CategoryIndex};
pub use classifier::GarbageClassifier;
pub use error::ClassifierError;
pub use ort_service::OrtModelBackend;
pub use preprocessing::Orientation;
pub use recognition::{ClassificationResult, Recognition};
pub use server::start_server;
