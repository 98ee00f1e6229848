use crate::error::ClassifierError;
use ndarray::Array4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Uint8,
    Float32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
    pub element_type: ElementType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelInput {
    Quantized(Array4<u8>),
    Float(Array4<f32>),
}

impl ModelInput {
    pub fn shape(&self) -> &[usize] {
        match self {
            ModelInput::Quantized(array) => array.shape(),
            ModelInput::Float(array) => array.shape(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawScores {
    Quantized(Vec<u8>),
    Float(Vec<f32>),
}

impl RawScores {
    pub fn len(&self) -> usize {
        match self {
            RawScores::Quantized(scores) => scores.len(),
            RawScores::Float(scores) => scores.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait ModelBackend: Send + Sync + 'static {
    fn input_spec(&self) -> InputSpec;

    fn output_classes(&self) -> Option<usize>;

    fn forward(&self, input: &ModelInput) -> Result<RawScores, ClassifierError>;
}
