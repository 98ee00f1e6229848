use crate::{
    config::{ModelConfig, Validatable},
    error::ClassifierError,
    model_service::{ElementType, InputSpec, ModelBackend, ModelInput, RawScores, TensorLayout},
};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    tensor::TensorElementType,
    value::{TensorRef, ValueType},
};
use std::{path::Path, sync::Mutex};

pub struct OrtModelBackend {
    session: Mutex<Session>,
    input_spec: InputSpec,
    output_name: String,
    output_type: ElementType,
    output_classes: Option<usize>,
}

impl OrtModelBackend {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ClassifierError> {
        let path = model_config.get_path();
        let load_error = |reason: String| ClassifierError::ModelLoad {
            path: path.clone(),
            reason,
        };

        if !path.exists() {
            return Err(load_error("file not found".to_string()));
        }
        let session = load_session(&path).map_err(|e| load_error(e.to_string()))?;

        let input_spec = read_input_spec(&session, model_config)?;
        let (output_name, output_type) = read_output(&session)?;
        let output_classes = read_output_classes(&session);

        tracing::info!(
            "Loaded model {:?}: input {}x{} {:?} {:?}, {} output classes",
            path,
            input_spec.width,
            input_spec.height,
            input_spec.layout,
            input_spec.element_type,
            output_classes.map_or_else(|| "dynamic".to_string(), |n| n.to_string())
        );

        Ok(Self {
            session: Mutex::new(session),
            input_spec,
            output_name,
            output_type,
            output_classes,
        })
    }
}

fn load_session(path: &Path) -> Result<Session, ort::Error> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(path)
}

fn read_input_spec(
    session: &Session,
    model_config: &ModelConfig,
) -> Result<InputSpec, ClassifierError> {
    let input = session
        .inputs
        .first()
        .ok_or_else(|| ClassifierError::UnsupportedModel("model has no inputs".to_string()))?;

    match &input.input_type {
        ValueType::Tensor { ty, shape, .. } => {
            let shape: Vec<i64> = shape.iter().copied().collect();
            input_spec_from_shape(&shape, element_type(*ty, "input")?, model_config)
        }
        other => Err(ClassifierError::UnsupportedModel(format!(
            "input is not a tensor: {:?}",
            other
        ))),
    }
}

fn input_spec_from_shape(
    shape: &[i64],
    element_type: ElementType,
    model_config: &ModelConfig,
) -> Result<InputSpec, ClassifierError> {
    if shape.len() != 4 {
        return Err(ClassifierError::UnsupportedModel(format!(
            "expected a rank 4 image input, got shape {:?}",
            shape
        )));
    }

    let (layout, raw_height, raw_width) = if shape[3] == 3 {
        (TensorLayout::Nhwc, shape[1], shape[2])
    } else if shape[1] == 3 {
        (TensorLayout::Nchw, shape[2], shape[3])
    } else {
        return Err(ClassifierError::UnsupportedModel(format!(
            "cannot find a 3 channel axis in input shape {:?}",
            shape
        )));
    };

    let width = spatial_dim(raw_width, model_config.input_width, "width")?;
    let height = spatial_dim(raw_height, model_config.input_height, "height")?;

    Ok(InputSpec {
        width,
        height,
        layout,
        element_type,
    })
}

fn spatial_dim(
    declared: i64,
    configured: Option<u32>,
    name: &str,
) -> Result<u32, ClassifierError> {
    if declared > 0 {
        return u32::try_from(declared)
            .map_err(|_| ClassifierError::UnsupportedModel(format!("input {} too large", name)));
    }
    configured.ok_or_else(|| {
        ClassifierError::UnsupportedModel(format!(
            "input {} is dynamic, set model.input_{} in the configuration",
            name, name
        ))
    })
}

fn element_type(ty: TensorElementType, what: &str) -> Result<ElementType, ClassifierError> {
    match ty {
        TensorElementType::Uint8 => Ok(ElementType::Uint8),
        TensorElementType::Float32 => Ok(ElementType::Float32),
        other => Err(ClassifierError::UnsupportedModel(format!(
            "unsupported {} element type {:?}",
            what, other
        ))),
    }
}

fn read_output(session: &Session) -> Result<(String, ElementType), ClassifierError> {
    let output = session
        .outputs
        .first()
        .ok_or_else(|| ClassifierError::UnsupportedModel("model has no outputs".to_string()))?;

    match &output.output_type {
        ValueType::Tensor { ty, .. } => Ok((output.name.clone(), element_type(*ty, "output")?)),
        other => Err(ClassifierError::UnsupportedModel(format!(
            "output is not a tensor: {:?}",
            other
        ))),
    }
}

fn read_output_classes(session: &Session) -> Option<usize> {
    let output = session.outputs.first()?;
    let shape: Vec<i64> = output.output_type.tensor_shape()?.iter().copied().collect();
    output_classes_from_shape(&shape)
}

fn output_classes_from_shape(shape: &[i64]) -> Option<usize> {
    let classes = *shape.last()?;
    usize::try_from(classes).ok().filter(|n| *n > 0)
}

impl ModelBackend for OrtModelBackend {
    fn input_spec(&self) -> InputSpec {
        self.input_spec
    }

    fn output_classes(&self) -> Option<usize> {
        self.output_classes
    }

    fn forward(&self, input: &ModelInput) -> Result<RawScores, ClassifierError> {
        let mut session = self
            .session
            .lock()
            .map_err(|e| ClassifierError::Inference(format!("session mutex poisoned: {}", e)))?;

        let outputs = match input {
            ModelInput::Quantized(array) => {
                let tensor_ref = TensorRef::from_array_view(array.view())?;
                session.run(ort::inputs![tensor_ref])?
            }
            ModelInput::Float(array) => {
                let tensor_ref = TensorRef::from_array_view(array.view())?;
                session.run(ort::inputs![tensor_ref])?
            }
        };

        let output = &outputs[self.output_name.as_str()];
        let scores = match self.output_type {
            ElementType::Uint8 => {
                let (_, data) = output.try_extract_tensor::<u8>()?;
                RawScores::Quantized(data.to_vec())
            }
            ElementType::Float32 => {
                let (_, data) = output.try_extract_tensor::<f32>()?;
                RawScores::Float(data.to_vec())
            }
        };

        tracing::debug!("Model returned {} scores", scores.len());
        Ok(scores)
    }
}
