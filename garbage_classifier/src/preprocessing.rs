use crate::{
    error::ClassifierError,
    model_service::{ElementType, InputSpec, ModelInput, TensorLayout},
};
use image::{imageops, imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;

/// Counter-clockwise rotation applied to the image before inference, in
/// quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation(u8);

impl Orientation {
    pub fn from_degrees(degrees: i32) -> Result<Self, ClassifierError> {
        if degrees % 90 != 0 {
            return Err(ClassifierError::InvalidOrientation(degrees));
        }
        Ok(Self::from_quarter_turns(degrees / 90))
    }

    pub fn from_quarter_turns(turns: i32) -> Self {
        Self(turns.rem_euclid(4) as u8)
    }

    pub fn quarter_turns(&self) -> u8 {
        self.0
    }

    pub fn degrees(&self) -> i32 {
        self.0 as i32 * 90
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: f32,
    pub std: f32,
}

impl Normalization {
    pub fn new(mean: f32, std: f32) -> Self {
        Self { mean, std }
    }

    pub fn is_identity(&self) -> bool {
        self.mean == 0.0 && self.std == 1.0
    }

    pub fn apply(&self, value: f32) -> f32 {
        (value - self.mean) / self.std
    }
}

pub fn crop_to_square(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    imageops::crop_imm(image, x, y, side, side).to_image()
}

fn rotate_counter_clockwise(image: RgbImage, orientation: Orientation) -> RgbImage {
    match orientation.quarter_turns() {
        1 => imageops::rotate270(&image),
        2 => imageops::rotate180(&image),
        3 => imageops::rotate90(&image),
        _ => image,
    }
}

pub fn prepare_image(image: &DynamicImage, spec: &InputSpec, orientation: Orientation) -> RgbImage {
    let square = crop_to_square(&image.to_rgb8());

    // Odd turns swap the axes, so resize to the transposed size first.
    let (resize_w, resize_h) = if orientation.quarter_turns() % 2 == 1 {
        (spec.height, spec.width)
    } else {
        (spec.width, spec.height)
    };
    let resized = imageops::resize(&square, resize_w, resize_h, FilterType::Nearest);

    rotate_counter_clockwise(resized, orientation)
}

pub fn to_tensor(image: &RgbImage, spec: &InputSpec, normalization: Normalization) -> ModelInput {
    let (width, height) = image.dimensions();
    let (width, height) = (width as usize, height as usize);
    let shape = match spec.layout {
        TensorLayout::Nhwc => (1, height, width, 3),
        TensorLayout::Nchw => (1, 3, height, width),
    };
    let index = |x: usize, y: usize, c: usize| match spec.layout {
        TensorLayout::Nhwc => [0, y, x, c],
        TensorLayout::Nchw => [0, c, y, x],
    };

    match spec.element_type {
        ElementType::Uint8 => {
            let mut input = Array4::<u8>::zeros(shape);
            for (x, y, pixel) in image.enumerate_pixels() {
                for (c, value) in pixel.0.iter().enumerate() {
                    input[index(x as usize, y as usize, c)] = if normalization.is_identity() {
                        *value
                    } else {
                        normalization.apply(*value as f32).round().clamp(0.0, 255.0) as u8
                    };
                }
            }
            ModelInput::Quantized(input)
        }
        ElementType::Float32 => {
            let mut input = Array4::<f32>::zeros(shape);
            for (x, y, pixel) in image.enumerate_pixels() {
                for (c, value) in pixel.0.iter().enumerate() {
                    input[index(x as usize, y as usize, c)] = normalization.apply(*value as f32);
                }
            }
            ModelInput::Float(input)
        }
    }
}

pub fn preprocess(
    image: &DynamicImage,
    spec: &InputSpec,
    orientation: Orientation,
    normalization: Normalization,
) -> ModelInput {
    let prepared = prepare_image(image, spec, orientation);
    to_tensor(&prepared, spec, normalization)
}

pub fn decode_image(image_data: &[u8]) -> Result<DynamicImage, ClassifierError> {
    let image = image::ImageReader::new(std::io::Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| ClassifierError::ImageDecode(image::ImageError::IoError(e)))?
        .decode()?;
    ensure_not_empty(&image)?;
    Ok(image)
}

pub fn ensure_not_empty(image: &DynamicImage) -> Result<(), ClassifierError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ClassifierError::EmptyImage { width, height });
    }
    Ok(())
}
