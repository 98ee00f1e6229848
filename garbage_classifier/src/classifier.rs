use crate::{
    category::{Category, CategoryIndex},
    config::{LabelsConfig, ModelConfig, Validatable},
    error::ClassifierError,
    labels::{load_model_labels, CategoryLists},
    model_service::{ModelBackend, RawScores},
    ort_service::OrtModelBackend,
    preprocessing::{ensure_not_empty, preprocess, Normalization, Orientation},
    recognition::{ClassificationResult, Recognition},
};
use image::DynamicImage;

pub fn normalize_scores(scores: RawScores, normalization: Normalization) -> Vec<f32> {
    match scores {
        RawScores::Quantized(scores) => scores
            .into_iter()
            .map(|score| normalization.apply(score as f32))
            .collect(),
        RawScores::Float(scores) => scores,
    }
}

pub struct GarbageClassifier<B: ModelBackend> {
    backend: B,
    labels: Vec<String>,
    categories: CategoryIndex,
    image_normalization: Normalization,
    probability_normalization: Normalization,
}

impl GarbageClassifier<OrtModelBackend> {
    pub fn from_config(
        model_config: &ModelConfig,
        labels_config: &LabelsConfig,
    ) -> Result<Self, ClassifierError> {
        let backend = OrtModelBackend::new(model_config)?;
        let labels = load_model_labels(&labels_config.get_path())?;
        let categories = CategoryIndex::new(&CategoryLists::load(labels_config));

        Self::new(backend, labels, categories)?.with_normalization(
            Normalization::new(model_config.image_mean, model_config.image_std),
            Normalization::new(model_config.probability_mean, model_config.probability_std),
        )
    }
}

impl<B: ModelBackend> GarbageClassifier<B> {
    pub fn new(
        backend: B,
        labels: Vec<String>,
        categories: CategoryIndex,
    ) -> Result<Self, ClassifierError> {
        if let Some(outputs) = backend.output_classes() {
            if outputs != labels.len() {
                return Err(ClassifierError::LabelCountMismatch {
                    labels: labels.len(),
                    outputs,
                });
            }
        }

        tracing::info!("Classifier ready with {} labels", labels.len());

        Ok(Self {
            backend,
            labels,
            categories,
            image_normalization: Normalization::new(0.0, 1.0),
            probability_normalization: Normalization::new(0.0, 255.0),
        })
    }

    pub fn with_normalization(
        mut self,
        image: Normalization,
        probability: Normalization,
    ) -> Result<Self, ClassifierError> {
        if image.std == 0.0 || probability.std == 0.0 {
            return Err(ClassifierError::UnsupportedModel(
                "normalization std must not be zero".to_string(),
            ));
        }
        self.image_normalization = image;
        self.probability_normalization = probability;
        Ok(self)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    pub fn category_word_counts(&self) -> Vec<(Category, usize)> {
        Category::PRIORITY
            .iter()
            .map(|category| (*category, self.categories.word_count(*category)))
            .collect()
    }

    #[tracing::instrument(
        skip(self, image),
        fields(width = image.width(), height = image.height())
    )]
    pub fn raw_recognitions(
        &self,
        image: &DynamicImage,
        orientation: Orientation,
    ) -> Result<Vec<Recognition>, ClassifierError> {
        ensure_not_empty(image)?;
        let spec = self.backend.input_spec();
        let input = preprocess(image, &spec, orientation, self.image_normalization);
        let scores = self.backend.forward(&input)?;

        if scores.len() != self.labels.len() {
            return Err(ClassifierError::LabelCountMismatch {
                labels: self.labels.len(),
                outputs: scores.len(),
            });
        }

        let probabilities = normalize_scores(scores, self.probability_normalization);
        Ok(self
            .labels
            .iter()
            .zip(probabilities)
            .map(|(label, confidence)| Recognition::new(label.as_str(), confidence))
            .collect())
    }

    pub fn recognize_image(
        &self,
        image: &DynamicImage,
        orientation: Orientation,
    ) -> Result<ClassificationResult, ClassifierError> {
        let raw = self.raw_recognitions(image, orientation)?;
        let result = self.categories.categorize(raw);

        if let Some(best) = result.best() {
            tracing::debug!("Best recognition: {}", best);
        }

        Ok(result)
    }
}
