use crate::{
    category::Category,
    classifier::GarbageClassifier,
    model_service::ModelBackend,
    preprocessing::{decode_image, Orientation},
};
use garbage_proto::{
    garbage_classifier_service_server::GarbageClassifierService, CategoryInfo, CategoryList,
    ClassificationResponse, ClassifyRequest, Empty, Recognition,
};
use std::sync::Arc;
use tonic::{async_trait, Request, Response, Status};

pub struct InferenceService<B: ModelBackend> {
    classifier: Arc<GarbageClassifier<B>>,
    max_results: usize,
}

impl<B: ModelBackend> InferenceService<B> {
    pub fn new(classifier: GarbageClassifier<B>, max_results: usize) -> Self {
        Self {
            classifier: Arc::new(classifier),
            max_results,
        }
    }
}

#[async_trait]
impl<B: ModelBackend> GarbageClassifierService for InferenceService<B> {
    async fn classify(
        &self,
        request: Request<ClassifyRequest>,
    ) -> Result<Response<ClassificationResponse>, Status> {
        let request = request.into_inner();
        let orientation = Orientation::from_degrees(request.orientation)?;
        let max_results = match request.max_results {
            0 => self.max_results,
            n => n as usize,
        };

        let ClassifyRequest {
            image_data,
            timestamp,
            ..
        } = request;

        let classifier = self.classifier.clone();
        let result = tokio::task::spawn_blocking(move || {
            let image = decode_image(&image_data)?;
            classifier.recognize_image(&image, orientation)
        })
        .await
        .map_err(|e| Status::internal(format!("classification task failed: {}", e)))??;

        let tip = result
            .best()
            .and_then(|best| Category::from_name(&best.label))
            .map(|category| category.tip().to_string())
            .unwrap_or_default();

        let recognitions: Vec<Recognition> = result
            .top(max_results)
            .iter()
            .map(|recognition| Recognition {
                label: recognition.label.clone(),
                confidence: recognition.confidence,
            })
            .collect();

        tracing::debug!("Returning {} recognitions", recognitions.len());
        for (i, recognition) in recognitions.iter().enumerate() {
            tracing::debug!(
                "Recognition {}: label={}, confidence={:.3}",
                i,
                recognition.label,
                recognition.confidence
            );
        }

        Ok(Response::new(ClassificationResponse {
            recognitions,
            timestamp,
            tip,
        }))
    }

    async fn get_categories(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<CategoryList>, Status> {
        let categories = self
            .classifier
            .category_word_counts()
            .into_iter()
            .map(|(category, word_count)| CategoryInfo {
                name: category.as_str().to_string(),
                word_count: word_count as u32,
            })
            .collect();

        Ok(Response::new(CategoryList { categories }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::mock_classifier;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png_bytes(red: u8) -> Vec<u8> {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(20, 20, Rgb([red, 0, 0]));
        let mut image_data: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut image_data), image::ImageFormat::Png)
            .unwrap();
        image_data
    }

    #[tokio::test]
    async fn test_classify() -> Result<(), Box<dyn std::error::Error>> {
        let inference_service = InferenceService::new(mock_classifier(), 5);

        let request = Request::new(ClassifyRequest {
            image_data: png_bytes(0),
            orientation: 0,
            max_results: 3,
            timestamp: 12345,
        });
        let response = inference_service.classify(request).await?.into_inner();

        assert_eq!(response.timestamp, 12345);
        assert_eq!(response.recognitions.len(), 3);
        assert_eq!(response.recognitions[0].label, "plastic");
        assert_eq!(response.tip, Category::Plastic.tip());
        assert!(response
            .recognitions
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));

        Ok(())
    }

    #[tokio::test]
    async fn test_classify_uses_default_max_results() -> Result<(), Box<dyn std::error::Error>> {
        let inference_service = InferenceService::new(mock_classifier(), 2);

        let request = Request::new(ClassifyRequest {
            image_data: png_bytes(0),
            orientation: 180,
            max_results: 0,
            timestamp: 0,
        });
        let response = inference_service.classify(request).await?.into_inner();

        assert_eq!(response.recognitions.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_classify_unmapped_best_has_no_tip() -> Result<(), Box<dyn std::error::Error>> {
        let inference_service = InferenceService::new(mock_classifier(), 5);

        let request = Request::new(ClassifyRequest {
            image_data: png_bytes(255),
            orientation: 0,
            max_results: 1,
            timestamp: 0,
        });
        let response = inference_service.classify(request).await?.into_inner();

        assert_eq!(response.recognitions[0].label, "goldfish");
        assert!(response.tip.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_classify_rejects_bad_input() {
        let inference_service = InferenceService::new(mock_classifier(), 5);

        let bad_orientation = inference_service
            .classify(Request::new(ClassifyRequest {
                image_data: png_bytes(0),
                orientation: 45,
                max_results: 0,
                timestamp: 0,
            }))
            .await
            .unwrap_err();
        assert_eq!(bad_orientation.code(), tonic::Code::InvalidArgument);

        let bad_image = inference_service
            .classify(Request::new(ClassifyRequest {
                image_data: vec![1, 2, 3],
                orientation: 0,
                max_results: 0,
                timestamp: 0,
            }))
            .await
            .unwrap_err();
        assert_eq!(bad_image.code(), tonic::Code::InvalidArgument);

        let empty_image = inference_service
            .classify(Request::new(ClassifyRequest {
                image_data: b"P6\n0 0\n255\n".to_vec(),
                orientation: 0,
                max_results: 0,
                timestamp: 0,
            }))
            .await
            .unwrap_err();
        assert_eq!(empty_image.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_get_categories() -> Result<(), Box<dyn std::error::Error>> {
        let inference_service = InferenceService::new(mock_classifier(), 5);

        let response = inference_service
            .get_categories(Request::new(Empty {}))
            .await?
            .into_inner();

        let names: Vec<&str> = response
            .categories
            .iter()
            .map(|category| category.name.as_str())
            .collect();
        assert_eq!(names, vec!["plastic", "paper", "metal", "glass"]);
        assert!(response.categories.iter().all(|c| c.word_count == 1));

        Ok(())
    }
}
