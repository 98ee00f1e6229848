use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub label: String,
    pub confidence: f32,
}

impl Recognition {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl fmt::Display for Recognition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label: {} Confidence: {}", self.label, self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassificationResult {
    recognitions: Vec<Recognition>,
}

impl ClassificationResult {
    /// Sorts by descending confidence. The sort is stable so equal scores keep
    /// model index order; NaN scores sink to the end.
    pub fn from_unsorted(mut recognitions: Vec<Recognition>) -> Self {
        recognitions.sort_by(|a, b| {
            descending_key(b.confidence).total_cmp(&descending_key(a.confidence))
        });
        Self { recognitions }
    }

    pub fn len(&self) -> usize {
        self.recognitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognitions.is_empty()
    }

    pub fn best(&self) -> Option<&Recognition> {
        self.recognitions.first()
    }

    /// The `k` most confident entries, or all of them when `k` is zero.
    pub fn top(&self, k: usize) -> &[Recognition] {
        if k == 0 {
            return &self.recognitions;
        }
        &self.recognitions[..k.min(self.recognitions.len())]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recognition> {
        self.recognitions.iter()
    }

    pub fn into_vec(self) -> Vec<Recognition> {
        self.recognitions
    }
}

impl IntoIterator for ClassificationResult {
    type Item = Recognition;
    type IntoIter = std::vec::IntoIter<Recognition>;

    fn into_iter(self) -> Self::IntoIter {
        self.recognitions.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClassificationResult {
    type Item = &'a Recognition;
    type IntoIter = std::slice::Iter<'a, Recognition>;

    fn into_iter(self) -> Self::IntoIter {
        self.recognitions.iter()
    }
}

fn descending_key(confidence: f32) -> f32 {
    if confidence.is_nan() {
        f32::NEG_INFINITY
    } else {
        confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_by_descending_confidence() {
        let result = ClassificationResult::from_unsorted(vec![
            Recognition::new("paper", 0.1),
            Recognition::new("glass", 0.7),
            Recognition::new("metal", 0.2),
        ]);

        let labels: Vec<&str> = result.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["glass", "metal", "paper"]);
    }

    #[test]
    fn test_ties_keep_model_order() {
        let result = ClassificationResult::from_unsorted(vec![
            Recognition::new("first", 0.5),
            Recognition::new("second", 0.5),
            Recognition::new("third", 0.9),
        ]);

        let labels: Vec<&str> = result.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["third", "first", "second"]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let result = ClassificationResult::from_unsorted(vec![
            Recognition::new("nan", f32::NAN),
            Recognition::new("low", 0.0),
        ]);

        assert_eq!(result.best().unwrap().label, "low");
        assert!(result.iter().last().unwrap().confidence.is_nan());
    }

    #[test]
    fn test_top_k() {
        let result = ClassificationResult::from_unsorted(vec![
            Recognition::new("a", 0.3),
            Recognition::new("b", 0.2),
            Recognition::new("c", 0.1),
        ]);

        assert_eq!(result.top(2).len(), 2);
        assert_eq!(result.top(10).len(), 3);
        assert_eq!(result.top(0).len(), 3);
    }

    #[test]
    fn test_display_format() {
        let recognition = Recognition::new("plastic", 0.5);
        assert_eq!(recognition.to_string(), "Label: plastic Confidence: 0.5");
    }
}
