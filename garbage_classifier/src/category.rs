use crate::{
    labels::{CategoryLists, CategorySet},
    recognition::{ClassificationResult, Recognition},
};
use std::{collections::HashMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Plastic,
    Paper,
    Metal,
    Glass,
}

impl Category {
    /// Lookup priority when a word appears in several lists.
    pub const PRIORITY: [Category; 4] = [
        Category::Plastic,
        Category::Paper,
        Category::Metal,
        Category::Glass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Plastic => "plastic",
            Category::Paper => "paper",
            Category::Metal => "metal",
            Category::Glass => "glass",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Category::PRIORITY
            .into_iter()
            .find(|category| category.as_str() == name)
    }

    pub fn tip(&self) -> &'static str {
        match self {
            Category::Plastic => "Please note that only rigid plastics are accepted for recycling.",
            Category::Paper => "All paper is safe to recycle!",
            Category::Metal => "Please note that electronic devices are not accepted for recycling.",
            Category::Glass => "Only glass bottles and jars may be recycled as glass",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    index: HashMap<String, Category>,
    word_counts: HashMap<Category, usize>,
}

impl CategoryIndex {
    pub fn new(lists: &CategoryLists) -> Self {
        let mut index = HashMap::new();
        let mut word_counts = HashMap::new();

        for category in Category::PRIORITY {
            let set: &CategorySet = match category {
                Category::Plastic => &lists.plastics,
                Category::Paper => &lists.papers,
                Category::Metal => &lists.metals,
                Category::Glass => &lists.glass,
            };
            word_counts.insert(category, set.len());

            for word in set.iter() {
                let winner = *index.entry(word.to_string()).or_insert(category);
                if winner != category {
                    tracing::debug!(
                        "'{}' listed under both {} and {}, keeping {}",
                        word,
                        winner,
                        category,
                        winner
                    );
                }
            }
        }

        Self { index, word_counts }
    }

    pub fn map_label(&self, label: &str) -> Option<Category> {
        self.index.get(label).copied()
    }

    pub fn word_count(&self, category: Category) -> usize {
        self.word_counts.get(&category).copied().unwrap_or(0)
    }

    pub fn categorize(&self, recognitions: Vec<Recognition>) -> ClassificationResult {
        let mapped = recognitions
            .into_iter()
            .map(|recognition| match self.map_label(&recognition.label) {
                Some(category) => Recognition::new(category.as_str(), recognition.confidence),
                None => recognition,
            })
            .collect();

        ClassificationResult::from_unsorted(mapped)
    }
}
