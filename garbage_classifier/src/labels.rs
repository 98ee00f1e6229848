use crate::{config::LabelsConfig, error::ClassifierError};
use std::{collections::HashSet, fs, io, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    words: HashSet<String>,
}

impl CategorySet {
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let words = iter
            .into_iter()
            .map(Into::into)
            .filter_map(|word: String| {
                let trimmed = word.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect();
        Self { words }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryLists {
    pub plastics: CategorySet,
    pub papers: CategorySet,
    pub metals: CategorySet,
    pub glass: CategorySet,
}

impl CategoryLists {
    pub fn load(labels_cfg: &LabelsConfig) -> Self {
        let lists = Self {
            plastics: load_category_set(&labels_cfg.category_path(&labels_cfg.plastics_file)),
            papers: load_category_set(&labels_cfg.category_path(&labels_cfg.papers_file)),
            metals: load_category_set(&labels_cfg.category_path(&labels_cfg.metals_file)),
            glass: load_category_set(&labels_cfg.category_path(&labels_cfg.glass_file)),
        };

        tracing::info!(
            plastics = lists.plastics.len(),
            papers = lists.papers.len(),
            metals = lists.metals.len(),
            glass = lists.glass.len(),
            "Loaded category word lists"
        );

        lists
    }
}

/// Reads a category word list. A missing or unreadable file counts as an
/// empty category.
pub fn load_category_set(filepath: &Path) -> CategorySet {
    match read_lines(filepath) {
        Ok(lines) => lines.into_iter().collect(),
        Err(e) => {
            tracing::warn!("Category list {:?} unavailable, using empty set: {}", filepath, e);
            CategorySet::default()
        }
    }
}

/// Reads the fine-grained label list. Line order is the model output order.
pub fn load_model_labels(filepath: &Path) -> Result<Vec<String>, ClassifierError> {
    let lines = read_lines(filepath).map_err(|e| ClassifierError::LabelsLoad {
        path: filepath.to_path_buf(),
        reason: e.to_string(),
    })?;

    let labels: Vec<String> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(ClassifierError::LabelsLoad {
            path: filepath.to_path_buf(),
            reason: "file contains no labels".to_string(),
        });
    }

    Ok(labels)
}

// Invalid UTF-8 is replaced per line instead of failing the whole file.
fn read_lines(filepath: &Path) -> io::Result<Vec<String>> {
    let bytes = fs::read(filepath)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: impl AsRef<[u8]>) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_category_set_trims_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "plastics.txt", "water bottle\n\n  plastic bag \r\n\n");

        let set = load_category_set(&path);

        assert_eq!(set.len(), 2);
        assert!(set.contains("water bottle"));
        assert!(set.contains("plastic bag"));
        assert!(!set.contains(""));
    }

    #[test]
    fn test_invalid_utf8_line_keeps_other_words() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "plastics.txt", b"water bottle\ncaf\xe9 cup\nplastic bag\n");

        let set = load_category_set(&path);

        assert_eq!(set.len(), 3);
        assert!(set.contains("water bottle"));
        assert!(set.contains("plastic bag"));
    }

    #[test]
    fn test_missing_category_file_is_empty_set() {
        let dir = TempDir::new().unwrap();
        let set = load_category_set(&dir.path().join("missing.txt"));

        assert!(set.is_empty());
    }

    #[test]
    fn test_empty_category_file_is_empty_set() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "glass.txt", "");

        assert!(load_category_set(&path).is_empty());
    }

    #[test]
    fn test_model_labels_keep_order() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "labels.txt", "background\ntench\ngoldfish\n");

        let labels = load_model_labels(&path).unwrap();

        assert_eq!(labels, vec!["background", "tench", "goldfish"]);
    }

    #[test]
    fn test_missing_model_labels_is_error() {
        let dir = TempDir::new().unwrap();
        let result = load_model_labels(&dir.path().join("labels.txt"));

        assert!(matches!(result, Err(ClassifierError::LabelsLoad { .. })));
    }

    #[test]
    fn test_blank_model_labels_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "labels.txt", "\n  \n");

        assert!(matches!(
            load_model_labels(&path),
            Err(ClassifierError::LabelsLoad { .. })
        ));
    }

    #[test]
    fn test_category_lists_load_with_missing_files() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "plastics.txt", "water bottle\n");
        write_file(&dir, "metals.txt", "tin can\nbeer can\n");

        let labels_cfg = LabelsConfig {
            labels_dir: dir.path().to_path_buf(),
            labels_file: "labels.txt".to_string(),
            plastics_file: "plastics.txt".to_string(),
            papers_file: "papers.txt".to_string(),
            metals_file: "metals.txt".to_string(),
            glass_file: "glass.txt".to_string(),
        };

        let lists = CategoryLists::load(&labels_cfg);

        assert_eq!(lists.plastics.len(), 1);
        assert!(lists.papers.is_empty());
        assert_eq!(lists.metals.len(), 2);
        assert!(lists.glass.is_empty());
    }
}
