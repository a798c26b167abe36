use std::path::Path;

/// Labels of the figures the bundled model was trained on, in output order.
pub const DEFAULT_LABELS: [&str; 3] = ["Zhabdrung_Ngawang_Namgyal", "Sangay_Tempa", "Guru_Rinpoche"];

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("could not read label file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("label file {0} does not contain any labels")]
    Empty(String),
    #[error("label {0:?} appears more than once")]
    Duplicate(String),
    #[error("label table has {labels} entries but the classifier produces {outputs} scores")]
    Mismatch { labels: usize, outputs: usize },
}

/// Index to name mapping for the classifier outputs. Never changes once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads one label per line, skipping blank lines.
    pub fn from_file(path: &Path) -> Result<Self, LabelError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LabelError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::new(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        if table.is_empty() {
            return Err(LabelError::Empty(path.display().to_string()));
        }
        for (index, label) in table.labels.iter().enumerate() {
            if table.labels[..index].contains(label) {
                return Err(LabelError::Duplicate(label.clone()));
            }
        }
        Ok(table)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn ensure_matches(&self, outputs: usize) -> Result<(), LabelError> {
        if self.len() != outputs {
            return Err(LabelError::Mismatch {
                labels: self.len(),
                outputs,
            });
        }
        Ok(())
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS)
    }
}
