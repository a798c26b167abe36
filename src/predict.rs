use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;
use crate::labels::LabelTable;
use crate::load_image::load_image;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: String,
    pub confidence: f32,
    pub class_probabilities: BTreeMap<String, f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
    #[error("classifier returned {actual} scores, expected {expected}")]
    ScoreCount { expected: usize, actual: usize },
}

/// Scores the image stored at `path`.
pub fn run(classifier: &dyn Classifier, labels: &LabelTable, path: &Path) -> Result<Prediction, PredictError> {
    let batch = load_image(path)?;
    let scores = classifier.predict(&batch)?;
    interpret(&scores, labels)
}

/// Maps raw scores onto the label table. Ties go to the lowest index.
pub fn interpret(scores: &[f32], labels: &LabelTable) -> Result<Prediction, PredictError> {
    if scores.len() != labels.len() || scores.is_empty() {
        return Err(PredictError::ScoreCount {
            expected: labels.len(),
            actual: scores.len(),
        });
    }

    let mut best = 0;
    for (index, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = index;
        }
    }

    let class_probabilities = labels
        .iter()
        .zip(scores)
        .map(|(label, score)| (label.to_string(), *score))
        .collect();
    let predicted_class = labels.get(best).unwrap_or_default().to_string();

    Ok(Prediction {
        predicted_class,
        confidence: scores[best],
        class_probabilities,
    })
}
