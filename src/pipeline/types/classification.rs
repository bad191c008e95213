use crate::error::StageError;
use serde::Serialize;

/// Output of one classifier call. `class_index` is always the argmax of `probabilities`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    class_index: usize,
    probabilities: Vec<f32>,
}

impl ClassificationResult {
    /// Build a result from a probability distribution, picking the first maximum as the class.
    pub fn from_probabilities(probabilities: Vec<f32>) -> Result<Self, StageError> {
        if probabilities.is_empty() {
            return Err(StageError::ClassifierFault(
                "empty probability distribution".to_string(),
            ));
        }
        if let Some(bad) = probabilities.iter().find(|p| !p.is_finite()) {
            return Err(StageError::ClassifierFault(format!(
                "non-finite probability {bad}"
            )));
        }

        let class_index = probabilities
            .iter()
            .enumerate()
            .fold(0, |best, (idx, p)| {
                if *p > probabilities[best] { idx } else { best }
            });

        Ok(Self {
            class_index,
            probabilities,
        })
    }

    pub fn class_index(&self) -> usize {
        self.class_index
    }

    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    /// Max class probability
    pub fn confidence(&self) -> f32 {
        self.probabilities[self.class_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_index_is_the_argmax() {
        let result = ClassificationResult::from_probabilities(vec![0.1, 0.7, 0.2]).unwrap();
        assert_eq!(result.class_index(), 1);
        assert!((result.confidence() - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn ties_resolve_to_the_first_class() {
        let result = ClassificationResult::from_probabilities(vec![0.4, 0.4, 0.2]).unwrap();
        assert_eq!(result.class_index(), 0);
    }

    #[test]
    fn rejects_degenerate_distributions() {
        assert!(ClassificationResult::from_probabilities(vec![]).is_err());
        assert!(ClassificationResult::from_probabilities(vec![0.5, f32::NAN]).is_err());
    }
}
