use crate::error::ModelError;
use crate::pipeline::types::GestureLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_COMPOUND_LABEL: &str = "LOVE_YOU";

/// On-disk label mapping: either an ordered list or an object keyed by class index.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelMapFile {
    Ordered(Vec<String>),
    // JSON object keys are always strings
    Indexed(BTreeMap<String, String>),
}

/// Class index -> gesture label lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Build a table from ordered labels, appending `compound` if it is missing.
    pub fn from_labels(labels: Vec<String>, compound: &str) -> Self {
        let mut labels = labels;
        if !compound.is_empty() && !labels.iter().any(|l| l == compound) {
            labels.push(compound.to_string());
        }
        Self { labels }
    }

    /// Digits 1-9, letters A-Z, then the compound label
    pub fn default_alphabet(compound: &str) -> Self {
        let labels = ('1'..='9')
            .chain('A'..='Z')
            .map(|c| c.to_string())
            .collect();
        Self::from_labels(labels, compound)
    }

    pub fn load(path: &Path, compound: &str) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::MissingArtifact(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|e| ModelError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&raw, compound).map_err(|e| ModelError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn parse(raw: &str, compound: &str) -> Result<Self, ModelError> {
        let file: LabelMapFile =
            serde_json::from_str(raw).map_err(|e| ModelError::InvalidArtifact(e.to_string()))?;
        let labels = match file {
            LabelMapFile::Ordered(labels) => labels,
            LabelMapFile::Indexed(map) => Self::ordered_by_index(map)?,
        };
        if labels.is_empty() {
            return Err(ModelError::InvalidArtifact(
                "label mapping is empty".to_string(),
            ));
        }
        Ok(Self::from_labels(labels, compound))
    }

    /// Sparse indices collapse onto their sorted positions
    fn ordered_by_index(map: BTreeMap<String, String>) -> Result<Vec<String>, ModelError> {
        let mut indexed = map
            .into_iter()
            .map(|(key, label)| {
                key.trim()
                    .parse::<usize>()
                    .map(|index| (index, label))
                    .map_err(|_| {
                        ModelError::InvalidArtifact(format!(
                            "label map key {:?} is not a class index",
                            key
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, label)| label).collect())
    }

    pub fn resolve(&self, class_index: usize) -> GestureLabel {
        self.labels
            .get(class_index)
            .map(GestureLabel::new)
            .unwrap_or_else(GestureLabel::unknown)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::default_alphabet(DEFAULT_COMPOUND_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_digits_letters_and_compound() {
        let table = LabelTable::default();
        assert_eq!(table.len(), 36);
        assert_eq!(table.resolve(0), "1");
        assert_eq!(table.resolve(8), "9");
        assert_eq!(table.resolve(9), "A");
        assert_eq!(table.resolve(34), "Z");
        assert_eq!(table.resolve(35), DEFAULT_COMPOUND_LABEL);
    }

    #[test]
    fn out_of_range_index_is_unknown() {
        let table = LabelTable::default();
        assert!(table.resolve(40).is_unknown());
        assert!(table.resolve(36).is_unknown());
    }

    #[test]
    fn parses_ordered_and_indexed_mappings() {
        let ordered = LabelTable::parse(r#"["A", "B", "LOVE_YOU"]"#, "LOVE_YOU").unwrap();
        assert_eq!(ordered.labels(), &["A", "B", "LOVE_YOU"]);

        let indexed =
            LabelTable::parse(r#"{"2": "C", "0": "A", "1": "B"}"#, "LOVE_YOU").unwrap();
        assert_eq!(indexed.labels(), &["A", "B", "C", "LOVE_YOU"]);

        // Numeric order, not string order
        let wide = LabelTable::parse(r#"{"10": "K", "2": "C", "0": "A"}"#, "").unwrap();
        assert_eq!(wide.labels(), &["A", "C", "K"]);
    }

    #[test]
    fn non_numeric_index_keys_are_rejected() {
        assert!(matches!(
            LabelTable::parse(r#"{"0": "A", "one": "B"}"#, "LOVE_YOU"),
            Err(ModelError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn rejects_empty_or_malformed_mappings() {
        assert!(LabelTable::parse("[]", "LOVE_YOU").is_err());
        assert!(LabelTable::parse(r#"{"x": 1}"#, "LOVE_YOU").is_err());
        assert!(matches!(
            LabelTable::load(Path::new("missing/labels.json"), "LOVE_YOU"),
            Err(ModelError::MissingArtifact(_))
        ));
    }
}
