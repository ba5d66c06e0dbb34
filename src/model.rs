/**
Model files. A model file is a JSON document describing everything the tagger needs besides the
corpus: the label set, the vocabulary, the feature kinds, the window radius and the lexicon of the
reference classifier.

```json
{
  "window_radius": 2,
  "labels": ["B-PER", "I-PER", "E-PER", "1-PER", "O"],
  "vocabulary": ["john", "smith", "lives"],
  "features": ["capitalized", "has_digit"],
  "lexicon": {"john": "B-PER", "smith": "E-PER"},
  "fallback_label": "O"
}
```
*/
use crate::classifier::LexiconClassifier;
use crate::features::{FeatureKind, Featurizer, Vocabulary, UNKNOWN_WORD};
use crate::schemes::{SchemeError, TagScheme, OUTSIDE};
use crate::window::WindowBuilder;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot open the model file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse the model file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid label set: {0}")]
    Scheme(#[from] SchemeError),
    #[error("the {context} refers to the unknown label `{label}`")]
    UnknownLabel { label: String, context: String },
    #[error("the lexicon refers to the word `{0}`, which is not in the vocabulary")]
    UnknownWord(String),
    #[error("the window radius {radius} is larger than {max}")]
    InvalidRadius { radius: usize, max: usize },
}

/// Largest window radius a model file may ask for.
pub const MAX_WINDOW_RADIUS: usize = 1024;

fn default_fallback_label() -> String {
    OUTSIDE.to_string()
}

/// The serialized form of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub window_radius: usize,
    pub labels: Vec<String>,
    pub vocabulary: Vec<String>,
    /// Every feature kind when absent.
    #[serde(default)]
    pub features: Option<Vec<FeatureKind>>,
    #[serde(default)]
    pub lexicon: BTreeMap<String, String>,
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
}

impl ModelFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            labels = model.labels.len(),
            words = model.vocabulary.len(),
            "loaded model file"
        );
        Ok(model)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds the scheme, the vocabulary, the featurizer and the classifier described by the file.
    pub fn compile(self) -> Result<TaggerModel, ModelError> {
        let width = self
            .window_radius
            .checked_mul(2)
            .and_then(|w| w.checked_add(1));
        if width.is_none() || self.window_radius > MAX_WINDOW_RADIUS {
            return Err(ModelError::InvalidRadius {
                radius: self.window_radius,
                max: MAX_WINDOW_RADIUS,
            });
        }
        let scheme = TagScheme::build(&self.labels)?;
        let vocabulary = Vocabulary::from_words(self.vocabulary);
        let featurizer = self.features.map(Featurizer::new).unwrap_or_default();
        let label_index = |label: &str, context: &str| {
            scheme
                .index_of(label)
                .ok_or_else(|| ModelError::UnknownLabel {
                    label: label.to_string(),
                    context: context.to_string(),
                })
        };
        let fallback = label_index(&self.fallback_label, "fallback label")?;
        let mut lexicon = AHashMap::with_capacity(self.lexicon.len());
        for (word, label) in self.lexicon.iter() {
            let word_index = vocabulary
                .get(word)
                .ok_or_else(|| ModelError::UnknownWord(word.clone()))?;
            lexicon.insert(word_index, label_index(label, "lexicon")?);
        }
        Ok(TaggerModel::new(
            scheme,
            vocabulary,
            featurizer,
            LexiconClassifier::new(lexicon, fallback),
            self.window_radius,
        ))
    }
}

/// Everything needed to tag a corpus.
#[derive(Debug, Clone)]
pub struct TaggerModel<C = LexiconClassifier> {
    pub scheme: TagScheme,
    pub vocabulary: Vocabulary,
    pub featurizer: Featurizer,
    pub classifier: C,
    pub window_radius: usize,
}

impl<C> TaggerModel<C> {
    pub fn new(
        scheme: TagScheme,
        vocabulary: Vocabulary,
        featurizer: Featurizer,
        classifier: C,
        window_radius: usize,
    ) -> Self {
        TaggerModel {
            scheme,
            vocabulary,
            featurizer,
            classifier,
            window_radius,
        }
    }

    /// Window builder padding with the unknown word.
    pub fn window_builder(&self) -> WindowBuilder {
        WindowBuilder::new(self.window_radius, UNKNOWN_WORD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use ndarray::Array2;

    const MODEL: &str = r#"{
        "window_radius": 1,
        "labels": ["B-PER", "I-PER", "E-PER", "1-PER", "O"],
        "vocabulary": ["john", "smith", "lives"],
        "lexicon": {"john": "B-PER", "smith": "E-PER"}
    }"#;

    #[test]
    fn test_compile() {
        let model = ModelFile::from_reader(MODEL.as_bytes())
            .unwrap()
            .compile()
            .unwrap();
        assert_eq!(model.scheme.len(), 5);
        assert_eq!(model.vocabulary.len(), 4);
        assert_eq!(model.featurizer, Featurizer::default());
        assert_eq!(model.classifier.fallback(), 4);
        let words = [1, 2, 3, 0];
        let features = Array2::<usize>::zeros((4, model.featurizer.feat_num()));
        let batch = model
            .window_builder()
            .build(&words, features.view())
            .unwrap();
        assert_eq!(model.classifier.tag_windows(&batch), Ok(vec![0, 2, 4, 4]));
    }

    #[test]
    fn test_unknown_lexicon_label() {
        let mut file = ModelFile::from_reader(MODEL.as_bytes()).unwrap();
        file.lexicon.insert("lives".to_string(), "B-LOC".to_string());
        assert!(matches!(
            file.compile(),
            Err(ModelError::UnknownLabel { label, .. }) if label == "B-LOC"
        ));
    }

    #[test]
    fn test_unknown_lexicon_word() {
        let mut file = ModelFile::from_reader(MODEL.as_bytes()).unwrap();
        file.lexicon.insert("paris".to_string(), "O".to_string());
        assert!(matches!(file.compile(), Err(ModelError::UnknownWord(w)) if w == "paris"));
    }

    #[test]
    fn test_window_radius_is_bounded() {
        for radius in [MAX_WINDOW_RADIUS + 1, usize::MAX / 2 + 1, usize::MAX] {
            let mut file = ModelFile::from_reader(MODEL.as_bytes()).unwrap();
            file.window_radius = radius;
            assert!(matches!(
                file.compile(),
                Err(ModelError::InvalidRadius { radius: r, max: MAX_WINDOW_RADIUS }) if r == radius
            ));
        }
        let huge = MODEL.replace(
            r#""window_radius": 1"#,
            r#""window_radius": 9223372036854775807"#,
        );
        assert!(matches!(
            ModelFile::from_reader(huge.as_bytes()).unwrap().compile(),
            Err(ModelError::InvalidRadius { .. })
        ));
        let mut file = ModelFile::from_reader(MODEL.as_bytes()).unwrap();
        file.window_radius = MAX_WINDOW_RADIUS;
        assert_eq!(file.compile().unwrap().window_builder().radius(), MAX_WINDOW_RADIUS);
    }

    #[test]
    fn test_invalid_files() {
        let unpaired = MODEL.replace(r#""E-PER", "#, "");
        assert!(matches!(
            ModelFile::from_reader(unpaired.as_bytes()).unwrap().compile(),
            Err(ModelError::Scheme(SchemeError::MissingContinuation { .. }))
        ));
        assert!(matches!(
            ModelFile::from_reader("{\"labels\": []}".as_bytes()),
            Err(ModelError::Parse(_))
        ));
        assert!(matches!(
            ModelFile::load("/nonexistent/model.json"),
            Err(ModelError::Io { .. })
        ));
    }
}
