/**
The classifier boundary. A classifier receives every window of a sentence at once and returns one
tag index per window, in window order. How it computes them is its own business: the pipeline
only checks the shape of the answer.
*/
use crate::metrics::argmax_rows;
use crate::window::WindowBatch;
use ahash::AHashMap;
use ndarray::ArrayView2;
use ndarray_stats::errors::MinMaxError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("the classifier returned {got} tags for {expected} windows")]
    LengthMismatch { expected: usize, got: usize },
    #[error("the classifier returned tag {tag}, but the scheme only has {labels} labels")]
    UnknownTag { tag: usize, labels: usize },
    #[error("the classifier scores cannot be decoded: {0}")]
    UndefinedScores(#[from] MinMaxError),
    #[error("the classifier failed: {0}")]
    Failed(String),
}

/// Tags every window of a batch.
pub trait Classifier {
    fn tag_windows(&self, windows: &WindowBatch) -> Result<Vec<usize>, ClassifierError>;
}

impl<F> Classifier for F
where
    F: Fn(&WindowBatch) -> Result<Vec<usize>, ClassifierError>,
{
    fn tag_windows(&self, windows: &WindowBatch) -> Result<Vec<usize>, ClassifierError> {
        self(windows)
    }
}

/// Checks that a classifier answer has one tag per window and that every tag is a valid index.
///
/// * `tags`: the classifier answer.
/// * `windows`: number of windows given to the classifier.
/// * `labels`: number of labels of the scheme.
pub fn check_tags(tags: &[usize], windows: usize, labels: usize) -> Result<(), ClassifierError> {
    if tags.len() != windows {
        return Err(ClassifierError::LengthMismatch {
            expected: windows,
            got: tags.len(),
        });
    }
    match tags.iter().find(|&&t| t >= labels) {
        Some(&tag) => Err(ClassifierError::UnknownTag { tag, labels }),
        None => Ok(()),
    }
}

/// Decodes a `(windows × labels)` score matrix into tag indices by taking the highest score of
/// every row.
pub fn decode_scores(scores: ArrayView2<f32>) -> Result<Vec<usize>, ClassifierError> {
    Ok(argmax_rows(scores)?)
}

/// Tags a window with the tag associated with its center word, or with the fallback tag if the
/// word is not in the lexicon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconClassifier {
    lexicon: AHashMap<usize, usize>,
    fallback: usize,
}

impl LexiconClassifier {
    /// * `lexicon`: word index to tag index.
    /// * `fallback`: tag index of the words absent from the lexicon.
    pub fn new(lexicon: AHashMap<usize, usize>, fallback: usize) -> Self {
        LexiconClassifier { lexicon, fallback }
    }

    pub fn fallback(&self) -> usize {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }
}

impl Classifier for LexiconClassifier {
    fn tag_windows(&self, windows: &WindowBatch) -> Result<Vec<usize>, ClassifierError> {
        Ok(windows
            .iter()
            .map(|w| {
                self.lexicon
                    .get(&w.center())
                    .copied()
                    .unwrap_or(self.fallback)
            })
            .collect())
    }
}
