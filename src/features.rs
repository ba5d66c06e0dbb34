/**
Orthographic features of a surface form. Every feature kind is binary, and feature `k` of a token
is encoded as the index `2 * k + value`, so that all the features of a sentence share a single
index space of size `2 * feat_num`.
*/
use ahash::AHashMap;
use enum_iterator::{all, Sequence};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// The first character is uppercase.
    Capitalized,
    /// Every letter is uppercase.
    AllCaps,
    HasDigit,
    /// Every character is an ASCII punctuation character.
    Punctuation,
    /// Every letter is lowercase.
    Lowercase,
}

impl FeatureKind {
    pub fn holds(&self, surface: &str) -> bool {
        let mut letters = surface.chars().filter(|c| c.is_alphabetic()).peekable();
        match self {
            FeatureKind::Capitalized => surface.chars().next().is_some_and(char::is_uppercase),
            FeatureKind::AllCaps => letters.peek().is_some() && letters.all(char::is_uppercase),
            FeatureKind::HasDigit => surface.chars().any(|c| c.is_numeric()),
            FeatureKind::Punctuation => {
                !surface.is_empty() && surface.chars().all(|c| c.is_ascii_punctuation())
            }
            FeatureKind::Lowercase => letters.peek().is_some() && letters.all(char::is_lowercase),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Capitalized => "capitalized",
            FeatureKind::AllCaps => "all_caps",
            FeatureKind::HasDigit => "has_digit",
            FeatureKind::Punctuation => "punctuation",
            FeatureKind::Lowercase => "lowercase",
        }
    }
}

impl Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Computes a fixed list of feature kinds over surface forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Featurizer {
    kinds: Vec<FeatureKind>,
}

impl Default for Featurizer {
    /// Every feature kind, in declaration order.
    fn default() -> Self {
        Featurizer {
            kinds: all::<FeatureKind>().collect(),
        }
    }
}

impl Featurizer {
    pub fn new(kinds: Vec<FeatureKind>) -> Self {
        Featurizer { kinds }
    }

    pub fn kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    /// Number of features per token.
    pub fn feat_num(&self) -> usize {
        self.kinds.len()
    }

    pub fn featurize<'a>(&'a self, surface: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.kinds
            .iter()
            .enumerate()
            .map(move |(k, kind)| 2 * k + usize::from(kind.holds(surface)))
    }

    /// `(tokens × feat_num)` feature indices of a sentence.
    pub fn featurize_sentence<S: AsRef<str>>(&self, surfaces: &[S]) -> Array2<usize> {
        let mut features = Array2::zeros((surfaces.len(), self.feat_num()));
        for (surface, mut row) in surfaces.iter().zip(features.rows_mut()) {
            for (slot, index) in row.iter_mut().zip(self.featurize(surface.as_ref())) {
                *slot = index;
            }
        }
        features
    }
}

/// Word index of the surface forms absent from the vocabulary. Also used to pad windows.
pub const UNKNOWN_WORD: usize = 0;

/// Maps surface forms to word indices. Known words are numbered from 1, in list order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary {
    words: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from a word list. A repeated word keeps its first index.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Vocabulary::default();
        for word in words {
            let word = word.into();
            if vocabulary.index.contains_key(&word) {
                continue;
            }
            vocabulary.words.push(word.clone());
            vocabulary.index.insert(word, vocabulary.words.len());
        }
        vocabulary
    }

    /// Word index of `surface`. The exact form is tried first, then its lowercase form.
    pub fn encode(&self, surface: &str) -> usize {
        self.get(surface)
            .or_else(|| self.get(&surface.to_lowercase()))
            .unwrap_or(UNKNOWN_WORD)
    }

    /// Word index of an exact surface form.
    pub fn get(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.words.get(i))
            .map(String::as_str)
    }

    /// Number of word indices, the unknown word included.
    pub fn len(&self) -> usize {
        self.words.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    #[case("Paris", [true, false, false, false, false])]
    #[case("NATO", [true, true, false, false, false])]
    #[case("b2b", [false, false, true, false, true])]
    #[case("...", [false, false, false, true, false])]
    #[case("1984", [false, false, true, false, false])]
    #[case("", [false, false, false, false, false])]
    fn test_feature_kinds(#[case] surface: &str, #[case] expected: [bool; 5]) {
        let holds: Vec<bool> = all::<FeatureKind>().map(|k| k.holds(surface)).collect();
        assert_eq!(holds, expected.to_vec());
    }

    #[test]
    fn test_featurize_sentence() {
        let featurizer = Featurizer::new(vec![FeatureKind::Capitalized, FeatureKind::HasDigit]);
        assert_eq!(featurizer.feat_num(), 2);
        assert_eq!(
            featurizer.featurize_sentence(&["Paris", "in", "1984"]),
            array![[1, 2], [0, 2], [0, 3]]
        );
    }

    #[test]
    fn test_default_featurizer() {
        let featurizer = Featurizer::default();
        assert_eq!(featurizer.feat_num(), 5);
        let indices: Vec<usize> = featurizer.featurize("NATO").collect();
        assert_eq!(indices, vec![1, 3, 4, 6, 8]);
    }

    #[test]
    fn test_vocabulary() {
        let vocabulary = Vocabulary::from_words(["Paris", "in", "paris", "in"]);
        assert_eq!(vocabulary.len(), 4);
        assert_eq!(vocabulary.encode("Paris"), 1);
        assert_eq!(vocabulary.encode("in"), 2);
        assert_eq!(vocabulary.encode("IN"), 2);
        assert_eq!(vocabulary.encode("London"), UNKNOWN_WORD);
        assert_eq!(vocabulary.word(3), Some("paris"));
        assert_eq!(vocabulary.word(UNKNOWN_WORD), None);
    }

    #[test]
    fn test_feature_kind_names() {
        let kinds: Vec<FeatureKind> = serde_json::from_str(r#"["all_caps", "lowercase"]"#).unwrap();
        assert_eq!(kinds, vec![FeatureKind::AllCaps, FeatureKind::Lowercase]);
        assert_eq!(FeatureKind::HasDigit.to_string(), "has_digit");
    }
}
