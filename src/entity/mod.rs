/**
This module turns a flat sequence of tag indices into the phrases it encodes. The extraction is a
single left-to-right pass driven by a `TagScheme`. It is lazy: `extract_phrases` returns an
iterator, and nothing is kept between two calls.
*/
use crate::schemes::{CategoryId, Part, TagScheme};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::iter::Enumerate;
use std::ops::Deref;
use std::slice::Iter;

/// A phrase represents a typed span over the tokens of one sentence. `start` and `end` are both
/// inclusive. Two phrases are equal only if category and both bounds are equal.
#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Phrase {
    pub category: CategoryId,
    pub start: usize,
    pub end: usize,
}

impl Phrase {
    pub fn new(category: CategoryId, start: usize, end: usize) -> Self {
        Phrase {
            category,
            start,
            end,
        }
    }

    /// Number of tokens covered by the phrase, at least one.
    pub fn token_count(&self) -> usize {
        self.end - self.start + 1
    }
}

impl Display for Phrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.category.index(), self.start, self.end)
    }
}

/// Extracts the phrases encoded by `tags`.
///
/// * `tags`: tag indices of one sentence, as produced by the classifier or read from gold data.
/// * `scheme`: the scheme the tag indices refer to.
pub fn extract_phrases<'a>(tags: &'a [usize], scheme: &'a TagScheme) -> PhraseIter<'a> {
    PhraseIter::new(tags, scheme)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenPhrase {
    category: CategoryId,
    start: usize,
}

/// This struct iterates over a *single* sequence of tag indices and returns the phrases
/// associated with it.
///
/// A `B` tag opens a phrase and silently replaces a phrase that was already open. A `1` tag
/// yields a one-token phrase right away. An open phrase is yielded when its category's `E` tag is
/// reached, is dropped on any tag other than its category's `I` tag, and is dropped as well when
/// the sequence ends.
#[derive(Debug, Clone)]
pub struct PhraseIter<'a> {
    tags: Enumerate<Iter<'a, usize>>,
    scheme: &'a TagScheme,
    open: Option<OpenPhrase>,
}

impl<'a> PhraseIter<'a> {
    fn new(tags: &'a [usize], scheme: &'a TagScheme) -> Self {
        PhraseIter {
            tags: tags.iter().enumerate(),
            scheme,
            open: None,
        }
    }
}

impl<'a> Iterator for PhraseIter<'a> {
    type Item = Phrase;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, &tag) = self.tags.next()?; // unterminated phrases are never emitted
            if let Some(beginner) = self.scheme.beginner(tag) {
                if beginner.part == Part::Single {
                    self.open = None;
                    return Some(Phrase::new(beginner.category, index, index));
                }
                self.open = Some(OpenPhrase {
                    category: beginner.category,
                    start: index,
                });
                continue;
            }
            if let Some(open) = self.open {
                let continuation = self.scheme.phrase_continuation(open.category);
                if continuation.end == Some(tag) {
                    self.open = None;
                    return Some(Phrase::new(open.category, open.start, index));
                } else if continuation.inside != Some(tag) {
                    self.open = None;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// The set of phrases of one sentence. Scoring is done with set arithmetic on two of these.
pub struct Phrases(AHashSet<Phrase>);

impl Phrases {
    /// Extracts and collects the phrases of a tag sequence.
    pub fn from_tags(tags: &[usize], scheme: &TagScheme) -> Self {
        extract_phrases(tags, scheme).collect()
    }

    /// Number of phrases of the given category.
    pub fn count_category(&self, category: CategoryId) -> usize {
        self.0.iter().filter(|p| p.category == category).count()
    }

    /// Phrases sorted by position, mostly useful for display and tests.
    pub fn sorted(&self) -> Vec<Phrase> {
        let mut phrases: Vec<Phrase> = self.0.iter().copied().collect();
        phrases.sort_by_key(|p| (p.start, p.end, p.category));
        phrases
    }
}

impl Deref for Phrases {
    type Target = AHashSet<Phrase>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Phrase> for Phrases {
    fn from_iter<T: IntoIterator<Item = Phrase>>(iter: T) -> Self {
        Phrases(iter.into_iter().collect())
    }
}

impl IntoIterator for Phrases {
    type Item = Phrase;
    type IntoIter = std::collections::hash_set::IntoIter<Phrase>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
