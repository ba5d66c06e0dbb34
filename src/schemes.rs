/**
This module maps a label vocabulary onto a phrase boundary encoding. A label such as `B-PER` is
split into a `Part` (where the token sits in its phrase) and a category (what kind of phrase it
is). The `TagScheme` built from the full, ordered label list answers the two questions the phrase
extractor asks: does this tag index open a phrase, and which indices continue or close a phrase of
a given category?
*/
use ahash::AHashMap;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Character separating the part from the category in a label (`B-PER`).
pub const DELIMITER: char = '-';

/// The label used for tokens outside of any phrase.
pub const OUTSIDE: &str = "O";

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Sequence, Serialize, Deserialize)]
/// Position of a token inside its phrase. Parts are always written as a single ascii character
/// in front of the category.
pub enum Part {
    /// `B`: first token of a multi-token phrase.
    B,
    /// `I`: token inside a phrase.
    I,
    /// `E`: last token of a multi-token phrase.
    E,
    /// `1`: a phrase made of a single token.
    Single,
    /// `O`: token outside of any phrase.
    O,
}

impl Part {
    pub fn as_str(&self) -> &'static str {
        match self {
            Part::B => "B",
            Part::I => "I",
            Part::E => "E",
            Part::Single => "1",
            Part::O => "O",
        }
    }

    /// Parts that open a phrase.
    pub fn is_beginner(&self) -> bool {
        matches!(self, Part::B | Part::Single)
    }
}

impl Display for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Part {
    type Err = SchemeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(Part::B),
            "I" => Ok(Part::I),
            "E" => Ok(Part::E),
            "1" => Ok(Part::Single),
            "O" => Ok(Part::O),
            _ => Err(SchemeError::UnknownPart {
                label: String::new(),
                part: String::from(s),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// The label set cannot be turned into a consistent boundary encoding.
pub enum SchemeError {
    #[error("the label set is empty")]
    EmptyLabelSet,
    #[error("label `{0}` is malformed: expected `O` or `<part>-<category>`")]
    MalformedLabel(String),
    #[error("label `{label}` has an unknown part `{part}` (expected one of B, I, E, 1, O)")]
    UnknownPart { label: String, part: String },
    #[error("label `{0}` appears more than once")]
    DuplicateLabel(String),
    #[error("category `{category}` has an `{present}` label but no `{missing}` label")]
    MissingContinuation {
        category: String,
        present: Part,
        missing: Part,
    },
}

/// Splits a label into its part and its category. `"O"` is the only label without a category.
pub fn parse_label(label: &str) -> Result<(Part, Option<&str>), SchemeError> {
    if label == OUTSIDE {
        return Ok((Part::O, None));
    }
    let (raw_part, category) = label
        .split_once(DELIMITER)
        .ok_or_else(|| SchemeError::MalformedLabel(String::from(label)))?;
    let part = raw_part.parse::<Part>().map_err(|_| SchemeError::UnknownPart {
        label: String::from(label),
        part: String::from(raw_part),
    })?;
    if category.is_empty() || part == Part::O {
        return Err(SchemeError::MalformedLabel(String::from(label)));
    }
    Ok((part, Some(category)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Dense index of a category, in order of first appearance in the label list.
pub struct CategoryId(pub(crate) usize);

impl CategoryId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A tag index opening a phrase.
pub struct Beginner {
    pub category: CategoryId,
    pub part: Part,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// The tag indices that continue (`inside`) or close (`end`) a phrase of one category. Both are
/// absent for categories that only use `B` and `1`.
pub struct Continuation {
    pub inside: Option<usize>,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CategoryTags {
    begin: Option<usize>,
    inside: Option<usize>,
    end: Option<usize>,
    single: Option<usize>,
}

impl CategoryTags {
    fn slot(&mut self, part: Part) -> Option<&mut Option<usize>> {
        match part {
            Part::B => Some(&mut self.begin),
            Part::I => Some(&mut self.inside),
            Part::E => Some(&mut self.end),
            Part::Single => Some(&mut self.single),
            Part::O => None,
        }
    }

    fn get(&self, part: Part) -> Option<usize> {
        match part {
            Part::B => self.begin,
            Part::I => self.inside,
            Part::E => self.end,
            Part::Single => self.single,
            Part::O => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Immutable mapping between tag indices and the boundary encoding. A tag index is the position of
/// its label in the list given to `TagScheme::build`.
pub struct TagScheme {
    labels: Box<[String]>,
    label_index: AHashMap<String, usize>,
    categories: Box<[String]>,
    tags: Box<[CategoryTags]>,
    beginners: AHashMap<usize, Beginner>,
    outside: Option<usize>,
}

impl TagScheme {
    /// Builds the scheme from the ordered label list.
    ///
    /// * `labels`: every label the classifier can output. The index of a label in this slice is
    ///   its tag index.
    pub fn build<S: AsRef<str>>(labels: &[S]) -> Result<Self, SchemeError> {
        if labels.is_empty() {
            return Err(SchemeError::EmptyLabelSet);
        }
        let mut label_index = AHashMap::with_capacity(labels.len());
        let mut category_index: AHashMap<&str, usize> = AHashMap::new();
        let mut categories: Vec<String> = Vec::new();
        let mut tags: Vec<CategoryTags> = Vec::new();
        let mut outside = None;

        for (index, label) in labels.iter().map(AsRef::as_ref).enumerate() {
            if label_index.insert(String::from(label), index).is_some() {
                return Err(SchemeError::DuplicateLabel(String::from(label)));
            }
            let (part, category) = parse_label(label)?;
            let Some(category) = category else {
                outside = Some(index);
                continue;
            };
            let id = *category_index.entry(category).or_insert_with(|| {
                categories.push(String::from(category));
                tags.push(CategoryTags::default());
                categories.len() - 1
            });
            if let Some(slot) = tags[id].slot(part) {
                *slot = Some(index);
            }
        }

        for (name, category_tags) in categories.iter().zip(tags.iter()) {
            match (category_tags.inside, category_tags.end) {
                (Some(_), None) => {
                    return Err(SchemeError::MissingContinuation {
                        category: name.clone(),
                        present: Part::I,
                        missing: Part::E,
                    })
                }
                (None, Some(_)) => {
                    return Err(SchemeError::MissingContinuation {
                        category: name.clone(),
                        present: Part::E,
                        missing: Part::I,
                    })
                }
                _ => (),
            }
        }

        let beginners = tags
            .iter()
            .enumerate()
            .flat_map(|(id, category_tags)| {
                [Part::B, Part::Single]
                    .into_iter()
                    .filter_map(move |part| category_tags.get(part).map(|tag| (tag, id, part)))
            })
            .map(|(tag, id, part)| {
                (
                    tag,
                    Beginner {
                        category: CategoryId(id),
                        part,
                    },
                )
            })
            .collect();

        Ok(TagScheme {
            labels: labels.iter().map(|l| String::from(l.as_ref())).collect(),
            label_index,
            categories: categories.into_boxed_slice(),
            tags: tags.into_boxed_slice(),
            beginners,
            outside,
        })
    }

    /// Every tag index whose part is `B` or `1`, with its category and part.
    pub fn phrase_beginners(&self) -> &AHashMap<usize, Beginner> {
        &self.beginners
    }

    #[inline]
    pub fn beginner(&self, tag: usize) -> Option<Beginner> {
        self.beginners.get(&tag).copied()
    }

    /// The `I` and `E` tag indices of a category.
    #[inline]
    pub fn phrase_continuation(&self, category: CategoryId) -> Continuation {
        self.tags
            .get(category.0)
            .map(|t| Continuation {
                inside: t.inside,
                end: t.end,
            })
            .unwrap_or_default()
    }

    /// Tag index encoding `part` for `category`, if the label set defines it.
    pub fn tag_for(&self, category: CategoryId, part: Part) -> Option<usize> {
        match part {
            Part::O => self.outside,
            p => self.tags.get(category.0).and_then(|t| t.get(p)),
        }
    }

    pub fn label(&self, tag: usize) -> Option<&str> {
        self.labels.get(tag).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.label_index.get(label).copied()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Category names, in construction order. The position of a name is its `CategoryId`.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.categories
            .iter()
            .position(|c| c == name)
            .map(CategoryId)
    }

    pub fn category_name(&self, category: CategoryId) -> Option<&str> {
        self.categories.get(category.0).map(String::as_str)
    }

    /// Tag index of the `O` label, if the label set has one.
    pub fn outside_index(&self) -> Option<usize> {
        self.outside
    }

    /// Number of labels, i.e. the exclusive upper bound of valid tag indices.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
