/**
Reading of tab separated corpora. A corpus holds one token per line and separates sentences with
blank lines. The layout of a line depends on the corpus variant:

* unlabeled corpora: the first field is the surface form, the other fields are ignored;
* gold labeled corpora: exactly two fields, the surface form and its label.

Sentences are read lazily, one at a time. A line that cannot be parsed invalidates its whole
sentence but not the rest of the corpus.
*/
use crate::features::{Featurizer, Vocabulary};
use crate::schemes::TagScheme;
use ndarray::{Array2, ArrayView2};
use std::io::{self, BufRead, Lines};
use thiserror::Error;

/// Separator of the fields of a line.
pub const FIELD_SEPARATOR: char = '\t';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedLine {
    #[error("expected {expected} tab separated fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("unknown label `{0}`")]
    UnknownLabel(String),
    #[error("empty surface form")]
    EmptySurface,
    #[error("the line is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("malformed sentence ending at line {line}: {reason}")]
    MalformedSentence { line: usize, reason: MalformedLine },
    #[error("cannot read the corpus: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    /// Gold tag index, only set by gold labeled variants.
    pub gold: Option<usize>,
}

/// How the lines of a corpus are parsed, displayed and scored. The variant is chosen once, before
/// reading the corpus.
pub trait CorpusVariant {
    fn parse_line(&self, line: &str) -> Result<Token, MalformedLine>;

    /// Text written in front of the predicted label of `token`.
    fn display(&self, token: &Token) -> String;

    /// Gold tags of a sentence, if this variant has any.
    fn score_inputs<'s>(&self, sentence: &'s Sentence) -> Option<&'s [usize]>;
}

/// Variant of corpora without labels. Nothing can be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unlabeled;

impl CorpusVariant for Unlabeled {
    fn parse_line(&self, line: &str) -> Result<Token, MalformedLine> {
        let surface = line.split(FIELD_SEPARATOR).next().unwrap_or_default();
        if surface.is_empty() {
            return Err(MalformedLine::EmptySurface);
        }
        Ok(Token {
            surface: surface.to_string(),
            gold: None,
        })
    }

    fn display(&self, token: &Token) -> String {
        token.surface.clone()
    }

    fn score_inputs<'s>(&self, _sentence: &'s Sentence) -> Option<&'s [usize]> {
        None
    }
}

/// Variant of corpora labeled with the labels of a scheme.
#[derive(Debug, Clone, Copy)]
pub struct GoldLabeled<'a> {
    scheme: &'a TagScheme,
}

impl<'a> GoldLabeled<'a> {
    pub fn new(scheme: &'a TagScheme) -> Self {
        GoldLabeled { scheme }
    }
}

impl CorpusVariant for GoldLabeled<'_> {
    fn parse_line(&self, line: &str) -> Result<Token, MalformedLine> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [surface, label] = fields[..] else {
            return Err(MalformedLine::FieldCount {
                expected: 2,
                found: fields.len(),
            });
        };
        if surface.is_empty() {
            return Err(MalformedLine::EmptySurface);
        }
        let gold = self
            .scheme
            .index_of(label)
            .ok_or_else(|| MalformedLine::UnknownLabel(label.to_string()))?;
        Ok(Token {
            surface: surface.to_string(),
            gold: Some(gold),
        })
    }

    fn display(&self, token: &Token) -> String {
        match token.gold.and_then(|g| self.scheme.label(g)) {
            Some(label) => format!("{}{}{}", token.surface, FIELD_SEPARATOR, label),
            None => token.surface.clone(),
        }
    }

    fn score_inputs<'s>(&self, sentence: &'s Sentence) -> Option<&'s [usize]> {
        sentence.gold()
    }
}

/// An encoded sentence: its tokens, their word indices and their feature indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    tokens: Vec<Token>,
    words: Vec<usize>,
    features: Array2<usize>,
    gold: Option<Vec<usize>>,
}

impl Sentence {
    pub fn encode(tokens: Vec<Token>, vocabulary: &Vocabulary, featurizer: &Featurizer) -> Self {
        let words = tokens.iter().map(|t| vocabulary.encode(&t.surface)).collect();
        let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
        let features = featurizer.featurize_sentence(&surfaces);
        let gold = tokens.iter().map(|t| t.gold).collect::<Option<Vec<usize>>>();
        Sentence {
            tokens,
            words,
            features,
            gold,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn words(&self) -> &[usize] {
        &self.words
    }

    pub fn features(&self) -> ArrayView2<usize> {
        self.features.view()
    }

    /// Gold tags, set only if every token has one.
    pub fn gold(&self) -> Option<&[usize]> {
        self.gold.as_deref()
    }
}

/// Lazily reads the sentences of a corpus.
pub struct SentenceReader<'a, R, V> {
    lines: Lines<R>,
    variant: V,
    vocabulary: &'a Vocabulary,
    featurizer: &'a Featurizer,
    line_number: usize,
    finished: bool,
}

impl<'a, R, V> SentenceReader<'a, R, V>
where
    R: BufRead,
    V: CorpusVariant,
{
    pub fn new(input: R, variant: V, vocabulary: &'a Vocabulary, featurizer: &'a Featurizer) -> Self {
        SentenceReader {
            lines: input.lines(),
            variant,
            vocabulary,
            featurizer,
            line_number: 0,
            finished: false,
        }
    }

    /// Number of lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R, V> Iterator for SentenceReader<'_, R, V>
where
    R: BufRead,
    V: CorpusVariant,
{
    type Item = Result<Sentence, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut tokens = Vec::new();
        let mut malformed = None;
        let mut has_lines = false;
        loop {
            let line = match self.lines.next() {
                None => {
                    self.finished = true;
                    break;
                }
                // the undecodable line is already consumed, only its sentence is lost
                Some(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                    self.line_number += 1;
                    has_lines = true;
                    if malformed.is_none() {
                        malformed = Some(MalformedLine::InvalidUtf8);
                    }
                    continue;
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(CorpusError::Io(e)));
                }
                Some(Ok(line)) => line,
            };
            self.line_number += 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                if has_lines {
                    break;
                }
                continue;
            }
            has_lines = true;
            // the rest of a malformed sentence is consumed but not parsed
            if malformed.is_some() {
                continue;
            }
            match self.variant.parse_line(line) {
                Ok(token) => tokens.push(token),
                Err(reason) => malformed = Some(reason),
            }
        }
        if let Some(reason) = malformed {
            return Some(Err(CorpusError::MalformedSentence {
                line: self.line_number,
                reason,
            }));
        }
        if !has_lines {
            return None;
        }
        Some(Ok(Sentence::encode(
            tokens,
            self.vocabulary,
            self.featurizer,
        )))
    }
}
