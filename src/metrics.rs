/**
This module computes the phrase level metrics (precision, recall, f-score) of a gold sequence and a
predicted sequence, and the per word accuracy. Phrases are matched exactly: a predicted phrase
counts as a true positive only if a gold phrase has the same category and the same bounds.
*/
use crate::entity::Phrases;
use crate::reporter::ScoreReport;
use crate::schemes::{CategoryId, TagScheme};
use ndarray::ArrayView2;
use ndarray_stats::{errors::MinMaxError, QuantileExt};
use num::Float;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::iter::{once, Sum};
use std::ops::AddAssign;
use thiserror::Error;

/// Name of the row aggregating every category.
pub const GLOBAL: &str = "Global";

/// Marker displayed in place of a ratio whose denominator is zero.
pub const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
/// A ratio that may be undefined. A zero denominator is not an error: it yields
/// `NotApplicable`, serialized as `null`.
pub enum Ratio<F = f64> {
    Value(F),
    NotApplicable,
}

impl<F: Float> Ratio<F> {
    /// Divides `numerator` by `denominator`, or returns `NotApplicable` if the denominator is 0.
    pub fn divide(numerator: F, denominator: F) -> Self {
        if denominator == F::zero() {
            Ratio::NotApplicable
        } else {
            Ratio::Value(numerator / denominator)
        }
    }

    pub fn value(&self) -> Option<F> {
        match self {
            Ratio::Value(v) => Some(*v),
            Ratio::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Ratio::Value(_))
    }
}

impl<F: Debug> Display for Ratio<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // `{:?}` keeps the fractional part of round values (`1.0`, not `1`)
            Ratio::Value(v) => write!(f, "{:?}", v),
            Ratio::NotApplicable => write!(f, "{}", NOT_APPLICABLE),
        }
    }
}

pub fn precision<F: Float>(true_positive: F, false_positive: F) -> Ratio<F> {
    Ratio::divide(true_positive, true_positive + false_positive)
}

pub fn recall<F: Float>(true_positive: F, false_negative: F) -> Ratio<F> {
    Ratio::divide(true_positive, true_positive + false_negative)
}

/// Harmonic mean of precision and recall. Both being exactly zero gives a score of zero, while
/// either of them being undefined makes the score undefined.
pub fn f_score<F: Float>(precision: Ratio<F>, recall: Ratio<F>) -> Ratio<F> {
    match (precision, recall) {
        (Ratio::Value(p), Ratio::Value(r)) if p == F::zero() && r == F::zero() => {
            Ratio::Value(F::zero())
        }
        (Ratio::Value(p), Ratio::Value(r)) => {
            let two = F::one() + F::one();
            Ratio::Value(two * p * r / (p + r))
        }
        _ => Ratio::NotApplicable,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
/// Confusion counters of a single category.
pub struct Counts {
    #[serde(rename = "tp")]
    pub true_positive: f64,
    #[serde(rename = "fp")]
    pub false_positive: f64,
    #[serde(rename = "fn")]
    pub false_negative: f64,
}

impl Counts {
    pub fn new(true_positive: f64, false_positive: f64, false_negative: f64) -> Self {
        Counts {
            true_positive,
            false_positive,
            false_negative,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Counts::default()
    }

    pub fn score_row<S: Into<String>>(&self, category: S) -> ScoreRow {
        let p = precision(self.true_positive, self.false_positive);
        let r = recall(self.true_positive, self.false_negative);
        ScoreRow {
            category: category.into(),
            precision: p,
            recall: r,
            f1: f_score(p, r),
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.true_positive += rhs.true_positive;
        self.false_positive += rhs.false_positive;
        self.false_negative += rhs.false_negative;
    }
}

impl<'a> Sum<&'a Counts> for Counts {
    fn sum<I: Iterator<Item = &'a Counts>>(iter: I) -> Self {
        iter.fold(Counts::default(), |mut acc, c| {
            acc += *c;
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// One line of the score report.
pub struct ScoreRow {
    pub category: String,
    pub precision: Ratio,
    pub recall: Ratio,
    pub f1: Ratio,
}

/// A score row is displayed as a tab separated line.
impl Display for ScoreRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.category, self.precision, self.recall, self.f1
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("inconsistent length between two lists: gold is length {gold}, predicted is length {predicted}")]
    InconsistentLength { gold: usize, predicted: usize },
    #[error("cannot merge confusion matrices built over different categories")]
    CategoryMismatch,
    #[error("cannot decode scores: {0}")]
    UndefinedScores(#[from] MinMaxError),
}

fn check_consistent_length<T>(gold: &[T], predicted: &[T]) -> Result<(), MetricsError> {
    if gold.len() != predicted.len() {
        return Err(MetricsError::InconsistentLength {
            gold: gold.len(),
            predicted: predicted.len(),
        });
    }
    Ok(())
}

/// Index of the largest score of every row. NaN scores have no order and make the decoding fail.
pub fn argmax_rows(scores: ArrayView2<f32>) -> Result<Vec<usize>, MinMaxError> {
    scores.rows().into_iter().map(|row| row.argmax()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Per category confusion counters. The category order is the construction order of the scheme.
pub struct ConfusionMatrix {
    categories: Box<[String]>,
    counts: Box<[Counts]>,
}

impl ConfusionMatrix {
    fn new(categories: &[String]) -> Self {
        ConfusionMatrix {
            categories: categories.into(),
            counts: vec![Counts::default(); categories.len()].into_boxed_slice(),
        }
    }

    pub fn get(&self, category: CategoryId) -> Option<Counts> {
        self.counts.get(category.index()).copied()
    }

    pub fn get_by_name(&self, category: &str) -> Option<Counts> {
        self.categories
            .iter()
            .position(|c| c == category)
            .and_then(|i| self.counts.get(i).copied())
    }

    /// Sum of the counters of every category.
    pub fn global(&self) -> Counts {
        self.counts.iter().sum()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Counts)> + '_ {
        self.categories
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter())
    }

    fn slot(&mut self, category: CategoryId) -> Option<&mut Counts> {
        self.counts.get_mut(category.index())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Owns the confusion matrix of a scoring run. The counters only grow until `reset` is called.
pub struct ConfusionAccumulator {
    matrix: ConfusionMatrix,
}

impl ConfusionAccumulator {
    /// Creates an accumulator with one zeroed row per category of `scheme`.
    pub fn new(scheme: &TagScheme) -> Self {
        ConfusionAccumulator {
            matrix: ConfusionMatrix::new(scheme.categories()),
        }
    }

    pub fn reset(&mut self) {
        self.matrix.counts.fill(Counts::default());
    }

    /// Updates the counters with the phrases of one sentence.
    ///
    /// * `gold`: phrases of the reference annotation.
    /// * `predicted`: phrases of the classifier output.
    pub fn update(&mut self, gold: &Phrases, predicted: &Phrases) {
        for phrase in gold.intersection(predicted) {
            if let Some(counts) = self.matrix.slot(phrase.category) {
                counts.true_positive += 1.0;
            }
        }
        for phrase in gold.difference(predicted) {
            if let Some(counts) = self.matrix.slot(phrase.category) {
                counts.false_negative += 1.0;
            }
        }
        for phrase in predicted.difference(gold) {
            if let Some(counts) = self.matrix.slot(phrase.category) {
                counts.false_positive += 1.0;
            }
        }
    }

    /// Extracts the phrases of both tag sequences of a sentence and updates the counters.
    pub fn process_sentence(&mut self, gold: &[usize], predicted: &[usize], scheme: &TagScheme) {
        let gold_phrases = Phrases::from_tags(gold, scheme);
        let predicted_phrases = Phrases::from_tags(predicted, scheme);
        self.update(&gold_phrases, &predicted_phrases);
    }

    /// Same as `process_sentence`, for sentences given as `(tokens × labels)` score or one-hot
    /// matrices.
    pub fn process_one_hot(
        &mut self,
        gold: ArrayView2<f32>,
        predicted: ArrayView2<f32>,
        scheme: &TagScheme,
    ) -> Result<(), MetricsError> {
        let gold_tags = argmax_rows(gold)?;
        let predicted_tags = argmax_rows(predicted)?;
        check_consistent_length(&gold_tags, &predicted_tags)?;
        self.process_sentence(&gold_tags, &predicted_tags, scheme);
        Ok(())
    }

    /// Resets the counters, scores every sentence pair and returns the report rows.
    pub fn count_score(
        &mut self,
        gold: &[Vec<usize>],
        predicted: &[Vec<usize>],
        scheme: &TagScheme,
    ) -> Result<Vec<ScoreRow>, MetricsError> {
        check_consistent_length(gold, predicted)?;
        self.reset();
        for (gold_sentence, predicted_sentence) in gold.iter().zip(predicted.iter()) {
            self.process_sentence(gold_sentence, predicted_sentence, scheme);
        }
        Ok(self.report().collect())
    }

    /// Adds the counters of `other` to this accumulator. Both must come from the same scheme.
    pub fn merge(&mut self, other: &ConfusionAccumulator) -> Result<(), MetricsError> {
        if self.matrix.categories != other.matrix.categories {
            return Err(MetricsError::CategoryMismatch);
        }
        for (mine, theirs) in self
            .matrix
            .counts
            .iter_mut()
            .zip(other.matrix.counts.iter())
        {
            *mine += *theirs;
        }
        Ok(())
    }

    /// One row per category, in construction order, followed by the `Global` row.
    pub fn report(&self) -> impl Iterator<Item = ScoreRow> + '_ {
        self.matrix
            .iter()
            .map(|(category, counts)| counts.score_row(category))
            .chain(once(self.matrix.global().score_row(GLOBAL)))
    }

    pub fn matrix(&self) -> &ConfusionMatrix {
        &self.matrix
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// Counts tokens whose predicted tag equals the gold tag.
pub struct AccuracyCounter {
    good: f64,
    bad: f64,
}

impl AccuracyCounter {
    pub fn reset(&mut self) {
        *self = AccuracyCounter::default();
    }

    pub fn update(&mut self, gold: &[usize], predicted: &[usize]) {
        let good = gold
            .iter()
            .zip(predicted.iter())
            .filter(|(g, p)| g == p)
            .count();
        self.good += good as f64;
        self.bad += (gold.len() - good) as f64;
    }

    pub fn ratio(&self) -> Ratio {
        Ratio::divide(self.good, self.good + self.bad)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// The score counters of a tagging run. They are owned by the caller, handed to the pipeline and
/// reset explicitly.
pub struct Scores {
    pub confusion: Option<ConfusionAccumulator>,
    pub accuracy: Option<AccuracyCounter>,
}

impl Scores {
    /// * `fscore`: accumulate the phrase confusion matrix
    /// * `accuracy`: count the per word accuracy
    pub fn new(scheme: &TagScheme, fscore: bool, accuracy: bool) -> Self {
        Scores {
            confusion: fscore.then(|| ConfusionAccumulator::new(scheme)),
            accuracy: accuracy.then(AccuracyCounter::default),
        }
    }

    pub fn disabled() -> Self {
        Scores::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.confusion.is_some() || self.accuracy.is_some()
    }

    pub fn reset(&mut self) {
        if let Some(confusion) = self.confusion.as_mut() {
            confusion.reset();
        }
        if let Some(accuracy) = self.accuracy.as_mut() {
            accuracy.reset();
        }
    }

    pub fn update(&mut self, scheme: &TagScheme, gold: &[usize], predicted: &[usize]) {
        if let Some(confusion) = self.confusion.as_mut() {
            confusion.process_sentence(gold, predicted, scheme);
        }
        if let Some(accuracy) = self.accuracy.as_mut() {
            accuracy.update(gold, predicted);
        }
    }

    pub fn report(&self) -> ScoreReport {
        ScoreReport::new(
            self.confusion
                .as_ref()
                .map(|c| c.report().collect())
                .unwrap_or_default(),
            self.accuracy.as_ref().map(AccuracyCounter::ratio),
        )
    }
}
