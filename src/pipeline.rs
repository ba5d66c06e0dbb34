/**
The streaming inference pipeline. Sentences are read one at a time, turned into windows, tagged by
the classifier and written out. When the corpus carries gold labels, the predicted tags are scored
against them.

Sentences shorter than the minimum length are skipped: they are neither written nor scored. A
malformed sentence is logged, counted and skipped. Classifier and I/O failures stop the run.
*/
use crate::classifier::{check_tags, Classifier, ClassifierError};
use crate::config::DEFAULT_MIN_SENTENCE_LEN;
use crate::corpus::{CorpusError, CorpusVariant, Sentence, SentenceReader};
use crate::metrics::Scores;
use crate::model::TaggerModel;
use crate::reporter::ResultWriter;
use crate::schemes::OUTSIDE;
use crate::window::{WindowBuilder, WindowError};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("cannot build the windows of a sentence: {0}")]
    Window(#[from] WindowError),
}

/// What happened to a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceOutcome {
    /// Too short to be tagged.
    Skipped,
    Tagged { tokens: usize },
}

/// Counters of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub tagged: usize,
    pub skipped: usize,
    pub malformed: usize,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sentences tagged, {} skipped, {} malformed",
            self.tagged, self.skipped, self.malformed
        )
    }
}

/// Tags a corpus with a model.
///
/// * `C`: the classifier of the model.
/// * `V`: the corpus variant, which decides how lines are parsed and whether they can be scored.
/// * `W`: the output stream.
pub struct InferencePipeline<'m, C, V, W: Write> {
    model: &'m TaggerModel<C>,
    variant: V,
    windows: WindowBuilder,
    writer: ResultWriter<W>,
    min_sentence_len: usize,
}

impl<'m, C, V, W> InferencePipeline<'m, C, V, W>
where
    C: Classifier,
    V: CorpusVariant + Clone,
    W: Write,
{
    pub fn new(model: &'m TaggerModel<C>, variant: V, out: W) -> Self {
        InferencePipeline {
            model,
            variant,
            windows: model.window_builder(),
            writer: ResultWriter::new(out),
            min_sentence_len: DEFAULT_MIN_SENTENCE_LEN,
        }
    }

    pub fn with_min_sentence_len(mut self, min_sentence_len: usize) -> Self {
        self.min_sentence_len = min_sentence_len;
        self
    }

    /// Tags every sentence of `input`, updating `scores` along the way, then writes the score
    /// report if `scores` computes anything. `scores` is not reset.
    pub fn run<R: BufRead>(
        &mut self,
        input: R,
        scores: &mut Scores,
    ) -> Result<RunSummary, PipelineError> {
        let model = self.model;
        let reader = SentenceReader::new(
            input,
            self.variant.clone(),
            &model.vocabulary,
            &model.featurizer,
        );
        let mut summary = RunSummary::default();
        for sentence in reader {
            match sentence {
                Ok(sentence) => match self.process(&sentence, scores)? {
                    SentenceOutcome::Skipped => summary.skipped += 1,
                    SentenceOutcome::Tagged { .. } => summary.tagged += 1,
                },
                Err(CorpusError::MalformedSentence { line, reason }) => {
                    warn!(line, %reason, "skipping malformed sentence");
                    summary.malformed += 1;
                }
                Err(CorpusError::Io(e)) => return Err(PipelineError::Io(e)),
            }
        }
        if scores.is_enabled() {
            self.writer.write_report(&scores.report())?;
        }
        self.writer.flush()?;
        info!(
            tagged = summary.tagged,
            skipped = summary.skipped,
            malformed = summary.malformed,
            "finished tagging"
        );
        Ok(summary)
    }

    /// Tags a single sentence and writes it out.
    pub fn process(
        &mut self,
        sentence: &Sentence,
        scores: &mut Scores,
    ) -> Result<SentenceOutcome, PipelineError> {
        if sentence.len() < self.min_sentence_len {
            debug!(tokens = sentence.len(), "skipping short sentence");
            return Ok(SentenceOutcome::Skipped);
        }
        let scheme = &self.model.scheme;
        let batch = self.windows.build(sentence.words(), sentence.features())?;
        let tags = self.model.classifier.tag_windows(&batch)?;
        check_tags(&tags, batch.len(), scheme.len())?;
        let displays = sentence.tokens().iter().map(|t| self.variant.display(t));
        let labels = tags.iter().map(|&t| scheme.label(t).unwrap_or(OUTSIDE));
        self.writer.write_sentence(displays, labels)?;
        if let Some(gold) = self.variant.score_inputs(sentence) {
            scores.update(scheme, gold, &tags);
        }
        debug!(tokens = sentence.len(), "tagged sentence");
        Ok(SentenceOutcome::Tagged {
            tokens: sentence.len(),
        })
    }

    pub fn writer(&self) -> &ResultWriter<W> {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{GoldLabeled, Unlabeled};
    use crate::features::{Featurizer, Vocabulary};
    use crate::metrics::Ratio;
    use crate::schemes::TagScheme;
    use crate::window::WindowBatch;

    type Tagger = fn(&WindowBatch) -> Result<Vec<usize>, ClassifierError>;

    fn model(classifier: Tagger) -> TaggerModel<Tagger> {
        TaggerModel::new(
            TagScheme::build(&["B-P", "I-P", "E-P", "1-P", "O"]).unwrap(),
            Vocabulary::from_words(["john", "smith"]),
            Featurizer::default(),
            classifier,
            1,
        )
    }

    // Tags known words as a `B-P E-P` phrase and everything else as `O`.
    fn by_word(windows: &WindowBatch) -> Result<Vec<usize>, ClassifierError> {
        Ok(windows
            .iter()
            .map(|w| match w.center() {
                1 => 0,
                2 => 2,
                _ => 4,
            })
            .collect())
    }

    #[test]
    fn test_unlabeled_run() {
        let model = model(by_word);
        let mut pipeline = InferencePipeline::new(&model, Unlabeled, Vec::new());
        let mut scores = Scores::disabled();
        let corpus = "John\nSmith\nsmiled\n\nHi\n\n";
        let summary = pipeline.run(corpus.as_bytes(), &mut scores).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                tagged: 1,
                skipped: 1,
                malformed: 0
            }
        );
        let out = String::from_utf8(pipeline.into_writer()).unwrap();
        assert_eq!(out, "John\tB-P\nSmith\tE-P\nsmiled\tO\n\n");
    }

    #[test]
    fn test_gold_run_scores_and_reports() {
        let model = model(by_word);
        let mut pipeline =
            InferencePipeline::new(&model, GoldLabeled::new(&model.scheme), Vec::new());
        let mut scores = Scores::new(&model.scheme, true, true);
        let corpus = "John\tB-P\nSmith\tE-P\nand\tO\nhim\t1-P\n\nbad\tline\tX\n\n";
        let summary = pipeline.run(corpus.as_bytes(), &mut scores).unwrap();
        assert_eq!(summary.tagged, 1);
        assert_eq!(summary.malformed, 1);
        let out = String::from_utf8(pipeline.into_writer()).unwrap();
        let expected = "John\tB-P\tB-P
Smith\tE-P\tE-P
and\tO\tO
him\t1-P\tO

P\t1.0\t0.5\t0.6666666666666666
Global\t1.0\t0.5\t0.6666666666666666
per word accuracy: 0.75
";
        assert_eq!(out, expected);
        assert_eq!(scores.report().accuracy(), Some(Ratio::Value(0.75)));
    }

    #[test]
    fn test_classifier_failures_are_fatal() {
        fn too_short(_: &WindowBatch) -> Result<Vec<usize>, ClassifierError> {
            Ok(vec![4])
        }
        fn out_of_range(windows: &WindowBatch) -> Result<Vec<usize>, ClassifierError> {
            Ok(vec![5; windows.len()])
        }
        let corpus = "a\nb\nc\n";
        let short_model = model(too_short);
        let mut pipeline = InferencePipeline::new(&short_model, Unlabeled, Vec::new());
        assert!(matches!(
            pipeline.run(corpus.as_bytes(), &mut Scores::disabled()),
            Err(PipelineError::Classifier(ClassifierError::LengthMismatch {
                expected: 3,
                got: 1
            }))
        ));
        let wide_model = model(out_of_range);
        let mut pipeline = InferencePipeline::new(&wide_model, Unlabeled, Vec::new());
        assert!(matches!(
            pipeline.run(corpus.as_bytes(), &mut Scores::disabled()),
            Err(PipelineError::Classifier(ClassifierError::UnknownTag { tag: 5, labels: 5 }))
        ));
        // Nothing is written for a sentence whose tags were rejected
        assert!(pipeline.writer().get_ref().is_empty());
    }

    #[test]
    fn test_min_sentence_len() {
        let model = model(by_word);
        let mut pipeline =
            InferencePipeline::new(&model, Unlabeled, Vec::new()).with_min_sentence_len(1);
        let summary = pipeline
            .run("Hi\n\n".as_bytes(), &mut Scores::disabled())
            .unwrap();
        assert_eq!(summary.tagged, 1);
        assert_eq!(String::from_utf8(pipeline.into_writer()).unwrap(), "Hi\tO\n\n");
    }
}
