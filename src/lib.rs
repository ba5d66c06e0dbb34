/*!
This library tags sentences with a windowed classifier and scores the predicted tags at the phrase
level. It is built around two pieces: a streaming inference pipeline, which turns sentences into
fixed width context windows and hands them to a classifier, and a scoring engine, which rebuilds
the phrases encoded by a tag sequence and counts the matches between gold and predicted phrases.

# SCHEME
Labels are made of a part and a category separated by `-`, such as `B-PER` or `1-LOC`. The parts
are:
* `B`: first token of a phrase of at least two tokens.
* `I`: token inside a phrase.
* `E`: last token of a phrase of at least two tokens.
* `1`: phrase of a single token.
* `O`: token outside of any phrase. This label has no category.

A category using `I` must also use `E`, and the other way around. The BIO encoding is therefore
not accepted as is: phrases need an explicit end.

# Terminology
* A category is the type of a phrase, such as `PER` or `NP`.
* A tag is the index of a label in the label list the scheme was built from. Classifiers and
    scorers work on tags, never on label strings.
* A phrase is a `(category, start, end)` span of tokens, both bounds inclusive. Two phrases match
    only if the three values are equal.
* A window is the list of word indices around a token, padded at the sentence boundaries.

# Example
```rust
use seqtag::{ConfusionAccumulator, Ratio, TagScheme};

let scheme = TagScheme::build(&["B-P", "I-P", "E-P", "1-P", "O"]).unwrap();
let gold = [0, 1, 2, 4, 3];
let predicted = [0, 1, 2, 4, 4];

let mut accumulator = ConfusionAccumulator::new(&scheme);
accumulator.process_sentence(&gold, &predicted, &scheme);
let rows: Vec<_> = accumulator.report().collect();
assert_eq!(rows[0].precision, Ratio::Value(1.0));
assert_eq!(rows[0].recall, Ratio::Value(0.5));
assert_eq!(rows[1].to_string(), "Global\t1.0\t0.5\t0.6666666666666666");
```
*/

mod classifier;
mod config;
mod corpus;
mod entity;
mod features;
mod metrics;
mod model;
mod pipeline;
mod reporter;
mod schemes;
mod window;

// The public api starts here
pub use schemes::{
    parse_label, Beginner, CategoryId, Continuation, Part, SchemeError, TagScheme, DELIMITER,
    OUTSIDE,
};

pub use entity::{extract_phrases, Phrase, PhraseIter, Phrases};

pub use metrics::{
    argmax_rows, f_score, precision, recall, AccuracyCounter, ConfusionAccumulator,
    ConfusionMatrix, Counts, MetricsError, Ratio, ScoreRow, Scores, GLOBAL, NOT_APPLICABLE,
};

pub use window::{Window, WindowBatch, WindowBuilder, WindowError};

pub use classifier::{check_tags, decode_scores, Classifier, ClassifierError, LexiconClassifier};

pub use features::{FeatureKind, Featurizer, Vocabulary, UNKNOWN_WORD};

pub use corpus::{
    CorpusError, CorpusVariant, GoldLabeled, MalformedLine, Sentence, SentenceReader, Token,
    Unlabeled, FIELD_SEPARATOR,
};

pub use model::{ModelError, ModelFile, TaggerModel, MAX_WINDOW_RADIUS};

pub use pipeline::{InferencePipeline, PipelineError, RunSummary, SentenceOutcome};

pub use reporter::{write_json_lines, ResultWriter, ScoreReport, ACCURACY_PREFIX};

pub use config::{
    ConfigError, Scoring, TaggerConfig, TaggerConfigBuilder, DEFAULT_MIN_SENTENCE_LEN,
};
