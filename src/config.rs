/*
 * This modules contains the `TaggerConfig` struct, which gathers every option of a tagging run, and
 * its builder. The config also knows how to open the input and output streams: a path opens a file
 * and no path means the standard stream.
*/
use either::Either as LeftOrRight;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, StdinLock, Stdout};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sentences with fewer tokens are neither tagged nor scored.
pub const DEFAULT_MIN_SENTENCE_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("a model file is required")]
    MissingModel,
    #[error("scores can only be computed on a gold labeled corpus")]
    ScoresWithoutGold,
    #[error("the score rows are only computed with the f-scores")]
    ScoresWithoutFscore,
}

/// Which scores a run computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scoring {
    pub fscore: bool,
    pub accuracy: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// Every option of a tagging run.
pub struct TaggerConfig {
    /// Path of the JSON model file.
    model: PathBuf,
    /// Corpus to tag. `None` reads the standard input.
    input: Option<PathBuf>,
    /// Where the tagged corpus and the scores are written. `None` writes to the standard output.
    output: Option<PathBuf>,
    /// Is the corpus labeled? Gold labels are required to compute scores.
    gold: bool,
    fscore: bool,
    /// Compute the per word accuracy.
    precision: bool,
    /// Also dump the score rows as JSON lines to this path.
    scores_jsonl: Option<PathBuf>,
    min_sentence_len: usize,
}

impl TaggerConfig {
    pub fn model(&self) -> &Path {
        &self.model
    }

    pub fn gold(&self) -> bool {
        self.gold
    }

    pub fn min_sentence_len(&self) -> usize {
        self.min_sentence_len
    }

    pub fn scores_jsonl(&self) -> Option<&Path> {
        self.scores_jsonl.as_deref()
    }

    /// The scores computed by the run. A gold run without any score flag computes the f-scores.
    pub fn scoring(&self) -> Scoring {
        if !self.gold {
            return Scoring::default();
        }
        Scoring {
            fscore: self.fscore || !self.precision,
            accuracy: self.precision,
        }
    }

    pub fn open_input(&self) -> io::Result<LeftOrRight<BufReader<File>, StdinLock<'static>>> {
        match &self.input {
            Some(path) => Ok(LeftOrRight::Left(BufReader::new(File::open(path)?))),
            None => Ok(LeftOrRight::Right(io::stdin().lock())),
        }
    }

    pub fn open_output(&self) -> io::Result<LeftOrRight<BufWriter<File>, BufWriter<Stdout>>> {
        match &self.output {
            Some(path) => Ok(LeftOrRight::Left(BufWriter::new(File::create(path)?))),
            None => Ok(LeftOrRight::Right(BufWriter::new(io::stdout()))),
        }
    }
}

impl Display for TaggerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stream = |p: &Option<PathBuf>, default: &str| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| default.to_string())
        };
        write!(
            f,
            "Model: {}\n Input: {}\n Output: {}\n Gold labeled corpus: {}\n Scores: {:?}\n Minimum sentence length: {}",
            self.model.display(),
            stream(&self.input, "stdin"),
            stream(&self.output, "stdout"),
            self.gold,
            self.scoring(),
            self.min_sentence_len
        )
    }
}

/// This builder can be used to build and customize a `TaggerConfig` structure.
#[derive(Clone, Debug)]
pub struct TaggerConfigBuilder {
    model: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    gold: bool,
    fscore: bool,
    precision: bool,
    scores_jsonl: Option<PathBuf>,
    min_sentence_len: usize,
}

impl Default for TaggerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggerConfigBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            input: None,
            output: None,
            gold: false,
            fscore: false,
            precision: false,
            scores_jsonl: None,
            min_sentence_len: DEFAULT_MIN_SENTENCE_LEN,
        }
    }
    pub fn model<P: Into<PathBuf>>(mut self, model: P) -> Self {
        self.model = Some(model.into());
        self
    }
    pub fn input<P: Into<PathBuf>>(mut self, input: Option<P>) -> Self {
        self.input = input.map(Into::into);
        self
    }
    pub fn output<P: Into<PathBuf>>(mut self, output: Option<P>) -> Self {
        self.output = output.map(Into::into);
        self
    }
    pub fn gold(mut self, gold: bool) -> Self {
        self.gold = gold;
        self
    }
    pub fn fscore(mut self, fscore: bool) -> Self {
        self.fscore = fscore;
        self
    }
    pub fn precision(mut self, precision: bool) -> Self {
        self.precision = precision;
        self
    }
    pub fn scores_jsonl<P: Into<PathBuf>>(mut self, scores_jsonl: Option<P>) -> Self {
        self.scores_jsonl = scores_jsonl.map(Into::into);
        self
    }
    pub fn min_sentence_len(mut self, min_sentence_len: usize) -> Self {
        self.min_sentence_len = min_sentence_len;
        self
    }
    pub fn build(self) -> Result<TaggerConfig, ConfigError> {
        let model = self.model.ok_or(ConfigError::MissingModel)?;
        if self.scores_jsonl.is_some() {
            if !self.gold {
                return Err(ConfigError::ScoresWithoutGold);
            }
            if self.precision && !self.fscore {
                return Err(ConfigError::ScoresWithoutFscore);
            }
        }
        Ok(TaggerConfig {
            model,
            input: self.input,
            output: self.output,
            gold: self.gold,
            fscore: self.fscore,
            precision: self.precision,
            scores_jsonl: self.scores_jsonl,
            min_sentence_len: self.min_sentence_len,
        })
    }
}
