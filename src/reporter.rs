/**
This module writes the results of a tagging run: one line per token with its predicted label, and,
at the end of the run, the score report. The score rows can also be dumped as JSON lines.
*/
use crate::metrics::{Ratio, ScoreRow};
use itertools::Itertools;
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

/// Prefix of the accuracy line of the score report.
pub const ACCURACY_PREFIX: &str = "per word accuracy:";

/// The scores of a run. When displayed, every row is a tab separated line and the accuracy, if
/// any, comes last.
///
/// ```text
/// P	1.0	0.5	0.6666666666666666
/// L	N/A	N/A	N/A
/// Global	1.0	0.5	0.6666666666666666
/// per word accuracy: 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScoreReport {
    rows: Vec<ScoreRow>,
    accuracy: Option<Ratio>,
}

impl ScoreReport {
    pub fn new(rows: Vec<ScoreRow>, accuracy: Option<Ratio>) -> Self {
        ScoreReport { rows, accuracy }
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn accuracy(&self) -> Option<Ratio> {
        self.accuracy
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.accuracy.is_none()
    }
}

impl Display for ScoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows.iter() {
            writeln!(f, "{}", row)?;
        }
        if let Some(accuracy) = self.accuracy {
            writeln!(f, "{} {}", ACCURACY_PREFIX, accuracy)?;
        }
        Ok(())
    }
}

/// Writes the tagged sentences and the score report to an output stream.
#[derive(Debug)]
pub struct ResultWriter<W: Write> {
    out: W,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(out: W) -> Self {
        ResultWriter { out }
    }

    /// Writes one `<display>\t<label>` line per token, then the blank line ending the sentence.
    /// Both iterators must have the same length.
    pub fn write_sentence<D, L>(&mut self, displays: D, labels: L) -> io::Result<()>
    where
        D: IntoIterator,
        D::Item: Display,
        L: IntoIterator,
        L::Item: Display,
    {
        for (display, label) in displays.into_iter().zip_eq(labels) {
            writeln!(self.out, "{}\t{}", display, label)?;
        }
        writeln!(self.out)
    }

    pub fn write_report(&mut self, report: &ScoreReport) -> io::Result<()> {
        write!(self.out, "{}", report)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Writes one JSON object per score row to `path`.
pub fn write_json_lines<P: AsRef<Path>>(path: P, rows: &[ScoreRow]) -> io::Result<()> {
    serde_jsonlines::write_json_lines(path, rows)
}
