/**
This module turns the encoded tokens of a sentence into fixed width context windows, the input
format of a `Classifier`. Every token gets one window: the word indices of the `radius` tokens on
each side of it (padded at the sentence boundaries) and its own feature indices.
*/
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("the feature matrix has {features} rows but the sentence has {words} words")]
    RowMismatch { words: usize, features: usize },
}

/// Builds the windows of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBuilder {
    radius: usize,
    padding: usize,
}

impl WindowBuilder {
    /// * `radius`: number of context words taken on each side of the center word.
    /// * `padding`: word index used for the positions outside the sentence.
    pub fn new(radius: usize, padding: usize) -> Self {
        WindowBuilder { radius, padding }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Number of word indices of a window.
    pub fn width(&self) -> usize {
        2 * self.radius + 1
    }

    /// Builds one window per word.
    ///
    /// * `words`: encoded words of the sentence.
    /// * `features`: `(words × feat_num)` feature indices, one row per word.
    pub fn build(
        &self,
        words: &[usize],
        features: ArrayView2<usize>,
    ) -> Result<WindowBatch, WindowError> {
        if features.nrows() != words.len() {
            return Err(WindowError::RowMismatch {
                words: words.len(),
                features: features.nrows(),
            });
        }
        let width = self.width();
        let mut word_rows = Array2::from_elem((words.len(), width), self.padding);
        for (center, mut row) in word_rows.rows_mut().into_iter().enumerate() {
            for (offset, slot) in row.iter_mut().enumerate() {
                // position of the slot in the sentence, `None` when left of the first word
                let position = (center + offset).checked_sub(self.radius);
                if let Some(word) = position.and_then(|p| words.get(p)) {
                    *slot = *word;
                }
            }
        }
        Ok(WindowBatch {
            words: word_rows,
            features: features.to_owned(),
            radius: self.radius,
        })
    }
}

/// The windows of one sentence, stored as two matrices with one row per window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowBatch {
    words: Array2<usize>,
    features: Array2<usize>,
    radius: usize,
}

impl WindowBatch {
    pub fn len(&self) -> usize {
        self.words.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(windows × (2 * radius + 1))` word indices.
    pub fn words(&self) -> ArrayView2<usize> {
        self.words.view()
    }

    /// `(windows × feat_num)` feature indices.
    pub fn features(&self) -> ArrayView2<usize> {
        self.features.view()
    }

    pub fn window(&self, index: usize) -> Option<Window<'_>> {
        if index >= self.len() {
            return None;
        }
        Some(Window {
            words: self.words.row(index),
            features: self.features.row(index),
            radius: self.radius,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Window<'_>> + '_ {
        self.words
            .rows()
            .into_iter()
            .zip(self.features.rows())
            .map(|(words, features)| Window {
                words,
                features,
                radius: self.radius,
            })
    }
}

/// A view over a single window of a `WindowBatch`.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub words: ArrayView1<'a, usize>,
    pub features: ArrayView1<'a, usize>,
    radius: usize,
}

impl<'a> Window<'a> {
    /// Word index of the token the window is centered on.
    pub fn center(&self) -> usize {
        self.words[self.radius]
    }

    /// Word indices left of the center word.
    pub fn left(&self) -> ArrayView1<'a, usize> {
        self.words.slice_move(s![..self.radius])
    }

    /// Word indices right of the center word.
    pub fn right(&self) -> ArrayView1<'a, usize> {
        self.words.slice_move(s![self.radius + 1..])
    }
}
