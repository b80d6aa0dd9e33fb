//! Rhythmic classification of notes by where they fall within the beat.
//!
//! Thresholds are beat lengths checked in order, coarsest first: with
//! `[2.0, 1.0, 0.5]` a note on every second beat is category 0, any other
//! whole beat is 1, an off-beat eighth is 2, and anything finer is unmatched.

use crate::sheet::Note;

/// Tolerance for "lands exactly on a multiple of the threshold".
pub const EPSILON: f64 = 1e-5;

/// Default thresholds in beats.
pub const DEFAULT_THRESHOLDS: [f64; 3] = [2.0, 1.0, 0.5];

/// Index of the first threshold `t` with `beat mod t < EPSILON`, or `None`.
///
/// The remainder is taken with `rem_euclid`, so notes before the start of the
/// sheet (negative beats) classify the same way as their positive mirrors.
pub fn classify(beat: f64, thresholds: &[f64]) -> Option<usize> {
    thresholds
        .iter()
        .position(|&t| beat.rem_euclid(t) < EPSILON)
}

/// A fixed set of thresholds, applied to notes of one sheet resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteClassifier {
    thresholds: Vec<f64>,
}

impl NoteClassifier {
    pub fn new(thresholds: Vec<f64>) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn classify_beat(&self, beat: f64) -> Option<usize> {
        classify(beat, &self.thresholds)
    }

    pub fn classify_note(&self, note: &Note, ticks_per_beat: i32) -> Option<usize> {
        self.classify_beat(note.beat(ticks_per_beat))
    }
}

impl Default for NoteClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLDS.to_vec())
    }
}
