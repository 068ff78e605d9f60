use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::RawPrediction;
use crate::frame::ColorFrame;

/// Stub backend for testing and bench runs without a model file.
///
/// Plays back scripted prediction sets, one per `infer` call; once the script
/// is exhausted it returns the fallback set (empty by default) forever.
/// Deterministic, no I/O.
pub struct StubBackend {
    cycles: VecDeque<Vec<RawPrediction>>,
    fallback: Vec<RawPrediction>,
}

impl StubBackend {
    /// A backend that never detects anything.
    pub fn new() -> Self {
        Self {
            cycles: VecDeque::new(),
            fallback: Vec::new(),
        }
    }

    /// Queue a prediction set for the next unscripted cycle.
    pub fn push_cycle(&mut self, predictions: Vec<RawPrediction>) {
        self.cycles.push_back(predictions);
    }

    /// Predictions returned on every cycle after the script runs out.
    pub fn with_fallback(mut self, predictions: Vec<RawPrediction>) -> Self {
        self.fallback = predictions;
        self
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn infer(&mut self, _frame: &ColorFrame) -> Result<Vec<RawPrediction>> {
        Ok(self
            .cycles
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}
