//! Per-run diagnostics.
//!
//! Recoverable, per-record problems are collected here as plain text lines and
//! mirrored to `tracing` so they show up in the log stream as they happen.

use tracing::warn;

/// Accumulates warning lines for one curation run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and emits it through `tracing`.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// True if any recorded warning contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(needle))
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
