//! Source-specific textual repair of staged FASTA files.
//!
//! Some upstream exports are not quite valid FASTA. The fix is applied once to
//! the whole file text before it reaches the loader.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::diag::Diagnostics;

/// Textual fix applied to a staged file before loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// Remove stray control characters (carriage returns, form feeds, ...).
    StripControl,
    /// Break lines where a `>` header was glued onto the end of a sequence line.
    SplitGluedHeaders,
}

impl Repair {
    /// Reads `path` and returns its repaired text.
    pub fn read(self, path: &Path, diag: &mut Diagnostics) -> Result<String> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        let (fixed, count) = self.apply(&text);
        if count > 0 {
            diag.warn(format!("{}: repaired {} {}", path.display(), count, self.describe()));
        } else {
            debug!(path = %path.display(), repair = self.describe(), "nothing to repair");
        }
        Ok(fixed)
    }

    /// Applies the repair, returning the new text and the number of fixes.
    pub fn apply(self, text: &str) -> (String, usize) {
        match self {
            Repair::StripControl => strip_control(text),
            Repair::SplitGluedHeaders => split_glued_headers(text),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Repair::StripControl => "control character(s)",
            Repair::SplitGluedHeaders => "glued header line(s)",
        }
    }
}

fn strip_control(text: &str) -> (String, usize) {
    let mut removed = 0;
    let fixed = text
        .chars()
        .filter(|&c| {
            let stray = c.is_control() && c != '\n' && c != '\t';
            if stray {
                removed += 1;
            }
            !stray
        })
        .collect();
    (fixed, removed)
}

fn split_glued_headers(text: &str) -> (String, usize) {
    let mut split = 0;
    let mut fixed = String::with_capacity(text.len() + 64);
    for line in text.split_inclusive('\n') {
        match line.find('>') {
            Some(pos) if pos > 0 && !line[..pos].trim().is_empty() => {
                fixed.push_str(&line[..pos]);
                fixed.push('\n');
                fixed.push_str(&line[pos..]);
                split += 1;
            }
            _ => fixed.push_str(line),
        }
    }
    (fixed, split)
}
