//! Canonical header encoding.
//!
//! Every output record carries a composite FASTA identifier
//! `<source>~~~<ID>~~~<ACC>~~~<ABX>` where `<ABX>` is the sorted class set joined
//! by `;` with each whitespace character replaced by `_`. The FASTA description is the
//! record's `DESC`, or its `ID` when that is empty.
//!
//! # Example
//! ```
//! use argcurate::canonical::{decode, encode};
//! use argcurate::record::{MoleculeType, Record};
//!
//! let rec = Record::new("blaTEM-1", "ATG", MoleculeType::Nucleotide)
//!     .with_acc("EU650653.1:1-1173")
//!     .with_abx(["BETA-LACTAM"]);
//! let header = encode("ncbi", &rec).unwrap();
//! assert_eq!(header.id, "ncbi~~~blaTEM-1~~~EU650653.1:1-1173~~~BETA-LACTAM");
//! assert_eq!(decode(&header.id).unwrap().acc, "EU650653.1:1-1173");
//! ```

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::diag::Diagnostics;
use crate::record::Record;
use crate::seqio::write_fasta;

/// Field separator inside the canonical identifier.
pub const DELIMITER: &str = "~~~";

/// Separator between class tags.
pub const ABX_SEPARATOR: &str = ";";

/// Reasons a record cannot be written in canonical form.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("field {field} of '{id}' contains the '~~~' delimiter")]
    DelimiterInField { id: String, field: &'static str },

    #[error("field {field} of '{id}' contains whitespace")]
    WhitespaceInField { id: String, field: &'static str },

    #[error("canonical identifier '{0}' does not have 4 fields")]
    FieldCount(String),
}

/// Encoded FASTA header of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalHeader {
    pub id: String,
    pub desc: String,
}

/// Fields recovered from a canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalId {
    pub source: String,
    pub id: String,
    pub acc: String,
    /// Joined class string, exactly as encoded.
    pub abx: String,
}

impl CanonicalId {
    /// Individual class tags.
    pub fn abx_tags(&self) -> Vec<&str> {
        self.abx.split(ABX_SEPARATOR).filter(|t| !t.is_empty()).collect()
    }
}

/// Sorted class set joined for the identifier.
pub fn join_abx(record: &Record) -> String {
    let joined = record.abx.iter().map(String::as_str).collect::<Vec<_>>().join(ABX_SEPARATOR);
    joined.chars().map(|c| if c.is_whitespace() { '_' } else { c }).collect()
}

/// Encodes a record's header for `source`.
pub fn encode(source: &str, record: &Record) -> Result<CanonicalHeader, CanonicalError> {
    let abx = join_abx(record);
    for (field, value) in [
        ("SOURCE", source),
        ("ID", record.id.as_str()),
        ("ACC", record.acc.as_str()),
        ("ABX", abx.as_str()),
    ] {
        // A leading or trailing '~' would merge with the neighbouring delimiter
        if value.contains(DELIMITER) || value.starts_with('~') || value.ends_with('~') {
            return Err(CanonicalError::DelimiterInField { id: record.id.clone(), field });
        }
        if value.contains(char::is_whitespace) {
            return Err(CanonicalError::WhitespaceInField { id: record.id.clone(), field });
        }
    }

    Ok(CanonicalHeader {
        id: [source, record.id.as_str(), record.acc.as_str(), abx.as_str()].join(DELIMITER),
        desc: record.display_desc().to_string(),
    })
}

/// Splits a canonical identifier back into its fields.
pub fn decode(id: &str) -> Result<CanonicalId, CanonicalError> {
    let parts: Vec<&str> = id.split(DELIMITER).collect();
    match parts.as_slice() {
        [source, gene, acc, abx] => Ok(CanonicalId {
            source: source.to_string(),
            id: gene.to_string(),
            acc: acc.to_string(),
            abx: abx.to_string(),
        }),
        _ => Err(CanonicalError::FieldCount(id.to_string())),
    }
}

/// Stable sort by `ID` in codepoint order.
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(|a, b| a.id.cmp(&b.id));
}

/// Writes the collection to `path`, dropping records that cannot be encoded.
///
/// Output goes to a temporary sibling first and is renamed into place once
/// everything has been written, so a failed run never leaves a partial file.
/// Returns the number of records written.
pub fn write_collection(
    path: &Path,
    source: &str,
    records: &[Record],
    diag: &mut Diagnostics,
) -> Result<usize> {
    let tmp = path.with_extension("partial");
    let file = File::create(&tmp)
        .with_context(|| format!("Failed to create {}", tmp.display()))?;
    let result = write_records(BufWriter::new(file), source, records, diag)
        .with_context(|| format!("Failed to write {}", tmp.display()))
        .and_then(|written| {
            std::fs::rename(&tmp, path)
                .with_context(|| format!("Failed to move {} into place", path.display()))?;
            Ok(written)
        });
    match result {
        Ok(written) => {
            debug!(path = %path.display(), written, "wrote canonical collection");
            Ok(written)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn write_records<W: Write>(
    mut writer: W,
    source: &str,
    records: &[Record],
    diag: &mut Diagnostics,
) -> Result<usize> {
    let mut written = 0usize;
    for record in records {
        match encode(source, record) {
            Ok(header) => {
                write_fasta(&mut writer, &header.id, &header.desc, &record.seq)?;
                written += 1;
            }
            Err(e) => diag.warn(format!("{}: not written: {}", record.id, e)),
        }
    }
    writer.flush()?;
    Ok(written)
}
