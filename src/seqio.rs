//! Sequence I/O Module
//!
//! Reads multi-sequence FASTA files (plain or gzip-compressed) into raw entries,
//! and writes FASTA records back out.
//!
//! # Loading
//! [`load_raw`] is the Raw Sequence Loader:
//! - the identifier token (text after '>' up to the first whitespace) is mandatory,
//!   an empty one aborts the whole load
//! - residues are uppercased; nucleotide files keep `ACGT` and map everything
//!   else to `N`, protein files keep `A-Z` and map everything else to `X`
//! - the molecule type is inferred from the first entry with residues and applied
//!   to the whole file
//! - repeated identifiers are renamed with a `_dupe` suffix and reported
//!
//! # Examples
//! ```no_run
//! use argcurate::diag::Diagnostics;
//! use argcurate::seqio::load_raw;
//!
//! let mut diag = Diagnostics::new();
//! let raw = load_raw("staging/arg-annot.fa", &mut diag).unwrap();
//! println!("{} {} entries", raw.molecule, raw.entries.len());
//! ```

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::diag::Diagnostics;
use crate::error::CurateError;
use crate::record::MoleculeType;

/// Output line width for sequence data.
pub const LINE_WIDTH: usize = 80;

/// Fraction of `ACGTN` residues above which a sequence is treated as nucleotide.
const NUCLEOTIDE_FRACTION: f64 = 0.9;

// ============================================================================
// FASTA Format
// ============================================================================

/// A FASTA record as it appears on disk.
#[derive(Debug, Clone)]
pub struct FastaRecord {
    /// Identifier token from the header line (may be empty; the loader rejects that).
    pub name: String,
    /// Remainder of the header line after the identifier.
    pub desc: String,
    /// Concatenated sequence lines, whitespace removed.
    pub seq: String,
    /// 1-based line number of the header.
    pub line: u64,
}

/// Sequential reader for FASTA data from any buffered source.
///
/// Handles multi-line sequences and strips whitespace automatically.
/// Anything before the first header line is skipped.
pub struct FastaReader<R: BufRead> {
    reader: R,
    line_buf: String,
    line_no: u64,
    pending: Option<(String, String, u64)>,
}

impl FastaReader<Box<dyn BufRead>> {
    /// Opens a FASTA file; files ending in `.gz` are decompressed on the fly.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open FASTA: {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let reader: Box<dyn BufRead> = if ext == "gz" {
            Box::new(BufReader::with_capacity(1024 * 1024, MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::with_capacity(1024 * 1024, file))
        };
        FastaReader::new(reader)
    }
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut fasta = Self {
            reader,
            line_buf: String::with_capacity(256),
            line_no: 0,
            pending: None,
        };

        // Advance to the first header line
        loop {
            fasta.line_buf.clear();
            if fasta.reader.read_line(&mut fasta.line_buf)? == 0 {
                break;
            }
            fasta.line_no += 1;
            if fasta.line_buf.starts_with('>') {
                fasta.pending = Some(split_header(&fasta.line_buf, fasta.line_no));
                break;
            }
            if !fasta.line_buf.trim().is_empty() {
                debug!(line = fasta.line_no, "skipping text before first FASTA header");
            }
        }

        Ok(fasta)
    }

    /// Reads the next FASTA record.
    ///
    /// # Returns
    /// - `Ok(Some(record))` - Successfully read a record
    /// - `Ok(None)` - End of input reached
    /// - `Err(e)` - I/O error occurred
    pub fn read_next(&mut self) -> Result<Option<FastaRecord>> {
        let (name, desc, line) = match self.pending.take() {
            Some(h) => h,
            None => return Ok(None),
        };

        let mut seq = String::with_capacity(2048);

        loop {
            self.line_buf.clear();
            if self.reader.read_line(&mut self.line_buf)? == 0 {
                break;
            }
            self.line_no += 1;

            if self.line_buf.starts_with('>') {
                self.pending = Some(split_header(&self.line_buf, self.line_no));
                break;
            }
            seq.extend(self.line_buf.chars().filter(|c| !c.is_whitespace()));
        }

        Ok(Some(FastaRecord { name, desc, seq, line }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Splits a `>name description` line into its identifier and description.
fn split_header(line: &str, line_no: u64) -> (String, String, u64) {
    let header = line[1..].trim();
    match header.find(char::is_whitespace) {
        Some(i) => (header[..i].to_string(), header[i..].trim().to_string(), line_no),
        None => (header.to_string(), String::new(), line_no),
    }
}

/// Writes one FASTA record with the sequence wrapped at [`LINE_WIDTH`].
pub fn write_fasta<W: Write>(writer: &mut W, name: &str, desc: &str, seq: &str) -> Result<()> {
    if desc.is_empty() {
        writeln!(writer, ">{}", name)?;
    } else {
        writeln!(writer, ">{} {}", name, desc)?;
    }
    for chunk in seq.as_bytes().chunks(LINE_WIDTH) {
        writeln!(writer, "{}", std::str::from_utf8(chunk)?)?;
    }
    Ok(())
}

// ============================================================================
// Raw Sequence Loader
// ============================================================================

/// One input FASTA entry before source-specific interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub id: String,
    pub description: String,
    /// Normalized residues.
    pub sequence: String,
}

/// All entries of one staged file.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub path: PathBuf,
    pub molecule: MoleculeType,
    pub entries: Vec<RawEntry>,
}

impl RawFile {
    /// File name without its extension, e.g. `beta-lactam` for `beta-lactam.fsa`.
    pub fn stem(&self) -> &str {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
    }
}

/// Loads and normalizes a staged FASTA file.
pub fn load_raw<P: AsRef<Path>>(path: P, diag: &mut Diagnostics) -> Result<RawFile> {
    let path = path.as_ref();
    let reader = FastaReader::open(path)?;
    collect_raw(path, reader, diag)
}

/// Loads FASTA text that has already been read (and possibly repaired) in memory.
pub fn load_raw_text(path: &Path, text: &str, diag: &mut Diagnostics) -> Result<RawFile> {
    let reader = FastaReader::new(Cursor::new(text.as_bytes()))?;
    collect_raw(path, reader, diag)
}

fn collect_raw<R: BufRead>(
    path: &Path,
    reader: FastaReader<R>,
    diag: &mut Diagnostics,
) -> Result<RawFile> {
    let mut records = Vec::new();
    for record in reader {
        let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
        if record.name.is_empty() {
            return Err(CurateError::EmptyIdentifier {
                path: path.to_path_buf(),
                line: record.line,
            }
            .into());
        }
        records.push(record);
    }
    if records.is_empty() {
        return Err(CurateError::EmptyInput(path.to_path_buf()).into());
    }

    // Empty entries say nothing about the alphabet
    let molecule = records
        .iter()
        .find(|r| r.seq.chars().any(|c| c.is_ascii_alphabetic()))
        .map_or(MoleculeType::Nucleotide, |r| detect_molecule(&r.seq));

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let sequence = normalize_residues(&record.seq, molecule);

        let mut id = record.name;
        if seen.contains(&id) {
            let original = id.clone();
            while seen.contains(&id) {
                id.push_str("_dupe");
            }
            diag.warn(format!(
                "{}: duplicate identifier '{}' renamed to '{}'",
                path.display(),
                original,
                id
            ));
        }
        seen.insert(id.clone());

        entries.push(RawEntry {
            id,
            description: record.desc,
            sequence,
        });
    }

    debug!(path = %path.display(), %molecule, entries = entries.len(), "loaded raw sequences");

    Ok(RawFile {
        path: path.to_path_buf(),
        molecule,
        entries,
    })
}

/// Infers the molecule type from a sequence's residue composition.
pub fn detect_molecule(seq: &str) -> MoleculeType {
    let mut total = 0usize;
    let mut nucleotide = 0usize;
    for c in seq.chars().filter(|c| c.is_ascii_alphabetic()) {
        total += 1;
        if matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T' | 'N') {
            nucleotide += 1;
        }
    }
    if total > 0 && nucleotide as f64 / total as f64 >= NUCLEOTIDE_FRACTION {
        MoleculeType::Nucleotide
    } else {
        MoleculeType::Protein
    }
}

/// Uppercases residues and replaces anything outside the alphabet with the sentinel.
pub fn normalize_residues(seq: &str, molecule: MoleculeType) -> String {
    let sentinel = molecule.sentinel();
    seq.chars()
        .map(|c| {
            let c = c.to_ascii_uppercase();
            let keep = match molecule {
                MoleculeType::Nucleotide => matches!(c, 'A' | 'C' | 'G' | 'T'),
                MoleculeType::Protein => c.is_ascii_uppercase(),
            };
            if keep { c } else { sentinel }
        })
        .collect()
}
