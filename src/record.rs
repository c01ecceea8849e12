//! Canonical record schema shared by every source adapter.

use std::collections::BTreeSet;
use std::fmt;

/// Residue alphabet of a sequence file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoleculeType {
    Nucleotide,
    Protein,
}

impl MoleculeType {
    /// Sentinel substituted for residues outside the alphabet.
    pub fn sentinel(self) -> char {
        match self {
            MoleculeType::Nucleotide => 'N',
            MoleculeType::Protein => 'X',
        }
    }

    /// `-dbtype` value understood by `makeblastdb`.
    pub fn blast_dbtype(self) -> &'static str {
        match self {
            MoleculeType::Nucleotide => "nucl",
            MoleculeType::Protein => "prot",
        }
    }
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoleculeType::Nucleotide => write!(f, "nucleotide"),
            MoleculeType::Protein => write!(f, "protein"),
        }
    }
}

/// A curated gene sequence.
///
/// `id` is never empty once an adapter has produced the record. `abx` is an
/// ordered set, so iteration is already in the sorted order the encoder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Gene or allele symbol.
    pub id: String,
    /// Accession and/or coordinate locator.
    pub acc: String,
    /// Free text; the encoder falls back to `id` when empty.
    pub desc: String,
    /// Normalized residues.
    pub seq: String,
    pub molecule: MoleculeType,
    /// Antibiotic / compound class tags.
    pub abx: BTreeSet<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, seq: impl Into<String>, molecule: MoleculeType) -> Self {
        Self {
            id: id.into(),
            acc: String::new(),
            desc: String::new(),
            seq: seq.into(),
            molecule,
            abx: BTreeSet::new(),
        }
    }

    pub fn with_acc(mut self, acc: impl Into<String>) -> Self {
        self.acc = acc.into();
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Adds class tags, ignoring blanks and surrounding whitespace.
    pub fn with_abx<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abx.extend(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    /// Description written to the output header.
    pub fn display_desc(&self) -> &str {
        if self.desc.is_empty() { &self.id } else { &self.desc }
    }
}
