//! Source Adapter Registry
//!
//! Every supported upstream database is a [`Source`] variant. Each variant owns an
//! [`Adapter`] that knows which staged files to read and how to turn their raw
//! entries into canonical [`Record`]s.
//!
//! # Sources
//! - **argannot**: ARG-ANNOT, colon-delimited headers
//! - **card**: CARD protein homolog FASTA with the ARO index
//! - **card_json**: CARD model graph (`card.json`)
//! - **resfinder**: ResFinder per-class `.fsa` files with phenotype table
//! - **plasmidfinder**: PlasmidFinder replicon `.fsa` files
//! - **vfdb**: VFDB core set
//! - **ecoh**: EcOH serotyping alleles (SRST2 format)
//! - **ncbi**: NCBI AMRFinderPlus `AMR_CDS`
//! - **megares**: MEGARes

pub mod argannot;
pub mod card;
pub mod card_json;
pub mod ecoh;
pub mod megares;
pub mod ncbi;
pub mod plasmidfinder;
pub mod resfinder;
pub mod vfdb;

use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::annotation::AnnotationTable;
use crate::diag::Diagnostics;
use crate::error::CurateError;
use crate::record::Record;
use crate::seqio::RawFile;

// ============================================================================
// Registry
// ============================================================================

/// Upstream sequence database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    Argannot,
    Card,
    CardJson,
    Resfinder,
    Plasmidfinder,
    Vfdb,
    Ecoh,
    Ncbi,
    Megares,
}

impl Source {
    pub const ALL: [Source; 9] = [
        Source::Argannot,
        Source::Card,
        Source::CardJson,
        Source::Resfinder,
        Source::Plasmidfinder,
        Source::Vfdb,
        Source::Ecoh,
        Source::Ncbi,
        Source::Megares,
    ];

    /// Registry key, also used as `<source>` in canonical headers.
    pub fn name(self) -> &'static str {
        match self {
            Source::Argannot => "argannot",
            Source::Card => "card",
            Source::CardJson => "card_json",
            Source::Resfinder => "resfinder",
            Source::Plasmidfinder => "plasmidfinder",
            Source::Vfdb => "vfdb",
            Source::Ecoh => "ecoh",
            Source::Ncbi => "ncbi",
            Source::Megares => "megares",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Source::Argannot => "ARG-ANNOT antibiotic resistance genes",
            Source::Card => "CARD (Comprehensive Antibiotic Resistance Database) protein homolog FASTA",
            Source::CardJson => "CARD protein homolog models from card.json",
            Source::Resfinder => "ResFinder acquired resistance genes",
            Source::Plasmidfinder => "PlasmidFinder replicon sequences",
            Source::Vfdb => "VFDB virulence factors (core set A)",
            Source::Ecoh => "EcOH E. coli O and H serotyping alleles",
            Source::Ncbi => "NCBI AMRFinderPlus reference genes",
            Source::Megares => "MEGARes antimicrobial resistance database",
        }
    }

    /// Whether nucleotide records from this source go through the CDS validator.
    pub fn validates_cds(self) -> bool {
        !matches!(self, Source::Plasmidfinder)
    }

    pub fn adapter(self) -> &'static dyn Adapter {
        match self {
            Source::Argannot => &argannot::Argannot,
            Source::Card => &card::Card,
            Source::CardJson => &card_json::CardJson,
            Source::Resfinder => &resfinder::Resfinder,
            Source::Plasmidfinder => &plasmidfinder::Plasmidfinder,
            Source::Vfdb => &vfdb::Vfdb,
            Source::Ecoh => &ecoh::Ecoh,
            Source::Ncbi => &ncbi::Ncbi,
            Source::Megares => &megares::Megares,
        }
    }

    /// Comma-separated list of every registry key.
    pub fn known_names() -> String {
        Source::ALL.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = CurateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Source::ALL
            .into_iter()
            .find(|src| src.name() == wanted)
            .ok_or_else(|| CurateError::UnknownSource {
                name: s.to_string(),
                known: Source::known_names(),
            })
    }
}

// ============================================================================
// Adapter capability
// ============================================================================

/// Everything an adapter reads from the staging directory.
#[derive(Debug, Default)]
pub struct SourceInputs {
    pub fastas: Vec<RawFile>,
    pub tables: Vec<AnnotationTable>,
    /// Structured metadata document, for sources that ship one.
    pub document: Option<(PathBuf, Value)>,
}

impl SourceInputs {
    /// Number of raw entries across all sequence files, plus document models.
    pub fn raw_count(&self) -> usize {
        let models = self
            .document
            .as_ref()
            .and_then(|(_, doc)| doc.as_object())
            .map_or(0, |map| map.values().filter(|v| v.is_object()).count());
        self.fastas.iter().map(|f| f.entries.len()).sum::<usize>() + models
    }
}

/// One header grammar: staged inputs in, canonical records out.
pub trait Adapter: Sync {
    /// Loads (and repairs, where needed) the staged inputs.
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs>;

    /// Converts loaded inputs into records. Only schema violations are errors.
    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>>;

    /// Relative paths the fetch collaborator must provide.
    fn expected_files(&self) -> &'static [&'static str];
}

// ============================================================================
// Staging helpers
// ============================================================================

/// Finds `name` in `dir` or any subdirectory (archives often unpack one level down).
pub fn find_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut matches = walk(dir, &|p: &Path| p.file_name().is_some_and(|n| n == name))?;
    matches.sort();
    matches
        .into_iter()
        .next()
        .ok_or_else(|| CurateError::MissingInput(dir.join(name)).into())
}

/// Every file under `dir` with extension `ext`, sorted by path.
pub fn find_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut matches = walk(dir, &|p: &Path| p.extension().is_some_and(|e| e == ext))?;
    if matches.is_empty() {
        return Err(CurateError::MissingInput(dir.join(format!("*.{}", ext))).into());
    }
    matches.sort();
    Ok(matches)
}

fn walk(dir: &Path, wanted: &dyn Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CurateError::MissingInput(dir.to_path_buf()).into());
    }
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if wanted(&path) {
                found.push(path);
            }
        }
    }
    Ok(found)
}

/// Splits a class list on `sep`, dropping blanks.
pub(crate) fn split_classes(text: &str, sep: char) -> Vec<String> {
    text.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert_eq!("ncbi".parse::<Source>().unwrap(), Source::Ncbi);
        assert_eq!("CARD_JSON".parse::<Source>().unwrap(), Source::CardJson);
        for src in Source::ALL {
            assert_eq!(src.name().parse::<Source>().unwrap(), src);
            assert_eq!(src.to_string(), src.name());
            assert!(!src.adapter().expected_files().is_empty());
        }
    }

    #[test]
    fn test_unknown_source() {
        match "resfinderz".parse::<Source>() {
            Err(CurateError::UnknownSource { name, known }) => {
                assert_eq!(name, "resfinderz");
                assert!(known.contains("megares"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_find_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("db-master");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("phenotypes.txt"), "x").unwrap();
        std::fs::write(nested.join("b.fsa"), ">b\nA\n").unwrap();
        std::fs::write(dir.path().join("a.fsa"), ">a\nA\n").unwrap();

        let found = find_file(dir.path(), "phenotypes.txt").unwrap();
        assert!(found.ends_with("db-master/phenotypes.txt"));

        let fsa = find_with_extension(dir.path(), "fsa").unwrap();
        assert_eq!(fsa.len(), 2);

        let err = find_file(dir.path(), "missing.txt").unwrap_err();
        assert!(matches!(err.downcast_ref::<CurateError>(), Some(CurateError::MissingInput(_))));
    }

    #[test]
    fn test_split_classes() {
        assert_eq!(split_classes("Beta-lactam, Aminoglycoside,", ','), ["Beta-lactam", "Aminoglycoside"]);
        assert!(split_classes("", ';').is_empty());
    }
}
