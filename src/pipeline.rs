//! Build orchestration.
//!
//! # Steps
//! 1. Fetch raw inputs into the staging directory
//! 2. Load and adapt them into canonical records
//! 3. Validate coding sequences (nucleotide sources only)
//! 4. Drop duplicate sequences
//! 5. Sort by identifier and write the collection
//! 6. Build the search index

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::canonical::{sort_records, write_collection};
use crate::cds::{check_cds, CdsTally};
use crate::collab::{Fetcher, IndexReport, Indexer};
use crate::config::BuildConfig;
use crate::dedup::dedupe;
use crate::diag::Diagnostics;
use crate::record::{MoleculeType, Record};
use crate::sources::Source;

/// Records ready to be written, with per-stage counts.
#[derive(Debug)]
pub struct Curated {
    pub records: Vec<Record>,
    pub molecule: MoleculeType,
    /// Entries read from the staged inputs.
    pub raw: usize,
    /// Records produced by the adapter.
    pub adapted: usize,
    pub cds: CdsTally,
}

/// Summary of one build.
#[derive(Debug)]
pub struct BuildReport {
    pub source: Source,
    pub output: PathBuf,
    pub molecule: MoleculeType,
    pub raw: usize,
    pub adapted: usize,
    /// Records written to `output`.
    pub kept: usize,
    pub cds: CdsTally,
    pub warnings: Vec<String>,
    pub index: IndexReport,
}

/// Turns a staged source into a sorted, deduplicated record set.
///
/// Touches nothing outside `staging`; all per-record problems end up in `diag`.
pub fn curate(source: Source, staging: &Path, diag: &mut Diagnostics) -> Result<Curated> {
    let adapter = source.adapter();

    info!(%source, staging = %staging.display(), "[2] Loading staged inputs");
    let inputs = adapter.load(staging, diag)?;
    let raw = inputs.raw_count();

    let mut records = adapter.adapt(&inputs, diag)?;
    let adapted = records.len();
    info!(raw, adapted, "adapted records");

    let molecule = inputs
        .fastas
        .first()
        .map_or(MoleculeType::Nucleotide, |file| file.molecule);

    let mut cds = CdsTally::default();
    if source.validates_cds() {
        info!("[3] Validating coding sequences");
        for record in records.iter_mut().filter(|r| r.molecule == MoleculeType::Nucleotide) {
            cds.add(check_cds(record, diag));
        }
        info!(
            valid = cds.valid,
            repaired = cds.repaired,
            bad_length = cds.bad_length,
            internal_stop = cds.internal_stop,
            "coding sequence check"
        );
    }

    info!("[4] Removing duplicate sequences");
    let mut records = dedupe(records, diag);
    sort_records(&mut records);

    Ok(Curated {
        records,
        molecule,
        raw,
        adapted,
        cds,
    })
}

/// Runs a full build for `config.source`.
pub fn run(config: &BuildConfig, fetcher: &dyn Fetcher, indexer: &dyn Indexer) -> Result<BuildReport> {
    info!(source = %config.source, "[1] Fetching inputs");
    fetcher.fetch(config)?;

    let mut diag = Diagnostics::new();
    let curated = curate(config.source, config.staging_dir(), &mut diag)?;

    let source_dir = config.source_dir();
    std::fs::create_dir_all(&source_dir)
        .with_context(|| format!("Failed to create {}", source_dir.display()))?;
    let output = config.output_path();

    info!(output = %output.display(), "[5] Writing collection");
    let kept = write_collection(&output, config.source.name(), &curated.records, &mut diag)?;
    if kept == 0 {
        warn!(source = %config.source, "collection is empty");
    }

    info!("[6] Indexing");
    let index = indexer.index(&output, config.source, curated.molecule)?;

    Ok(BuildReport {
        source: config.source,
        output,
        molecule: curated.molecule,
        raw: curated.raw,
        adapted: curated.adapted,
        kept,
        cds: curated.cds,
        warnings: diag.into_warnings(),
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curate_validates_dedupes_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("megares_database.fasta"),
            ">MEG_2|Drugs|Tetracyclines|Tetracycline_efflux|TETA\nATGAAATAA\n\
             >MEG_1|Drugs|Aminoglycosides|Aminoglycoside_N-acetyltransferases|AAC2\nATGTAACTTTAA\n\
             >MEG_3|Drugs|Tetracyclines|Tetracycline_efflux|TETB\nATGAAATAA\n",
        )
        .unwrap();

        let mut diag = Diagnostics::new();
        let curated = curate(Source::Megares, dir.path(), &mut diag).unwrap();
        assert_eq!(curated.raw, 3);
        assert_eq!(curated.adapted, 3);
        assert_eq!(curated.cds.total(), 3);
        assert_eq!(curated.cds.repaired, 1);

        let ids: Vec<_> = curated.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["AAC2", "TETA"]);
        assert_eq!(curated.records[0].seq, "TTAAAGTTACAT");
        assert!(diag.mentions("TETB: duplicate sequence, dropped in favour of TETA"));
    }

    #[test]
    fn test_curate_skips_cds_for_replicons() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inc.fsa"), ">IncX_1_AB1\nATGTAGTAGA\n").unwrap();
        let mut diag = Diagnostics::new();
        let curated = curate(Source::Plasmidfinder, dir.path(), &mut diag).unwrap();
        assert_eq!(curated.cds.total(), 0);
        assert_eq!(curated.records.len(), 1);
        assert!(diag.is_empty());
    }
}
