//! ResFinder: one `.fsa` file per drug class, headers `GENE_COPY_ACCESSION`.
//!
//! Descriptions and classes are looked up in `phenotypes.txt`; when a gene is
//! not listed the description is the gene itself and the class is the name of
//! the `.fsa` file it came from.

use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{find_file, find_with_extension, split_classes, Adapter, SourceInputs};
use crate::annotation::{AnnotationTable, TableOptions};
use crate::diag::Diagnostics;
use crate::grammar::{fallback, HeaderRule, Pattern};
use crate::record::Record;
use crate::seqio::{load_raw, RawEntry, RawFile};

const PHENOTYPES: &str = "phenotypes.txt";

static TRIPLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)_(\d+)_(.*)$").expect("static regex")
});

/// `GENE_COPY_ACCESSION`, shared with PlasmidFinder.
pub(crate) static TRIPLET: Pattern = Pattern { name: "underscore triplet", regex: &TRIPLET_RE };

/// Header fields of a triplet entry.
pub(crate) struct Triplet<'a> {
    pub gene: &'a str,
    /// `GENE_COPY`
    pub id: String,
    pub acc: &'a str,
}

pub(crate) fn parse_triplet(raw_id: &str) -> Option<Triplet<'_>> {
    let f = TRIPLET.fields(raw_id)?;
    Some(Triplet {
        gene: f[0],
        id: format!("{}_{}", f[0], f[1]),
        // Some accessions are written with a doubled separator
        acc: f[2].trim_start_matches('_'),
    })
}

/// Loads every `.fsa` under `dir`, in path order.
pub(crate) fn load_fsa_files(dir: &Path, diag: &mut Diagnostics) -> Result<Vec<RawFile>> {
    find_with_extension(dir, "fsa")?
        .into_iter()
        .map(|path| load_raw(path, diag))
        .collect()
}

pub struct Resfinder;

impl Adapter for Resfinder {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        let fastas = load_fsa_files(dir, diag)?;
        let phenotypes = AnnotationTable::load(find_file(dir, PHENOTYPES)?, TableOptions::default())?;
        Ok(SourceInputs {
            fastas,
            tables: vec![phenotypes],
            document: None,
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let table = inputs.tables.first();
        let mut records = Vec::new();
        for file in &inputs.fastas {
            for raw in &file.entries {
                let record = match parse_triplet(&raw.id) {
                    Some(t) => annotate(&t, raw, file, table),
                    None => fallback("resfinder", &TRIPLET, raw, file.molecule, diag),
                };
                records.push(record);
            }
        }
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &["*.fsa", PHENOTYPES]
    }
}

fn annotate(t: &Triplet<'_>, raw: &RawEntry, file: &RawFile, table: Option<&AnnotationTable>) -> Record {
    // Keyed by gene; released tables key on the full header instead
    let lookup = |column: &str| {
        table.and_then(|tbl| tbl.field(t.gene, column).or_else(|| tbl.field(&raw.id, column)))
    };
    let desc = lookup("Phenotype").unwrap_or(t.gene);
    let classes = match lookup("Class") {
        Some(class) => split_classes(class, ','),
        None => vec![file.stem().to_string()],
    };
    Record::new(t.id.clone(), raw.sequence.clone(), file.molecule)
        .with_acc(t.acc)
        .with_desc(desc)
        .with_abx(classes)
}
