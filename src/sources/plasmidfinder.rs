//! PlasmidFinder replicons: same header grammar as ResFinder, no annotation table.

use anyhow::Result;
use std::path::Path;

use super::resfinder::{load_fsa_files, parse_triplet, TRIPLET};
use super::{Adapter, SourceInputs};
use crate::diag::Diagnostics;
use crate::grammar::fallback;
use crate::record::Record;

pub struct Plasmidfinder;

impl Adapter for Plasmidfinder {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        Ok(SourceInputs {
            fastas: load_fsa_files(dir, diag)?,
            ..Default::default()
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for file in &inputs.fastas {
            for raw in &file.entries {
                let record = match parse_triplet(&raw.id) {
                    Some(t) => Record::new(t.id, raw.sequence.clone(), file.molecule)
                        .with_acc(t.acc)
                        .with_desc(t.gene),
                    None => fallback("plasmidfinder", &TRIPLET, raw, file.molecule, diag),
                };
                records.push(record);
            }
        }
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &["*.fsa"]
    }
}
