//! EcOH serotyping alleles in SRST2 layout.
//!
//! Identifier `CLUSTER__GENE__ALLELE__SEQID`, description
//! `ACCESSION;PRODUCT;...`.

use anyhow::Result;
use std::path::Path;

use super::{find_file, Adapter, SourceInputs};
use crate::diag::Diagnostics;
use crate::grammar::{fallback, Delimited, HeaderRule};
use crate::record::Record;
use crate::seqio::load_raw;

const FASTA: &str = "EcOH.fasta";

const HEADER: Delimited = Delimited::exact("SRST2 double-underscore", "__", 4);

pub struct Ecoh;

impl Adapter for Ecoh {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        Ok(SourceInputs {
            fastas: vec![load_raw(find_file(dir, FASTA)?, diag)?],
            ..Default::default()
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for file in &inputs.fastas {
            for raw in &file.entries {
                let Some(f) = HEADER.fields(&raw.id).filter(|f| !f[2].is_empty()) else {
                    records.push(fallback("ecoh", &HEADER, raw, file.molecule, diag));
                    continue;
                };
                let mut parts = raw.description.split(';').map(str::trim);
                let acc = parts.next().unwrap_or_default();
                let desc = parts.filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ");
                records.push(
                    Record::new(f[2], raw.sequence.clone(), file.molecule)
                        .with_acc(acc)
                        .with_desc(desc),
                );
            }
        }
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &[FASTA]
    }
}
