//! NCBI AMRFinderPlus reference gene CDS (`AMR_CDS`).
//!
//! The identifier is 11 pipe-separated fields:
//!
//! | idx | field            | example                             |
//! |-----|------------------|-------------------------------------|
//! | 0   | protein gi       | `1000909371`                        |
//! | 1   | protein acc      | `WP_061158039.1`                    |
//! | 2-3 | curation flags   | `1`, `1`                            |
//! | 4   | allele           | `cepA-44`                           |
//! | 5   | gene family      | `cepA`                              |
//! | 6   | type             | `hydrolase`                         |
//! | 7   | flag             | `2`                                 |
//! | 8   | class            | `BETA-LACTAM`                       |
//! | 9   | subclass         | `BETA-LACTAM`                       |
//! | 10  | product          | `class_A_beta-lactamase_CepA-44`    |
//!
//! The description holds the nucleotide locator, e.g. `NG_048023.1:101-973`.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use super::{find_file, split_classes, Adapter, SourceInputs};
use crate::diag::Diagnostics;
use crate::grammar::{fallback, Delimited, HeaderRule};
use crate::record::Record;
use crate::seqio::load_raw;

const FASTA: &str = "AMR_CDS.fa";

const HEADER: Delimited = Delimited::exact("AMRFinderPlus pipe", "|", 11);

pub struct Ncbi;

impl Adapter for Ncbi {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        Ok(SourceInputs {
            fastas: vec![load_raw(find_file(dir, FASTA)?, diag)?],
            ..Default::default()
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut fusions = 0usize;
        for file in &inputs.fastas {
            for raw in &file.entries {
                let Some(f) = HEADER.fields(&raw.id) else {
                    records.push(fallback("ncbi", &HEADER, raw, file.molecule, diag));
                    continue;
                };
                let id = if f[4].is_empty() { f[5] } else { f[4] };
                if id.is_empty() {
                    records.push(fallback("ncbi", &HEADER, raw, file.molecule, diag));
                    continue;
                }
                // Fusion genes (`aac(6')-Ib/aph(3'')-Ib`) duplicate their parts
                if id.contains('/') {
                    fusions += 1;
                    continue;
                }

                let acc = raw
                    .description
                    .split_whitespace()
                    .next()
                    .filter(|token| token.contains(':'))
                    .unwrap_or(f[1]);
                let subclass = if f[9].is_empty() { f[8] } else { f[9] };

                records.push(
                    Record::new(id, raw.sequence.clone(), file.molecule)
                        .with_acc(acc)
                        .with_desc(f[10].replace('_', " "))
                        .with_abx(split_classes(subclass, '/')),
                );
            }
        }
        if fusions > 0 {
            info!(fusions, "skipped fusion genes");
        }
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &[FASTA]
    }
}
