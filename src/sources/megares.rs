//! MEGARes: `MEG_1|Drugs|Aminoglycosides|Aminoglycoside_N-acetyltransferases|AAC2`,
//! with an optional sixth `RequiresSNPConfirmation` flag.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use super::{find_file, Adapter, SourceInputs};
use crate::diag::Diagnostics;
use crate::grammar::{fallback, Delimited, HeaderRule};
use crate::record::Record;
use crate::seqio::load_raw;

const FASTA: &str = "megares_database.fasta";
const SNP_FLAG: &str = "RequiresSNPConfirmation";

const HEADER: Delimited = Delimited::between("MEGARes pipe", "|", 5, 6);

pub struct Megares;

impl Adapter for Megares {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        Ok(SourceInputs {
            fastas: vec![load_raw(find_file(dir, FASTA)?, diag)?],
            ..Default::default()
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut snp_only = 0usize;
        for file in &inputs.fastas {
            for raw in &file.entries {
                let Some(f) = HEADER.fields(&raw.id).filter(|f| !f[4].is_empty()) else {
                    records.push(fallback("megares", &HEADER, raw, file.molecule, diag));
                    continue;
                };
                // Point-mutation models only confer resistance with specific SNPs
                if f.get(5) == Some(&SNP_FLAG) {
                    snp_only += 1;
                    continue;
                }
                records.push(
                    Record::new(f[4], raw.sequence.clone(), file.molecule)
                        .with_acc(f[0])
                        .with_desc(f[3].replace('_', " "))
                        .with_abx([f[2]]),
                );
            }
        }
        if snp_only > 0 {
            info!(skipped = snp_only, "skipped SNP-confirmation entries");
        }
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &[FASTA]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testutil::raw_file;

    #[test]
    fn test_megares_header() {
        let inputs = SourceInputs {
            fastas: vec![raw_file(
                FASTA,
                &[
                    ("MEG_1|Drugs|Aminoglycosides|Aminoglycoside_N-acetyltransferases|AAC2", "", "ATGAAA"),
                    ("MEG_2|Drugs|Fluoroquinolones|Fluoroquinolone-resistant_gyrA|GYRA|RequiresSNPConfirmation", "", "ATGCCC"),
                    ("MEG_3|Drugs|Bad", "", "ATGGGG"),
                ],
            )],
            ..Default::default()
        };
        let mut diag = Diagnostics::new();
        let records = Megares.adapt(&inputs, &mut diag).unwrap();
        assert_eq!(records.len(), 2);
        let r = &records[0];
        assert_eq!(r.id, "AAC2");
        assert_eq!(r.acc, "MEG_1");
        assert_eq!(r.desc, "Aminoglycoside N-acetyltransferases");
        assert!(r.abx.contains("Aminoglycosides"));
        assert_eq!(records[1].id, "MEG_3|Drugs|Bad");
        assert!(diag.mentions("MEGARes pipe grammar"));
    }
}
