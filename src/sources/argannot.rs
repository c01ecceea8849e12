//! ARG-ANNOT: `(Class)Symbol:Accession:Start-End:Length`.

use anyhow::Result;
use std::path::Path;

use super::{find_file, Adapter, SourceInputs};
use crate::diag::Diagnostics;
use crate::grammar::{fallback, leading_parenthetical, Delimited, HeaderRule};
use crate::record::Record;
use crate::repair::Repair;
use crate::seqio::load_raw_text;

const FASTA: &str = "arg-annot.fa";

const HEADER: Delimited = Delimited::exact("colon", ":", 4);

pub struct Argannot;

impl Adapter for Argannot {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        let path = find_file(dir, FASTA)?;
        // Upstream export has headers glued onto the preceding sequence line
        let text = Repair::SplitGluedHeaders.read(&path, diag)?;
        Ok(SourceInputs {
            fastas: vec![load_raw_text(&path, &text, diag)?],
            ..Default::default()
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for file in &inputs.fastas {
            for raw in &file.entries {
                let record = match HEADER.fields(&raw.id).filter(|f| !f[0].is_empty()) {
                    Some(f) => Record::new(f[0], raw.sequence.clone(), file.molecule)
                        .with_acc(format!("{}:{}", f[1], f[2]))
                        .with_abx(leading_parenthetical(f[0])),
                    None => fallback("argannot", &HEADER, raw, file.molecule, diag),
                };
                records.push(record);
            }
        }
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &[FASTA]
    }
}
