//! VFDB core set: `VFG037176(gb|WP_001081735) (plc1) phospholipase C [...]`.

use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{find_file, Adapter, SourceInputs};
use crate::diag::Diagnostics;
use crate::grammar::{fallback, leading_parenthetical, HeaderRule, Pattern};
use crate::record::Record;
use crate::repair::Repair;
use crate::seqio::load_raw_text;

const FASTA: &str = "VFDB_setA_nt.fas";

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^(|)]+)\(([^|()]+)\|([^|()]+)\)$").expect("static regex")
});

static HEADER: Pattern = Pattern { name: "SYMBOL(db|ACC)", regex: &SYMBOL_RE };

pub struct Vfdb;

impl Adapter for Vfdb {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        let path = find_file(dir, FASTA)?;
        let text = Repair::StripControl.read(&path, diag)?;
        Ok(SourceInputs {
            fastas: vec![load_raw_text(&path, &text, diag)?],
            ..Default::default()
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for file in &inputs.fastas {
            for raw in &file.entries {
                let record = match HEADER.fields(&raw.id) {
                    Some(f) => {
                        let desc = leading_parenthetical(&raw.description)
                            .unwrap_or(raw.description.trim());
                        Record::new(f[0], raw.sequence.clone(), file.molecule)
                            .with_acc(f[2])
                            .with_desc(desc)
                    }
                    None => fallback("vfdb", &HEADER, raw, file.molecule, diag),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testutil::raw_file;

    #[test]
    fn test_symbol_header() {
        let inputs = SourceInputs {
            fastas: vec![raw_file(
                FASTA,
                &[
                    ("VFG037176(gb|WP_001081735)", "(plc1) phospholipase C [PLC (VF0470)] [Acinetobacter]", "ATG"),
                    ("VFG000001(gb|NP_1.1)", "adhesin without symbol", "ATGA"),
                ],
            )],
            ..Default::default()
        };
        let mut diag = Diagnostics::new();
        let records = Vfdb.adapt(&inputs, &mut diag).unwrap();
        assert_eq!(records[0].id, "VFG037176");
        assert_eq!(records[0].acc, "WP_001081735");
        assert_eq!(records[0].desc, "plc1");
        assert_eq!(records[1].acc, "NP_1.1");
        assert_eq!(records[1].desc, "adhesin without symbol");
        assert!(diag.is_empty());
    }

    #[test]
    fn test_unmatched_symbol() {
        let inputs = SourceInputs {
            fastas: vec![raw_file(FASTA, &[("VFG9(gb)", "x", "ATG")])],
            ..Default::default()
        };
        let mut diag = Diagnostics::new();
        let records = Vfdb.adapt(&inputs, &mut diag).unwrap();
        assert_eq!(records[0].id, "VFG9(gb)");
        assert!(diag.mentions("SYMBOL(db|ACC) grammar"));
    }

    #[test]
    fn test_load_strips_control_characters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FASTA), ">VFG1(gb|X1) (aaa) toxin\r\nATG\u{c}AAA\r\n").unwrap();
        let mut diag = Diagnostics::new();
        let inputs = Vfdb.load(dir.path(), &mut diag).unwrap();
        let entry = &inputs.fastas[0].entries[0];
        assert_eq!(entry.sequence, "ATGAAA");
        assert_eq!(entry.description, "(aaa) toxin");
        assert!(diag.mentions("control character"));
    }
}
