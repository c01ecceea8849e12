//! CARD protein homolog models, FASTA export.
//!
//! Header: `gb|ACCESSION|STRAND|START-END|ARO:NNNNNNN|NAME [organism]`. Drug
//! classes come from the ARO index, keyed by ARO accession.

use anyhow::Result;
use std::path::Path;

use super::{find_file, split_classes, Adapter, SourceInputs};
use crate::annotation::{AnnotationTable, TableOptions};
use crate::diag::Diagnostics;
use crate::grammar::{fallback, Delimited, HeaderRule};
use crate::record::Record;
use crate::seqio::load_raw;

const FASTA: &str = "nucleotide_fasta_protein_homolog_model.fasta";
const ARO_INDEX: &str = "aro_index.tsv";
const DRUG_CLASS: &str = "Drug Class";

const HEADER: Delimited = Delimited::exact("pipe", "|", 6);

pub struct Card;

impl Adapter for Card {
    fn load(&self, dir: &Path, diag: &mut Diagnostics) -> Result<SourceInputs> {
        let fasta = load_raw(find_file(dir, FASTA)?, diag)?;
        let index = AnnotationTable::load(find_file(dir, ARO_INDEX)?, TableOptions::default())?;
        Ok(SourceInputs {
            fastas: vec![fasta],
            tables: vec![index],
            document: None,
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let index = inputs.tables.first();
        let mut records = Vec::new();
        for file in &inputs.fastas {
            for raw in &file.entries {
                // raw.id already stops at the first space, dropping the organism
                let Some(f) = HEADER.fields(&raw.id).filter(|f| !f[5].is_empty()) else {
                    records.push(fallback("card", &HEADER, raw, file.molecule, diag));
                    continue;
                };
                let aro = f[4];
                let classes = index
                    .and_then(|t| t.field(aro, DRUG_CLASS))
                    .map(|c| split_classes(c, ';'))
                    .unwrap_or_default();
                if classes.is_empty() {
                    diag.warn(format!("card: {}: no drug class for {}", f[5], aro));
                }
                records.push(
                    Record::new(f[5], raw.sequence.clone(), file.molecule)
                        .with_acc(format!("{}:{}", f[1], f[3]))
                        .with_desc(aro)
                        .with_abx(classes),
                );
            }
        }
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &[FASTA, ARO_INDEX]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testutil::raw_file;

    fn aro_index() -> AnnotationTable {
        let text = "ARO Accession\tModel Name\tDrug Class\n\
                    ARO:3001109\tSHV-52\tcephalosporin; penam\n";
        AnnotationTable::from_reader(Path::new(ARO_INDEX), text.as_bytes(), TableOptions::default())
            .unwrap()
    }

    #[test]
    fn test_pipe_header() {
        let inputs = SourceInputs {
            fastas: vec![raw_file(
                FASTA,
                &[("gb|HQ845196|+|0-861|ARO:3001109|SHV-52", "[Klebsiella pneumoniae]", "ATGCGT")],
            )],
            tables: vec![aro_index()],
            document: None,
        };
        let mut diag = Diagnostics::new();
        let records = Card.adapt(&inputs, &mut diag).unwrap();
        let r = &records[0];
        assert_eq!(r.id, "SHV-52");
        assert_eq!(r.acc, "HQ845196:0-861");
        assert_eq!(r.desc, "ARO:3001109");
        let classes: Vec<_> = r.abx.iter().map(String::as_str).collect();
        assert_eq!(classes, ["cephalosporin", "penam"]);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_unindexed_aro_warns() {
        let inputs = SourceInputs {
            fastas: vec![raw_file(FASTA, &[("gb|X1|-|5-10|ARO:9|mystery", "", "ATG")])],
            tables: vec![aro_index()],
            document: None,
        };
        let mut diag = Diagnostics::new();
        let records = Card.adapt(&inputs, &mut diag).unwrap();
        assert!(records[0].abx.is_empty());
        assert!(diag.mentions("no drug class for ARO:9"));
    }

    #[test]
    fn test_load_requires_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FASTA), ">gb|X|+|0-3|ARO:1|a\nATG\n").unwrap();
        let mut diag = Diagnostics::new();
        let err = Card.load(dir.path(), &mut diag).unwrap_err();
        assert!(err.to_string().contains(ARO_INDEX));
    }
}
