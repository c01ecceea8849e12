//! CARD models read from `card.json`.
//!
//! Only protein homolog models are kept. The first sequence child (by key) of
//! each model supplies the nucleotide sequence and its coordinates; drug classes
//! come from the model's ARO categories.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use super::{find_file, Adapter, SourceInputs};
use crate::diag::Diagnostics;
use crate::error::CurateError;
use crate::record::{MoleculeType, Record};
use crate::seqio::normalize_residues;

const DOCUMENT: &str = "card.json";
const MODEL_KIND: &str = "protein homolog model";
const DRUG_CLASS: &str = "Drug Class";

/// Fields of one model this adapter reads; everything else is ignored.
#[derive(Debug, Deserialize)]
struct CardModel {
    #[serde(default)]
    model_name: String,
    #[serde(default)]
    model_type: String,
    /// `{"sequence": {"<n>": {...}}}`, or `[]` when the model has none
    #[serde(default)]
    model_sequences: Value,
    #[serde(default, rename = "ARO_description")]
    aro_description: String,
    #[serde(default, rename = "ARO_category")]
    aro_category: Value,
}

#[derive(Debug, Deserialize)]
struct DnaSequence {
    #[serde(default)]
    accession: String,
    #[serde(default)]
    fmin: Value,
    #[serde(default)]
    fmax: Value,
    #[serde(default)]
    strand: String,
    #[serde(default)]
    sequence: String,
}

pub struct CardJson;

impl Adapter for CardJson {
    fn load(&self, dir: &Path, _diag: &mut Diagnostics) -> Result<SourceInputs> {
        let path = find_file(dir, DOCUMENT)?;
        let file = File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let document: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(SourceInputs {
            document: Some((path, document)),
            ..Default::default()
        })
    }

    fn adapt(&self, inputs: &SourceInputs, diag: &mut Diagnostics) -> Result<Vec<Record>> {
        let Some((path, document)) = &inputs.document else {
            return Ok(Vec::new());
        };
        let models = document
            .as_object()
            .ok_or_else(|| CurateError::EmptyInput(path.clone()))?;

        let mut records = Vec::new();
        for (key, value) in models {
            // Top-level metadata keys (`_version`, ...) are not models
            if !value.is_object() {
                continue;
            }
            let model = CardModel::deserialize(value)
                .with_context(|| format!("{}: malformed model {}", path.display(), key))?;
            if model.model_type != MODEL_KIND {
                continue;
            }
            if let Some(record) = model_record(key, &model, diag)? {
                records.push(record);
            }
        }
        debug!(models = models.len(), kept = records.len(), "read card.json");
        Ok(records)
    }

    fn expected_files(&self) -> &'static [&'static str] {
        &[DOCUMENT]
    }
}

fn model_record(key: &str, model: &CardModel, diag: &mut Diagnostics) -> Result<Option<Record>> {
    let missing = |field| CurateError::MissingField {
        source_name: "card_json".to_string(),
        model: key.to_string(),
        field,
    };
    if model.model_name.trim().is_empty() {
        return Err(missing("model_name").into());
    }
    if model.aro_description.trim().is_empty() {
        return Err(missing("ARO_description").into());
    }
    let id = model.model_name.split_whitespace().collect::<Vec<_>>().join("_");

    let Some(dna) = first_sequence(&model.model_sequences)? else {
        diag.warn(format!("card_json: {}: model {} has no sequence, skipped", id, key));
        return Ok(None);
    };
    if dna.sequence.is_empty() {
        diag.warn(format!("card_json: {}: empty dna_sequence, skipped", id));
        return Ok(None);
    }

    let (mut start, mut stop) = (coordinate(&dna.fmin), coordinate(&dna.fmax));
    if dna.strand == "-" {
        std::mem::swap(&mut start, &mut stop);
    }

    Ok(Some(
        Record::new(id, normalize_residues(&dna.sequence, MoleculeType::Nucleotide), MoleculeType::Nucleotide)
            .with_acc(format!("{}:{}-{}", dna.accession, start, stop))
            .with_desc(model.aro_description.trim())
            .with_abx(drug_classes(&model.aro_category)),
    ))
}

/// `dna_sequence` of the child with the smallest key.
fn first_sequence(model_sequences: &Value) -> Result<Option<DnaSequence>> {
    let Some(children) = model_sequences.get("sequence").and_then(Value::as_object) else {
        return Ok(None);
    };
    let first = children
        .iter()
        .min_by(|a, b| a.0.cmp(b.0))
        .and_then(|(_, child)| child.get("dna_sequence"));
    match first {
        Some(dna) => Ok(Some(DnaSequence::deserialize(dna)?)),
        None => Ok(None),
    }
}

/// Coordinates appear as numbers or numeric strings.
fn coordinate(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn drug_classes(categories: &Value) -> Vec<String> {
    let empty = Map::new();
    categories
        .as_object()
        .unwrap_or(&empty)
        .values()
        .filter(|c| c.get("category_aro_class_name").and_then(Value::as_str) == Some(DRUG_CLASS))
        .filter_map(|c| c.get("category_aro_name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn model(name: &str, description: &str, strand: &str) -> Value {
        json!({
            "model_id": "1",
            "model_name": name,
            "model_type": MODEL_KIND,
            "ARO_accession": "3001109",
            "ARO_description": description,
            "ARO_category": {
                "35919": {"category_aro_class_name": "Drug Class", "category_aro_name": "penam"},
                "36268": {"category_aro_class_name": "AMR Gene Family", "category_aro_name": "SHV beta-lactamase"},
                "35939": {"category_aro_class_name": "Drug Class", "category_aro_name": "cephalosporin"}
            },
            "model_sequences": {"sequence": {
                "902": {"dna_sequence": {"accession": "LATER", "fmin": "1", "fmax": "2", "strand": "+", "sequence": "ttt"}},
                "1025": {"dna_sequence": {"accession": "HQ845196", "fmin": 0, "fmax": 861, "strand": strand, "sequence": "atgcgt"}}
            }}
        })
    }

    fn inputs(document: Value) -> SourceInputs {
        SourceInputs {
            document: Some((PathBuf::from(DOCUMENT), document)),
            ..Default::default()
        }
    }

    #[test]
    fn test_protein_homolog_model() {
        let doc = json!({
            "_version": "3.2.9",
            "10": model("SHV-52", "SHV-52 is a beta-lactamase", "+"),
            "11": {"model_name": "variant", "model_type": "protein variant model"}
        });
        let mut diag = Diagnostics::new();
        let records = CardJson.adapt(&inputs(doc), &mut diag).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "SHV-52");
        // "1025" < "902" by key
        assert_eq!(r.acc, "HQ845196:0-861");
        assert_eq!(r.seq, "ATGCGT");
        assert_eq!(r.desc, "SHV-52 is a beta-lactamase");
        let classes: Vec<_> = r.abx.iter().map(String::as_str).collect();
        assert_eq!(classes, ["cephalosporin", "penam"]);
    }

    #[test]
    fn test_reverse_strand_swaps_coordinates() {
        let doc = json!({"1": model("Escherichia coli ampC", "AmpC", "-")});
        let mut diag = Diagnostics::new();
        let records = CardJson.adapt(&inputs(doc), &mut diag).unwrap();
        assert_eq!(records[0].id, "Escherichia_coli_ampC");
        assert_eq!(records[0].acc, "HQ845196:861-0");
    }

    #[test]
    fn test_empty_description_is_fatal() {
        let doc = json!({"7": model("OXA-1", "", "+")});
        let mut diag = Diagnostics::new();
        let err = CardJson.adapt(&inputs(doc), &mut diag).unwrap_err();
        match err.downcast_ref::<CurateError>() {
            Some(CurateError::MissingField { model, field, .. }) => {
                assert_eq!(model, "7");
                assert_eq!(*field, "ARO_description");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_model_without_sequence_skipped() {
        let doc = json!({"3": {
            "model_name": "TEM-1",
            "model_type": MODEL_KIND,
            "ARO_description": "TEM-1",
            "model_sequences": []
        }});
        let mut diag = Diagnostics::new();
        let records = CardJson.adapt(&inputs(doc), &mut diag).unwrap();
        assert!(records.is_empty());
        assert!(diag.mentions("has no sequence"));
    }

    #[test]
    fn test_load_from_staging() {
        let dir = tempfile::tempdir().unwrap();
        let doc = json!({"1": model("SHV-52", "SHV-52", "+")});
        std::fs::write(dir.path().join(DOCUMENT), doc.to_string()).unwrap();
        let mut diag = Diagnostics::new();
        let inputs = CardJson.load(dir.path(), &mut diag).unwrap();
        assert_eq!(CardJson.adapt(&inputs, &mut diag).unwrap().len(), 1);
    }
}
