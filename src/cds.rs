//! Coding Sequence Validator
//!
//! Checks that a nucleotide record reads as a single open reading frame:
//! - length is a multiple of three
//! - residues are strictly `ACGT`
//! - translation with the standard genetic code has no internal stop codon
//!
//! A record with an internal stop is retried on the reverse strand; if that
//! translates cleanly the record's sequence is replaced by its reverse complement.
//! The outcome is informational: records are never dropped here.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::diag::Diagnostics;
use crate::record::Record;

// ============================================================================
// Codon Table
// ============================================================================

/// Standard genetic code codon table.
static CODON_TABLE: LazyLock<FxHashMap<&'static str, char>> = LazyLock::new(|| {
    let mut table = FxHashMap::default();
    // Phenylalanine (F)
    table.insert("TTT", 'F'); table.insert("TTC", 'F');
    // Leucine (L)
    table.insert("TTA", 'L'); table.insert("TTG", 'L');
    table.insert("CTT", 'L'); table.insert("CTC", 'L');
    table.insert("CTA", 'L'); table.insert("CTG", 'L');
    // Isoleucine (I)
    table.insert("ATT", 'I'); table.insert("ATC", 'I'); table.insert("ATA", 'I');
    // Methionine (M) - Start
    table.insert("ATG", 'M');
    // Valine (V)
    table.insert("GTT", 'V'); table.insert("GTC", 'V');
    table.insert("GTA", 'V'); table.insert("GTG", 'V');
    // Serine (S)
    table.insert("TCT", 'S'); table.insert("TCC", 'S');
    table.insert("TCA", 'S'); table.insert("TCG", 'S');
    table.insert("AGT", 'S'); table.insert("AGC", 'S');
    // Proline (P)
    table.insert("CCT", 'P'); table.insert("CCC", 'P');
    table.insert("CCA", 'P'); table.insert("CCG", 'P');
    // Threonine (T)
    table.insert("ACT", 'T'); table.insert("ACC", 'T');
    table.insert("ACA", 'T'); table.insert("ACG", 'T');
    // Alanine (A)
    table.insert("GCT", 'A'); table.insert("GCC", 'A');
    table.insert("GCA", 'A'); table.insert("GCG", 'A');
    // Tyrosine (Y)
    table.insert("TAT", 'Y'); table.insert("TAC", 'Y');
    // Stop codons (*)
    table.insert("TAA", STOP); table.insert("TAG", STOP); table.insert("TGA", STOP);
    // Histidine (H)
    table.insert("CAT", 'H'); table.insert("CAC", 'H');
    // Glutamine (Q)
    table.insert("CAA", 'Q'); table.insert("CAG", 'Q');
    // Asparagine (N)
    table.insert("AAT", 'N'); table.insert("AAC", 'N');
    // Lysine (K)
    table.insert("AAA", 'K'); table.insert("AAG", 'K');
    // Aspartic acid (D)
    table.insert("GAT", 'D'); table.insert("GAC", 'D');
    // Glutamic acid (E)
    table.insert("GAA", 'E'); table.insert("GAG", 'E');
    // Cysteine (C)
    table.insert("TGT", 'C'); table.insert("TGC", 'C');
    // Tryptophan (W)
    table.insert("TGG", 'W');
    // Arginine (R)
    table.insert("CGT", 'R'); table.insert("CGC", 'R');
    table.insert("CGA", 'R'); table.insert("CGG", 'R');
    table.insert("AGA", 'R'); table.insert("AGG", 'R');
    // Glycine (G)
    table.insert("GGT", 'G'); table.insert("GGC", 'G');
    table.insert("GGA", 'G'); table.insert("GGG", 'G');
    table
});

/// Translated stop symbol.
pub const STOP: char = '*';

/// Translates a codon (3 nucleotides) to amino acid.
pub fn translate_codon(codon: &str) -> Option<char> {
    let upper = codon.to_uppercase();
    CODON_TABLE.get(upper.as_str()).copied()
}

/// Translates a nucleotide sequence in frame 1.
///
/// Codons containing ambiguity codes become `X`; a trailing partial codon is ignored.
pub fn translate(seq: &str) -> String {
    seq.as_bytes()
        .chunks_exact(3)
        .map(|codon| {
            std::str::from_utf8(codon)
                .ok()
                .and_then(translate_codon)
                .unwrap_or('X')
        })
        .collect()
}

/// True if a stop symbol is followed by at least one more residue.
///
/// Only the final symbol may be a stop, so `MK**` has an internal stop.
pub fn has_internal_stop(protein: &str) -> bool {
    protein.strip_suffix(STOP).unwrap_or(protein).contains(STOP)
}

/// Computes the reverse complement of a DNA sequence.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c.to_ascii_uppercase() {
            'A' => 'T',
            'T' => 'A',
            'G' => 'C',
            'C' => 'G',
            _ => 'N',
        })
        .collect()
}

// ============================================================================
// Validation
// ============================================================================

/// Outcome of [`check_cds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdsCheck {
    /// Translates cleanly on the forward strand.
    Valid,
    /// Sequence was replaced by its reverse complement.
    Repaired,
    /// Length is not a multiple of three; not translated.
    BadLength,
    /// Internal stop on both strands; left unmodified.
    InternalStop,
}

impl CdsCheck {
    pub fn is_valid(self) -> bool {
        matches!(self, CdsCheck::Valid | CdsCheck::Repaired)
    }
}

impl fmt::Display for CdsCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdsCheck::Valid => write!(f, "valid"),
            CdsCheck::Repaired => write!(f, "repaired"),
            CdsCheck::BadLength => write!(f, "bad_length"),
            CdsCheck::InternalStop => write!(f, "internal_stop"),
        }
    }
}

/// Per-run counts of [`CdsCheck`] outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CdsTally {
    pub valid: usize,
    pub repaired: usize,
    pub bad_length: usize,
    pub internal_stop: usize,
}

impl CdsTally {
    pub fn add(&mut self, check: CdsCheck) {
        match check {
            CdsCheck::Valid => self.valid += 1,
            CdsCheck::Repaired => self.repaired += 1,
            CdsCheck::BadLength => self.bad_length += 1,
            CdsCheck::InternalStop => self.internal_stop += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.valid + self.repaired + self.bad_length + self.internal_stop
    }
}

/// Validates a coding sequence in place, repairing strand orientation if possible.
pub fn check_cds(record: &mut Record, diag: &mut Diagnostics) -> CdsCheck {
    let len = record.seq.len();
    if len % 3 != 0 {
        diag.warn(format!("{}: length {} is not a multiple of 3", record.id, len));
        return CdsCheck::BadLength;
    }

    if let Some(bad) = record.seq.chars().find(|c| !matches!(c, 'A' | 'C' | 'G' | 'T')) {
        diag.warn(format!("{}: non-ACGT residue '{}' in coding sequence", record.id, bad));
    }

    let forward = translate(&record.seq);
    if !has_internal_stop(&forward) {
        debug!(id = %record.id, aa = forward.len(), "coding sequence ok");
        return CdsCheck::Valid;
    }

    diag.warn(format!("{}: internal stop codon, trying reverse complement", record.id));
    let revcom = reverse_complement(&record.seq);
    if has_internal_stop(&translate(&revcom)) {
        diag.warn(format!("{}: internal stop codon on both strands, left unmodified", record.id));
        return CdsCheck::InternalStop;
    }

    record.seq = revcom;
    info!(id = %record.id, "reverse complement translates cleanly, sequence replaced");
    CdsCheck::Repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MoleculeType;

    fn rec(seq: &str) -> Record {
        Record::new("gene", seq, MoleculeType::Nucleotide)
    }

    #[test]
    fn test_translate_codon() {
        assert_eq!(translate_codon("ATG"), Some('M'));
        assert_eq!(translate_codon("ttt"), Some('F'));
        assert_eq!(translate_codon("TAA"), Some('*'));
        assert_eq!(translate_codon("NNN"), None);
    }

    #[test]
    fn test_translate() {
        assert_eq!(translate("ATGAAATAA"), "MK*");
        assert_eq!(translate("ATGNNNTAAGG"), "MX*");
    }

    #[test]
    fn test_internal_stop_detection() {
        assert!(!has_internal_stop("MKL*"));
        assert!(!has_internal_stop("MKL"));
        assert!(has_internal_stop("M*KL*"));
        assert!(has_internal_stop("M*K"));
        assert!(has_internal_stop("MK**"));
    }

    #[test]
    fn test_double_terminal_stop_is_internal() {
        // ATG AAA TAA TAG: M K * *
        let mut r = rec("ATGAAATAATAG");
        let mut diag = Diagnostics::new();
        assert_ne!(check_cds(&mut r, &mut diag), CdsCheck::Valid);
        assert!(diag.mentions("internal stop codon"));
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("ATGC"), "GCAT");
        assert_eq!(reverse_complement("AAAN"), "NTTT");
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn test_valid_cds_untouched() {
        let mut r = rec("ATGAAACCCTAA");
        let mut diag = Diagnostics::new();
        assert_eq!(check_cds(&mut r, &mut diag), CdsCheck::Valid);
        assert_eq!(r.seq, "ATGAAACCCTAA");
        assert!(diag.is_empty());
    }

    #[test]
    fn test_reverse_strand_repair() {
        // Forward: M * L *; reverse complement: L K L H
        let mut r = rec("ATGTAACTTTAA");
        let mut diag = Diagnostics::new();
        assert_eq!(check_cds(&mut r, &mut diag), CdsCheck::Repaired);
        assert_eq!(r.seq, "TTAAAGTTACAT");
        let protein = translate(&r.seq);
        assert!(!has_internal_stop(&protein));
        assert!(diag.mentions("trying reverse complement"));
    }

    #[test]
    fn test_bad_length_is_left_alone() {
        let mut r = rec("ATGAAACCCTA");
        let mut diag = Diagnostics::new();
        assert_eq!(check_cds(&mut r, &mut diag), CdsCheck::BadLength);
        assert_eq!(r.seq, "ATGAAACCCTA");
        assert!(diag.mentions("not a multiple of 3"));
    }

    #[test]
    fn test_unrepairable_stop_keeps_sequence() {
        // Reverse-complement palindrome: * L * L on both strands
        let mut r = rec("TAGCTATAGCTA");
        let mut diag = Diagnostics::new();
        assert_eq!(check_cds(&mut r, &mut diag), CdsCheck::InternalStop);
        assert_eq!(r.seq, "TAGCTATAGCTA");
        assert!(diag.mentions("both strands"));
    }

    #[test]
    fn test_ambiguous_residues_warn_but_continue() {
        let mut r = rec("ATGNNNTAA");
        let mut diag = Diagnostics::new();
        assert_eq!(check_cds(&mut r, &mut diag), CdsCheck::Valid);
        assert!(diag.mentions("non-ACGT residue 'N'"));
    }

    #[test]
    fn test_tally() {
        let mut tally = CdsTally::default();
        tally.add(CdsCheck::Valid);
        tally.add(CdsCheck::Repaired);
        tally.add(CdsCheck::InternalStop);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.repaired, 1);
        assert!(CdsCheck::Repaired.is_valid());
        assert!(!CdsCheck::BadLength.is_valid());
    }
}
