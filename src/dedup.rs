//! Sequence deduplication.
//!
//! Keeps the first record seen for each distinct sequence (exact, case-sensitive
//! comparison) and reports every later record that repeats it.

use rustc_hash::FxHashMap;

use crate::diag::Diagnostics;
use crate::record::Record;

/// Removes records whose sequence was already seen, preserving input order.
pub fn dedupe(records: Vec<Record>, diag: &mut Diagnostics) -> Vec<Record> {
    // sequence -> IDs of every record carrying it, the retained one first
    let mut seen: FxHashMap<String, Vec<String>> = FxHashMap::default();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        match seen.get_mut(&record.seq) {
            Some(ids) => {
                diag.warn(format!(
                    "{}: duplicate sequence, dropped in favour of {}",
                    record.id,
                    ids.join(",")
                ));
                ids.push(record.id);
            }
            None => {
                seen.insert(record.seq.clone(), vec![record.id.clone()]);
                kept.push(record);
            }
        }
    }

    kept
}
