//! Annotation Table Loader
//!
//! Parses delimited auxiliary metadata (phenotype tables, ARO indexes, ...) into a
//! key → (column name → cell) mapping. The first non-comment row is the header
//! and fixes the column count; any data row with a different count is fatal.
//! Repeated keys keep their first row.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::CurateError;

/// One table row: column name → cell value.
pub type Row = FxHashMap<String, String>;

/// Parsing options for [`AnnotationTable::load`].
#[derive(Debug, Clone, Copy)]
pub struct TableOptions {
    /// Column whose value becomes the row key.
    pub key_column: usize,
    pub delimiter: u8,
    /// Lines starting with this byte are skipped.
    pub comment: Option<u8>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            key_column: 0,
            delimiter: b'\t',
            comment: Some(b'#'),
        }
    }
}

impl TableOptions {
    pub fn key_column(mut self, column: usize) -> Self {
        self.key_column = column;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Header-driven key/value table.
#[derive(Debug, Clone)]
pub struct AnnotationTable {
    path: PathBuf,
    columns: Vec<String>,
    rows: FxHashMap<String, Row>,
}

impl AnnotationTable {
    /// Loads a table from disk.
    pub fn load<P: AsRef<Path>>(path: P, options: TableOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open annotation table: {}", path.display()))?;
        Self::from_reader(path, file, options)
    }

    /// Parses a table from any reader; `path` is only used in messages.
    pub fn from_reader<R: Read>(path: &Path, reader: R, options: TableOptions) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .comment(options.comment)
            .has_headers(true)
            .flexible(false)
            .quoting(false)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()
            .map_err(|e| table_error(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if options.key_column >= columns.len() {
            return Err(CurateError::MissingKeyColumn {
                path: path.to_path_buf(),
                column: options.key_column,
                width: columns.len(),
            }
            .into());
        }

        let mut rows: FxHashMap<String, Row> = FxHashMap::default();
        let mut repeated = 0usize;

        for result in csv_reader.records() {
            let record = result.map_err(|e| table_error(path, e))?;
            let key = record.get(options.key_column).unwrap_or("").trim().to_string();

            if rows.contains_key(&key) {
                repeated += 1;
                continue;
            }

            let row: Row = columns
                .iter()
                .cloned()
                .zip(record.iter().map(|cell| cell.trim().to_string()))
                .collect();
            rows.insert(key, row);
        }

        debug!(path = %path.display(), rows = rows.len(), repeated, "loaded annotation table");

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Non-empty cell `column` of the row keyed by `key`.
    pub fn field(&self, key: &str, column: &str) -> Option<&str> {
        self.rows
            .get(key)
            .and_then(|row| row.get(column))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Maps csv's length errors onto the fatal column-count condition.
fn table_error(path: &Path, err: csv::Error) -> anyhow::Error {
    if let csv::ErrorKind::UnequalLengths { pos, expected_len, len } = err.kind() {
        return CurateError::ColumnMismatch {
            path: path.to_path_buf(),
            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
            expected: *expected_len as usize,
            found: *len as usize,
        }
        .into();
    }
    anyhow::Error::new(err).context(format!("Failed to parse annotation table: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, options: TableOptions) -> Result<AnnotationTable> {
        AnnotationTable::from_reader(Path::new("table.tsv"), text.as_bytes(), options)
    }

    #[test]
    fn test_header_driven_rows() {
        let text = "gene\tclass\tphenotype\nblaB\tBeta-lactam\tAmpicillin\ntet(M)\tTetracycline\tDoxycycline\n";
        let table = parse(text, TableOptions::default()).unwrap();
        assert_eq!(table.columns(), ["gene", "class", "phenotype"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.field("blaB", "class"), Some("Beta-lactam"));
        assert_eq!(table.field("tet(M)", "phenotype"), Some("Doxycycline"));
        assert_eq!(table.field("missing", "class"), None);
    }

    #[test]
    fn test_comment_rows_are_skipped() {
        let text = "# exported 2024\nid\tvalue\n# note\nA\t1\n";
        let table = parse(text, TableOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.field("A", "value"), Some("1"));
    }

    #[test]
    fn test_first_key_wins() {
        let text = "id\tvalue\nA\tfirst\nA\tsecond\n";
        let table = parse(text, TableOptions::default()).unwrap();
        assert_eq!(table.field("A", "value"), Some("first"));
    }

    #[test]
    fn test_column_mismatch_is_fatal() {
        let text = "id\tvalue\tnote\nA\t1\tok\nB\t2\n";
        let err = parse(text, TableOptions::default()).unwrap_err();
        match err.downcast_ref::<CurateError>() {
            Some(CurateError::ColumnMismatch { expected, found, .. }) => {
                assert_eq!(*expected, 3);
                assert_eq!(*found, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_custom_key_column_and_delimiter() {
        let text = "name,acc\nsul1,AY224185\n";
        let table = parse(text, TableOptions::default().key_column(1).delimiter(b',')).unwrap();
        assert_eq!(table.field("AY224185", "name"), Some("sul1"));
    }

    #[test]
    fn test_key_column_out_of_range() {
        let err = parse("a\tb\nx\ty\n", TableOptions::default().key_column(5)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CurateError>(),
            Some(CurateError::MissingKeyColumn { column: 5, width: 2, .. })
        ));
    }
}
