//! Header grammar rules.
//!
//! Each source header format is a small rule that either yields all of its
//! fields or nothing. A rule never returns a partial match, so an adapter cannot
//! pick up values left over from a previous header; on `None` the adapter keeps
//! the raw entry's own values via [`fallback`].

use regex::Regex;
use std::sync::LazyLock;

use crate::diag::Diagnostics;
use crate::record::{MoleculeType, Record};
use crate::seqio::RawEntry;

/// A header grammar that splits text into positional fields.
pub trait HeaderRule {
    /// Short name used in warnings.
    fn name(&self) -> &'static str;

    /// All fields of `text`, or `None` if the grammar does not match.
    fn fields<'a>(&self, text: &'a str) -> Option<Vec<&'a str>>;
}

/// Fixed-delimiter grammar with a bounded field count.
#[derive(Debug, Clone, Copy)]
pub struct Delimited {
    pub name: &'static str,
    pub delimiter: &'static str,
    pub min_fields: usize,
    pub max_fields: usize,
}

impl Delimited {
    pub const fn exact(name: &'static str, delimiter: &'static str, fields: usize) -> Self {
        Self { name, delimiter, min_fields: fields, max_fields: fields }
    }

    pub const fn between(name: &'static str, delimiter: &'static str, min: usize, max: usize) -> Self {
        Self { name, delimiter, min_fields: min, max_fields: max }
    }
}

impl HeaderRule for Delimited {
    fn name(&self) -> &'static str {
        self.name
    }

    fn fields<'a>(&self, text: &'a str) -> Option<Vec<&'a str>> {
        let fields: Vec<&str> = text.split(self.delimiter).collect();
        (self.min_fields..=self.max_fields)
            .contains(&fields.len())
            .then_some(fields)
    }
}

/// Regex grammar; every capture group must participate in the match.
pub struct Pattern {
    pub name: &'static str,
    pub regex: &'static LazyLock<Regex>,
}

impl HeaderRule for Pattern {
    fn name(&self) -> &'static str {
        self.name
    }

    fn fields<'a>(&self, text: &'a str) -> Option<Vec<&'a str>> {
        let caps = self.regex.captures(text)?;
        caps.iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str()))
            .collect()
    }
}

/// Record built from the raw entry's own values when its header does not match.
pub fn fallback(
    source: &str,
    rule: &dyn HeaderRule,
    raw: &RawEntry,
    molecule: MoleculeType,
    diag: &mut Diagnostics,
) -> Record {
    diag.warn(format!(
        "{}: header '{}' does not match the {} grammar; keeping raw identifier",
        source,
        raw.id,
        rule.name()
    ));
    Record::new(raw.id.clone(), raw.sequence.clone(), molecule).with_desc(raw.description.clone())
}

/// Text of a leading `(...)` group, e.g. `plc1` from `(plc1) phospholipase C`.
pub fn leading_parenthetical(text: &str) -> Option<&str> {
    let rest = text.trim_start().strip_prefix('(')?;
    let end = rest.find(')')?;
    Some(&rest[..end]).filter(|s| !s.is_empty())
}
