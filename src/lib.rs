//! argcurate - canonical AMR / virulence / serotyping sequence collections
//!
//! Turns heterogeneous public sequence exports into one FASTA collection per
//! source with a uniform `<source>~~~<ID>~~~<ACC>~~~<ABX>` header.
//!
//! # Modules
//! - `seqio`: FASTA reading/writing with gzip support, raw sequence loader
//! - `annotation`: delimited metadata tables
//! - `record`: canonical record schema
//! - `grammar`: header grammar rules
//! - `repair`: textual fixes for malformed upstream files
//! - `sources`: per-database adapters and the source registry
//! - `cds`: coding sequence validation
//! - `dedup`: duplicate sequence removal
//! - `canonical`: header encoding and collection output
//! - `pipeline`: build orchestration
//! - `collab`: fetch and index collaborators
//! - `config`: run configuration
//! - `diag`: per-run warnings
//! - `error`: fatal errors

pub mod annotation;
pub mod canonical;
pub mod cds;
pub mod collab;
pub mod config;
pub mod dedup;
pub mod diag;
pub mod error;
pub mod grammar;
pub mod pipeline;
pub mod record;
pub mod repair;
pub mod seqio;
pub mod sources;

pub use config::BuildConfig;
pub use error::CurateError;
pub use pipeline::{curate, run, BuildReport};
pub use sources::Source;
