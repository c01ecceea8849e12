//! Run configuration.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::CurateError;
use crate::sources::Source;

/// Output file name inside `<datadir>/<source>/`.
pub const OUTPUT_NAME: &str = "sequences";

/// Everything a build needs, resolved once up front.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub source: Source,
    /// Root of the curated collections; must already exist.
    pub datadir: PathBuf,
    /// Where the fetcher stages raw inputs.
    pub staging: PathBuf,
    /// Re-download staged inputs even if present.
    pub force: bool,
    pub debug: bool,
}

impl BuildConfig {
    /// Resolves `source` through the registry and checks `datadir`.
    pub fn new(source: &str, datadir: impl Into<PathBuf>) -> Result<Self> {
        let source: Source = source.parse()?;
        let datadir = datadir.into();
        if !datadir.is_dir() {
            return Err(CurateError::MissingOutputDir(datadir).into());
        }
        let staging = datadir.join(source.name()).join("staging");
        Ok(Self {
            source,
            datadir,
            staging,
            force: false,
            debug: false,
        })
    }

    pub fn with_staging(mut self, staging: impl Into<PathBuf>) -> Self {
        self.staging = staging.into();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// `<datadir>/<source>`
    pub fn source_dir(&self) -> PathBuf {
        self.datadir.join(self.source.name())
    }

    /// `<datadir>/<source>/sequences`
    pub fn output_path(&self) -> PathBuf {
        self.source_dir().join(OUTPUT_NAME)
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new("VFDB", dir.path()).unwrap();
        assert_eq!(config.source, Source::Vfdb);
        assert_eq!(config.staging, dir.path().join("vfdb").join("staging"));
        assert_eq!(config.output_path(), dir.path().join("vfdb").join("sequences"));
        assert!(!config.force);

        let config = config.with_staging("/tmp/x").with_force(true).with_debug(true);
        assert_eq!(config.staging_dir(), Path::new("/tmp/x"));
        assert!(config.force && config.debug);
    }

    #[test]
    fn test_missing_datadir() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildConfig::new("ncbi", dir.path().join("absent")).unwrap_err();
        assert!(matches!(err.downcast_ref::<CurateError>(), Some(CurateError::MissingOutputDir(_))));
    }

    #[test]
    fn test_unknown_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = BuildConfig::new("arg-annot", dir.path()).unwrap_err();
        assert!(err.to_string().contains("Known sources: argannot"));
    }
}
