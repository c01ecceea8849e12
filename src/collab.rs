//! Fetch and index collaborators.
//!
//! The pipeline only needs two capabilities from the outside world: getting raw
//! inputs into the staging directory ([`Fetcher`]) and turning the finished
//! collection into a search index ([`Indexer`]). Both are traits so tests and
//! offline runs can substitute [`StagedFetcher`] and [`NoIndexer`].

use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::BuildConfig;
use crate::record::MoleculeType;
use crate::sources::{find_file, find_with_extension, Source};

// ============================================================================
// Fetch
// ============================================================================

/// Makes a source's raw inputs available in the staging directory.
pub trait Fetcher {
    fn fetch(&self, config: &BuildConfig) -> Result<()>;
}

/// Uses whatever is already staged; fails if an expected input is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct StagedFetcher;

impl Fetcher for StagedFetcher {
    fn fetch(&self, config: &BuildConfig) -> Result<()> {
        for pattern in config.source.adapter().expected_files() {
            match pattern.strip_prefix("*.") {
                Some(ext) => {
                    find_with_extension(config.staging_dir(), ext)?;
                }
                None => {
                    find_file(config.staging_dir(), pattern)?;
                }
            }
        }
        debug!(staging = %config.staging_dir().display(), "staged inputs present");
        Ok(())
    }
}

/// How a downloaded file is turned into staged inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unpack {
    None,
    /// Single gzip member; the `.gz` suffix is dropped.
    Gzip,
    TarGz,
    TarBz2,
}

/// One upstream download.
#[derive(Debug, Clone, Copy)]
pub struct Remote {
    pub url: &'static str,
    /// File name inside the staging directory.
    pub file: &'static str,
    pub unpack: Unpack,
}

const CARD_DATA: Remote = Remote {
    url: "https://card.mcmaster.ca/latest/data",
    file: "card-data.tar.bz2",
    unpack: Unpack::TarBz2,
};

/// Upstream downloads for `source`.
pub fn remotes(source: Source) -> &'static [Remote] {
    match source {
        Source::Argannot => &[Remote {
            url: "https://www.mediterranee-infection.com/wp-content/uploads/2019/03/ARG-ANNOT_NT_V6_July2019.txt",
            file: "arg-annot.fa",
            unpack: Unpack::None,
        }],
        Source::Card | Source::CardJson => &[CARD_DATA],
        Source::Resfinder => &[Remote {
            url: "https://bitbucket.org/genomicepidemiology/resfinder_db/get/master.tar.gz",
            file: "resfinder_db.tar.gz",
            unpack: Unpack::TarGz,
        }],
        Source::Plasmidfinder => &[Remote {
            url: "https://bitbucket.org/genomicepidemiology/plasmidfinder_db/get/master.tar.gz",
            file: "plasmidfinder_db.tar.gz",
            unpack: Unpack::TarGz,
        }],
        Source::Vfdb => &[Remote {
            url: "http://www.mgc.ac.cn/VFs/Down/VFDB_setA_nt.fas.gz",
            file: "VFDB_setA_nt.fas.gz",
            unpack: Unpack::Gzip,
        }],
        Source::Ecoh => &[Remote {
            url: "https://raw.githubusercontent.com/katholt/srst2/master/data/EcOH.fasta",
            file: "EcOH.fasta",
            unpack: Unpack::None,
        }],
        Source::Ncbi => &[Remote {
            url: "https://ftp.ncbi.nlm.nih.gov/pathogen/Antimicrobial_resistance/AMRFinderPlus/database/latest/AMR_CDS.fa",
            file: "AMR_CDS.fa",
            unpack: Unpack::None,
        }],
        Source::Megares => &[Remote {
            url: "https://www.meglab.org/downloads/megares_v3.00/megares_database_v3.00.fasta",
            file: "megares_database.fasta",
            unpack: Unpack::None,
        }],
    }
}

/// Downloads each [`Remote`] of the configured source over HTTP.
#[derive(Debug, Clone, Copy)]
pub struct HttpFetcher {
    pub timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        // Large archives (CARD, ResFinder) on slow mirrors
        Self { timeout: Duration::from_secs(300) }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, config: &BuildConfig) -> Result<()> {
        let staging = config.staging_dir();
        std::fs::create_dir_all(staging)
            .with_context(|| format!("Failed to create {}", staging.display()))?;

        for remote in remotes(config.source) {
            let target = staging.join(remote.file);
            if target.exists() && !config.force {
                info!(file = remote.file, "already staged, skipping download");
                continue;
            }
            info!(url = remote.url, "downloading");
            self.fetch_file(remote.url, &target)?;
            unpack(remote.unpack, &target, staging)?;
        }

        StagedFetcher.fetch(config)
    }
}

impl HttpFetcher {
    fn fetch_file(&self, url: &str, output_path: &Path) -> Result<()> {
        let response = ureq::get(url)
            .timeout(self.timeout)
            .call()
            .with_context(|| format!("Failed to download {}", url))?;

        // Partial downloads must not look staged
        let partial = output_path.with_extension("download");
        {
            let mut file = File::create(&partial)
                .with_context(|| format!("Failed to create {}", partial.display()))?;
            let mut reader = response.into_reader();
            std::io::copy(&mut reader, &mut file)?;
        }
        std::fs::rename(&partial, output_path)?;
        Ok(())
    }
}

/// Unpacks a downloaded file into `dest`.
pub fn unpack(kind: Unpack, archive: &Path, dest: &Path) -> Result<()> {
    use bzip2::read::BzDecoder;
    use flate2::read::{GzDecoder, MultiGzDecoder};
    use tar::Archive;

    let open = || {
        File::open(archive)
            .map(BufReader::new)
            .with_context(|| format!("Failed to open {}", archive.display()))
    };

    match kind {
        Unpack::None => return Ok(()),
        Unpack::Gzip => {
            let name = archive
                .file_stem()
                .with_context(|| format!("No file name in {}", archive.display()))?;
            let mut out = File::create(dest.join(name))?;
            std::io::copy(&mut MultiGzDecoder::new(open()?), &mut out)?;
        }
        Unpack::TarGz => Archive::new(GzDecoder::new(open()?)).unpack(dest)?,
        Unpack::TarBz2 => Archive::new(BzDecoder::new(open()?)).unpack(dest)?,
    }
    debug!(archive = %archive.display(), ?kind, "unpacked");
    Ok(())
}

// ============================================================================
// Index
// ============================================================================

/// Outcome of an index build. Failure never aborts a curation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexReport {
    Skipped,
    Built { program: String },
    /// Tail of the indexer's output.
    Failed { program: String, tail: String },
}

impl IndexReport {
    pub fn is_failure(&self) -> bool {
        matches!(self, IndexReport::Failed { .. })
    }
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexReport::Skipped => write!(f, "not indexed"),
            IndexReport::Built { program } => write!(f, "indexed with {}", program),
            IndexReport::Failed { program, tail } => write!(f, "{} failed:\n{}", program, tail),
        }
    }
}

/// Builds a search index over a finished collection.
pub trait Indexer {
    fn index(&self, fasta: &Path, source: Source, molecule: MoleculeType) -> Result<IndexReport>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndexer;

impl Indexer for NoIndexer {
    fn index(&self, _fasta: &Path, _source: Source, _molecule: MoleculeType) -> Result<IndexReport> {
        Ok(IndexReport::Skipped)
    }
}

/// Number of output lines kept when the indexer fails.
const FAILURE_TAIL: usize = 10;

/// Runs `makeblastdb` next to the collection.
#[derive(Debug, Clone)]
pub struct BlastIndexer {
    pub program: String,
}

impl Default for BlastIndexer {
    fn default() -> Self {
        Self { program: "makeblastdb".to_string() }
    }
}

impl Indexer for BlastIndexer {
    fn index(&self, fasta: &Path, source: Source, molecule: MoleculeType) -> Result<IndexReport> {
        let result = Command::new(&self.program)
            .arg("-in")
            .arg(fasta)
            .args(["-title", source.name(), "-dbtype", molecule.blast_dbtype(), "-hash_index"])
            .output();

        let program = self.program.clone();
        let report = match result {
            Ok(output) if output.status.success() => IndexReport::Built { program },
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                IndexReport::Failed { program, tail: tail_lines(&text, FAILURE_TAIL) }
            }
            Err(e) => IndexReport::Failed {
                tail: format!("could not run {}: {}", self.program, e),
                program,
            },
        };
        if report.is_failure() {
            warn!(fasta = %fasta.display(), "index build failed");
        }
        Ok(report)
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_every_source_has_a_remote() {
        for source in Source::ALL {
            assert!(!remotes(source).is_empty(), "{}", source);
        }
    }

    #[test]
    fn test_staged_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new("ecoh", dir.path()).unwrap();
        assert!(StagedFetcher.fetch(&config).is_err());

        std::fs::create_dir_all(config.staging_dir()).unwrap();
        std::fs::write(config.staging_dir().join("EcOH.fasta"), ">a\nACGT\n").unwrap();
        StagedFetcher.fetch(&config).unwrap();
    }

    #[test]
    fn test_unpack_gzip_and_tar_gz() {
        let dir = tempfile::tempdir().unwrap();

        let gz = dir.path().join("VFDB_setA_nt.fas.gz");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(b">VFG1(gb|X)\nACGT\n").unwrap();
        enc.finish().unwrap();
        unpack(Unpack::Gzip, &gz, dir.path()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("VFDB_setA_nt.fas")).unwrap();
        assert!(text.starts_with(">VFG1"));

        let tgz = dir.path().join("db.tar.gz");
        {
            let enc = GzEncoder::new(File::create(&tgz).unwrap(), Compression::default());
            let mut builder = tar::Builder::new(enc);
            let data = b">blaA_1_X1\nATG\n";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, "db-master/beta-lactam.fsa", &data[..]).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        unpack(Unpack::TarGz, &tgz, &out).unwrap();
        assert!(out.join("db-master/beta-lactam.fsa").exists());
    }

    #[test]
    fn test_indexers() {
        let fasta = Path::new("sequences");
        let report = NoIndexer.index(fasta, Source::Ncbi, MoleculeType::Nucleotide).unwrap();
        assert_eq!(report, IndexReport::Skipped);

        let missing = BlastIndexer { program: "argcurate-no-such-indexer".to_string() };
        let report = missing.index(fasta, Source::Ncbi, MoleculeType::Nucleotide).unwrap();
        assert!(report.is_failure());
        assert!(report.to_string().contains("could not run"));
    }

    #[test]
    fn test_tail_lines() {
        let text = (1..=15).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        assert_eq!(tail_lines(&text, 3), "13\n14\n15");
        assert_eq!(tail_lines("one", 10), "one");
    }
}
