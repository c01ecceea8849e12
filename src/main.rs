use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use argcurate::collab::{BlastIndexer, Fetcher, HttpFetcher, Indexer, NoIndexer, StagedFetcher};
use argcurate::{BuildConfig, BuildReport, Source};

#[derive(Parser)]
#[command(name = "argcurate")]
#[command(version)]
#[command(about = "Build a canonical sequence collection from a public AMR/virulence database")]
#[command(long_about = r#"
argcurate - canonical sequence collections for AMR, virulence and serotyping databases

Fetches one upstream database, normalizes every entry into a record with a
uniform header, checks coding sequences, removes duplicate sequences and writes
<DATADIR>/<SOURCE>/sequences, then indexes it with makeblastdb.

WORKFLOW:
  Fetch → Load/repair → Adapt → CDS check → Deduplicate → Sort → Write → Index

OUTPUT HEADER:
  ><source>~~~<ID>~~~<ACC>~~~<ABX> <DESC>
    ABX   Antibiotic classes, sorted, ';'-separated, whitespace as '_'
    DESC  Product description (the ID when the source has none)

EXAMPLES:
  # Download and build NCBI AMRFinderPlus
  argcurate -x ncbi -d db/

  # Rebuild from files already staged, without indexing
  argcurate -x resfinder -d db/ --offline --no-index

  # List sources
  argcurate --list
"#)]
struct Args {
    #[arg(short = 'x', long, value_name = "SOURCE", env = "ARGCURATE_SOURCE",
          required_unless_present = "list", help_heading = "Database")]
    source: Option<String>,

    #[arg(short = 'd', long, value_name = "DIR", env = "ARGCURATE_DATADIR",
          default_value = "db", help_heading = "Database")]
    datadir: PathBuf,

    #[arg(short = 's', long, value_name = "DIR", env = "ARGCURATE_STAGING", help_heading = "Database")]
    staging: Option<PathBuf>,

    #[arg(short = 'l', long, help_heading = "Database")]
    list: bool,

    #[arg(long, help_heading = "Fetch")]
    offline: bool,

    #[arg(short = 'f', long, env = "ARGCURATE_FORCE", help_heading = "Fetch")]
    force: bool,

    #[arg(long = "no-index", help_heading = "Index")]
    no_index: bool,

    #[arg(long, value_name = "PROGRAM", default_value = "makeblastdb",
          env = "ARGCURATE_MAKEBLASTDB", help_heading = "Index")]
    makeblastdb: String,

    #[arg(long, env = "ARGCURATE_DEBUG", help_heading = "Runtime")]
    debug: bool,

    #[arg(short = 'q', long, help_heading = "Runtime")]
    quiet: bool,
}

fn init_logging(args: &Args) {
    let level = match (args.debug, args.quiet) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_sources() {
    println!("SOURCE          DESCRIPTION");
    for source in Source::ALL {
        println!("{:<15} {}", source.name(), source.description());
    }
}

fn print_summary(report: &BuildReport, elapsed: f64) {
    eprintln!("\n============================================================");
    eprintln!(" Build Complete!");
    eprintln!("============================================================");
    eprintln!("Source:     {} ({})", report.source, report.molecule);
    eprintln!("Output:     {}", report.output.display());
    eprintln!("Entries:    {} read, {} adapted, {} written", report.raw, report.adapted, report.kept);
    if report.cds.total() > 0 {
        eprintln!(
            "CDS check:  {} valid, {} reverse-complemented, {} bad length, {} internal stop",
            report.cds.valid, report.cds.repaired, report.cds.bad_length, report.cds.internal_stop
        );
    }
    eprintln!("Warnings:   {}", report.warnings.len());
    eprintln!("Index:      {}", report.index);
    eprintln!("Elapsed:    {:.1}s", elapsed);
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        print_sources();
        return Ok(());
    }

    init_logging(&args);
    let start_time = Instant::now();

    let source = args.source.as_deref().unwrap_or_default();
    let mut config = BuildConfig::new(source, &args.datadir)?
        .with_force(args.force)
        .with_debug(args.debug);
    if let Some(staging) = &args.staging {
        config = config.with_staging(staging);
    }

    let fetcher: Box<dyn Fetcher> = if args.offline {
        Box::new(StagedFetcher)
    } else {
        Box::new(HttpFetcher::default())
    };
    let indexer: Box<dyn Indexer> = if args.no_index {
        Box::new(NoIndexer)
    } else {
        Box::new(BlastIndexer { program: args.makeblastdb.clone() })
    };

    let report = argcurate::run(&config, fetcher.as_ref(), indexer.as_ref())?;
    print_summary(&report, start_time.elapsed().as_secs_f64());
    Ok(())
}
