//! Merge three reads of the same DAT tape into one corrected image.
//!
//! The merged stream goes to standard output; diagnostics and the error
//! counters go to standard error.

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datrec_merge::{merge, MergeStats};

/// Reconstruct a clean tape image from three reads of the same tape
#[derive(Parser, Debug)]
#[command(name = "datrec-merge", disable_version_flag = true)]
struct Args {
    /// Print the version and continue
    #[arg(short = 'V', long = "version")]
    version: bool,

    #[arg(value_name = "IMAGE1")]
    image1: PathBuf,
    #[arg(value_name = "IMAGE2")]
    image2: PathBuf,
    #[arg(value_name = "IMAGE3")]
    image3: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.version {
        println!("datrec-merge v{}", env!("CARGO_PKG_VERSION"));
    }

    let mut inputs = Vec::with_capacity(3);
    for path in [&args.image1, &args.image2, &args.image3] {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("can not open '{}': {e}", path.display()))?;
        inputs.push(file);
    }
    let [a, b, c] = <[File; 3]>::try_from(inputs)
        .map_err(|_| anyhow::anyhow!("expected exactly three inputs"))?;

    let mut stats = MergeStats::default();
    let mut stdout = std::io::stdout().lock();
    let result = merge([a, b, c], &mut stdout, &mut stats);
    stdout.flush()?;

    eprintln!("datrec-merge: {} uncorrectable errors", stats.uncorrected);
    for (i, corrected) in stats.corrected.iter().enumerate() {
        eprintln!("datrec-merge: {corrected} corrected errors in file {i}");
    }

    result?;
    Ok(())
}
