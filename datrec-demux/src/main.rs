//! DAT tape image demultiplexer.
//!
//! Reads tape images (or an audio-capable DDS drive's device node) and
//! produces a series of WAV files with `.details` sidecars, one per track.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datrec_demux::{process_file, DemuxContext, Options};

fn main() -> anyhow::Result<()> {
    let mut opts = Options::parse();
    opts.normalize();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| opts.log_level().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if opts.version {
        println!("datrec-demux v{}", env!("CARGO_PKG_VERSION"));
    }

    let mut ctx = DemuxContext::new(opts.clone());
    for input in &opts.inputs {
        if let Err(e) = process_file(input, &mut ctx) {
            // Leave whatever was recovered on disk, finalized.
            let _ = ctx.close_track();
            return Err(anyhow::Error::new(e).context(format!("{}", input.display())));
        }
    }
    Ok(())
}
