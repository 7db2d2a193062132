//! audio-triage CLI entrypoint.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let cli = audio_triage::cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("audio_triage=info".parse()?))
        .init();

    audio_triage::cli::run(&cli)
}
