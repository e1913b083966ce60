use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pyrite::runner::{self, PipelineResult};

#[derive(Parser)]
#[command(name = "pyrite", version, about = "A small Python-inspired expression language")]
struct Cli {
    /// Source file to execute; starts the REPL when omitted
    file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Tracing is opt-in via PYRITE_LOG; without it the pipeline is silent.
    if let Ok(filter) = EnvFilter::try_from_env("PYRITE_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    match cli.file {
        Some(path) => match runner::run_file(&path) {
            PipelineResult::Success(_) => Ok(()),
            PipelineResult::Failure(message) => {
                eprintln!("{message}");
                process::exit(1);
            }
        },
        None => runner::repl::run(),
    }
}
