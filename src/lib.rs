// turbo-video: stream resolution and split audio/video playback sync

pub mod commands;
pub mod logging;
pub mod playback;
pub mod resolver;

use std::process::ExitCode;

use clap::Parser;

use commands::{handle_command, Cli, Report};
use resolver::{ResolverConfig, StreamResolver};

/// CLI entry point: parse args, run one command, print its JSON document
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let report = match execute(cli) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!("[Main] {}", err);
            Report::error(&err)
        }
    };

    match serde_json::to_string_pretty(&report.document) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            tracing::error!("[Main] Failed to print output: {}", err);
            return ExitCode::FAILURE;
        }
    }

    if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn execute(cli: Cli) -> Result<Report, Box<dyn std::error::Error>> {
    let config = ResolverConfig::load(cli.config.as_deref())?;

    let resolver = StreamResolver::from_config(config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    Ok(runtime.block_on(handle_command(&resolver, cli.command))?)
}
