//! AzureManagedControlPlane admission driver
//!
//! Runs the create, update and delete admission checks against manifests on
//! disk and prints what the API server would persist or return.
//!
//! Exit status is 0 when the request is admitted, 1 when it is rejected and
//! 2 when the manifests could not be processed.

mod commands;
mod config;
mod error;

use std::io::{self, Write};
use std::process::ExitCode;

use amcp_admission::AdmissionEngine;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Cli;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    info!("Starting AzureManagedControlPlane admission");

    let defaults = cli.options.load_defaults()?;
    let engine = AdmissionEngine::with_defaults(defaults).context("building admission engine")?;

    let verdict = commands::run(&engine, &cli.command, cli.options.output)?;
    if let Some(output) = verdict.output {
        io::stdout()
            .lock()
            .write_all(output.as_bytes())
            .context("writing output")?;
    }
    Ok(verdict.allowed)
}
