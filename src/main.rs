use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod config;
mod provision;
mod util;

use crate::api::UreqTransport;
use crate::cli::Args;
use crate::config::Connection;
use crate::provision::Plan;

fn main() -> ExitCode {
    init_tracing();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

// Stdout carries only the JSON summary; every diagnostic goes to stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let plan = Plan::from_args(args)?;
    let conn = Connection::from_env()?;

    let transport = UreqTransport::new();
    let session = api::authenticate(&transport, &conn)
        .with_context(|| format!("log in to {} as {}", conn.host, conn.user))?;

    if let Some(summary) = provision::execute(&plan, &transport, &session)? {
        let json = serde_json::to_string(&summary).context("serialize summary")?;
        println!("{json}");
    }
    Ok(())
}
