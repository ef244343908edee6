use anyhow::Result;
use clap::Parser;
use client::WorkerOptions;
use commands::{expand_path, Commands};

mod client;
mod commands;

/// Typings CLI - drive a typings-worker by hand
#[derive(Parser, Debug)]
#[command(name = "typings")]
#[command(version, about = "CLI client for the typings worker", long_about = None)]
struct Cli {
    /// Worker binary to spawn
    #[arg(long, global = true, value_name = "PATH")]
    worker: Option<String>,

    /// Global typings cache directory
    #[arg(long, global = true, value_name = "DIR")]
    cache: Option<String>,

    /// npm executable for the worker to use
    #[arg(long, global = true, value_name = "PATH")]
    npm: Option<String>,

    /// Worker log file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn worker_options(&self) -> Result<WorkerOptions> {
        Ok(WorkerOptions {
            worker: self.worker.as_deref().map(expand_path).transpose()?,
            cache: self.cache.as_deref().map(expand_path).transpose()?,
            npm: self.npm.clone(),
            log_file: self.log_file.as_deref().map(expand_path).transpose()?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let options = cli.worker_options()?;

    cli.command.execute(&options).await
}
