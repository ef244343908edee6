mod collab;
mod exec;
mod handler;
mod install;
mod ipc;
mod log;
mod project;
mod registry;
mod server;
mod setup;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use typings_common::WorkerConfig;

use crate::log::FileLog;

/// Typings installer worker, driven by a language server over stdin/stdout
#[derive(Parser, Debug)]
#[command(name = "typings-worker")]
#[command(version, about, long_about = None)]
struct WorkerArgs {
    /// Cache directory where typings and the types registry are installed
    #[arg(long = "globalTypingsCacheLocation", value_name = "DIR")]
    global_typings_cache_location: Option<PathBuf>,

    /// Append diagnostic output to this file
    #[arg(long = "logFile", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// npm executable to run
    #[arg(long = "npmLocation", value_name = "PATH")]
    npm_location: Option<String>,

    /// Look up npm on PATH instead of trusting a bare `npm`
    #[arg(long = "validateDefaultNpmLocation")]
    validate_default_npm_location: bool,

    #[arg(long = "typingSafeListLocation", value_name = "FILE")]
    typing_safe_list_location: Option<PathBuf>,

    #[arg(long = "typesMapLocation", value_name = "FILE")]
    types_map_location: Option<PathBuf>,
}

impl From<WorkerArgs> for WorkerConfig {
    fn from(args: WorkerArgs) -> Self {
        let defaults = WorkerConfig::default();
        Self {
            global_cache_location: args
                .global_typings_cache_location
                .unwrap_or(defaults.global_cache_location),
            log_file: args.log_file,
            npm_location: args.npm_location,
            validate_default_npm_location: args.validate_default_npm_location,
            typing_safe_list_location: args.typing_safe_list_location,
            types_map_location: args.types_map_location,
        }
    }
}

/// Record panics in the worker log before the process goes down
fn install_panic_hook(log: FileLog) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        tracing::error!("Unhandled failure: {}", info);
        let mut log = log.clone();
        if log.is_enabled() {
            log.write_line(&format!("[ERROR] {}\n{}", info, backtrace));
        }
        default_hook(info);
    }));
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout carries the channel, so diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config: WorkerConfig = WorkerArgs::parse().into();
    install_panic_hook(FileLog::new(config.log_file.clone()));

    tracing::info!("Typings worker starting...");
    tracing::info!("Cache directory: {:?}", config.global_cache_location);
    tracing::info!("Log file: {:?}", config.log_file);

    let mut worker = server::Worker::new(config);
    if worker.dispatcher().has_pending_failure() {
        tracing::warn!("Setup failed, the failure will be reported before the first response");
    }
    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    worker.run(&mut stdin, &mut stdout).await?;

    Ok(())
}
