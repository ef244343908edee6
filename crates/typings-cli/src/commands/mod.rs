use ansi_term::Colour;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use typings_common::{InspectValueOptions, InspectValueRequest, InstallPackageRequest, Request, Response};

use crate::client::{send_request, WorkerOptions};

/// Typings CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the cached types registry
    Registry,
    /// Install a package into the project that owns a source file
    Install(InstallArgs),
    /// Describe the exports of a module
    Inspect(InspectArgs),
}

impl Commands {
    pub async fn execute(self, options: &WorkerOptions) -> Result<()> {
        let request = self.into_request()?;
        let responses = send_request(options, request).await?;
        for response in &responses {
            print_response(response)?;
        }
        Ok(())
    }

    fn into_request(self) -> Result<Request> {
        Ok(match self {
            Commands::Registry => Request::TypesRegistry,
            Commands::Install(args) => args.into_request()?,
            Commands::Inspect(args) => Request::InspectValue(InspectValueRequest {
                options: InspectValueOptions {
                    file_name_to_require: expand_path(&args.module)?,
                },
            }),
        })
    }
}

/// Arguments for the `install` command
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Source file the package is needed for
    #[clap(long, value_name = "FILE")]
    pub file: String,

    /// Package to install, e.g. @types/node
    #[clap(long)]
    pub package: String,

    /// Install here when no package.json is found above the file
    #[clap(long, value_name = "DIR")]
    pub project_root: Option<String>,

    /// Project name echoed back in the response
    #[clap(long, default_value = "cli")]
    pub project_name: String,
}

impl InstallArgs {
    fn into_request(self) -> Result<Request> {
        let project_root_path = self.project_root.as_deref().map(expand_path).transpose()?;
        Ok(Request::InstallPackage(InstallPackageRequest {
            file_name: expand_path(&self.file)?,
            package_name: self.package,
            project_name: self.project_name,
            project_root_path,
            id: 1,
        }))
    }
}

/// Arguments for the `inspect` command
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Module file to require
    #[clap(long, value_name = "FILE")]
    pub module: String,
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(path).context(format!("Failed to expand path {:?}", path))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn print_response(response: &Response) -> Result<()> {
    println!("{}", status_line(response));
    let json = serde_json::to_string_pretty(response).context("Failed to format response")?;
    println!("{}", json);
    Ok(())
}

/// One coloured line summarising `response`
pub fn status_line(response: &Response) -> String {
    match response {
        Response::InitializationFailed(r) => {
            format!("{} {}", Colour::Red.bold().paint("initialization failed:"), r.message)
        }
        Response::InstallPackage(r) if r.success => {
            format!("{} {}", Colour::Green.bold().paint("ok"), r.message)
        }
        Response::InstallPackage(r) => {
            format!("{} {}", Colour::Red.bold().paint("failed"), r.message)
        }
        Response::TypesRegistry(r) => format!(
            "{} {} registry entries",
            Colour::Green.bold().paint("ok"),
            r.types_registry.len()
        ),
        other => format!("{} {}", Colour::Cyan.paint("response"), other.kind()),
    }
}
