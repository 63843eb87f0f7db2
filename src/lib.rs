//! cgroup-name: resolves a cgroup identifier to the name of the workload running in it.
//!
//! Identifiers are matched against administrator overrides, Kubernetes pods, docker and podman
//! containers, systemd machines, libvirt and Proxmox guests and LXC containers. The resolved
//! name is printed on stdout and the outcome is reported through the exit code.
use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;
use config::Cli;

pub mod classify;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod instance;
pub mod k8s;
pub mod logging;
pub mod machine;
pub mod overrides;
pub mod process;
pub mod resolve;
pub mod runtime;

pub use resolve::{Resolution, ResolutionStatus, resolve};

/// Runs the resolver for the identifier given on the command line.
///
/// Prints the resolved name on stdout and returns the matching exit code:
/// `0` when a name was found, `1` when no identifier was given, `2` when a docker-like runtime
/// did not know the container and `3` when Kubernetes did not know it.
pub async fn run() -> ExitCode {
    let cli = match parse_args(std::env::args_os().collect()) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            log::error!(target: logging::FATAL, "{}", first_line(&err));
            return ExitCode::from(resolve::EXIT_MISSING_ARGUMENT);
        }
    };

    let Some(identifier) = cli.identifier.filter(|identifier| !identifier.is_empty()) else {
        log::error!(target: logging::FATAL, "called without a cgroup identifier");
        return ExitCode::from(resolve::EXIT_MISSING_ARGUMENT);
    };
    if !cli.extra.is_empty() {
        log::warn!("ignoring extra arguments {:?}", cli.extra);
    }
    log::debug!("{:?}", cli.config);

    let resolution = resolve(&identifier, &cli.config).await;
    println!("{}", resolution.name);
    ExitCode::from(resolution.status.exit_code())
}

/// Parses the command line.
///
/// A command line clap rejects still resolves its first argument, with every setting taken
/// from the environment or its default. The original error is returned only if that fails too.
fn parse_args(args: Vec<OsString>) -> Result<Cli, clap::Error> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => Ok(cli),
        Err(err) if !err.use_stderr() => Err(err),
        Err(err) => {
            log::warn!(
                "ignoring invalid command line ({}), resolving the first argument only",
                first_line(&err)
            );
            Cli::try_parse_from(args.iter().take(2)).map_err(|_| err)
        }
    }
}

fn first_line(err: &clap::Error) -> String {
    err.render()
        .to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .to_owned()
}
