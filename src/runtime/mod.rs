//! Container names from docker-like runtimes.
//!
//! A runtime can be asked through its command line tool or through its HTTP API. Both are
//! modelled as a [`Source`]; a resolver is an ordered list of sources and the first one that
//! produces a name wins.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::error::ResultOkLogExt;
use crate::instance::InstanceID;
use crate::process;

mod api;
mod cli;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no API endpoint configured in `{variable}`")]
    MissingEndpoint { variable: &'static str },
    #[error("unsupported API endpoint `{0}`, expected `unix://`, `tcp://`, `http://` or an absolute socket path")]
    InvalidEndpoint(String),
    #[error("API socket `{path}` does not exist")]
    MissingSocket { path: PathBuf },
    #[error("failed to connect to `{endpoint}`: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request to `{endpoint}` failed: {source}")]
    Http {
        endpoint: Endpoint,
        #[source]
        source: hyper::Error,
    },
    #[error("failed to build request for `{endpoint}`: {source}")]
    Request {
        endpoint: Endpoint,
        #[source]
        source: hyper::http::Error,
    },
    #[error("`{endpoint}{path}` answered with {status}")]
    Status {
        endpoint: Endpoint,
        path: String,
        status: hyper::StatusCode,
    },
    #[error("request to `{endpoint}` did not finish within {timeout:?}")]
    Timeout {
        endpoint: Endpoint,
        timeout: Duration,
    },
    #[error("failed to decode container details from `{endpoint}`: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Process(#[from] process::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Address of a runtime's HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A unix domain socket.
    Unix(PathBuf),
    /// A plain HTTP `host:port`.
    Tcp(String),
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix://") {
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if s.starts_with('/') {
            return Ok(Endpoint::Unix(PathBuf::from(s)));
        }
        if let Some(authority) = s
            .strip_prefix("tcp://")
            .or_else(|| s.strip_prefix("http://"))
        {
            let authority = authority.trim_end_matches('/');
            if !authority.is_empty() {
                return Ok(Endpoint::Tcp(authority.to_owned()));
            }
        }
        Err(Error::InvalidEndpoint(s.to_owned()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp(authority) => write!(f, "http://{authority}"),
        }
    }
}

/// One way of asking a runtime for a container's name.
#[derive(Debug, Clone)]
pub enum Source {
    /// `<program> ps --filter id=<id> --format {{.Names}}`.
    Cli { program: String },
    /// `GET /containers/<id>/json`. `variable` names the setting the host came from.
    Api {
        host: String,
        variable: &'static str,
    },
}

impl Source {
    /// Asks this source for the name of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unavailable or the query fails.
    pub async fn lookup(&self, id: &InstanceID, timeout: Duration) -> Result<Option<String>> {
        match self {
            Source::Cli { program } => cli::container_name(program, id, timeout).await,
            Source::Api { host, variable } => {
                if host.is_empty() {
                    return Err(Error::MissingEndpoint {
                        variable: *variable,
                    });
                }
                let endpoint = host.parse::<Endpoint>()?;
                api::container_name(&endpoint, id, timeout).await
            }
        }
    }
}

/// Sources consulted for docker containers.
///
/// The local CLI is preferred when installed. Otherwise the API is asked and the podman CLI,
/// which understands the same listing, is the last resort.
pub fn docker_sources(config: &Config) -> Vec<Source> {
    let mut sources = Vec::with_capacity(3);
    if process::find_executable(&config.docker_bin).is_some() {
        sources.push(Source::Cli {
            program: config.docker_bin.clone(),
        });
    }
    sources.push(Source::Api {
        host: config.docker_host.clone(),
        variable: "DOCKER_HOST",
    });
    sources.push(Source::Cli {
        program: config.podman_bin.clone(),
    });
    sources
}

/// Sources consulted for podman containers.
///
/// The API comes first: the CLI only lists containers of the current user session.
pub fn podman_sources(config: &Config) -> Vec<Source> {
    vec![
        Source::Api {
            host: config.podman_host.clone(),
            variable: "PODMAN_HOST",
        },
        Source::Cli {
            program: config.podman_bin.clone(),
        },
    ]
}

/// Asks `sources` in order and returns the first non-empty name.
///
/// Failing sources are logged as warnings and skipped.
pub async fn container_name(
    sources: &[Source],
    id: &InstanceID,
    timeout: Duration,
) -> Option<String> {
    for source in sources {
        if let Some(name) = source.lookup(id, timeout).await.ok_warn().flatten() {
            return Some(name);
        }
        log::debug!("{source:?} did not name container `{id}`");
    }

    None
}

/// First non-empty line of a command's or API's answer.
fn first_name(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}
