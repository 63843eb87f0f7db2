//! Names for containers running in Kubernetes pods.
//!
//! The pod list is fetched from the in-cluster API when this process runs inside a pod, and
//! from `kubectl` otherwise. The container whose id contains the fragment taken from the cgroup
//! identifier is named `k8s_<namespace>_<pod>_<pod uid>_<container>`.
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::config::Config;
use crate::error::ResultOkLogExt;
use crate::process;

mod api;
mod cli;
pub mod pods;

pub use pods::PodList;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read service account file `{path}`: {source}")]
    ReadServiceAccount {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cluster CA certificate `{path}`: {source}")]
    InvalidCertificate {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build Kubernetes API client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Kubernetes API request `{url}` failed: {source}")]
    Api {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode pod list from `{origin}`: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Process(#[from] process::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

static POD_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*kube.*_pod(.*)$").expect("pod fragment pattern is valid")
});

/// Prefixes systemd scope units carry in front of the container id.
const SCOPE_PREFIXES: [&str; 4] = ["cri-containerd-", "crio-", "docker-", "containerd-"];

/// Extracts the part of a kubepods identifier that is matched against container ids.
///
/// Identifiers shaped like `kube..._pod<rest>` yield `<rest>`. Any other identifier yields its
/// last `_` separated segment, or its last `/` separated segment if it has no `_`, with a
/// systemd scope wrapper such as `cri-containerd-<id>.scope` removed.
pub fn container_fragment(identifier: &str) -> &str {
    if let Some(rest) = POD_FRAGMENT
        .captures(identifier)
        .and_then(|captures| captures.get(1))
    {
        return rest.as_str();
    }

    let segment = match identifier.rsplit_once('_') {
        Some((_, last)) => last,
        None => identifier
            .rsplit_once('/')
            .map_or(identifier, |(_, last)| last),
    };
    strip_scope(segment)
}

fn strip_scope(segment: &str) -> &str {
    let Some(unit) = segment.strip_suffix(".scope") else {
        return segment;
    };
    SCOPE_PREFIXES
        .iter()
        .find_map(|prefix| unit.strip_prefix(prefix))
        .filter(|id| !id.is_empty())
        .unwrap_or(unit)
}

/// One way of listing the cluster's pods.
#[derive(Debug, Clone)]
pub enum PodSource {
    /// The API server reachable from inside a pod.
    Api {
        /// `https://<host>:<port>`.
        base_url: String,
        service_account_dir: PathBuf,
    },
    /// `kubectl` with an explicit kubeconfig.
    Cli {
        program: String,
        kube_config: PathBuf,
    },
}

impl PodSource {
    /// Lists all pods in all namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unavailable or the query fails.
    pub async fn list_pods(&self, timeout: Duration) -> Result<PodList> {
        match self {
            PodSource::Api {
                base_url,
                service_account_dir,
            } => api::list_pods(base_url, service_account_dir, timeout).await,
            PodSource::Cli {
                program,
                kube_config,
            } => cli::list_pods(program, kube_config, timeout).await,
        }
    }
}

/// Sources to ask, in order: the in-cluster API if available, then `kubectl`.
pub fn pod_sources(config: &Config) -> Vec<PodSource> {
    let mut sources = Vec::with_capacity(2);
    if let Some((host, port)) = config.in_cluster_api() {
        sources.push(PodSource::Api {
            base_url: api::base_url(host, port),
            service_account_dir: config.service_account_dir.clone(),
        });
    }
    sources.push(PodSource::Cli {
        program: config.kubectl_bin.clone(),
        kube_config: config.kube_config.clone(),
    });
    sources
}

/// Names the container matching `fragment` using the first source that can list pods.
///
/// Returns `None` if no source is usable or the listed pods contain no matching container.
pub async fn container_name(
    sources: &[PodSource],
    fragment: &str,
    timeout: Duration,
) -> Option<String> {
    for source in sources {
        let Some(pods) = source.list_pods(timeout).await.ok_warn() else {
            continue;
        };
        log::debug!("{source:?} listed {} pods", pods.items.len());
        return pods.container_name(fragment);
    }

    log::warn!(
        "cannot list Kubernetes pods, set KUBE_CONFIG to a kubeconfig that can reach the control plane"
    );
    None
}
