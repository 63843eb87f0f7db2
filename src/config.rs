//! Command line and environment configuration.
//!
//! Every setting can be given as a flag or through the environment variable the
//! surrounding tooling already exports (`DOCKER_HOST`, `KUBERNETES_SERVICE_HOST`, ...).
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;

/// Name of the override table looked up in each configuration directory.
pub const OVERRIDE_FILE_NAME: &str = "cgroups-names.conf";

const DEFAULT_USER_CONFIG_DIR: &str = "/etc/cgroup-name";
const DEFAULT_STOCK_CONFIG_DIR: &str = "/usr/lib/cgroup-name/conf.d";
const DEFAULT_SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const DEFAULT_KUBE_CONFIG: &str = "/etc/kubernetes/admin.conf";
const DEFAULT_HOST_PREFIX: &str = "/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Resolves a cgroup identifier to a human readable workload name.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "cgroup-name", version)]
pub struct Cli {
    /// The cgroup identifier to resolve, e.g. `system.slice_docker-<id>.scope`.
    #[arg(allow_hyphen_values = true)]
    pub identifier: Option<String>,

    /// Anything after the identifier; ignored.
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,

    #[command(flatten)]
    pub config: Config,
}

/// Locations and limits used while resolving a name.
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// Directory holding the administrator's override table.
    #[arg(
        long,
        env = "CGROUP_NAME_USER_CONFIG_DIR",
        default_value = DEFAULT_USER_CONFIG_DIR,
        value_parser = path_or(DEFAULT_USER_CONFIG_DIR)
    )]
    pub user_config_dir: PathBuf,

    /// Directory holding the stock override table.
    #[arg(
        long,
        env = "CGROUP_NAME_STOCK_CONFIG_DIR",
        default_value = DEFAULT_STOCK_CONFIG_DIR,
        value_parser = path_or(DEFAULT_STOCK_CONFIG_DIR)
    )]
    pub stock_config_dir: PathBuf,

    /// Docker API endpoint (`unix:///path`, `/path`, `tcp://host:port` or `http://host:port`).
    #[arg(long, env = "DOCKER_HOST", default_value = "/var/run/docker.sock")]
    pub docker_host: String,

    /// Podman API endpoint, same syntax as `--docker-host`.
    #[arg(long, env = "PODMAN_HOST", default_value = "/run/podman/podman.sock")]
    pub podman_host: String,

    /// In-cluster Kubernetes API host.
    #[arg(long, env = "KUBERNETES_SERVICE_HOST")]
    pub kubernetes_service_host: Option<String>,

    /// In-cluster Kubernetes API port.
    #[arg(long, env = "KUBERNETES_PORT_443_TCP_PORT")]
    pub kubernetes_service_port: Option<String>,

    /// Directory with the pod's service account `token` and `ca.crt`.
    #[arg(
        long,
        env = "KUBERNETES_SERVICE_ACCOUNT_DIR",
        default_value = DEFAULT_SERVICE_ACCOUNT_DIR,
        value_parser = path_or(DEFAULT_SERVICE_ACCOUNT_DIR)
    )]
    pub service_account_dir: PathBuf,

    /// kubeconfig passed to `kubectl` when not running inside the cluster.
    #[arg(
        long,
        env = "KUBE_CONFIG",
        default_value = DEFAULT_KUBE_CONFIG,
        value_parser = path_or(DEFAULT_KUBE_CONFIG)
    )]
    pub kube_config: PathBuf,

    /// Root of the host filesystem, used to locate Proxmox configuration files.
    #[arg(
        long,
        env = "CGROUP_NAME_HOST_PREFIX",
        default_value = DEFAULT_HOST_PREFIX,
        value_parser = path_or(DEFAULT_HOST_PREFIX)
    )]
    pub host_prefix: PathBuf,

    /// Deadline in seconds for every external command or API request.
    #[arg(
        long = "timeout",
        env = "CGROUP_NAME_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = timeout_secs
    )]
    pub timeout_secs: u64,

    #[arg(long, env = "CGROUP_NAME_DOCKER_BIN", default_value = "docker")]
    pub docker_bin: String,

    #[arg(long, env = "CGROUP_NAME_PODMAN_BIN", default_value = "podman")]
    pub podman_bin: String,

    #[arg(long, env = "CGROUP_NAME_KUBECTL_BIN", default_value = "kubectl")]
    pub kubectl_bin: String,
}

impl Config {
    /// Override tables in lookup order: user level before stock.
    pub fn override_files(&self) -> [PathBuf; 2] {
        [
            self.user_config_dir.join(OVERRIDE_FILE_NAME),
            self.stock_config_dir.join(OVERRIDE_FILE_NAME),
        ]
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Host and port of the Kubernetes API if this process runs inside a pod.
    pub fn in_cluster_api(&self) -> Option<(&str, &str)> {
        match (
            self.kubernetes_service_host.as_deref(),
            self.kubernetes_service_port.as_deref(),
        ) {
            (Some(host), Some(port)) if !host.is_empty() && !port.is_empty() => Some((host, port)),
            _ => None,
        }
    }

    /// Directory holding one `<vmid>.conf` per Proxmox guest; its presence marks a Proxmox host.
    pub fn proxmox_dir(&self) -> PathBuf {
        self.host_prefix.join("etc/pve")
    }
}

/// Parses a path setting; an empty value keeps `default`.
fn path_or(
    default: &'static str,
) -> impl Fn(&str) -> Result<PathBuf, Infallible> + Clone + Send + Sync + 'static {
    move |value: &str| {
        if value.is_empty() {
            log::warn!("empty path setting, using `{default}`");
            return Ok(PathBuf::from(default));
        }
        Ok(PathBuf::from(value))
    }
}

/// Parses the deadline; anything but a positive number of seconds keeps the default.
fn timeout_secs(value: &str) -> Result<u64, Infallible> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => {
            log::warn!("invalid timeout `{value}`, using {DEFAULT_TIMEOUT_SECS} seconds");
            Ok(DEFAULT_TIMEOUT_SECS)
        }
    }
}

/// Configuration rooted in a scratch directory with every external collaborator unreachable.
#[cfg(test)]
pub(crate) fn test_config(root: &std::path::Path) -> Config {
    Config {
        user_config_dir: root.join("user"),
        stock_config_dir: root.join("stock"),
        docker_host: root.join("docker.sock").display().to_string(),
        podman_host: root.join("podman.sock").display().to_string(),
        kubernetes_service_host: None,
        kubernetes_service_port: None,
        service_account_dir: root.join("serviceaccount"),
        kube_config: root.join("admin.conf"),
        host_prefix: root.to_path_buf(),
        timeout_secs: 5,
        docker_bin: root.join("bin/docker").display().to_string(),
        podman_bin: root.join("bin/podman").display().to_string(),
        kubectl_bin: root.join("bin/kubectl").display().to_string(),
    }
}
