//! The name resolution pipeline.
//!
//! Stages run in a fixed order and the first one producing a usable name wins:
//!
//! 1. the administrator's override tables,
//! 2. Kubernetes, for identifiers containing `kubepods`,
//! 3. the runtime selected by [`classify`](crate::classify::classify).
//!
//! If none of them produces a name the identifier itself is used.
use crate::classify::{self, RuntimeKind};
use crate::config::Config;
use crate::error::ResultOkLogExt;
use crate::instance::InstanceID;
use crate::{k8s, machine, overrides, runtime};

/// Upper bound for a resolved name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Exit code used when no identifier is given.
pub const EXIT_MISSING_ARGUMENT: u8 = 1;

/// Outcome classification, reported to the caller through the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    Found,
    /// A docker-like runtime was asked but knew no name; the short id is used instead.
    NotFoundDockerLike,
    /// Kubernetes was asked but knew no name; the container id fragment is used instead.
    NotFoundK8s,
}

impl ResolutionStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            ResolutionStatus::Found => 0,
            ResolutionStatus::NotFoundDockerLike => 2,
            ResolutionStatus::NotFoundK8s => 3,
        }
    }
}

/// A display name and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub status: ResolutionStatus,
}

impl Resolution {
    fn found(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ResolutionStatus::Found,
        }
    }

    /// Keeps the first non-blank line, bounded to [`MAX_NAME_LEN`]. `None` if nothing is left.
    fn sanitized(self) -> Option<Self> {
        let name = self
            .name
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())?;

        Some(Self {
            name: truncate(name),
            status: self.status,
        })
    }
}

fn truncate(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Override,
    Kubernetes,
    Runtime,
}

const STAGES: [Stage; 3] = [Stage::Override, Stage::Kubernetes, Stage::Runtime];

impl Stage {
    async fn run(self, identifier: &str, config: &Config) -> Option<Resolution> {
        match self {
            Stage::Override => overrides::lookup(identifier, &config.override_files())
                .map(Resolution::found),
            Stage::Kubernetes => by_kubernetes(identifier, config).await,
            Stage::Runtime => by_runtime(identifier, config).await,
        }
    }
}

/// Resolves `identifier` to a display name.
///
/// Never fails: when every stage comes up empty the first non-blank line of the identifier,
/// truncated to [`MAX_NAME_LEN`] characters, is returned as [`ResolutionStatus::Found`].
pub async fn resolve(identifier: &str, config: &Config) -> Resolution {
    for stage in STAGES {
        if let Some(resolution) = stage
            .run(identifier, config)
            .await
            .and_then(Resolution::sanitized)
        {
            log::info!(
                "cgroup `{}` is called `{}` ({:?})",
                identifier,
                resolution.name,
                stage
            );
            return resolution;
        }
        log::trace!("{stage:?} stage produced no name for `{identifier}`");
    }

    let resolution = Resolution::found(identifier)
        .sanitized()
        .unwrap_or_else(|| Resolution::found(truncate(identifier)));
    log::info!(
        "cgroup `{}` is called `{}`",
        identifier,
        resolution.name
    );
    resolution
}

async fn by_kubernetes(identifier: &str, config: &Config) -> Option<Resolution> {
    if !classify::is_kubernetes(identifier) {
        return None;
    }

    let fragment = k8s::container_fragment(identifier);
    let sources = k8s::pod_sources(config);
    match k8s::container_name(&sources, fragment, config.timeout()).await {
        Some(name) => {
            log::info!("k8s container `{fragment}` is named `{name}`");
            Some(Resolution::found(name))
        }
        None => {
            let name = if fragment.is_empty() {
                identifier
            } else {
                fragment
            };
            log::warn!("cannot find the name of k8s pod with container id `{fragment}`, using `{name}`");
            Some(Resolution {
                name: name.to_owned(),
                status: ResolutionStatus::NotFoundK8s,
            })
        }
    }
}

async fn by_runtime(identifier: &str, config: &Config) -> Option<Resolution> {
    let classification = classify::classify(identifier, config.proxmox_dir());
    log::debug!(
        "cgroup `{}` classified as {:?} (fragment `{}`)",
        identifier,
        classification.kind,
        classification.fragment
    );
    let fragment = classification.fragment.as_str();

    match classification.kind {
        RuntimeKind::DockerLike | RuntimeKind::Ecs => {
            let id = InstanceID::docker(fragment, identifier).ok_log()?;
            let sources = runtime::docker_sources(config);
            let name = runtime::container_name(&sources, &id, config.timeout()).await;
            Some(container_resolution("docker", &id, name))
        }
        RuntimeKind::PodmanLibpod => {
            let id = InstanceID::podman(fragment, identifier).ok_log()?;
            let sources = runtime::podman_sources(config);
            let name = runtime::container_name(&sources, &id, config.timeout()).await;
            Some(container_resolution("podman", &id, name))
        }
        RuntimeKind::SystemdNspawn => Some(Resolution::found(machine::nspawn_name(fragment))),
        RuntimeKind::LibvirtLxc => Some(Resolution::found(machine::libvirt_lxc_name(fragment))),
        RuntimeKind::QemuMachineSlice => Some(Resolution::found(
            machine::qemu_machine_slice_name(fragment),
        )),
        RuntimeKind::QemuLibvirt => Some(Resolution::found(machine::qemu_libvirt_name(fragment))),
        RuntimeKind::ProxmoxQemu => machine::proxmox_qemu_name(&config.proxmox_dir(), fragment)
            .ok_log()
            .map(Resolution::found),
        RuntimeKind::ProxmoxLxc => machine::proxmox_lxc_name(&config.proxmox_dir(), fragment)
            .ok_log()
            .map(Resolution::found),
        RuntimeKind::LxcPayload => Some(Resolution::found(machine::lxc_payload_name(fragment))),
        RuntimeKind::Unknown => None,
    }
}

fn container_resolution(runtime: &str, id: &InstanceID, name: Option<String>) -> Resolution {
    match name {
        Some(name) => {
            log::info!("{runtime} container `{id}` is named `{name}`");
            Resolution::found(name)
        }
        None => {
            log::warn!("cannot find the name of {runtime} container `{id}`");
            Resolution {
                name: id.short().to_owned(),
                status: ResolutionStatus::NotFoundDockerLike,
            }
        }
    }
}
