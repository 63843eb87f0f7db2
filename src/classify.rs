//! Structural classification of cgroup identifiers.
//!
//! Identifiers are tested against a fixed, ordered rule table and the first matching rule
//! decides the [`RuntimeKind`]. Kubernetes identifiers are recognized separately through
//! [`is_kubernetes`] because they are handled before the table is consulted.
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Runtime family an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeKind {
    DockerLike,
    Ecs,
    PodmanLibpod,
    SystemdNspawn,
    LibvirtLxc,
    QemuMachineSlice,
    QemuLibvirt,
    ProxmoxQemu,
    ProxmoxLxc,
    LxcPayload,
    Unknown,
}

/// Result of classifying an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: RuntimeKind,
    /// Rule specific capture: a container id, a machine name, a Proxmox VMID, ...
    pub fragment: String,
}

impl Classification {
    fn unknown() -> Self {
        Self {
            kind: RuntimeKind::Unknown,
            fragment: String::new(),
        }
    }
}

/// How a rule extracts its fragment once its matcher fired.
enum Extract {
    /// First group of a separate regex, or the whole identifier when it does not match.
    Capture(Regex),
    /// First group of the matcher itself.
    Group,
    /// Everything after the matcher's match.
    Rest,
    /// The whole identifier.
    Whole,
}

/// Additional condition evaluated after the matcher.
enum Guard {
    Always,
    /// The Proxmox guest configuration directory must exist.
    ProxmoxHost,
}

struct Rule {
    kind: RuntimeKind,
    matcher: Regex,
    extract: Extract,
    guard: Guard,
}

impl Rule {
    fn new(kind: RuntimeKind, matcher: &str, extract: Extract) -> Self {
        Self {
            kind,
            matcher: compile(matcher),
            extract,
            guard: Guard::Always,
        }
    }

    fn guarded(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    fn apply(&self, identifier: &str, proxmox_dir: &Path) -> Option<Classification> {
        let captures = self.matcher.captures(identifier)?;
        if let Guard::ProxmoxHost = self.guard {
            if !proxmox_dir.is_dir() {
                log::debug!(
                    "`{}` looks like {:?}, but `{}` is not a directory",
                    identifier,
                    self.kind,
                    proxmox_dir.display()
                );
                return None;
            }
        }

        let fragment = match &self.extract {
            Extract::Capture(re) => re
                .captures(identifier)
                .and_then(|c| c.get(1))
                .map_or(identifier, |m| m.as_str()),
            Extract::Group => captures.get(1).map_or("", |m| m.as_str()),
            Extract::Rest => captures.get(0).map_or("", |m| &identifier[m.end()..]),
            Extract::Whole => identifier,
        };

        Some(Classification {
            kind: self.kind,
            fragment: fragment.to_owned(),
        })
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("classification patterns are valid")
}

static KUBEPODS: LazyLock<Regex> = LazyLock::new(|| compile("kubepods"));

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use RuntimeKind::*;
    vec![
        Rule::new(
            DockerLike,
            r"docker[-_/.][a-fA-F0-9]+",
            Extract::Capture(compile(r"^.*docker[-_/]([a-fA-F0-9]+)")),
        ),
        Rule::new(
            Ecs,
            r"ecs[-_/.][a-fA-F0-9]+",
            Extract::Capture(compile(r"^.*ecs[-_/].*[-_/]([a-fA-F0-9]+)")),
        ),
        Rule::new(
            PodmanLibpod,
            r"libpod-[a-fA-F0-9]+",
            Extract::Capture(compile(r"^.*libpod-([a-fA-F0-9]+)")),
        ),
        Rule::new(
            SystemdNspawn,
            r"machine\.slice[_/](.*)\.service",
            Extract::Group,
        ),
        Rule::new(LibvirtLxc, r"machine\.slice_machine.*-lxc", Extract::Rest),
        Rule::new(
            QemuMachineSlice,
            r"machine\.slice_machine.*-qemu",
            Extract::Rest,
        ),
        Rule::new(QemuLibvirt, r"machine_.*\.libvirt-qemu", Extract::Whole),
        Rule::new(ProxmoxQemu, r"qemu\.slice_([0-9]+)\.scope", Extract::Group)
            .guarded(Guard::ProxmoxHost),
        Rule::new(ProxmoxLxc, r"lxc_([0-9]+)", Extract::Group).guarded(Guard::ProxmoxHost),
        Rule::new(LxcPayload, r"lxc\.payload\.(.*)", Extract::Group),
    ]
});

/// Returns true if `identifier` belongs to a Kubernetes pod.
pub fn is_kubernetes(identifier: &str) -> bool {
    KUBEPODS.is_match(identifier)
}

/// Classifies `identifier` with the first matching rule.
///
/// `proxmox_dir` is the Proxmox guest configuration directory; the Proxmox rules only apply
/// when it exists.
pub fn classify(identifier: &str, proxmox_dir: impl AsRef<Path>) -> Classification {
    let proxmox_dir = proxmox_dir.as_ref();
    RULES
        .iter()
        .find_map(|rule| rule.apply(identifier, proxmox_dir))
        .unwrap_or_else(Classification::unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn no_proxmox() -> std::path::PathBuf {
        std::path::PathBuf::from("/definitely/does/not/exist")
    }

    fn classify_plain(identifier: &str) -> Classification {
        classify(identifier, no_proxmox())
    }

    #[test]
    fn test_kubernetes_detection() {
        assert!(is_kubernetes(
            "kubepods_kubepods-burstable.slice_kubepods-burstable-pod1234.slice"
        ));
        assert!(!is_kubernetes("system.slice_docker.service"));
    }

    #[test]
    fn test_docker_scope() {
        let c = classify_plain(&format!("system.slice_docker-{FULL}.scope"));
        assert_eq!(c.kind, RuntimeKind::DockerLike);
        assert_eq!(c.fragment, FULL);
    }

    #[test]
    fn test_docker_cgroup_v1_path() {
        let c = classify_plain(&format!("docker/{FULL}"));
        assert_eq!(c.kind, RuntimeKind::DockerLike);
        assert_eq!(c.fragment, FULL);
    }

    #[test]
    fn test_docker_with_dot_delimiter_keeps_whole_identifier() {
        let id = "docker.abc123";
        let c = classify_plain(id);
        assert_eq!(c.kind, RuntimeKind::DockerLike);
        assert_eq!(c.fragment, id);
    }

    #[test]
    fn test_docker_service_is_not_a_container() {
        assert_eq!(
            classify_plain("system.slice_docker.service").kind,
            RuntimeKind::Unknown
        );
    }

    #[test]
    fn test_ecs_takes_last_hex_segment() {
        let c = classify_plain(&format!("ecs/5a0d5ceddf6c44c1928d367a815d890f/{FULL}"));
        assert_eq!(c.kind, RuntimeKind::Ecs);
        assert_eq!(c.fragment, FULL);
    }

    #[test]
    fn test_libpod() {
        let c = classify_plain(&format!("machine.slice_libpod-{FULL}.scope"));
        assert_eq!(c.kind, RuntimeKind::PodmanLibpod);
        assert_eq!(c.fragment, FULL);
    }

    #[test]
    fn test_docker_has_priority_over_libpod() {
        let c = classify_plain(&format!("docker-{FULL}_libpod-{FULL}"));
        assert_eq!(c.kind, RuntimeKind::DockerLike);
    }

    #[test]
    fn test_systemd_nspawn() {
        let c = classify_plain("machine.slice_systemd-nspawn@debian.service");
        assert_eq!(c.kind, RuntimeKind::SystemdNspawn);
        assert_eq!(c.fragment, "systemd-nspawn@debian");
    }

    #[test]
    fn test_libvirt_lxc() {
        let c = classify_plain("machine.slice_machine-lxc/x2d969/x2dhubud0xians01.scope");
        assert_eq!(c.kind, RuntimeKind::LibvirtLxc);
        assert_eq!(c.fragment, "/x2d969/x2dhubud0xians01.scope");
    }

    #[test]
    fn test_qemu_machine_slice() {
        let c = classify_plain("machine.slice_machine-qemu_x2d1_x2dopnsense.scope");
        assert_eq!(c.kind, RuntimeKind::QemuMachineSlice);
        assert_eq!(c.fragment, "_x2d1_x2dopnsense.scope");
    }

    #[test]
    fn test_qemu_libvirt() {
        let c = classify_plain("machine_myvm.libvirt-qemu");
        assert_eq!(c.kind, RuntimeKind::QemuLibvirt);
        assert_eq!(c.fragment, "machine_myvm.libvirt-qemu");
    }

    #[test]
    fn test_proxmox_requires_config_dir() {
        assert_eq!(
            classify_plain("qemu.slice_100.scope").kind,
            RuntimeKind::Unknown
        );
        assert_eq!(classify_plain("lxc_101").kind, RuntimeKind::Unknown);

        let dir = tempfile::tempdir().unwrap();
        let c = classify("qemu.slice_100.scope", dir.path());
        assert_eq!(c.kind, RuntimeKind::ProxmoxQemu);
        assert_eq!(c.fragment, "100");
        let c = classify("lxc_101", dir.path());
        assert_eq!(c.kind, RuntimeKind::ProxmoxLxc);
        assert_eq!(c.fragment, "101");
    }

    #[test]
    fn test_lxc_payload() {
        let c = classify_plain("lxc.payload.web01");
        assert_eq!(c.kind, RuntimeKind::LxcPayload);
        assert_eq!(c.fragment, "web01");
    }

    #[test]
    fn test_unknown() {
        let c = classify_plain("custom.cgroup.path");
        assert_eq!(c, Classification::unknown());
    }
}
