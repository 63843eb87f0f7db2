//! End to end tests for the `cgroup-name` binary.
//!
//! Every external collaborator lives in a scratch directory: sockets and kubeconfig point at
//! missing paths and the docker, podman and kubectl programs are small shell scripts.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const FULL_ID: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

const POD_LIST: &str = r#"{"items":[{"metadata":{"namespace":"default","name":"myapp","uid":"abcd"},"status":{"containerStatuses":[{"name":"nginx","containerID":"containerd://containerXYZ"}]}}]}"#;

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn script(&self, name: &str, body: &str) {
        let bin = self.path("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let path = bin.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn override_entry(&self, dir: &str, content: &str) {
        let dir = self.path(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cgroups-names.conf"), content).unwrap();
    }

    fn bin(&self, name: &str) -> String {
        self.path("bin").join(name).display().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("cgroup-name");
        cmd.env_clear()
            .env("PATH", self.path("bin"))
            .env("RUST_LOG", "debug")
            .env("CGROUP_NAME_USER_CONFIG_DIR", self.path("user"))
            .env("CGROUP_NAME_STOCK_CONFIG_DIR", self.path("stock"))
            .env("DOCKER_HOST", self.path("docker.sock"))
            .env("PODMAN_HOST", self.path("podman.sock"))
            .env("KUBE_CONFIG", self.path("admin.conf"))
            .env("KUBERNETES_SERVICE_ACCOUNT_DIR", self.path("serviceaccount"))
            .env("CGROUP_NAME_HOST_PREFIX", self.dir.path())
            .env("CGROUP_NAME_TIMEOUT", "5")
            .env("CGROUP_NAME_DOCKER_BIN", self.bin("docker"))
            .env("CGROUP_NAME_PODMAN_BIN", self.bin("podman"))
            .env("CGROUP_NAME_KUBECTL_BIN", self.bin("kubectl"));
        cmd
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }
}

#[test]
fn missing_identifier_is_fatal() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("cgroup-name : FATAL :"));
}

#[test]
fn unknown_identifier_is_echoed() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("custom.cgroup.path")
        .assert()
        .success()
        .stdout("custom.cgroup.path\n");
}

#[test]
fn long_identifier_is_truncated() {
    let sandbox = Sandbox::new();
    let identifier = "a".repeat(150);
    sandbox
        .cmd()
        .arg(&identifier)
        .assert()
        .success()
        .stdout(format!("{}\n", &identifier[..100]));
}

#[test]
fn libvirt_qemu_guest() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("machine_myvm.libvirt-qemu")
        .assert()
        .success()
        .stdout("qemu_myvm\n");
}

#[test]
fn user_override_wins() {
    let sandbox = Sandbox::new();
    sandbox.override_entry("stock", "foo stock-name\n");
    sandbox.override_entry("user", "# comment\nfoo user-name\n");
    sandbox
        .cmd()
        .arg("foo")
        .assert()
        .success()
        .stdout("user-name\n");
}

#[test]
fn docker_container_named_by_cli() {
    let sandbox = Sandbox::new();
    sandbox.script("docker", "echo webapp");
    sandbox
        .cmd()
        .arg(format!("system.slice_docker-{FULL_ID}.scope"))
        .assert()
        .success()
        .stdout("webapp\n")
        .stderr(predicate::str::contains("Running command:"));
}

#[test]
fn docker_container_unknown() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg(format!("system.slice_docker-{FULL_ID}.scope"))
        .assert()
        .code(2)
        .stdout(format!("{}\n", &FULL_ID[..12]))
        .stderr(predicate::str::contains("WARNING"));
}

#[test]
fn invalid_docker_id_falls_back_to_identifier() {
    let sandbox = Sandbox::new();
    sandbox.script("docker", "echo should-not-run");
    sandbox
        .cmd()
        .arg("system.slice_docker-abc123.scope")
        .assert()
        .success()
        .stdout("system.slice_docker-abc123.scope\n");
}

#[test]
fn podman_container_named_by_cli() {
    let sandbox = Sandbox::new();
    sandbox.script("podman", "echo pod-web");
    sandbox
        .cmd()
        .arg(format!("machine.slice_libpod-{FULL_ID}.scope"))
        .assert()
        .success()
        .stdout("pod-web\n");
}

#[test]
fn kubernetes_container_named_by_kubectl() {
    let sandbox = Sandbox::new();
    sandbox.script("kubectl", &format!("echo '{POD_LIST}'"));
    sandbox
        .cmd()
        .arg("kubepods-burstable-pod1234_containerXYZ")
        .assert()
        .success()
        .stdout("k8s_default_myapp_abcd_nginx\n");
}

#[test]
fn kubernetes_container_unknown() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("kubepods-burstable-pod1234_containerXYZ")
        .assert()
        .code(3)
        .stdout("containerXYZ\n");
}

#[test]
fn proxmox_guest_named_from_config() {
    let sandbox = Sandbox::new();
    let lxc = sandbox.root().join("etc/pve/lxc");
    std::fs::create_dir_all(&lxc).unwrap();
    std::fs::write(lxc.join("101.conf"), "arch: amd64\nhostname: pihole\n").unwrap();
    sandbox
        .cmd()
        .arg("lxc_101")
        .assert()
        .success()
        .stdout("pihole\n");
}

#[test]
fn help_exits_cleanly() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cgroup"));
}

#[test]
fn empty_identifier_is_fatal() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn extra_arguments_are_ignored() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["custom.cgroup.path", "extra", "--bogus"])
        .assert()
        .success()
        .stdout("custom.cgroup.path\n")
        .stderr(predicate::str::contains("WARNING"));
}

#[test]
fn hyphenated_identifier_is_resolved() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("-x.slice")
        .assert()
        .success()
        .stdout("-x.slice\n");
}

#[test]
fn invalid_timeout_keeps_default() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .env("CGROUP_NAME_TIMEOUT", "abc")
        .arg("custom.cgroup.path")
        .assert()
        .success()
        .stdout("custom.cgroup.path\n")
        .stderr(predicate::str::contains("invalid timeout `abc`"));
}

#[test]
fn empty_path_setting_keeps_default() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .env("CGROUP_NAME_HOST_PREFIX", "")
        .arg("custom.cgroup.path")
        .assert()
        .success()
        .stdout("custom.cgroup.path\n");
}

#[test]
fn option_without_value_still_resolves() {
    let sandbox = Sandbox::new();
    sandbox.override_entry("user", "foo bar\n");
    sandbox
        .cmd()
        .args(["foo", "--timeout"])
        .assert()
        .success()
        .stdout("bar\n")
        .stderr(predicate::str::contains("ignoring invalid command line"));
}

#[test]
fn multi_line_identifier_prints_one_line() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("custom.cgroup.path\nsecond")
        .assert()
        .success()
        .stdout("custom.cgroup.path\n");
}
