//! Names for systemd machines, libvirt guests, LXC and Proxmox guests.
//!
//! Apart from Proxmox, where the guest name lives in a per guest configuration file, every
//! name here is derived from the identifier alone.
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::fsutil::{self, FileOpenError, ReadLineError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("proxmox config file missing or not readable by this user: {source}")]
    ProxmoxConfig {
        #[source]
        source: FileOpenError,
    },
    #[error(transparent)]
    ReadLine(#[from] ReadLineError),
    #[error("no `{key}` entry in proxmox config file `{path}`")]
    MissingKey { key: &'static str, path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

static FIRST_ESCAPED_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[/_]x2d[0-9]*").expect("escaped dash pattern is valid")
});
static ESCAPED_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/_]x2d").expect("escaped dash pattern is valid"));

/// `machine.slice_<name>.service` → `<name>`, with `/` turned into `_`.
pub fn nspawn_name(fragment: &str) -> String {
    fragment.replace('/', "_")
}

/// Decodes the tail of a libvirt machine scope.
///
/// systemd escapes `-` as `\x2d` (`x2d` once path separators are flattened); the first escape
/// is followed by the libvirt domain number, which is dropped with it.
/// `_x2d1_x2dopnsense.scope` → `opnsense`.
fn decode_machine_scope(fragment: &str) -> String {
    let decoded = FIRST_ESCAPED_DASH.replace(fragment, "");
    let decoded = ESCAPED_DASH.replace_all(&decoded, "");
    decoded.replace(".scope", "")
}

/// `machine.slice_machine-qemu_x2d1_x2dopnsense.scope` → `qemu_opnsense`.
pub fn qemu_machine_slice_name(fragment: &str) -> String {
    format!("qemu_{}", decode_machine_scope(fragment))
}

/// `machine.slice_machine-lxc/x2d969/x2dhubud0xians01.scope` → `lxc/hubud0xians01`.
pub fn libvirt_lxc_name(fragment: &str) -> String {
    format!("lxc/{}", decode_machine_scope(fragment))
}

/// `machine_<domain>.libvirt-qemu` → `qemu_<domain>`, the first `-` of the domain becoming `_`.
pub fn qemu_libvirt_name(identifier: &str) -> String {
    let domain = identifier.strip_prefix("machine_").unwrap_or(identifier);
    let domain = domain.strip_suffix(".libvirt-qemu").unwrap_or(domain);
    format!("qemu_{}", domain.replacen('-', "_", 1))
}

/// `lxc.payload.<name>` → `<name>`.
pub fn lxc_payload_name(fragment: &str) -> String {
    fragment.to_owned()
}

/// `qemu.slice_<vmid>.scope` → `qemu_<name>` from `<proxmox_dir>/qemu-server/<vmid>.conf`.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or has no `name:` entry.
pub fn proxmox_qemu_name(proxmox_dir: &Path, vmid: &str) -> Result<String> {
    let path = proxmox_dir.join(format!("qemu-server/{vmid}.conf"));
    read_config_value(&path, "name").map(|name| format!("qemu_{name}"))
}

/// `lxc_<vmid>` → the `hostname:` of `<proxmox_dir>/lxc/<vmid>.conf`.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or has no `hostname:` entry.
pub fn proxmox_lxc_name(proxmox_dir: &Path, vmid: &str) -> Result<String> {
    let path = proxmox_dir.join(format!("lxc/{vmid}.conf"));
    read_config_value(&path, "hostname")
}

/// Returns the value of the first top level `<key>: <value>` line.
fn read_config_value(path: &Path, key: &'static str) -> Result<String> {
    let reader =
        fsutil::open_file_reader(path).map_err(|source| Error::ProxmoxConfig { source })?;
    let value = fsutil::find_line(reader, path, |line| {
        let (k, v) = line.split_once(':')?;
        (k == key)
            .then(|| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    })?;

    value.ok_or_else(|| Error::MissingKey {
        key,
        path: path.to_path_buf(),
    })
}
