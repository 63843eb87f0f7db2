use std::fmt;

/// Length of an abbreviated container id as printed by `docker ps`.
pub const SHORT_ID_LEN: usize = 12;
/// Length of a full container id.
pub const FULL_ID_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a docker id cannot be extracted from cgroup `{cgroup}` (got `{id}`)")]
    InvalidDockerID { cgroup: String, id: String },
    #[error("a podman id cannot be extracted from cgroup `{cgroup}` (got `{id}`)")]
    InvalidPodmanID { cgroup: String, id: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A validated container runtime instance id.
///
/// # Examples
///
/// ```
/// # use cgroup_name::instance::InstanceID;
/// let id = InstanceID::docker("abc123abc123", "docker-abc123abc123.scope").unwrap();
/// assert_eq!(id.short(), "abc123abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceID(String);

impl InstanceID {
    /// Accepts an abbreviated (12) or full (64) hex id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDockerID`] for any other input. `cgroup` is only used for the
    /// error message.
    pub fn docker(src: impl AsRef<str>, cgroup: &str) -> Result<Self> {
        let src = src.as_ref();
        if is_non_empty_hex_string(src) && matches!(src.len(), SHORT_ID_LEN | FULL_ID_LEN) {
            return Ok(Self(src.to_owned()));
        }
        Err(Error::InvalidDockerID {
            cgroup: cgroup.to_owned(),
            id: src.to_owned(),
        })
    }

    /// Accepts a full (64) hex id only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPodmanID`] for any other input.
    pub fn podman(src: impl AsRef<str>, cgroup: &str) -> Result<Self> {
        let src = src.as_ref();
        if is_non_empty_hex_string(src) && src.len() == FULL_ID_LEN {
            return Ok(Self(src.to_owned()));
        }
        Err(Error::InvalidPodmanID {
            cgroup: cgroup.to_owned(),
            id: src.to_owned(),
        })
    }

    /// The abbreviated form, used as the name when a lookup finds nothing.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_ID_LEN]
    }
}

impl AsRef<str> for InstanceID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns true if the input string is not empty and contains only ASCII hex digits.
pub fn is_non_empty_hex_string(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_is_hex_string_valid_hex() {
        assert!(is_non_empty_hex_string("deadbeef12345678"));
        assert!(is_non_empty_hex_string("ABCDEFabcdef0123456789"));
    }

    #[test]
    fn test_is_hex_string_invalid_hex() {
        assert!(!is_non_empty_hex_string("deadbeefXYZ"));
        assert!(!is_non_empty_hex_string(""));
    }

    #[test]
    fn test_docker_accepts_short_and_full() {
        assert!(InstanceID::docker(&FULL[..12], "cg").is_ok());
        assert!(InstanceID::docker(FULL, "cg").is_ok());
    }

    #[test]
    fn test_docker_rejects_other_lengths() {
        let err = InstanceID::docker(&FULL[..13], "cg").unwrap_err();
        assert!(matches!(err, Error::InvalidDockerID { .. }));
        assert!(InstanceID::docker("c", "cg").is_err());
        assert!(InstanceID::docker("system.slice_docker.service", "cg").is_err());
    }

    #[test]
    fn test_podman_requires_full_id() {
        assert!(InstanceID::podman(FULL, "cg").is_ok());
        let err = InstanceID::podman(&FULL[..12], "cg").unwrap_err();
        assert!(matches!(err, Error::InvalidPodmanID { .. }));
    }

    #[test]
    fn test_short() {
        let id = InstanceID::docker(FULL, "cg").unwrap();
        assert_eq!(id.short(), "0123456789ab");
        assert_eq!(id.to_string(), FULL);
    }
}
