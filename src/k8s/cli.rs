use std::path::Path;
use std::time::Duration;

use crate::process::Tool;

use super::pods::PodList;
use super::{Error, Result};

/// Lists all pods in all namespaces with `kubectl`.
///
/// A failing `kubectl` usually means the kubeconfig is missing or the control plane cannot be
/// reached; both surface as [`Error::Process`].
pub(super) async fn list_pods(
    program: &str,
    kube_config: &Path,
    timeout: Duration,
) -> Result<PodList> {
    let tool = Tool::locate(program, timeout)?;
    let output = tool
        .output([
            format!("--kubeconfig={}", kube_config.display()),
            "get".to_owned(),
            "pods".to_owned(),
            "--all-namespaces".to_owned(),
            "--output=json".to_owned(),
        ])
        .await?;

    serde_json::from_str(&output).map_err(|source| Error::Decode {
        origin: tool.path().display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::write_script;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_passes_kubeconfig() {
        let dir = tempfile::tempdir().unwrap();
        let kube_config = dir.path().join("admin.conf");
        let script = write_script(
            dir.path(),
            "kubectl",
            &format!(
                r#"[ "$1" = "--kubeconfig={}" ] && echo '{{"items":[]}}'"#,
                kube_config.display()
            ),
        );
        let pods = list_pods(script.to_str().unwrap(), &kube_config, TIMEOUT)
            .await
            .unwrap();
        assert!(pods.items.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_control_plane() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "kubectl",
            "echo 'The connection to the server localhost:8080 was refused' >&2; exit 1",
        );
        let err = list_pods(script.to_str().unwrap(), Path::new("/nope"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Process(_)));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "kubectl", "echo not-json");
        let err = list_pods(script.to_str().unwrap(), Path::new("/nope"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
