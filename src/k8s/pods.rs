//! The subset of the Kubernetes `PodList` needed to name a container.

#[derive(Debug, Default, serde::Deserialize)]
pub struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: PodStatus,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uid: String,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
    #[serde(default)]
    pub init_container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ContainerStatus {
    #[serde(default)]
    pub name: String,
    /// `<runtime>://<id>`, e.g. `containerd://4f3c...`. Empty while the container is pending.
    #[serde(default, rename = "containerID")]
    pub container_id: String,
}

impl PodList {
    /// Names the container whose id contains `fragment` as
    /// `k8s_<namespace>_<pod>_<pod uid>_<container>`.
    pub fn container_name(&self, fragment: &str) -> Option<String> {
        if fragment.is_empty() {
            return None;
        }

        self.items.iter().find_map(|pod| {
            pod.status
                .container_statuses
                .iter()
                .chain(&pod.status.init_container_statuses)
                .find(|status| status.container_id.contains(fragment))
                .map(|status| {
                    format!(
                        "k8s_{}_{}_{}_{}",
                        pod.metadata.namespace, pod.metadata.name, pod.metadata.uid, status.name
                    )
                })
        })
    }
}
