/// Entry point for `cgroup-name`.
///
/// # Examples
///
/// ```bash
/// cgroup-name system.slice_docker-4f3c9e0d5a2b.scope
/// ```
#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    cgroup_name::logging::init();
    cgroup_name::run().await
}
