use std::time::Duration;

use crate::instance::InstanceID;
use crate::process::Tool;

use super::{Result, first_name};

/// Lists containers filtered by `id` with `<program> ps` and returns the first name printed.
pub(super) async fn container_name(
    program: &str,
    id: &InstanceID,
    timeout: Duration,
) -> Result<Option<String>> {
    let tool = Tool::locate(program, timeout)?;
    let output = tool
        .output([
            "ps".to_owned(),
            format!("--filter=id={id}"),
            "--format={{.Names}}".to_owned(),
        ])
        .await?;

    Ok(first_name(&output))
}
