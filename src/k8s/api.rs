use std::path::Path;
use std::time::Duration;

use super::pods::PodList;
use super::{Error, Result};

const TOKEN_FILE: &str = "token";
const CA_FILE: &str = "ca.crt";
const PODS_PATH: &str = "/api/v1/pods";

/// `https://<host>:<port>` of the in-cluster API server.
pub(super) fn base_url(host: &str, port: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("https://[{host}]:{port}")
    } else {
        format!("https://{host}:{port}")
    }
}

/// Lists all pods in all namespaces through the API server at `base_url`, authenticated with
/// the pod's service account.
pub(super) async fn list_pods(
    base_url: &str,
    service_account_dir: &Path,
    timeout: Duration,
) -> Result<PodList> {
    let token_path = service_account_dir.join(TOKEN_FILE);
    let token = tokio::fs::read_to_string(&token_path)
        .await
        .map_err(|source| Error::ReadServiceAccount {
            path: token_path,
            source,
        })?;

    let client = client(service_account_dir, timeout).await?;
    let url = format!("{}{PODS_PATH}", base_url.trim_end_matches('/'));
    log::info!("Requesting pods from {url}");

    let body = client
        .get(&url)
        .bearer_auth(token.trim())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|source| Error::Api {
            url: url.clone(),
            source,
        })?
        .bytes()
        .await
        .map_err(|source| Error::Api {
            url: url.clone(),
            source,
        })?;

    serde_json::from_slice(&body).map_err(|source| Error::Decode {
        origin: url,
        source,
    })
}

/// Trusts the cluster CA when it is mounted; otherwise certificate verification is skipped.
async fn client(service_account_dir: &Path, timeout: Duration) -> Result<reqwest::Client> {
    let builder = reqwest::Client::builder().timeout(timeout);
    let ca_path = service_account_dir.join(CA_FILE);

    let builder = match tokio::fs::read(&ca_path).await {
        Ok(pem) => {
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|source| {
                Error::InvalidCertificate {
                    path: ca_path.clone(),
                    source,
                }
            })?;
            builder.add_root_certificate(cert)
        }
        Err(err) => {
            log::warn!(
                "cannot read cluster CA `{}` ({err}), the API server certificate will not be verified",
                ca_path.display()
            );
            builder.danger_accept_invalid_certs(true)
        }
    };

    builder.build().map_err(Error::Client)
}
