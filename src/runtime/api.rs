use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper_util::rt::TokioIo;

use crate::instance::InstanceID;

use super::{Endpoint, Error, Result};

/// The subset of `GET /containers/{id}/json` needed to name a container.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerInspect {
    name: Option<String>,
    config: Option<ContainerConfig>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerConfig {
    hostname: Option<String>,
}

impl ContainerInspect {
    /// The container name without its leading `/`, or the hostname if there is no name.
    fn into_name(self) -> Option<String> {
        let name = self.name.filter(|name| !name.is_empty());
        let hostname = self
            .config
            .and_then(|config| config.hostname)
            .filter(|hostname| !hostname.is_empty());

        name.or(hostname)
            .map(|name| name.strip_prefix('/').unwrap_or(&name).to_owned())
            .filter(|name| !name.is_empty())
    }
}

/// Inspects container `id` through the runtime API at `endpoint`.
///
/// The whole exchange, connecting included, is bounded by `timeout`.
pub(crate) async fn container_name(
    endpoint: &Endpoint,
    id: &InstanceID,
    timeout: Duration,
) -> Result<Option<String>> {
    let path = format!("/containers/{id}/json");
    log::info!("Requesting {endpoint}{path}");

    let body = tokio::time::timeout(timeout, get(endpoint, &path))
        .await
        .map_err(|_| Error::Timeout {
            endpoint: endpoint.clone(),
            timeout,
        })??;

    let inspect: ContainerInspect =
        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            endpoint: endpoint.clone(),
            source,
        })?;

    Ok(inspect.into_name())
}

async fn get(endpoint: &Endpoint, path: &str) -> Result<Bytes> {
    match endpoint {
        Endpoint::Unix(socket) => {
            if !socket.exists() {
                return Err(Error::MissingSocket {
                    path: socket.clone(),
                });
            }
            let stream = tokio::net::UnixStream::connect(socket)
                .await
                .map_err(|source| Error::Connect {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            send_get(TokioIo::new(stream), endpoint, "localhost", path).await
        }
        Endpoint::Tcp(authority) => {
            let stream = tokio::net::TcpStream::connect(authority.as_str())
                .await
                .map_err(|source| Error::Connect {
                    endpoint: endpoint.clone(),
                    source,
                })?;
            send_get(TokioIo::new(stream), endpoint, authority, path).await
        }
    }
}

/// Issues a single HTTP/1 `GET` over an established connection and collects the body.
async fn send_get<T>(io: T, endpoint: &Endpoint, host: &str, path: &str) -> Result<Bytes>
where
    T: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let http_err = |source| Error::Http {
        endpoint: endpoint.clone(),
        source,
    };

    let (mut sender, connection) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(http_err)?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::debug!("API connection closed with error: {err}");
        }
    });

    let request = hyper::Request::get(path)
        .header(hyper::header::HOST, host)
        .header(hyper::header::ACCEPT, "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|source| Error::Request {
            endpoint: endpoint.clone(),
            source,
        })?;

    let response = sender.send_request(request).await.map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            endpoint: endpoint.clone(),
            path: path.to_owned(),
            status,
        });
    }

    let body = response.into_body().collect().await.map_err(http_err)?;
    Ok(body.to_bytes())
}
