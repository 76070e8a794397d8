use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::header::RETRY_AFTER;
use hyper::{Body, Client, Request, StatusCode};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{CompletionError, CompletionResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

pub(crate) fn build_https_client() -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Client::builder().build::<_, Body>(connector)
}

/// Sends `request` and returns the body of a 2xx response.
///
/// The timeout covers the whole exchange, body included. Non-success
/// statuses are mapped by [`status_error`].
pub(crate) async fn send(
    client: &HyperClient,
    request: Request<Body>,
    limit: Duration,
) -> CompletionResult<Bytes> {
    timeout(limit, exchange(client, request))
        .await
        .map_err(|_| CompletionError::Timeout { after: limit })?
}

async fn exchange(client: &HyperClient, request: Request<Body>) -> CompletionResult<Bytes> {
    let response = client
        .request(request)
        .await
        .map_err(|err| CompletionError::transport(format!("request failed: {err}")))?;

    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let bytes = to_bytes(response.into_body())
        .await
        .map_err(|err| CompletionError::transport(format!("failed to read response: {err}")))?;

    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes).into_owned();
        return Err(status_error(status, retry_after, body));
    }
    Ok(bytes)
}

pub(crate) fn status_error(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: String,
) -> CompletionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Authentication {
            status: status.as_u16(),
            body,
        },
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { retry_after },
        _ => CompletionError::Service {
            status: status.as_u16(),
            body,
        },
    }
}
