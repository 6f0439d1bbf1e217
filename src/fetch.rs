//! Manifest and bundle acquisition over HTTPS.
//!
//! The manifest is a small JSON document naming the latest bundle. The
//! bundle itself is served through an asset endpoint that answers with a
//! redirect to the real download location, so the bundle client disables
//! automatic redirects and follows exactly one by hand — any further
//! redirection is a failure. Non-success responses surface the status code
//! and body text verbatim. No retries: a transient failure means a re-run.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Client, RequestBuilder, Response};
use tokio::io::AsyncWriteExt;

use crate::models::ArchiveInfo;

const USER_AGENT: &str = concat!("bangumi-archive/", env!("CARGO_PKG_VERSION"));

/// Fetch and deserialize the manifest document. The manifest is tiny, but a
/// stalled server must still fail the run rather than hang it.
pub async fn fetch_manifest(url: &str, token: Option<&str>, timeout: Duration) -> Result<ArchiveInfo> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    let resp = with_auth(client.get(url), token)
        .send()
        .await
        .context("Failed to download manifest")?;

    if !resp.status().is_success() {
        return Err(status_error("manifest request failed", resp).await);
    }

    let body = resp.text().await.context("Failed to read manifest body")?;
    serde_json::from_str(&body).context("Failed to deserialize manifest")
}

/// Download the bundle asset to `dest`, streaming to disk. Follows one
/// redirect; anything else non-success is fatal.
pub async fn download_bundle(
    url: &str,
    token: Option<&str>,
    timeout: Duration,
    dest: &Path,
) -> Result<()> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()?;

    let resp = bundle_request(&client, url, token)
        .send()
        .await
        .context("Failed to download bundle")?;

    let resp = if resp.status().is_redirection() {
        let target = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .context("bundle redirect without a Location header")?;
        let resp = bundle_request(&client, &target, token)
            .send()
            .await
            .context("Failed to download bundle from redirect target")?;
        if !resp.status().is_success() {
            return Err(status_error("bundle download failed", resp).await);
        }
        resp
    } else if resp.status().is_success() {
        resp
    } else {
        return Err(status_error("bundle download failed", resp).await);
    };

    write_body(resp, dest).await
}

fn with_auth(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => req.bearer_auth(token),
        None => req,
    }
}

fn bundle_request(client: &Client, url: &str, token: Option<&str>) -> RequestBuilder {
    with_auth(client.get(url).header(ACCEPT, "application/octet-stream"), token)
}

async fn status_error(what: &str, resp: Response) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    anyhow::anyhow!("{}: {}: {}", what, status, body)
}

async fn write_body(mut resp: Response, dest: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    while let Some(bytes) = resp.chunk().await.context("bundle transfer interrupted")? {
        file.write_all(&bytes).await?;
    }
    file.flush().await?;
    Ok(())
}
