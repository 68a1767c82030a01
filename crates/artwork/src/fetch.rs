use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use tracing::instrument;

/// Downloads a remote image. Any non-2xx status is an error.
#[instrument(skip(client))]
pub(crate) async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        exn::bail!(ErrorKind::Status(status.as_u16()));
    }
    let body = response.bytes().await.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
    tracing::debug!(bytes = body.len(), "Fetched remote image");
    Ok(body.to_vec())
}
