use crate::error::LoadError;
use crate::provision::progress::StepProgress;
use futures_util::StreamExt;

/// Upper bound on the buffer reserved from a `Content-Length` header
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// GET `url` into memory, reporting received bytes on `progress`
pub async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    progress: &StepProgress,
) -> Result<Vec<u8>, LoadError> {
    tracing::debug!("GET {url}");

    let response = client.get(url).send().await.map_err(|source| LoadError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length();
    let reserve = total.map_or(0, |len| len.min(MAX_PREALLOC));
    let mut body = Vec::with_capacity(usize::try_from(reserve).unwrap_or(0));
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| LoadError::Http {
            url: url.to_string(),
            source,
        })?;
        body.extend_from_slice(&chunk);
        progress.bytes(body.len() as u64, total);
    }

    tracing::debug!("Fetched {} bytes from {url}", body.len());
    Ok(body)
}
