//! Remote fetching with a fixed User-Agent, a whole-request timeout and a streaming
//! size cutoff.

use intake_core::{IngestError, IngestResult, UrlValidationSettings};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response};

/// A fully received response body.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    /// Content-Type as declared by the server; informational only
    pub declared_content_type: Option<String>,
}

/// What a HEAD request says about a remote resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &UrlValidationSettings) -> IngestResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| {
                IngestError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    /// GET `url`, aborting with `SizeExceeded` as soon as more than `ceiling_bytes`
    /// have been announced or received.
    #[tracing::instrument(skip(self), fields(operation = "fetch"))]
    pub async fn fetch(&self, url: &str, ceiling_bytes: u64) -> IngestResult<FetchedBody> {
        let start = std::time::Instant::now();

        let mut response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!(error = %e, url = %url, "Failed to download from URL");
            IngestError::download_failed(url, describe(&e))
        })?;
        ensure_success(url, &response)?;

        if let Some(announced) = header_content_length(&response) {
            if announced > ceiling_bytes {
                tracing::debug!(
                    url = %url,
                    content_length = announced,
                    ceiling_bytes,
                    "Announced body exceeds ceiling"
                );
                return Err(IngestError::size_exceeded(ceiling_bytes));
            }
        }

        let declared_content_type = header_string(&response, CONTENT_TYPE);
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| IngestError::download_failed(url, describe(&e)))?
        {
            if (bytes.len() + chunk.len()) as u64 > ceiling_bytes {
                tracing::debug!(
                    url = %url,
                    received_bytes = bytes.len() + chunk.len(),
                    ceiling_bytes,
                    "Download aborted at size ceiling"
                );
                return Err(IngestError::size_exceeded(ceiling_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::info!(
            url = %url,
            size_bytes = bytes.len(),
            content_type = ?declared_content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Download complete"
        );

        Ok(FetchedBody {
            bytes,
            declared_content_type,
        })
    }

    /// HEAD `url` and report its declared type and length.
    #[tracing::instrument(skip(self), fields(operation = "probe"))]
    pub async fn probe(&self, url: &str) -> IngestResult<ProbeResult> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| IngestError::download_failed(url, describe(&e)))?;
        ensure_success(url, &response)?;

        Ok(ProbeResult {
            content_type: header_string(&response, CONTENT_TYPE),
            content_length: header_content_length(&response),
        })
    }
}

fn ensure_success(url: &str, response: &Response) -> IngestResult<()> {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = %status, "URL returned non-success status");
        return Err(IngestError::download_failed(
            url,
            format!("HTTP status {}", status),
        ));
    }
    Ok(())
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

fn header_string(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Read from the header, since reqwest reports no length for HEAD bodies.
fn header_content_length(response: &Response) -> Option<u64> {
    header_string(response, CONTENT_LENGTH).and_then(|v| v.parse().ok())
}
