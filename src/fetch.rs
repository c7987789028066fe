use std::time::Instant;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

pub fn client(user_agent: &str) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(user_agent).build()
}

/// Fetch the profile listing page as text. Any transport error or non-2xx
/// status is an error.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let request_err = |source: reqwest::Error| FetchError::Request {
        url: url.to_string(),
        source,
    };

    info!("Fetching profiles page: {}", url);
    let start = Instant::now();
    let response = client.get(url).send().await.map_err(request_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let html = response.text().await.map_err(request_err)?;
    info!(
        "Fetched {} bytes in {}ms",
        html.len(),
        start.elapsed().as_millis()
    );
    Ok(html)
}
