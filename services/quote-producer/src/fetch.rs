//! Quote Fetcher: one timed HTTP call to the upstream quotes API.
//!
//! Any failure past process startup — network error, timeout, redirect
//! loop, non-2xx status, malformed or symbol-less body — is recovered
//! as "unavailable" with a logged diagnostic. Retry pacing belongs to
//! the publisher loop, not to the fetcher.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use tracing::warn;
use types::quote::Quote;

const QUOTES_PATH: &str = "/v1/cryptocurrency/quotes/latest";
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors underlying an unavailable fetch. Diagnostic only: the
/// fetcher never propagates these as a crash.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid API credential")]
    Credential,
}

/// Upstream response envelope: `data.<symbol>` holds the quote.
#[derive(Debug, Deserialize)]
struct QuotesResponse {
    #[serde(default)]
    data: Option<HashMap<String, Quote>>,
}

/// Fetches the latest quote for one symbol from the upstream API.
pub struct QuoteFetcher {
    client: reqwest::Client,
    url: String,
}

impl QuoteFetcher {
    /// Build the client with the fixed timeout and credential header.
    /// An unusable credential value is a fatal configuration error.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(api_key).map_err(|_| FetchError::Credential)?;
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), QUOTES_PATH),
        })
    }

    /// Fetch the latest quote, recovering every failure as `None`.
    pub async fn fetch(&self, symbol: &str) -> Option<Quote> {
        match self.try_fetch(symbol).await {
            Ok(Some(quote)) => Some(quote),
            Ok(None) => {
                warn!(symbol, "upstream response has no data for symbol");
                None
            }
            Err(err) => {
                warn!(symbol, error = %err, "quote fetch failed");
                None
            }
        }
    }

    async fn try_fetch(&self, symbol: &str) -> Result<Option<Quote>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("symbol", symbol), ("convert", "USD")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        Ok(extract_quote(&body, symbol)?)
    }
}

/// Parse the response body and pull out the quote for `symbol`.
///
/// Split from the transport so payload handling is testable offline.
fn extract_quote(body: &str, symbol: &str) -> Result<Option<Quote>, serde_json::Error> {
    let response: QuotesResponse = serde_json::from_str(body)?;
    Ok(response
        .data
        .and_then(|mut data| data.remove(symbol)))
}
