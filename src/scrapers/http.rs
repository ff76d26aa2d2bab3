//! HTTP fetching with a bounded timeout.
//!
//! There is no retry policy: a timeout, transport error or non-2xx status
//! fails the fetch outright.

use crate::error::FetchError;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::{debug, instrument};

/// Build the client shared by every fetch in a run.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(FetchError::Client)
}

/// GET `url` and return its body as text.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, FetchError> {
    let request_error = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };

    let resp = client
        .get(url)
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
        .send()
        .await
        .map_err(request_error)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = resp.text().await.map_err(request_error)?;
    debug!(bytes = body.len(), "Fetched page");
    Ok(body)
}
