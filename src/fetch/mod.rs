mod basic;
mod client;
mod url_param;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use url_param::UrlParam;

use reqwest::Url;
use tracing::debug;

use crate::error::Result;

/// Issues a GET for `url` and returns the body text.
///
/// # Errors
///
/// Connection failures and non-2xx statuses surface as
/// [`crate::error::BusTrackerError::Transport`]. The error carries no URL,
/// since the query string holds the API key.
pub async fn fetch_text<C: HttpClient>(client: &C, url: Url) -> Result<String> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client
        .execute(req)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(reqwest::Error::without_url)?;
    let text = resp.text().await.map_err(reqwest::Error::without_url)?;
    debug!(bytes = text.len(), "Response body received");
    Ok(text)
}
