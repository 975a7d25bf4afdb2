use std::time::Duration;

use eyre::{Result, bail};
use log::debug;
use reqwest::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;

pub const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Build the outbound client: one redirect hop, fixed per-call timeout,
/// browser-like default headers.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DESKTOP_USER_AGENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9,ja;q=0.8"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(Policy::limited(1))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Client for API calls: default headers, no browser identity
pub fn build_api_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().build()?)
}

/// GET a URL and return the body as text
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!("GET {url}");
    let body = client.get(url).send().await?.text().await?;
    Ok(body)
}

/// POST a JSON body and decode the JSON reply
pub async fn post_json(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    debug!("POST {url}");
    let resp = client.post(url).headers(headers).json(body).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        bail!("{url} returned {status}: {text}");
    }

    Ok(resp.json().await?)
}
