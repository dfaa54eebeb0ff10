use std::time::Duration;

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use ureq::Agent;
use ureq::config::{AutoHeaderValue, Config};
use ureq::http::HeaderValue;
use ureq::http::header::USER_AGENT;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Firefox ESR
const BROWSER_USER_AGENT: HeaderValue = HeaderValue::from_static(
    "Mozilla/5.0 (X11; Fedora; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
);

/// Agent that hands back the first response as is.
///
/// Redirects are not followed, error statuses are not turned into errors and
/// ureq adds neither `User-Agent` nor `Accept` on its own, so the request
/// carries exactly the headers the caller sets.
pub fn relinker_agent(timeout: Duration) -> Agent {
    let config = Config::builder()
        .max_redirects(0)
        .max_redirects_will_error(false)
        .http_status_as_error(false)
        .user_agent(AutoHeaderValue::None)
        .accept(AutoHeaderValue::None)
        .timeout_global(Some(timeout))
        .build();
    Agent::new_with_config(config)
}

/// GET with a browser `User-Agent`, following redirects.
pub fn get_text(url: &str, timeout: Duration) -> anyhow::Result<String> {
    let config = Config::builder().timeout_global(Some(timeout)).build();
    let agent = Agent::new_with_config(config);
    let mut response = agent
        .get(url)
        .header(USER_AGENT, BROWSER_USER_AGENT)
        .call()
        .context("HTTP GET request failed")?;
    tracing::debug!(url, status = %response.status(), "fetched");
    response
        .body_mut()
        .read_to_string()
        .context("Body should be a string")
}

pub fn get_json<T: DeserializeOwned>(url: &str, timeout: Duration) -> anyhow::Result<T> {
    let body = get_text(url, timeout)?;
    serde_json::from_str(&body).context("Body should be valid json")
}
