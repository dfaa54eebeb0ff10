use std::time::Duration;

use anyhow::Context as _;
use lazy_regex::regex_captures;
use serde::Deserialize;

use crate::http;
use crate::relinker::Relinker;

/// Metadata a `RaiPlay` video page exposes as JSON next to its HTML.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub video: VideoSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSource {
    /// Relinker URL of the video
    pub content_url: String,
}

impl VideoInfo {
    pub fn fetch(json_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let info: Self = http::get_json(json_url, timeout)
            .with_context(|| format!("Should be able to load video info from {json_url}"))?;
        tracing::info!(name = %info.name, content_url = %info.video.content_url, "video info");
        Ok(info)
    }

    pub fn relinker(&self, timeout: Duration) -> anyhow::Result<Relinker> {
        Ok(Relinker::new(&self.video.content_url)
            .context("Video info should contain a valid relinker URL")?
            .with_timeout(timeout))
    }
}

/// JSON URL for a `RaiPlay` video page, always over https.
pub fn json_url(page_url: &str) -> anyhow::Result<String> {
    let (_, https, rest) = regex_captures!(
        r"^http(s)?://((?:www\.)?raiplay\.it/video/\d{4}/\d{2}/[^.]+)\.html$",
        page_url
    )
    .with_context(|| format!("URL `{page_url}` is not a RaiPlay video page"))?;
    if https.is_empty() {
        tracing::debug!(page_url, "upgrade to https");
    }
    Ok(format!("https://{rest}.json"))
}
