//! Quality variants of an M3U8 master playlist.

use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;

use crate::http;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamVariant {
    pub uri: String,
    pub bandwidth: u64,
    /// `WIDTHxHEIGHT`
    pub resolution: String,
}

/// Video variants of a master playlist. Streams without a resolution
/// (audio only) and I-frame streams are skipped.
pub fn parse_master(playlist: &[u8]) -> anyhow::Result<Vec<StreamVariant>> {
    let master = m3u8_rs::parse_master_playlist_res(playlist)
        .map_err(|error| anyhow::anyhow!("Playlist should be a master playlist: {error:?}"))?;
    Ok(master
        .variants
        .into_iter()
        .filter(|variant| !variant.is_i_frame)
        .filter_map(|variant| {
            let resolution = variant.resolution?;
            Some(StreamVariant {
                uri: variant.uri,
                bandwidth: variant.bandwidth,
                resolution: format!("{}x{}", resolution.width, resolution.height),
            })
        })
        .collect())
}

pub fn fetch_variants(url: &str, timeout: Duration) -> anyhow::Result<Vec<StreamVariant>> {
    let body = http::get_text(url, timeout)
        .with_context(|| format!("Should be able to load playlist {url}"))?;
    let variants = parse_master(body.as_bytes())?;
    tracing::info!(url, count = variants.len(), "playlist variants");
    Ok(variants)
}

#[cfg(test)]
pub const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=1200000,RESOLUTION=704x396,CODECS=\"avc1.4d401e,mp4a.40.2\"
https://cdn.example.com/video_1200.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2400000,RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\"
https://cdn.example.com/video_2400.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=128000,CODECS=\"mp4a.40.2\"
https://cdn.example.com/audio.m3u8
";
