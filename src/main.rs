use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{ArgAction, Parser};
use serde::Serialize;

use crate::playlist::StreamVariant;
use crate::raiplay::VideoInfo;
use crate::relinker::{Relinker, Variant};

mod http;
mod logging;
mod playlist;
mod raiplay;
mod relinker;
mod sanitize;
#[cfg(test)]
mod test_server;

/// Print where the Rai relinker redirects to, first without and then with a
/// `User-Agent` header.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Cli {
    /// `RaiPlay` video page to resolve instead of the default relinker
    #[arg(value_name = "PAGE_URL", conflicts_with = "content_id")]
    page_url: Option<String>,

    /// Content id to resolve on the default relinker endpoint
    #[arg(long)]
    content_id: Option<String>,

    /// Timeout of each request in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = http::DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    timeout: u64,

    /// Print a single JSON object with the playlist variants instead of one URL per line
    #[arg(long)]
    json: bool,

    /// Save the JSON object as `<video name>.json` in the current directory
    #[arg(long, requires = "page_url", conflicts_with = "json")]
    infos: bool,

    /// Log more to stderr, can be repeated
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Serialize)]
struct Resolved {
    id: Option<String>,
    name: Option<String>,
    subtitle: Option<String>,
    without_user_agent: String,
    with_user_agent: String,
    /// Master playlist behind `with_user_agent`
    variants: Vec<StreamVariant>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let timeout = Duration::from_secs(cli.timeout);
    let (info, relinker) = target(&cli, timeout)?;
    tracing::info!(url = relinker.url(), host = ?relinker.host(), "relinker");

    if cli.json || cli.infos {
        let resolved = collect(info, &relinker, timeout)?;
        if cli.infos {
            let path = save_infos(Path::new("."), &resolved)?;
            println!("{}", path.display());
        } else {
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
    } else {
        for variant in Variant::ALL {
            println!("{}", resolve(&relinker, variant)?);
        }
    }
    Ok(())
}

fn target(cli: &Cli, timeout: Duration) -> anyhow::Result<(Option<VideoInfo>, Relinker)> {
    if let Some(page_url) = &cli.page_url {
        let json_url = raiplay::json_url(page_url)?;
        let info = VideoInfo::fetch(&json_url, timeout)?;
        let relinker = info.relinker(timeout)?;
        return Ok((Some(info), relinker));
    }
    let relinker = match &cli.content_id {
        Some(content_id) => Relinker::for_content_id(content_id)
            .context("Content id should form a valid relinker URL")?,
        None => Relinker::default(),
    };
    Ok((None, relinker.with_timeout(timeout)))
}

fn resolve(relinker: &Relinker, variant: Variant) -> anyhow::Result<String> {
    relinker
        .resolve(variant)
        .with_context(|| format!("Failed to resolve {} {variant:?}", relinker.url()))
}

fn collect(
    info: Option<VideoInfo>,
    relinker: &Relinker,
    timeout: Duration,
) -> anyhow::Result<Resolved> {
    let without_user_agent = resolve(relinker, Variant::WithoutUserAgent)?;
    let with_user_agent = resolve(relinker, Variant::WithUserAgent)?;
    let variants = playlist::fetch_variants(&with_user_agent, timeout)?;
    let (id, name, subtitle) = info.map_or((None, None, None), |info| {
        (info.id, Some(info.name), info.subtitle)
    });
    Ok(Resolved {
        id,
        name,
        subtitle,
        without_user_agent,
        with_user_agent,
        variants,
    })
}

/// Write `resolved` into `dir`, named after the sanitized video name.
fn save_infos(dir: &Path, resolved: &Resolved) -> anyhow::Result<PathBuf> {
    let name = resolved
        .name
        .as_deref()
        .context("Video info should have a name")?;
    let path = dir.join(format!("{}.json", sanitize::sanitize_filename(name)));
    let json = serde_json::to_string_pretty(resolved)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Should be able to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved video info");
    Ok(path)
}

#[test]
fn cli_is_consistent() {
    use clap::CommandFactory as _;
    Cli::command().debug_assert();
}

#[test]
fn no_arguments_resolve_default_relinker() {
    let cli = Cli::try_parse_from(["rai-relinker"]).unwrap();
    assert_eq!(cli.timeout, 10);
    assert!(!cli.json);
    let (info, relinker) = target(&cli, Duration::from_secs(cli.timeout)).unwrap();
    assert!(info.is_none());
    assert_eq!(relinker.url(), relinker::RELINKER_URL);
}

#[test]
fn content_id_replaces_default() {
    let cli = Cli::try_parse_from(["rai-relinker", "--content-id", "xyzEqual", "-vv"]).unwrap();
    assert_eq!(cli.verbose, 2);
    let (_, relinker) = target(&cli, Duration::from_secs(cli.timeout)).unwrap();
    assert_eq!(
        relinker.url(),
        "http://mediapolisvod.rai.it/relinker/relinkerServlet.htm?cont=xyzEqual"
    );
}

#[test]
fn page_and_content_id_conflict() {
    let result = Cli::try_parse_from([
        "rai-relinker",
        "https://www.raiplay.it/video/2020/02/sanremo.html",
        "--content-id",
        "xyz",
    ]);
    assert!(result.is_err());
}

#[test]
fn zero_timeout_is_rejected() {
    assert!(Cli::try_parse_from(["rai-relinker", "--timeout", "0"]).is_err());
}

#[test]
fn invalid_page_url_fails_before_any_request() {
    let cli = Cli::try_parse_from(["rai-relinker", "https://www.example.com/video.html"]).unwrap();
    let error = target(&cli, Duration::from_secs(1)).unwrap_err();
    assert!(error.to_string().contains("not a RaiPlay video page"), "{error:#}");
}

#[test]
fn infos_needs_page_and_excludes_json() {
    assert!(Cli::try_parse_from(["rai-relinker", "--infos"]).is_err());
    assert!(
        Cli::try_parse_from([
            "rai-relinker",
            "https://www.raiplay.it/video/2020/02/sanremo.html",
            "--infos",
            "--json",
        ])
        .is_err()
    );
}

#[cfg(test)]
fn resolved_example() -> Resolved {
    Resolved {
        id: None,
        name: Some("Narcos: III".to_owned()),
        subtitle: None,
        without_user_agent: "http://example.com/video.mp4".to_owned(),
        with_user_agent: "http://example.com/playlist.m3u8".to_owned(),
        variants: vec![StreamVariant {
            uri: "https://cdn.example.com/video_1200.m3u8".to_owned(),
            bandwidth: 1_200_000,
            resolution: "704x396".to_owned(),
        }],
    }
}

#[test]
fn json_output_shape() {
    let json = serde_json::to_value(resolved_example()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": null,
            "name": "Narcos: III",
            "subtitle": null,
            "without_user_agent": "http://example.com/video.mp4",
            "with_user_agent": "http://example.com/playlist.m3u8",
            "variants": [{
                "uri": "https://cdn.example.com/video_1200.m3u8",
                "bandwidth": 1_200_000,
                "resolution": "704x396",
            }],
        })
    );
}

#[test]
fn collect_lists_variants_of_user_agent_target() {
    use std::sync::{Arc, OnceLock};

    use crate::test_server::{self, Reply};

    let base_url = Arc::new(OnceLock::<String>::new());
    let base = {
        let base_url = Arc::clone(&base_url);
        test_server::start(move |request| {
            let base = base_url.get().expect("base url set before the first request");
            match (request.path.as_str(), request.header("user-agent")) {
                ("/master.m3u8", _) => Reply::ok(playlist::MASTER),
                (_, None) => Reply::redirect(&format!("{base}/video.mp4")),
                (_, Some(_)) => Reply::redirect(&format!("{base}/master.m3u8")),
            }
        })
    };
    base_url.set(base.clone()).unwrap();

    let relinker =
        Relinker::new(&format!("{base}/relinker/relinkerServlet.htm?cont=abc")).unwrap();
    let resolved = collect(None, &relinker, http::DEFAULT_TIMEOUT).unwrap();
    assert_eq!(resolved.without_user_agent, format!("{base}/video.mp4"));
    assert_eq!(resolved.with_user_agent, format!("{base}/master.m3u8"));
    assert_eq!(resolved.name, None);
    let resolutions = resolved
        .variants
        .iter()
        .map(|variant| variant.resolution.as_str())
        .collect::<Vec<_>>();
    assert_eq!(resolutions, ["704x396", "1280x720"]);
}

#[test]
fn save_infos_uses_sanitized_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_infos(dir.path(), &resolved_example()).unwrap();
    assert_eq!(path, dir.path().join("Narcos! III.json"));
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["name"], "Narcos: III");
    assert_eq!(saved["variants"][0]["resolution"], "704x396");
}

#[test]
fn save_infos_needs_a_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut resolved = resolved_example();
    resolved.name = None;
    assert!(save_infos(dir.path(), &resolved).is_err());
}
