use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, header::USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::common::errors::ResolveError;
use crate::common::http::apply_request_options;
use crate::config::ResolveOptions;
use crate::extras::{self, PageMetadata};
use crate::util::between;

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=";
pub const EMBED_URL: &str = "https://www.youtube.com/embed/";

const WATCH_CONFIG_LEFT: &str = "ytplayer.config = ";
const EMBED_CONFIG_LEFT: &str = "t.setConfig({'PLAYER_CONFIG': ";

/// The page-embedded player config. Parsed once per resolution and
/// immutable afterwards; every field is optional because the blob comes
/// from an uncontrolled source.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PageConfig {
    sts: Option<Value>,
    pub assets: ConfigAssets,
    pub args: ConfigArgs,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConfigAssets {
    /// Path of the player script carrying the decipher algorithm.
    pub js: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConfigArgs {
    pub player_response: Option<String>,
    /// Secondary DASH manifest URL some configs carry.
    pub dashmpd: Option<String>,
}

impl PageConfig {
    /// Signing timestamp for the video info endpoint. The config carries it
    /// as a number or a string depending on page version.
    pub fn sts(&self) -> u64 {
        match &self.sts {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Resolves the player config for a video: watch page first, embed page as
/// the fallback for gated content. The returned flag is true when the
/// config came from the embed page, which is what marks a video
/// age-restricted downstream.
pub async fn resolve_config(
    client: &Client,
    id: &str,
    options: &ResolveOptions,
) -> Result<(PageConfig, PageMetadata, bool), ResolveError> {
    let bpctr = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_millis() as u64).div_ceil(1000))
        .unwrap_or(0);
    let url = format!("{}{}&hl={}&bpctr={}", VIDEO_URL, id, options.lang, bpctr);

    // A blank user agent keeps the platform on the scrapeable page layout.
    let req = apply_request_options(client.get(&url), &options.request).header(USER_AGENT, "");
    let body = req.send().await?.text().await?;

    if let Some(reason) = unavailable_reason(&body) {
        return Err(ResolveError::VideoUnavailable(reason));
    }

    let metadata = extras::scrape(&body);

    if let Some(blob) = extract_watch_config(&body) {
        let config = parse_config(blob)?;
        return Ok((config, metadata, false));
    }

    tracing::debug!("No player config on the watch page for {}, trying embed page", id);
    let embed_url = format!("{}{}?hl={}", EMBED_URL, id, options.lang);
    let req = apply_request_options(client.get(&embed_url), &options.request);
    let body = req.send().await?.text().await?;

    let blob = extract_embed_config(&body).ok_or(ResolveError::ConfigNotFound)?;
    let config = parse_config(&blob)?;
    Ok((config, metadata, true))
}

/// Reads the watch page's unavailability marker. Age-gated videos also
/// carry the marker but are handled by the embed fallback, not as a hard
/// failure.
pub fn unavailable_reason(body: &str) -> Option<String> {
    let div = between(body, r#"<div id="player-unavailable""#, ">")?;
    let class = between(div, r#"class=""#, r#"""#).unwrap_or_default();
    if class.split_whitespace().any(|c| c == "hid") {
        return None;
    }
    if body.contains(r#"<div id="watch7-player-age-gate-content""#) {
        return None;
    }
    let reason = between(body, r#"<h1 id="unavailable-message" class="message">"#, "</h1>")
        .map(str::trim)
        .unwrap_or("This video is unavailable");
    Some(reason.to_string())
}

pub fn extract_watch_config(body: &str) -> Option<&str> {
    let blob = between(body, WATCH_CONFIG_LEFT, "</script>")?;
    Some(match blob.rfind(";ytplayer.load") {
        Some(end) => &blob[..end],
        None => blob,
    })
}

/// The embed page closes the config with either `},'<next key>` or `}});`;
/// the blob loses its final brace either way, so it is re-appended.
pub fn extract_embed_config(body: &str) -> Option<String> {
    let start = body.find(EMBED_CONFIG_LEFT)? + EMBED_CONFIG_LEFT.len();
    let rest = &body[start..];
    let end = match (rest.find("},'"), rest.find("}});")) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some(format!("{}}}", &rest[..end]))
}

pub fn parse_config(blob: &str) -> Result<PageConfig, ResolveError> {
    serde_json::from_str(blob).map_err(|e| ResolveError::ConfigParse(e.to_string()))
}
