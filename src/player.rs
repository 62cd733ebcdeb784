use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::common::errors::ResolveError;
use crate::common::http::apply_request_options;
use crate::config::ResolveOptions;
use crate::formats::Format;
use crate::page::PageConfig;
use crate::util::{parse_query, strip_html};

pub const VIDEO_EURL: &str = "https://youtube.googleapis.com/v/";
const INFO_URL: &str = "https://www.youtube.com/get_video_info";

/// Typed view over the platform's player response. Every field is optional;
/// the payload shape changes without notice.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerResponse {
    pub video_details: Option<VideoDetails>,
    pub streaming_data: Option<StreamingData>,
    pub playability_status: Option<PlayabilityStatus>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoDetails {
    pub title: Option<String>,
    /// Travels as a decimal string.
    pub length_seconds: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingData {
    pub formats: Vec<Value>,
    pub adaptive_formats: Vec<Value>,
    pub dash_manifest_url: Option<String>,
    pub hls_manifest_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayabilityStatus {
    pub status: Option<String>,
    pub reason: Option<String>,
}

/// Everything the rest of the pipeline needs from the player response: the
/// raw payload for callers, the typed view, and the inline format list.
#[derive(Debug)]
pub struct PlayerData {
    pub raw: Value,
    pub response: PlayerResponse,
    pub formats: Vec<Format>,
}

/// Queries the legacy video info endpoint and extracts a validated player
/// response. The endpoint answers with urlencoded key/value pairs, with
/// the player response itself as a nested JSON string; the one embedded in
/// the page config wins when present.
pub async fn fetch_player_response(
    client: &Client,
    id: &str,
    config: &PageConfig,
    options: &ResolveOptions,
) -> Result<PlayerData, ResolveError> {
    let url = format!(
        "{}?video_id={}&eurl={}&ps=default&gl=US&hl={}&sts={}",
        INFO_URL,
        id,
        urlencoding::encode(&format!("{}{}", VIDEO_EURL, id)),
        options.lang,
        config.sts(),
    );
    let req = apply_request_options(client.get(&url), &options.request);
    let body = req.send().await?.text().await?;

    let info = parse_query(&body);
    if info.get("status").map(String::as_str) == Some("fail") {
        return Err(ResolveError::Platform {
            code: info.get("errorcode").cloned().unwrap_or_default(),
            reason: strip_html(info.get("reason").map(String::as_str).unwrap_or_default()),
        });
    }

    let payload = config
        .args
        .player_response
        .as_deref()
        .or_else(|| info.get("player_response").map(String::as_str))
        .ok_or_else(|| ResolveError::PlayerResponseParse("missing player_response".to_string()))?;

    parse_player_response(payload)
}

/// Parses and validates a raw player response payload.
pub fn parse_player_response(payload: &str) -> Result<PlayerData, ResolveError> {
    let raw: Value = serde_json::from_str(payload)
        .map_err(|e| ResolveError::PlayerResponseParse(e.to_string()))?;
    let response: PlayerResponse = serde_json::from_value(raw.clone())
        .map_err(|e| ResolveError::PlayerResponseParse(e.to_string()))?;

    if let Some(playability) = &response.playability_status {
        if playability.status.as_deref() == Some("UNPLAYABLE") {
            let reason = playability
                .reason
                .clone()
                .unwrap_or_else(|| "This video is unplayable".to_string());
            return Err(ResolveError::Unplayable(reason));
        }
    }

    let formats = collect_formats(&response);
    Ok(PlayerData {
        raw,
        response,
        formats,
    })
}

/// Inline formats in stable order: `formats` first, then `adaptiveFormats`.
/// Entries that do not look like format descriptors are dropped with a log
/// line rather than failing the whole response.
fn collect_formats(response: &PlayerResponse) -> Vec<Format> {
    let Some(streaming) = &response.streaming_data else {
        return Vec::new();
    };
    streaming
        .formats
        .iter()
        .chain(streaming.adaptive_formats.iter())
        .filter_map(|value| match serde_json::from_value(value.clone()) {
            Ok(format) => Some(format),
            Err(e) => {
                tracing::warn!("Dropping malformed format entry: {}", e);
                None
            }
        })
        .collect()
}
