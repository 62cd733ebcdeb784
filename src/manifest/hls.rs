use std::collections::HashMap;

use regex::Regex;
use reqwest::Client;

use crate::common::errors::ResolveError;
use crate::common::http::apply_request_options;
use crate::config::ResolveOptions;
use crate::formats::Format;

/// Fetches an HLS master playlist and maps every variant URL to its itag,
/// read from the `/itag/<digits>/` path segment. Host-relative playlist
/// paths are resolved against www.youtube.com.
pub async fn fetch_formats(
    client: &Client,
    url: &str,
    options: &ResolveOptions,
) -> Result<HashMap<i64, Format>, ResolveError> {
    let url = resolve_playlist_url(url);
    let req = apply_request_options(client.get(&url), &options.request);
    let body = req
        .send()
        .await
        .map_err(|e| ResolveError::ManifestFetch(format!("hls: {e}")))?
        .text()
        .await
        .map_err(|e| ResolveError::ManifestFetch(format!("hls: {e}")))?;
    parse_playlist(&body)
}

pub fn resolve_playlist_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://www.youtube.com{}", url)
    }
}

/// Scans playlist lines for absolute variant URLs.
pub fn parse_playlist(body: &str) -> Result<HashMap<i64, Format>, ResolveError> {
    let itag_re = Regex::new(r"/itag/(\d+)/")
        .map_err(|e| ResolveError::ManifestFetch(e.to_string()))?;

    let mut formats = HashMap::new();
    for line in body.lines() {
        let line = line.trim();
        if !(line.starts_with("http://") || line.starts_with("https://")) {
            continue;
        }
        let Some(caps) = itag_re.captures(line) else {
            tracing::debug!("Playlist line has no itag segment: {}", line);
            continue;
        };
        if let Ok(itag) = caps[1].parse::<i64>() {
            formats.insert(itag, Format::from_manifest(itag, line));
        }
    }
    Ok(formats)
}
