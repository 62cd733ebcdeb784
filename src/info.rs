use std::collections::HashMap;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::cipher::{CipherManager, DecipherOp, ops};
use crate::common::errors::ResolveError;
use crate::common::http::HttpClient;
use crate::config::ResolveOptions;
use crate::extras::Author;
use crate::formats::{Format, add_format_meta, merge_formats, sort_formats};
use crate::manifest::{dash, hls};
use crate::page;
use crate::player;

/// Terminal output of a resolution. Immutable once returned.
#[derive(Debug, Serialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub video_url: String,
    pub title: Option<String>,
    pub length_seconds: Option<u64>,
    pub author: Option<Author>,
    pub published: Option<String>,
    pub description: Option<String>,
    pub media: HashMap<String, String>,
    pub related_videos: Vec<HashMap<String, String>>,
    /// The platform's raw player response payload.
    pub player_response: Value,
    pub formats: Vec<Format>,
    pub age_restricted: bool,
    /// Player script path, the source of the decipher algorithm.
    pub html5player: Option<String>,
    /// True once formats have been deciphered, merged and ranked.
    pub full: bool,
}

struct ManifestUrls {
    dash: Option<String>,
    hls: Option<String>,
}

/// Resolves video ids into stream format lists.
///
/// Cheap to share: concurrent resolutions only share the HTTP client and
/// the decipher-operation cache, everything else is owned per call.
pub struct Resolver {
    client: Client,
    cipher: CipherManager,
}

impl Resolver {
    pub fn new() -> Result<Self, ResolveError> {
        Ok(Self::with_client(HttpClient::new()?))
    }

    pub fn with_client(client: Client) -> Self {
        let cipher = CipherManager::new(client.clone());
        Self { client, cipher }
    }

    /// Resolves metadata and the raw inline format list, without touching
    /// the player script or any manifest. Formats may still carry
    /// obfuscated signatures.
    pub async fn get_basic_info(
        &self,
        id: &str,
        options: &ResolveOptions,
    ) -> Result<VideoInfo, ResolveError> {
        let (info, _) = self.resolve_basic(id, options).await?;
        Ok(info)
    }

    /// Resolves the complete, playable format list: signatures deciphered,
    /// DASH and HLS manifests merged in, metadata enriched, ranked.
    ///
    /// The decipher branch and both manifest fetches run concurrently; the
    /// merge waits for all of them. Manifest failures and per-format
    /// decipher failures are dropped with a warning, a token extraction
    /// failure is fatal.
    pub async fn get_full_info(
        &self,
        id: &str,
        options: &ResolveOptions,
    ) -> Result<VideoInfo, ResolveError> {
        let (mut info, manifests) = self.resolve_basic(id, options).await?;
        let has_manifest = manifests.dash.is_some() || manifests.hls.is_some();
        if info.formats.is_empty() && !has_manifest {
            return Err(ResolveError::NoPlayableFormats);
        }

        let script_path = info.html5player.as_deref().ok_or_else(|| {
            ResolveError::TokenExtraction("config has no player script path".to_string())
        })?;
        let script_url = CipherManager::script_url(script_path);

        let inline = std::mem::take(&mut info.formats);
        let decipher_branch = async {
            let ops = self.cipher.get_operations(&script_url, options).await?;
            Ok::<_, ResolveError>(decipher_inline(inline, &ops))
        };
        let dash_branch = async {
            match &manifests.dash {
                Some(url) => Some(dash::fetch_formats(&self.client, url, options).await),
                None => None,
            }
        };
        let hls_branch = async {
            match &manifests.hls {
                Some(url) => Some(hls::fetch_formats(&self.client, url, options).await),
                None => None,
            }
        };

        let (deciphered, dash_result, hls_result) =
            tokio::join!(decipher_branch, dash_branch, hls_branch);

        let mut formats = deciphered?;
        fold_manifest(&mut formats, "dash", dash_result);
        fold_manifest(&mut formats, "hls", hls_result);

        if formats.is_empty() {
            return Err(ResolveError::NoPlayableFormats);
        }

        for format in formats.iter_mut() {
            add_format_meta(format);
        }
        sort_formats(&mut formats);

        info.formats = formats;
        info.full = true;
        Ok(info)
    }

    async fn resolve_basic(
        &self,
        id: &str,
        options: &ResolveOptions,
    ) -> Result<(VideoInfo, ManifestUrls), ResolveError> {
        let (config, metadata, from_embed) =
            page::resolve_config(&self.client, id, options).await?;
        let data = player::fetch_player_response(&self.client, id, &config, options).await?;

        let details = data.response.video_details.clone().unwrap_or_default();
        let streaming = data.response.streaming_data.clone().unwrap_or_default();
        let manifests = ManifestUrls {
            // Some configs carry a secondary DASH URL under args.dashmpd.
            dash: streaming
                .dash_manifest_url
                .clone()
                .or_else(|| config.args.dashmpd.clone()),
            hls: streaming.hls_manifest_url.clone(),
        };

        tracing::debug!(
            "Resolved player response for {}: {} inline formats, dash={}, hls={}",
            id,
            data.formats.len(),
            manifests.dash.is_some(),
            manifests.hls.is_some(),
        );

        let info = VideoInfo {
            video_id: id.to_string(),
            video_url: format!("{}{}", page::VIDEO_URL, id),
            title: details.title,
            length_seconds: details.length_seconds.and_then(|s| s.parse().ok()),
            author: metadata.author,
            published: metadata.published,
            description: metadata.description,
            media: metadata.media,
            related_videos: metadata.related_videos,
            player_response: data.raw,
            formats: data.formats,
            age_restricted: from_embed,
            html5player: config.assets.js.clone(),
            full: false,
        };
        Ok((info, manifests))
    }
}

/// Partial-success policy for inline formats: a format that fails to
/// decipher is dropped, the rest survive.
fn decipher_inline(formats: Vec<Format>, ops: &[DecipherOp]) -> Vec<Format> {
    let mut kept = Vec::with_capacity(formats.len());
    for mut format in formats {
        match ops::decipher_format(&mut format, ops) {
            Ok(()) => kept.push(format),
            Err(e) => tracing::warn!("Dropping format {}: {}", format.itag, e),
        }
    }
    kept
}

/// Partial-success policy for manifests: a failed fetch is logged and
/// ignored, a successful map is merged (map entries win per itag).
fn fold_manifest(
    formats: &mut Vec<Format>,
    source: &str,
    result: Option<Result<HashMap<i64, Format>, ResolveError>>,
) {
    match result {
        Some(Ok(map)) => {
            tracing::debug!("Merging {} formats from {} manifest", map.len(), source);
            merge_formats(formats, map);
        }
        Some(Err(e)) => tracing::warn!("Ignoring {} manifest: {}", source, e),
        None => {}
    }
}
