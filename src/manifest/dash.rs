use std::collections::HashMap;

use regex::Regex;
use reqwest::Client;

use crate::common::errors::ResolveError;
use crate::common::http::apply_request_options;
use crate::config::ResolveOptions;
use crate::formats::Format;

/// Fetches a DASH manifest and maps every `<Representation>` id to a
/// format descriptor. All entries reference the manifest URL itself;
/// per-representation addressing is the player's concern, not ours.
pub async fn fetch_formats(
    client: &Client,
    url: &str,
    options: &ResolveOptions,
) -> Result<HashMap<i64, Format>, ResolveError> {
    let req = apply_request_options(client.get(url), &options.request)
        .header("Content-Type", "text/plain;charset=UTF-8");
    let body = req
        .send()
        .await
        .map_err(|e| ResolveError::ManifestFetch(format!("dash: {e}")))?
        .text()
        .await
        .map_err(|e| ResolveError::ManifestFetch(format!("dash: {e}")))?;
    parse_manifest(&body, url)
}

/// Scans the manifest XML for representation ids. Ids that are not small
/// integers (some live manifests carry string ids) are skipped.
pub fn parse_manifest(xml: &str, manifest_url: &str) -> Result<HashMap<i64, Format>, ResolveError> {
    let rep_re = Regex::new(r#"<Representation\s[^>]*?id="([^"]+)""#)
        .map_err(|e| ResolveError::ManifestFetch(e.to_string()))?;

    let mut formats = HashMap::new();
    for caps in rep_re.captures_iter(xml) {
        let id = &caps[1];
        match id.parse::<i64>() {
            Ok(itag) => {
                formats.insert(itag, Format::from_manifest(itag, manifest_url));
            }
            Err(_) => {
                tracing::debug!("Skipping non-numeric representation id: {}", id);
            }
        }
    }
    Ok(formats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static">
  <Period>
    <AdaptationSet mimeType="video/mp4">
      <Representation id="137" bandwidth="4400000" width="1920" height="1080"/>
      <Representation id="136" bandwidth="2200000" width="1280" height="720"/>
    </AdaptationSet>
    <AdaptationSet mimeType="audio/mp4">
      <Representation id="140" bandwidth="130000"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

    #[test]
    fn representations_map_to_manifest_url() {
        let url = "https://manifest.example/api/manifest/dash/id/abc";
        let formats = parse_manifest(MANIFEST, url).unwrap();
        assert_eq!(formats.len(), 3);
        for itag in [136, 137, 140] {
            assert_eq!(formats[&itag].itag, itag);
            assert_eq!(formats[&itag].url.as_deref(), Some(url));
        }
    }

    #[test]
    fn non_numeric_ids_are_skipped() {
        let xml = r#"<Representation id="audio_only_0" bandwidth="1"/>
<Representation id="134" bandwidth="2"/>"#;
        let formats = parse_manifest(xml, "https://m.example/d.mpd").unwrap();
        assert_eq!(formats.len(), 1);
        assert!(formats.contains_key(&134));
    }

    #[test]
    fn empty_manifest_yields_empty_map() {
        let formats = parse_manifest("<MPD></MPD>", "https://m.example/d.mpd").unwrap();
        assert!(formats.is_empty());
    }
}
