use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One playable stream descriptor. Deserialized from the player response's
/// `streamingData` entries; manifest fetchers synthesize minimal instances.
/// Everything except `itag` is optional — the payload is not under our
/// control.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Format {
    pub itag: i64,
    pub url: Option<String>,
    /// Urlencoded `url`/`s`/`sp` triple carrying an obfuscated signature.
    #[serde(alias = "cipher")]
    pub signature_cipher: Option<String>,
    pub mime_type: Option<String>,
    pub quality: Option<String>,
    pub quality_label: Option<String>,
    pub bitrate: Option<i64>,
    pub audio_quality: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub fps: Option<i64>,
    pub content_length: Option<String>,

    // Derived by `add_format_meta`, absent on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codecs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<i64>,
}

impl Format {
    /// Minimal descriptor for a manifest-derived entry: just an itag and
    /// the manifest URL.
    pub fn from_manifest(itag: i64, url: &str) -> Self {
        Self {
            itag,
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn has_video(&self) -> bool {
        if let Some(mime) = &self.mime_type {
            return mime.starts_with("video/");
        }
        self.resolution.is_some() || self.quality_label.is_some()
    }

    pub fn has_audio(&self) -> bool {
        if let Some(mime) = &self.mime_type {
            if mime.starts_with("audio/") {
                return true;
            }
            // Muxed streams are video/* with two codecs listed.
            return codecs_of(mime).map(|c| c.contains(',')).unwrap_or(false);
        }
        self.audio_bitrate.is_some() || self.audio_quality.is_some()
    }

    fn resolution_rank(&self) -> i64 {
        self.quality_label
            .as_deref()
            .or(self.resolution.as_deref())
            .and_then(parse_resolution)
            .or(self.height)
            .unwrap_or(0)
    }
}

/// Leading digits of a label like "1080p" or "720p60".
fn parse_resolution(label: &str) -> Option<i64> {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn codecs_of(mime: &str) -> Option<&str> {
    let start = mime.find("codecs=\"")? + "codecs=\"".len();
    let rest = &mime[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Static per-itag encoding profile, used to fill in metadata the payload
/// leaves out. Covers the common muxed, video-only and audio-only profiles.
struct ItagProfile {
    container: &'static str,
    resolution: Option<&'static str>,
    audio_bitrate: Option<i64>,
}

fn profile_for(itag: i64) -> Option<ItagProfile> {
    let p = |container, resolution, audio_bitrate| ItagProfile {
        container,
        resolution,
        audio_bitrate,
    };
    Some(match itag {
        // Muxed legacy formats
        5 => p("flv", Some("240p"), Some(64)),
        6 => p("flv", Some("270p"), Some(64)),
        17 => p("3gp", Some("144p"), Some(24)),
        18 => p("mp4", Some("360p"), Some(96)),
        22 => p("mp4", Some("720p"), Some(192)),
        34 => p("flv", Some("360p"), Some(128)),
        35 => p("flv", Some("480p"), Some(128)),
        36 => p("3gp", Some("240p"), Some(32)),
        37 => p("mp4", Some("1080p"), Some(192)),
        38 => p("mp4", Some("3072p"), Some(192)),
        43 => p("webm", Some("360p"), Some(128)),
        44 => p("webm", Some("480p"), Some(128)),
        45 => p("webm", Some("720p"), Some(192)),
        46 => p("webm", Some("1080p"), Some(192)),
        // Live / HLS profiles
        91 => p("ts", Some("144p"), Some(48)),
        92 => p("ts", Some("240p"), Some(48)),
        93 => p("ts", Some("360p"), Some(128)),
        94 => p("ts", Some("480p"), Some(128)),
        95 => p("ts", Some("720p"), Some(256)),
        96 => p("ts", Some("1080p"), Some(256)),
        // DASH video-only
        133 => p("mp4", Some("240p"), None),
        134 => p("mp4", Some("360p"), None),
        135 => p("mp4", Some("480p"), None),
        136 => p("mp4", Some("720p"), None),
        137 => p("mp4", Some("1080p"), None),
        138 => p("mp4", Some("4320p"), None),
        160 => p("mp4", Some("144p"), None),
        242 => p("webm", Some("240p"), None),
        243 => p("webm", Some("360p"), None),
        244 => p("webm", Some("480p"), None),
        247 => p("webm", Some("720p"), None),
        248 => p("webm", Some("1080p"), None),
        264 => p("mp4", Some("1440p"), None),
        266 => p("mp4", Some("2160p"), None),
        271 => p("webm", Some("1440p"), None),
        272 => p("webm", Some("4320p"), None),
        278 => p("webm", Some("144p"), None),
        298 => p("mp4", Some("720p60"), None),
        299 => p("mp4", Some("1080p60"), None),
        302 => p("webm", Some("720p60"), None),
        303 => p("webm", Some("1080p60"), None),
        308 => p("webm", Some("1440p60"), None),
        313 => p("webm", Some("2160p"), None),
        315 => p("webm", Some("2160p60"), None),
        // DASH audio-only
        139 => p("m4a", None, Some(48)),
        140 => p("m4a", None, Some(128)),
        141 => p("m4a", None, Some(256)),
        171 => p("webm", None, Some(128)),
        172 => p("webm", None, Some(192)),
        249 => p("webm", None, Some(48)),
        250 => p("webm", None, Some(64)),
        251 => p("webm", None, Some(160)),
        _ => return None,
    })
}

/// Fills in container/codecs/resolution/audio-bitrate metadata.
///
/// Pure and idempotent: a second application changes nothing, and payload
/// values always win over the static profile.
pub fn add_format_meta(format: &mut Format) {
    if format.codecs.is_none() {
        format.codecs = format
            .mime_type
            .as_deref()
            .and_then(codecs_of)
            .map(str::to_string);
    }
    if format.container.is_none() {
        format.container = format
            .mime_type
            .as_deref()
            .and_then(|m| m.split(';').next())
            .and_then(|m| m.split('/').nth(1))
            .map(str::to_string);
    }
    if let Some(profile) = profile_for(format.itag) {
        if format.container.is_none() {
            format.container = Some(profile.container.to_string());
        }
        if format.resolution.is_none() {
            format.resolution = profile
                .resolution
                .map(str::to_string)
                .or_else(|| format.quality_label.clone());
        }
        if format.audio_bitrate.is_none() {
            format.audio_bitrate = profile.audio_bitrate;
        }
    } else if format.resolution.is_none() {
        format.resolution = format.quality_label.clone();
    }
}

/// Folds a manifest-derived map into the inline format list.
///
/// Exactly one descriptor per itag survives; the map entry wins over an
/// inline entry with the same itag. Inline ordering is preserved, map-only
/// entries are appended in ascending itag order so the outcome is
/// deterministic before ranking.
pub fn merge_formats(formats: &mut Vec<Format>, mut incoming: HashMap<i64, Format>) {
    for format in formats.iter_mut() {
        if let Some(replacement) = incoming.remove(&format.itag) {
            *format = replacement;
        }
    }
    let mut appended: Vec<Format> = incoming.into_values().collect();
    appended.sort_by_key(|f| f.itag);
    formats.extend(appended);
}

/// Ranks formats into a total, reproducible order:
/// 1. streams carrying both audio and video first,
/// 2. higher resolution first,
/// 3. higher bitrate first,
/// 4. higher audio bitrate first,
/// 5. ties keep their original relative order (stable sort).
pub fn sort_formats(formats: &mut [Format]) {
    formats.sort_by(|a, b| {
        let a_both = a.has_video() && a.has_audio();
        let b_both = b.has_video() && b.has_audio();
        b_both
            .cmp(&a_both)
            .then_with(|| b.resolution_rank().cmp(&a.resolution_rank()))
            .then_with(|| b.bitrate.unwrap_or(0).cmp(&a.bitrate.unwrap_or(0)))
            .then_with(|| {
                b.audio_bitrate
                    .unwrap_or(0)
                    .cmp(&a.audio_bitrate.unwrap_or(0))
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(itag: i64, url: &str) -> Format {
        Format::from_manifest(itag, url)
    }

    #[test]
    fn merge_prefers_manifest_entry() {
        let mut formats = vec![fmt(18, "https://a.example/video")];
        let mut map = HashMap::new();
        map.insert(18, fmt(18, "https://b.example/manifest.mpd"));
        merge_formats(&mut formats, map);

        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].itag, 18);
        assert_eq!(
            formats[0].url.as_deref(),
            Some("https://b.example/manifest.mpd")
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let make_map = || {
            let mut map = HashMap::new();
            map.insert(18, fmt(18, "https://m.example/d.mpd"));
            map.insert(137, fmt(137, "https://m.example/d.mpd"));
            map
        };
        let mut once = vec![fmt(18, "https://a.example"), fmt(22, "https://a.example")];
        merge_formats(&mut once, make_map());
        let mut twice = once.clone();
        merge_formats(&mut twice, make_map());

        let itags: Vec<i64> = once.iter().map(|f| f.itag).collect();
        let itags_twice: Vec<i64> = twice.iter().map(|f| f.itag).collect();
        assert_eq!(itags, itags_twice);
        assert_eq!(itags, vec![18, 22, 137]);
    }

    #[test]
    fn meta_enrichment_fills_profile_fields() {
        let mut format = fmt(18, "https://a.example");
        add_format_meta(&mut format);
        assert_eq!(format.container.as_deref(), Some("mp4"));
        assert_eq!(format.resolution.as_deref(), Some("360p"));
        assert_eq!(format.audio_bitrate, Some(96));
    }

    #[test]
    fn meta_enrichment_prefers_mime_type() {
        let mut format = Format {
            itag: 137,
            mime_type: Some("video/mp4; codecs=\"avc1.640028\"".to_string()),
            ..Default::default()
        };
        add_format_meta(&mut format);
        assert_eq!(format.container.as_deref(), Some("mp4"));
        assert_eq!(format.codecs.as_deref(), Some("avc1.640028"));
        assert_eq!(format.resolution.as_deref(), Some("1080p"));
        assert_eq!(format.audio_bitrate, None);
    }

    #[test]
    fn meta_enrichment_is_idempotent() {
        let mut format = fmt(22, "https://a.example");
        add_format_meta(&mut format);
        let snapshot = serde_json::to_string(&format).unwrap();
        add_format_meta(&mut format);
        assert_eq!(serde_json::to_string(&format).unwrap(), snapshot);
    }

    #[test]
    fn sorting_prefers_muxed_then_resolution() {
        let mut video_only = fmt(137, "https://a.example");
        video_only.mime_type = Some("video/mp4; codecs=\"avc1.640028\"".to_string());
        let mut muxed_low = fmt(18, "https://a.example");
        muxed_low.mime_type = Some("video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"".to_string());
        let mut muxed_high = fmt(22, "https://a.example");
        muxed_high.mime_type = Some("video/mp4; codecs=\"avc1.64001F, mp4a.40.2\"".to_string());
        for f in [&mut video_only, &mut muxed_low, &mut muxed_high] {
            add_format_meta(f);
        }

        let mut formats = vec![video_only, muxed_low, muxed_high];
        sort_formats(&mut formats);
        let itags: Vec<i64> = formats.iter().map(|f| f.itag).collect();
        assert_eq!(itags, vec![22, 18, 137]);
    }

    #[test]
    fn sorting_by_resolution_descending() {
        let mut a = fmt(135, "u");
        a.quality_label = Some("480p".to_string());
        let mut b = fmt(137, "u");
        b.quality_label = Some("1080p".to_string());
        let mut formats = vec![a, b];
        sort_formats(&mut formats);
        assert_eq!(formats[0].itag, 137);
    }

    #[test]
    fn sorting_is_stable_on_ties() {
        let first = fmt(247, "first");
        let second = fmt(302, "second");
        let mut formats = vec![first, second];
        // Neither carries distinguishing metadata; order must be preserved.
        sort_formats(&mut formats);
        assert_eq!(formats[0].url.as_deref(), Some("first"));
        assert_eq!(formats[1].url.as_deref(), Some("second"));
    }

    #[test]
    fn cipher_alias_deserializes() {
        let json = r#"{"itag": 22, "cipher": "s=abc&url=def"}"#;
        let format: Format = serde_json::from_str(json).unwrap();
        assert_eq!(format.signature_cipher.as_deref(), Some("s=abc&url=def"));
    }
}
