use thiserror::Error;

/// Errors raised while resolving a video into playable stream formats.
///
/// `Decipher` and `ManifestFetch` are recoverable: the pipeline drops the
/// affected format or manifest and keeps going. Everything that happens
/// before a player response is in hand aborts the resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The watch page reported the video as unavailable, with the
    /// platform's own reason text.
    #[error("video unavailable: {0}")]
    VideoUnavailable(String),

    /// Neither the watch page nor the embed page contained a player config.
    #[error("could not find player config")]
    ConfigNotFound,

    /// A player config blob was found but did not parse as JSON.
    #[error("error parsing player config: {0}")]
    ConfigParse(String),

    /// The video info endpoint answered with `status=fail`.
    #[error("code {code}: {reason}")]
    Platform { code: String, reason: String },

    /// The `player_response` payload was missing or not valid JSON.
    #[error("error parsing player_response: {0}")]
    PlayerResponseParse(String),

    /// The platform marked the video UNPLAYABLE.
    #[error("{0}")]
    Unplayable(String),

    /// The decipher operations could not be extracted from the player
    /// script. Usually means the script format changed and the extraction
    /// patterns need an update, not a transient fault.
    #[error("could not extract decipher operations: {0}")]
    TokenExtraction(String),

    /// A single format's signature cipher could not be resolved.
    #[error("could not decipher format: {0}")]
    Decipher(String),

    /// A DASH or HLS manifest could not be fetched or parsed.
    #[error("manifest fetch failed: {0}")]
    ManifestFetch(String),

    /// After all recoverable drops, no playable format survived.
    #[error("no playable formats found")]
    NoPlayableFormats,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
