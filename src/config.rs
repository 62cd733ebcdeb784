use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-resolution options. Threaded explicitly through every stage; there
/// is no ambient/global request state.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolveOptions {
    /// Language hint passed as `hl` to every page and endpoint.
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Extra HTTP options applied to outgoing requests.
    #[serde(default)]
    pub request: RequestOptions,
    /// Emit verbose tracing for decipher internals.
    #[serde(default)]
    pub debug: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            request: RequestOptions::default(),
            debug: false,
        }
    }
}

fn default_lang() -> String {
    "en".to_string()
}

/// Caller-supplied HTTP request overrides.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RequestOptions {
    #[serde(default)]
    pub headers: HashMap<String, String>,
}
