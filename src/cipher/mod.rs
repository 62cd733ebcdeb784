use std::sync::Arc;

use dashmap::DashMap;
use reqwest::Client;

use crate::common::errors::ResolveError;
use crate::common::http::apply_request_options;
use crate::config::ResolveOptions;

pub mod extract;
pub mod ops;

pub use ops::DecipherOp;

/// Fetches player scripts and caches the extracted operation sequence per
/// script URL. Script URLs are content-versioned, so entries never expire.
///
/// The cache is safe for concurrent population; two racing misses may both
/// compute, which is harmless since extraction is deterministic.
pub struct CipherManager {
    client: Client,
    operations: DashMap<String, Arc<Vec<DecipherOp>>>,
}

impl CipherManager {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            operations: DashMap::new(),
        }
    }

    /// Turns the `assets.js` path from a player config into a fetchable URL.
    pub fn script_url(player_script_path: &str) -> String {
        if player_script_path.starts_with("http") {
            player_script_path.to_string()
        } else if let Some(rest) = player_script_path.strip_prefix("//") {
            format!("https://{}", rest)
        } else {
            format!("https://www.youtube.com{}", player_script_path)
        }
    }

    pub async fn get_operations(
        &self,
        script_url: &str,
        options: &ResolveOptions,
    ) -> Result<Arc<Vec<DecipherOp>>, ResolveError> {
        if let Some(cached) = self.operations.get(script_url) {
            tracing::debug!("Using cached decipher operations for {}", script_url);
            return Ok(cached.clone());
        }

        let req = apply_request_options(self.client.get(script_url), &options.request);
        let script = req.send().await?.text().await?;
        let ops = Arc::new(extract::extract_operations(&script)?);
        if options.debug {
            tracing::debug!("Extracted {} decipher operations: {:?}", ops.len(), ops);
        }
        self.operations.insert(script_url.to_string(), ops.clone());
        Ok(ops)
    }
}
