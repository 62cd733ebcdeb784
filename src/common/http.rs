use std::time::Duration;

use reqwest::{
    Client, Error, RequestBuilder,
    header::{HeaderName, HeaderValue},
};

use crate::config::RequestOptions;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

pub struct HttpClient;

impl HttpClient {
    pub fn default_user_agent() -> String {
        DEFAULT_USER_AGENT.to_string()
    }

    pub fn new() -> Result<Client, Error> {
        Client::builder()
            .user_agent(Self::default_user_agent())
            .timeout(Duration::from_secs(10))
            .build()
    }
}

/// Applies caller-supplied headers to a request. Invalid header names or
/// values are skipped rather than failing the whole request.
pub fn apply_request_options(mut req: RequestBuilder, options: &RequestOptions) -> RequestBuilder {
    for (key, value) in &options.headers {
        let name = match key.parse::<HeaderName>() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!("Skipping invalid header name: {}", key);
                continue;
            }
        };
        let value = match HeaderValue::from_str(value) {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("Skipping invalid header value for: {}", key);
                continue;
            }
        };
        req = req.header(name, value);
    }
    req
}
