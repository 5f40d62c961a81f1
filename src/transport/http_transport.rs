use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::config::UpstreamConfig;
use crate::error::AdapterError;

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Join the chat-completions path onto a base URL.
///
/// A trailing slash on the base is tolerated: `http://host:11434/` and
/// `http://host:11434` both yield `http://host:11434/v1/chat/completions`.
#[must_use]
pub fn chat_completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut url = String::with_capacity(base.len() + CHAT_COMPLETIONS_PATH.len());
    url.push_str(base);
    url.push_str(CHAT_COMPLETIONS_PATH);
    url
}

fn build_reqwest_client(config: &UpstreamConfig) -> Result<reqwest::Client, AdapterError> {
    let mut builder = reqwest::Client::builder()
        .tcp_nodelay(true)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(config.timeout));

    if !config.http_use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|err| AdapterError::Connection(format!("Failed to build HTTP client: {err}")))
}

/// HTTP client for the chat-completion service.
///
/// Requests are sent once; there is no retry loop.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the timeouts and proxy policy from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, AdapterError> {
        Ok(Self {
            client: build_reqwest_client(config)?,
        })
    }

    /// Wrap an already configured client.
    #[must_use]
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST a JSON body and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the URL is invalid or the
    /// request could not be sent.
    pub async fn post_json(&self, url: &str, body: Bytes) -> Result<reqwest::Response, AdapterError> {
        let parsed = url::Url::parse(url)
            .map_err(|err| AdapterError::Connection(format!("Invalid upstream URL '{url}': {err}")))?;

        let mut request = reqwest::Request::new(http::Method::POST, parsed);
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        *request.body_mut() = Some(reqwest::Body::from(body));

        match self.client.execute(request).await {
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), url, "upstream responded");
                Ok(response)
            }
            Err(err) => {
                tracing::debug!(error = %err, url, "upstream request failed");
                Err(err.into())
            }
        }
    }
}
