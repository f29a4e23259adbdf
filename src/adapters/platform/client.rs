//! HTTP implementation of [`PlatformApi`]
//!
//! Authenticates with the OAuth password flow, keeps the resulting tokens in a
//! [`SessionStore`] and issues JSON calls with `reqwest`. Nothing here retries:
//! transport failures surface as [`PodexError::Network`] immediately.

use super::api::{ByteStream, Method, PlatformApi, StreamFault};
use super::session::{Credentials, SessionStore};
use crate::config::{secret_string, PlatformConfig, SecretString};
use crate::domain::{PodexError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Path of the OAuth token endpoint
const TOKEN_PATH: &str = "/oauth/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Platform client over HTTPS
pub struct HttpPlatformClient {
    base_url: String,
    client: Client,
    config: PlatformConfig,
    sessions: Arc<dyn SessionStore>,
}

impl HttpPlatformClient {
    /// Create a client; no request is made until [`Self::ensure_authenticated`]
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: PlatformConfig, sessions: Arc<dyn SessionStore>) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PodexError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            config,
            sessions,
        })
    }

    /// Whether the session store already holds credentials for this flow
    pub fn is_authenticated(&self) -> bool {
        self.sessions.get(&self.config.auth_type).is_some()
    }

    /// Reuse stored credentials or run the password flow
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            tracing::debug!("Reusing stored session");
            return Ok(());
        }
        self.authenticate().await
    }

    /// Exchange username and password for tokens
    pub async fn authenticate(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        let form = [
            ("grant_type", "password"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.expose_secret().as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
        ];

        let resp = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| PodexError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PodexError::Authentication(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| PodexError::Authentication(format!("Unreadable token response: {e}")))?;

        self.sessions.set(
            Credentials {
                access_token: secret_string(token.access_token),
                refresh_token: token.refresh_token.map(secret_string),
                expires_in: token.expires_in,
            },
            &self.config.auth_type,
        );

        tracing::info!(username = %self.config.username, "Authenticated");
        Ok(())
    }

    fn access_token(&self) -> Result<SecretString> {
        self.sessions
            .get(&self.config.auth_type)
            .map(|c| c.access_token)
            .ok_or_else(|| PodexError::Authentication("Not authenticated".to_string()))
    }

    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token()?;
        Ok(builder.header(
            "Authorization",
            format!("OAuth2 {}", token.expose_secret().as_str()),
        ))
    }

    async fn check_status(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PodexError::Authentication(format!(
                "Request rejected with status {status}: {body}"
            )));
        }
        Err(PodexError::Api {
            status: status.as_u16(),
            message: body,
        })
    }
}

/// Flattens a params object into query pairs, leaving strings unquoted
fn query_pairs(params: &Value) -> Vec<(String, String)> {
    match params {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn classify(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_decode() {
        "decode"
    } else if err.is_body() {
        "body"
    } else {
        "transport"
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn request(&self, method: Method, path: &str, params: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "API request");

        let builder = match method {
            Method::Get => {
                let builder = self.client.get(&url);
                match &params {
                    Some(params) => builder.query(&query_pairs(params)),
                    None => builder,
                }
            }
            Method::Post => {
                let builder = self.client.post(&url);
                match &params {
                    Some(params) => builder.json(params),
                    None => builder,
                }
            }
        };

        let resp = self
            .authorize(builder)?
            .send()
            .await
            .map_err(|e| PodexError::Network(format!("{method} {path}: {e}")))?;
        let resp = Self::check_status(resp).await?;

        resp.json::<Value>()
            .await
            .map_err(|e| PodexError::InvalidResponse(format!("{method} {path}: {e}")))
    }

    async fn open_download(&self, link: &str) -> Result<ByteStream> {
        let mut url = Url::parse(link)
            .map_err(|e| PodexError::InvalidResponse(format!("Bad file link '{link}': {e}")))?;
        let token = self.access_token()?;
        url.query_pairs_mut()
            .append_pair("oauth_token", token.expose_secret().as_str());

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PodexError::Network(e.to_string()))?;
        let resp = Self::check_status(resp).await?;

        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| StreamFault::new(classify(&e), e.to_string())))
            .boxed())
    }
}
