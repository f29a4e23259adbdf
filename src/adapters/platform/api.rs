//! Platform API trait definition
//!
//! `PlatformApi` is the seam between the exporter and the remote platform. The
//! HTTP implementation lives in [`super::client`]; tests plug in in-memory
//! fakes.

use crate::domain::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde_json::Value;

/// HTTP verb of a JSON API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A fault raised while a download body is streaming
///
/// `kind` is a short classification (for example `timeout`, `body`,
/// `decode`) that the download warning policy matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFault {
    pub kind: String,
    pub message: String,
}

impl StreamFault {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StreamFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

/// Body of a binary download
pub type ByteStream = BoxStream<'static, std::result::Result<Bytes, StreamFault>>;

/// Authenticated access to the platform
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Issue a JSON API call
    ///
    /// For `GET` the params object becomes the query string; for `POST` it is
    /// sent as the JSON body.
    async fn request(&self, method: Method, path: &str, params: Option<Value>) -> Result<Value>;

    /// Open the body of a file link for streaming
    ///
    /// Downloads bypass the JSON API and are authorized with the current
    /// access token.
    async fn open_download(&self, link: &str) -> Result<ByteStream>;
}
