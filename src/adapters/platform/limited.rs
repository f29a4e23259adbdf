//! Rate-limited decorator for [`PlatformApi`]
//!
//! Takes one limiter token immediately before every request or download, so
//! callers never deal with the limiter themselves.

use super::api::{ByteStream, Method, PlatformApi};
use crate::core::rate_limit::RateLimiter;
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct RateLimitedApi {
    inner: Arc<dyn PlatformApi>,
    limiter: Arc<RateLimiter>,
}

impl RateLimitedApi {
    pub fn new(inner: Arc<dyn PlatformApi>, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl PlatformApi for RateLimitedApi {
    async fn request(&self, method: Method, path: &str, params: Option<Value>) -> Result<Value> {
        self.limiter.acquire().await;
        self.inner.request(method, path, params).await
    }

    async fn open_download(&self, link: &str) -> Result<ByteStream> {
        self.limiter.acquire().await;
        self.inner.open_download(link).await
    }
}
