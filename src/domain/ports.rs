use crate::utils::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// Descriptor for one observed network response, correlated with its
/// originating request.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub request_id: String,
    pub url: String,
    pub status: i64,
    pub method: String,
    pub post_data: Option<String>,
}

impl ResponseEvent {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub type ResponseStream = BoxStream<'static, ResponseEvent>;

/// Calls made from the page against one exposed callable; each item is the
/// callable's single string argument.
pub type CallableCalls = mpsc::UnboundedReceiver<String>;

/// The single browser tab the harvesting strategies drive. Implemented over
/// CDP in production and by an in-memory fake in tests.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and wait for the page to settle, failing once the timeout
    /// elapses.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Subscribe to responses observed from this point on.
    async fn response_events(&self) -> Result<ResponseStream>;

    /// Fetch and parse the body of an observed response.
    async fn response_json(&self, request_id: &str) -> Result<Value>;

    /// Run a script inside the page context.
    async fn inject_script(&self, source: &str) -> Result<()>;

    /// Make `window.<name>(payload)` available inside the page, delivering
    /// each call's payload to the returned receiver. Fails if the name is
    /// already exposed.
    async fn expose_callable(&self, name: &str) -> Result<CallableCalls>;

    /// Remove a previously exposed callable so the name can be reused.
    async fn remove_callable(&self, name: &str) -> Result<()>;
}
