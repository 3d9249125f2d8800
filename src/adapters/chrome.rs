//! Chrome/Chromium implementation of the `BrowserPage` port over CDP.
//!
//! Network traffic is observed by correlating `Network.requestWillBeSent`,
//! `Network.responseReceived` and `Network.loadingFinished` by request id.
//! All three event kinds are consumed through one merged stream, so
//! correlation never depends on scheduling order between separate listener
//! tasks; an exchange is surfaced once its status is known and its body is
//! loaded, whichever event arrives last. Exposed callables map onto
//! `Runtime.addBinding`; binding calls are routed to the registered
//! receiver by name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, EventLoadingFinished, EventRequestWillBeSent,
    EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    AddBindingParams, EnableParams as RuntimeEnableParams, EventBindingCalled,
    RemoveBindingParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::{future, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CliConfig;
use crate::core::NAVIGATE_TIMEOUT;
use crate::domain::ports::{BrowserPage, CallableCalls, ResponseEvent, ResponseStream};
use crate::utils::error::{HarvestError, Result};

const CHROME_ARGS: [&str; 4] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--start-maximized",
    "--disable-dev-shm-usage",
];

/// One launched browser with its single tab. Must be closed on every exit
/// path so the Chrome process is released.
pub struct ChromeSession {
    browser: Browser,
    page: ChromePage,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch(config: &CliConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .viewport(Viewport {
                width: 1024,
                height: 768,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .request_timeout(NAVIGATE_TIMEOUT);

        if config.headed {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        for arg in CHROME_ARGS {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| HarvestError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| HarvestError::Browser(format!("browser launch failed: {e}")))?;
        info!(args = ?CHROME_ARGS, headed = config.headed, "launched Chrome browser");

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "browser handler event");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        let page = ChromePage::new(page).await?;
        info!("created new tab in browser");

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "failed to close browser");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

enum NetworkEvent {
    Request(Arc<EventRequestWillBeSent>),
    Response(Arc<EventResponseReceived>),
    Finished(Arc<EventLoadingFinished>),
}

#[derive(Debug, Default)]
struct PendingExchange {
    url: String,
    method: String,
    post_data: Option<String>,
    status: Option<i64>,
    finished: bool,
}

/// Correlates the per-request CDP events into one `ResponseEvent` per
/// finished exchange. `responseReceived` and `loadingFinished` can reach the
/// host in either order; the exchange is surfaced only when both have been
/// seen, so a known status is always attached.
#[derive(Debug, Default)]
struct ExchangeCorrelator {
    pending: HashMap<String, PendingExchange>,
}

impl ExchangeCorrelator {
    fn on_request(&mut self, id: &str, url: String, method: String, post_data: Option<String>) {
        let entry = self.pending.entry(id.to_string()).or_default();
        entry.url = url;
        entry.method = method;
        entry.post_data = post_data;
    }

    fn on_response(&mut self, id: &str, url: String, status: i64) -> Option<ResponseEvent> {
        let entry = self.pending.entry(id.to_string()).or_default();
        // Response URL wins over the request URL after redirects.
        entry.url = url;
        entry.status = Some(status);
        if entry.finished {
            return self.surface(id);
        }
        None
    }

    fn on_finished(&mut self, id: &str) -> Option<ResponseEvent> {
        let entry = self.pending.get_mut(id)?;
        if entry.status.is_some() {
            return self.surface(id);
        }
        entry.finished = true;
        None
    }

    fn surface(&mut self, id: &str) -> Option<ResponseEvent> {
        let entry = self.pending.remove(id)?;
        let status = entry.status?;
        Some(ResponseEvent {
            request_id: id.to_string(),
            url: entry.url,
            status,
            method: entry.method,
            post_data: entry.post_data,
        })
    }
}

pub struct ChromePage {
    page: Page,
    callables: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl ChromePage {
    pub async fn new(page: Page) -> Result<Self> {
        page.execute(NetworkEnableParams::default()).await?;
        page.execute(RuntimeEnableParams::default()).await?;

        let callables: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<String>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let mut on_binding = page.event_listener::<EventBindingCalled>().await?;
        let callable_map = callables.clone();
        tokio::spawn(async move {
            while let Some(event) = on_binding.next().await {
                let sender = callable_map.lock().unwrap().get(&event.name).cloned();
                match sender {
                    Some(tx) => {
                        let _ = tx.send(event.payload.clone());
                    }
                    None => debug!(name = %event.name, "binding call with no registered callable"),
                }
            }
        });

        Ok(Self { page, callables })
    }
}

#[async_trait::async_trait]
impl BrowserPage for ChromePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        info!(url = %url, "navigating to URL");
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| HarvestError::NavigationTimeout {
                seconds: timeout.as_secs(),
            })??;
        Ok(())
    }

    async fn response_events(&self) -> Result<ResponseStream> {
        let on_request = self.page.event_listener::<EventRequestWillBeSent>().await?;
        let on_response = self.page.event_listener::<EventResponseReceived>().await?;
        let on_finished = self.page.event_listener::<EventLoadingFinished>().await?;

        let merged = futures::stream::select(
            on_request.map(NetworkEvent::Request),
            futures::stream::select(
                on_response.map(NetworkEvent::Response),
                on_finished.map(NetworkEvent::Finished),
            ),
        );

        let stream = merged
            .scan(ExchangeCorrelator::default(), |correlator, event| {
                let surfaced = match event {
                    NetworkEvent::Request(ev) => {
                        let post_data = ev.request.post_data_entries.as_ref().map(|entries| {
                            let bytes: Vec<u8> = entries
                                .iter()
                                .filter_map(|entry| entry.bytes.as_ref())
                                .filter_map(|chunk| {
                                    BASE64.decode(AsRef::<str>::as_ref(chunk)).ok()
                                })
                                .flatten()
                                .collect();
                            String::from_utf8_lossy(&bytes).into_owned()
                        });
                        correlator.on_request(
                            ev.request_id.inner(),
                            ev.request.url.clone(),
                            ev.request.method.clone(),
                            post_data,
                        );
                        None
                    }
                    NetworkEvent::Response(ev) => correlator.on_response(
                        ev.request_id.inner(),
                        ev.response.url.clone(),
                        ev.response.status,
                    ),
                    NetworkEvent::Finished(ev) => correlator.on_finished(ev.request_id.inner()),
                };
                future::ready(Some(surfaced))
            })
            .filter_map(future::ready);

        Ok(stream.boxed())
    }

    async fn response_json(&self, request_id: &str) -> Result<Value> {
        let response = self
            .page
            .execute(GetResponseBodyParams::new(RequestId::new(request_id)))
            .await?;

        let raw = if response.result.base64_encoded {
            let bytes = BASE64
                .decode(response.result.body.as_bytes())
                .map_err(|e| HarvestError::Browser(format!("invalid base64 response body: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| HarvestError::Browser(format!("response body is not UTF-8: {e}")))?
        } else {
            response.result.body
        };

        Ok(serde_json::from_str(&raw)?)
    }

    async fn inject_script(&self, source: &str) -> Result<()> {
        self.page.evaluate(source.to_string()).await?;
        Ok(())
    }

    async fn expose_callable(&self, name: &str) -> Result<CallableCalls> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut callables = self.callables.lock().unwrap();
            if callables.contains_key(name) {
                return Err(HarvestError::Browser(format!(
                    "callable '{name}' is already exposed"
                )));
            }
            callables.insert(name.to_string(), tx);
        }

        if let Err(err) = self.page.execute(AddBindingParams::new(name)).await {
            self.callables.lock().unwrap().remove(name);
            return Err(err.into());
        }
        Ok(rx)
    }

    async fn remove_callable(&self, name: &str) -> Result<()> {
        self.callables.lock().unwrap().remove(name);
        self.page
            .execute(RemoveBindingParams::new(name))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(correlator: &mut ExchangeCorrelator, id: &str) {
        correlator.on_request(
            id,
            "https://api.example.com/graphql".to_string(),
            "POST".to_string(),
            Some("{\"query\":\"...\"}".to_string()),
        );
    }

    #[test]
    fn surfaces_exchange_when_finish_follows_response() {
        let mut correlator = ExchangeCorrelator::default();
        request(&mut correlator, "1");

        assert!(correlator
            .on_response("1", "https://api.example.com/graphql".to_string(), 200)
            .is_none());
        let event = correlator.on_finished("1").expect("exchange surfaced");

        assert_eq!(event.request_id, "1");
        assert_eq!(event.status, 200);
        assert_eq!(event.method, "POST");
    }

    #[test]
    fn holds_early_finish_until_the_status_is_known() {
        let mut correlator = ExchangeCorrelator::default();
        request(&mut correlator, "1");

        // loadingFinished delivered ahead of responseReceived must not drop
        // the exchange.
        assert!(correlator.on_finished("1").is_none());
        let event = correlator
            .on_response("1", "https://api.example.com/graphql".to_string(), 500)
            .expect("exchange surfaced");

        assert_eq!(event.status, 500);
    }

    #[test]
    fn each_exchange_is_surfaced_once() {
        let mut correlator = ExchangeCorrelator::default();
        request(&mut correlator, "1");

        assert!(correlator
            .on_response("1", "https://api.example.com/graphql".to_string(), 200)
            .is_none());
        assert!(correlator.on_finished("1").is_some());
        assert!(correlator.on_finished("1").is_none());
    }

    #[test]
    fn finish_for_an_unseen_request_is_ignored() {
        let mut correlator = ExchangeCorrelator::default();
        assert!(correlator.on_finished("ghost").is_none());
    }
}
