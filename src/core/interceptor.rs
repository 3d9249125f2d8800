//! Listener mode: passively harvest the GraphQL exchanges the search page
//! issues on its own while it loads.

use crate::core::{response, GRAPHQL_OPERATION, GRAPHQL_URI};
use crate::domain::model::Inventory;
use crate::domain::ports::{BrowserPage, ResponseEvent};
use crate::utils::error::{HarvestError, Result};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tracing::{debug, info};

pub struct ResponseInterceptor<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    endpoint: String,
    operation: String,
}

impl<'a, P: BrowserPage + ?Sized> ResponseInterceptor<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self {
            page,
            endpoint: GRAPHQL_URI.to_string(),
            operation: GRAPHQL_OPERATION.to_string(),
        }
    }

    /// Navigate to the search page and collect vehicles from every matching
    /// exchange observed while the navigation settles.
    ///
    /// Navigation completion is not a barrier against late responses: events
    /// already queued when it resolves are still drained, but a response in
    /// flight at that moment can be missed.
    pub async fn harvest(&self, url: &str, timeout: Duration) -> Result<Inventory> {
        let mut inventory = Inventory::new();
        let mut events = self.page.response_events().await?;
        debug!("attached response listener");

        let navigation = self.page.navigate(url, timeout);
        tokio::pin!(navigation);

        loop {
            tokio::select! {
                result = &mut navigation => {
                    result?;
                    break;
                }
                event = events.next() => match event {
                    Some(event) => self.handle_response(event, &mut inventory).await?,
                    None => {
                        navigation.await?;
                        break;
                    }
                },
            }
        }

        while let Some(Some(event)) = events.next().now_or_never() {
            self.handle_response(event, &mut inventory).await?;
        }

        Ok(inventory)
    }

    async fn handle_response(&self, event: ResponseEvent, inventory: &mut Inventory) -> Result<()> {
        let url = event.url.trim().to_lowercase();
        debug!(url = %url, status = event.status, "handled response");

        if url != self.endpoint {
            return Ok(());
        }
        if !event.ok() {
            return Err(HarvestError::UpstreamHttp {
                status: event.status,
            });
        }
        // The endpoint only serves POST; anything else is stray traffic.
        if !event.method.eq_ignore_ascii_case("POST") {
            return Ok(());
        }
        let Some(post_data) = event.post_data.as_deref() else {
            return Ok(());
        };
        // Other operations share the endpoint; the marker picks ours out.
        if !post_data.contains(&self.operation) {
            return Ok(());
        }

        info!(url = %url, "captured response for GraphQL query");
        let body = self.page.response_json(&event.request_id).await?;
        let vehicles = response::vehicle_summary(&body, &self.operation)?;
        info!(count = vehicles.len(), "found vehicle(s)");
        inventory.append(vehicles);
        Ok(())
    }
}
