//! Paging mode: actively issue the paged GraphQL query from injected script,
//! one page at a time.

use crate::core::{bridge, response, GRAPHQL_OPERATION, NAVIGATE_TIMEOUT};
use crate::domain::model::{Inventory, PageCursor, QueryParameters};
use crate::domain::ports::BrowserPage;
use crate::utils::error::{HarvestError, Result};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

pub struct PagedQueryDriver<'a, P: BrowserPage + ?Sized> {
    page: &'a P,
    template: String,
}

impl<P: BrowserPage + ?Sized> std::fmt::Debug for PagedQueryDriver<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedQueryDriver")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl<'a, P: BrowserPage + ?Sized> PagedQueryDriver<'a, P> {
    pub fn new(page: &'a P, template: String) -> Result<Self> {
        if !template.contains("{pageNo}") {
            return Err(HarvestError::Config {
                message: "query template is missing the {pageNo} placeholder".to_string(),
            });
        }
        Ok(Self { page, template })
    }

    /// Navigate once to establish the page context the fetch runs under,
    /// then walk pages sequentially. The total page count is re-read from
    /// every response, so the loop self-corrects if the upstream total
    /// changes mid-run. One fetch in flight at a time; the bridge callable
    /// names are reused across iterations.
    pub async fn harvest(&self, params: &QueryParameters, context_url: &str) -> Result<Inventory> {
        self.harvest_with_timeout(params, context_url, NAVIGATE_TIMEOUT)
            .await
    }

    pub async fn harvest_with_timeout(
        &self,
        params: &QueryParameters,
        context_url: &str,
        timeout: Duration,
    ) -> Result<Inventory> {
        self.page.navigate(context_url, timeout).await?;

        let query = render_parameters(&self.template, params);
        debug!(query = %query, "rendered query template");

        let mut inventory = Inventory::new();
        let mut cursor = PageCursor::new();

        while cursor.has_next() {
            let paged = substitute_once(&query, "pageNo", &cursor.page_no.to_string());
            let body = bridge::execute_query(self.page, &paged).await?;

            cursor.observe_total(response::total_pages(&body, GRAPHQL_OPERATION)?);
            debug!(
                page = cursor.page_no,
                total_pages = cursor.total_pages,
                "query indicated total pages"
            );

            let vehicles = response::vehicle_summary(&body, GRAPHQL_OPERATION)?;
            info!(page = cursor.page_no, count = vehicles.len(), "found vehicle(s)");
            inventory.append(vehicles);
            cursor.advance();
        }

        Ok(inventory)
    }
}

/// Substitute the named parameters and a fresh lead identifier, each exactly
/// once. The `{pageNo}` placeholder is left for the per-page pass.
fn render_parameters(template: &str, params: &QueryParameters) -> String {
    let mut query = template.to_string();
    for (key, value) in params.pairs() {
        query = substitute_once(&query, key, &value);
    }
    substitute_once(&query, "leadid", &Uuid::new_v4().to_string())
}

fn substitute_once(template: &str, key: &str, value: &str) -> String {
    template.replacen(&format!("{{{key}}}"), value, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> QueryParameters {
        QueryParameters {
            model: "corolla".to_string(),
            zipcode: "97204".to_string(),
            distance: 20,
            sale_pending: true,
            in_transit: false,
        }
    }

    #[test]
    fn substitution_replaces_only_the_first_occurrence() {
        let rendered = substitute_once("{pageNo} and again {pageNo}", "pageNo", "3");
        assert_eq!(rendered, "3 and again {pageNo}");
    }

    #[test]
    fn all_parameters_are_rendered() {
        let template =
            "m={model} z={zipcode} d={distance} s={salePending} t={inTransit} l={leadid} p={pageNo}";
        let rendered = render_parameters(template, &params());

        assert!(rendered.contains("m=corolla"));
        assert!(rendered.contains("z=97204"));
        assert!(rendered.contains("d=20"));
        assert!(rendered.contains("s=true"));
        assert!(rendered.contains("t=false"));
        assert!(!rendered.contains("{leadid}"));
        // pageNo is substituted per page, not here.
        assert!(rendered.contains("p={pageNo}"));
    }

    #[test]
    fn lead_identifier_is_fresh_per_render() {
        let first = render_parameters("{leadid}", &params());
        let second = render_parameters("{leadid}", &params());
        assert_ne!(first, second);
    }
}
