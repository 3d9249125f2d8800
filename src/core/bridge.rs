//! Script-bridge query execution: run one GraphQL query from inside the page
//! context and hand its parsed result back to the host.
//!
//! The host and the page only share an injectable-script plus
//! exposed-callable boundary, so each call exposes a success and an error
//! callable, injects a fetch that reports through them, and awaits whichever
//! fires first. Both callables are torn down on every exit path; the names
//! are reused by the next call and must never be double-registered.

use crate::core::GRAPHQL_URI;
use crate::domain::ports::{BrowserPage, CallableCalls};
use crate::utils::error::{HarvestError, Result};
use serde_json::Value;
use tracing::debug;

pub const SUCCESS_CALLABLE: &str = "fetchSuccess";
pub const ERROR_CALLABLE: &str = "fetchError";

pub async fn execute_query<P: BrowserPage + ?Sized>(page: &P, query: &str) -> Result<Value> {
    let on_success = page.expose_callable(SUCCESS_CALLABLE).await?;
    let on_error = match page.expose_callable(ERROR_CALLABLE).await {
        Ok(calls) => calls,
        Err(err) => {
            let _ = page.remove_callable(SUCCESS_CALLABLE).await;
            return Err(err);
        }
    };

    let result = run_fetch(page, query, on_success, on_error).await;

    // Teardown must run whether the fetch succeeded or not; a leaked name
    // would collide with the next call's registration.
    let removed_success = page.remove_callable(SUCCESS_CALLABLE).await;
    let removed_error = page.remove_callable(ERROR_CALLABLE).await;

    let value = result?;
    removed_success?;
    removed_error?;
    Ok(value)
}

async fn run_fetch<P: BrowserPage + ?Sized>(
    page: &P,
    query: &str,
    mut on_success: CallableCalls,
    mut on_error: CallableCalls,
) -> Result<Value> {
    page.inject_script(&fetch_script(query)).await?;
    debug!("added script to execute graphql query");

    tokio::select! {
        payload = on_success.recv() => match payload {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Err(bridge_closed()),
        },
        message = on_error.recv() => match message {
            Some(message) => Err(HarvestError::Bridge { message }),
            None => Err(bridge_closed()),
        },
    }
}

fn bridge_closed() -> HarvestError {
    HarvestError::Bridge {
        message: "bridge closed without a result".to_string(),
    }
}

/// The callables take a single string argument, so the page side stringifies
/// the parsed body before handing it over.
fn fetch_script(query: &str) -> String {
    let body = serde_json::json!({ "query": query }).to_string();
    format!(
        r#"(() => {{
    fetch('{GRAPHQL_URI}', {{
        method: 'POST',
        headers: {{ 'Content-Type': 'application/json' }},
        body: JSON.stringify({body}),
    }})
        .then((response) => {{
            if (!response.ok) throw new Error('HTTP Error: ' + response.status);
            return response.json();
        }})
        .then((data) => {{ window.{SUCCESS_CALLABLE}(JSON.stringify(data)); }})
        .catch((error) => {{ window.{ERROR_CALLABLE}(String((error && error.message) || error)); }});
}})()"#
    )
}
