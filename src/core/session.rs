//! One harvesting run: a single tab, exactly one strategy, the finished
//! inventory as the only artifact.

use crate::config::{CliConfig, Mode};
use crate::core::{export, PagedQueryDriver, ResponseInterceptor, NAVIGATE_TIMEOUT};
use crate::domain::model::Inventory;
use crate::domain::ports::BrowserPage;
use crate::utils::error::Result;
use tracing::info;

pub async fn run<P: BrowserPage + ?Sized>(page: &P, config: &CliConfig) -> Result<Inventory> {
    let inventory = match config.mode {
        Mode::Listener => {
            info!("running with listener on page queries");
            let interceptor = ResponseInterceptor::new(page);
            interceptor
                .harvest(&config.listener_url(), NAVIGATE_TIMEOUT)
                .await?
        }
        Mode::Paging => {
            info!("running with custom paged query");
            let driver = PagedQueryDriver::new(page, config.query_template()?)?;
            driver
                .harvest(&config.query_parameters(), &config.paging_url())
                .await?
        }
    };

    info!(total = inventory.len(), "harvest complete");
    Ok(inventory)
}

/// Runs the harvest and then the requested output writers. Writers only run
/// against a completed harvest; a failed run leaves no output files behind.
pub async fn run_and_export<P: BrowserPage + ?Sized>(
    page: &P,
    config: &CliConfig,
) -> Result<Inventory> {
    let inventory = run(page, config).await?;

    info!(
        "found a total of {} inventory entr(ies) to write",
        inventory.len()
    );

    if let Some(path) = &config.json {
        export::write_json(&inventory, path)?;
        info!("inventory JSON written to {}", path.display());
    }

    if let Some(path) = &config.csv {
        export::write_csv(&inventory, path)?;
        info!("inventory CSV written to {}", path.display());
    }

    Ok(inventory)
}
