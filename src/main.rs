use clap::Parser;
use inventory_harvester::adapters::chrome::ChromeSession;
use inventory_harvester::core::session;
use inventory_harvester::utils::logger;
use inventory_harvester::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    logger::init(&config.log_level);

    tracing::info!("starting inventory-harvester");
    tracing::debug!(?config, "parsed configuration");

    if let Err(e) = run(&config).await {
        tracing::error!("harvest failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(config: &CliConfig) -> inventory_harvester::Result<()> {
    let browser = ChromeSession::launch(config).await?;

    // The browser must be released even when the harvest fails.
    let result = session::run_and_export(browser.page(), config).await;
    browser.close().await;
    result.map(|_| ())
}
