use crate::core::{BASE_URL, DEFAULT_QUERY_TEMPLATE};
use crate::domain::model::QueryParameters;
use crate::utils::error::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;

/// Harvesting strategy to run. The endpoint serves the same operation either
/// way; the strategies differ only in who issues the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Navigate the real search page and intercept the GraphQL exchanges it
    /// issues on its own.
    Listener,
    /// Navigate once for a page context, then issue a paged query from
    /// injected script.
    Paging,
}

/// Immutable run configuration. Every flag falls back to an environment
/// variable and then a default, so the tool works unattended.
#[derive(Debug, Clone, Parser)]
#[command(name = "inventory-harvester")]
#[command(about = "Harvest vehicle inventory from the dealer search page")]
pub struct CliConfig {
    #[arg(long, env = "MODEL", default_value = "corolla")]
    pub model: String,

    #[arg(long, env = "ZIPCODE", default_value = "97204")]
    pub zipcode: String,

    /// Search radius in miles.
    #[arg(long, env = "DISTANCE", default_value_t = 20)]
    pub distance: u32,

    #[arg(long, env = "SALEPENDING", default_value_t = true, action = ArgAction::Set)]
    pub sale_pending: bool,

    #[arg(long, env = "INTRANSIT", default_value_t = true, action = ArgAction::Set)]
    pub in_transit: bool,

    /// Write the full inventory as pretty-printed JSON to this path.
    #[arg(long, env = "JSON")]
    pub json: Option<PathBuf>,

    /// Write the fixed-column CSV to this path.
    #[arg(long, env = "CSV")]
    pub csv: Option<PathBuf>,

    #[arg(long, env = "MODE", value_enum, default_value_t = Mode::Listener)]
    pub mode: Mode,

    /// Override the bundled GraphQL query template (paging mode only).
    #[arg(long, env = "QUERY")]
    pub query: Option<PathBuf>,

    #[arg(long, env = "LOGLEVEL", default_value = "info")]
    pub log_level: String,

    /// Show the browser window instead of running headless.
    #[arg(long, env = "HEADED")]
    pub headed: bool,

    #[arg(long, env = "CHROME_EXECUTABLE_PATH")]
    pub chrome_path: Option<PathBuf>,
}

impl CliConfig {
    pub fn query_parameters(&self) -> QueryParameters {
        QueryParameters {
            model: self.model.clone(),
            zipcode: self.zipcode.clone(),
            distance: self.distance,
            sale_pending: self.sale_pending,
            in_transit: self.in_transit,
        }
    }

    /// Search-page URL carrying the full parameter set; the page's own
    /// scripts issue the queries we listen for.
    pub fn listener_url(&self) -> String {
        format!(
            "{}/{}/?zipcode={}&distance={}&salePending={}&inTransit={}",
            BASE_URL, self.model, self.zipcode, self.distance, self.sale_pending, self.in_transit
        )
    }

    /// Minimal URL establishing a valid page context for injected queries.
    pub fn paging_url(&self) -> String {
        format!("{}/{}/?zipcode={}", BASE_URL, self.model, self.zipcode)
    }

    pub fn query_template(&self) -> Result<String> {
        match &self.query {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => Ok(DEFAULT_QUERY_TEMPLATE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CliConfig {
        CliConfig {
            model: "rav4".to_string(),
            zipcode: "97204".to_string(),
            distance: 50,
            sale_pending: true,
            in_transit: false,
            json: None,
            csv: None,
            mode: Mode::Listener,
            query: None,
            log_level: "info".to_string(),
            headed: false,
            chrome_path: None,
        }
    }

    #[test]
    fn listener_url_carries_all_parameters() {
        assert_eq!(
            config().listener_url(),
            "https://www.toyota.com/search-inventory/model/rav4/?zipcode=97204&distance=50&salePending=true&inTransit=false"
        );
    }

    #[test]
    fn paging_url_only_needs_zipcode() {
        assert_eq!(
            config().paging_url(),
            "https://www.toyota.com/search-inventory/model/rav4/?zipcode=97204"
        );
    }

    #[test]
    fn bundled_template_is_the_default() {
        let template = config().query_template().unwrap();
        assert!(template.contains("locateVehiclesByZip"));
        assert!(template.contains("{pageNo}"));
    }
}
