pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{CliConfig, Mode};
pub use domain::model::{Inventory, PageCursor, QueryParameters, VehicleRecord};
pub use domain::ports::{BrowserPage, CallableCalls, ResponseEvent, ResponseStream};
pub use utils::error::{HarvestError, Result};
