pub mod bridge;
pub mod export;
pub mod interceptor;
pub mod paging;
pub mod response;
pub mod session;

use std::time::Duration;

pub const BASE_URL: &str = "https://www.toyota.com/search-inventory/model";
pub const GRAPHQL_URI: &str = "https://api.search-inventory.toyota.com/graphql";

/// Operation marker: the endpoint serves several operations; only exchanges
/// whose request body mentions this name are harvested.
pub const GRAPHQL_OPERATION: &str = "locateVehiclesByZip";

pub const NAVIGATE_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_QUERY_TEMPLATE: &str = include_str!("query.graphql");

pub use interceptor::ResponseInterceptor;
pub use paging::PagedQueryDriver;
