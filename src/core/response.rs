//! Helpers for digging the operation's result out of a GraphQL response body.

use crate::domain::model::VehicleRecord;
use crate::utils::error::{HarvestError, Result};
use serde_json::Value;

/// Vehicle list under `data.<operation>.vehicleSummary`, in response order.
pub fn vehicle_summary(body: &Value, operation: &str) -> Result<Vec<VehicleRecord>> {
    let vehicles = body
        .get("data")
        .and_then(|data| data.get(operation))
        .and_then(|op| op.get("vehicleSummary"))
        .and_then(Value::as_array)
        .ok_or_else(|| HarvestError::MalformedResponse {
            path: format!("data.{operation}.vehicleSummary"),
        })?;

    Ok(vehicles.iter().cloned().map(VehicleRecord::from).collect())
}

/// Total page count under `data.<operation>.pagination.totalPages`.
pub fn total_pages(body: &Value, operation: &str) -> Result<u32> {
    body.get("data")
        .and_then(|data| data.get(operation))
        .and_then(|op| op.get("pagination"))
        .and_then(|pagination| pagination.get("totalPages"))
        .and_then(Value::as_u64)
        .map(|total| total as u32)
        .ok_or_else(|| HarvestError::MalformedResponse {
            path: format!("data.{operation}.pagination.totalPages"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_vehicles_in_order() {
        let body = json!({
            "data": {
                "locateVehiclesByZip": {
                    "vehicleSummary": [{"vin": "A"}, {"vin": "B"}]
                }
            }
        });

        let vehicles = vehicle_summary(&body, "locateVehiclesByZip").unwrap();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].text(&["vin"]).unwrap(), "A");
        assert_eq!(vehicles[1].text(&["vin"]).unwrap(), "B");
    }

    #[test]
    fn missing_vehicle_list_names_the_path() {
        let body = json!({"data": {"locateVehiclesByZip": {}}});
        let err = vehicle_summary(&body, "locateVehiclesByZip").unwrap_err();
        assert!(err
            .to_string()
            .contains("data.locateVehiclesByZip.vehicleSummary"));
    }

    #[test]
    fn reads_total_pages() {
        let body = json!({
            "data": {
                "locateVehiclesByZip": {"pagination": {"totalPages": 7}}
            }
        });
        assert_eq!(total_pages(&body, "locateVehiclesByZip").unwrap(), 7);
    }

    #[test]
    fn missing_pagination_names_the_path() {
        let body = json!({"data": {"locateVehiclesByZip": {}}});
        let err = total_pages(&body, "locateVehiclesByZip").unwrap_err();
        assert!(err
            .to_string()
            .contains("data.locateVehiclesByZip.pagination.totalPages"));
    }
}
