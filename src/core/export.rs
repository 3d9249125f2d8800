//! Inventory serialization: pretty-printed JSON and the fixed-column CSV.
//!
//! Every CSV column is an explicit accessor over the opaque record; a record
//! missing any accessed sub-field fails the whole export. Writers only run
//! after a fully successful harvest, so there is no partial output.

use crate::domain::model::{Inventory, VehicleRecord};
use crate::utils::error::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

type Accessor = fn(&VehicleRecord) -> Result<String>;

pub const COLUMNS: &[(&str, Accessor)] = &[
    ("VIN", |v| v.text(&["vin"])),
    ("Name", |v| v.text(&["model", "marketingName"])),
    ("Model", |v| v.text(&["model", "marketingTitle"])),
    ("Year", |v| v.text(&["year"])),
    ("Status", |v| v.text(&["inventoryStatus"])),
    ("Base MSRP", |v| v.text(&["price", "baseMsrp"])),
    ("Total MSRP", |v| v.text(&["price", "totalMsrp"])),
    ("Advertised Price", |v| v.text(&["price", "advertisedPrice"])),
    ("Selling Price", |v| v.text(&["price", "sellingPrice"])),
    ("Exterior Color", |v| v.text(&["extColor", "marketingName"])),
    ("Interior Color", |v| v.text(&["intColor", "marketingName"])),
    ("Engine", |v| v.text(&["engine", "name"])),
    ("Drivetrain", |v| v.text(&["drivetrain", "title"])),
    ("Transmission", |v| v.text(&["transmission", "transmissionType"])),
    ("MPG City", |v| v.text(&["mpg", "city"])),
    ("MPG Highway", |v| v.text(&["mpg", "highway"])),
    ("MPG Combined", |v| v.text(&["mpg", "combined"])),
    ("Dealer", |v| v.text(&["dealerMarketingName"])),
    ("Dealer Website", |v| v.text(&["dealerWebsite"])),
    ("Distance", |v| v.text(&["distance"])),
    ("Option Codes", |v| v.joined(&["options"], "optionCd")),
    ("Option Names", |v| v.joined(&["options"], "marketingName")),
];

pub fn write_json(inventory: &Inventory, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(inventory.records())?;
    fs::write(path, json)?;
    debug!(path = %path.display(), records = inventory.len(), "wrote inventory JSON");
    Ok(())
}

pub fn write_csv(inventory: &Inventory, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS.iter().map(|(name, _)| *name))?;

    for record in inventory.records() {
        let row = COLUMNS
            .iter()
            .map(|(_, accessor)| accessor(record))
            .collect::<Result<Vec<_>>>()?;
        writer.write_record(&row)?;
    }

    writer.flush()?;
    debug!(path = %path.display(), records = inventory.len(), "wrote inventory CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_fixed_and_ordered() {
        let names: Vec<_> = COLUMNS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), 22);
        assert_eq!(names[0], "VIN");
        assert_eq!(names[21], "Option Names");
    }
}
