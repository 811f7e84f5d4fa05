use crate::coerce::{child_text, parse_field, parse_text};
use crate::error::ParseError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use xmltree::Element;

/// Metadata for one climate station, taken from a `stationinformation` block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: u32,
    pub name: Option<String>,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    pub climate_identifier: Option<i64>,
    pub local_tz: Tz,
}

impl Station {
    pub fn new(station_id: u32, local_tz: Tz) -> Self {
        Self {
            station_id,
            name: None,
            province: None,
            latitude: None,
            longitude: None,
            elevation: None,
            climate_identifier: None,
            local_tz,
        }
    }

    /// Fills in fields from a `stationinformation` block. Blank or missing
    /// fields keep whatever an earlier block set.
    pub fn with_information(self, info: &Element) -> Result<Self, ParseError> {
        let field = |name: &str| child_text(info, name);
        Ok(Self {
            name: parse_text(field("name").as_deref()).or(self.name),
            province: parse_text(field("province").as_deref()).or(self.province),
            latitude: parse_field("latitude", field("latitude").as_deref())?.or(self.latitude),
            longitude: parse_field("longitude", field("longitude").as_deref())?.or(self.longitude),
            elevation: parse_field("elevation", field("elevation").as_deref())?.or(self.elevation),
            climate_identifier: parse_field(
                "climate_identifier",
                field("climate_identifier").as_deref(),
            )?
            .or(self.climate_identifier),
            ..self
        })
    }
}
