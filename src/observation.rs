use crate::coerce::{attribute, child_text, parse_field, parse_text, parse_wind_direction};
use crate::error::ParseError;
use crate::timestamp::{normalize, ObservationTime};
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use xmltree::Element;

/// One hourly reading from a `stationdata` block.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub station_id: u32,
    pub temp_c: Option<f64>,
    pub dewpoint_temp_c: Option<f64>,
    pub rel_humidity_pct: Option<i32>,
    pub wind_dir_deg: Option<i32>,
    pub wind_speed_kph: Option<i32>,
    pub visibility_km: Option<f64>,
    pub station_pressure_kpa: Option<f64>,
    pub humidex: Option<f64>,
    pub wind_chill: Option<i32>,
    pub weather_desc: Option<String>,
    pub obs_quality: Option<String>,
    /// Observation time at the station's standard offset
    pub obs_datetime_std: Option<DateTime<FixedOffset>>,
    /// The same instant on the station's wall clock
    pub obs_datetime_dst: Option<DateTime<Tz>>,
}

fn time_attribute<T: std::str::FromStr>(
    block: &Element,
    name: &str,
) -> Result<Option<T>, ParseError> {
    parse_field(name, attribute(block, name))
}

fn reading<T: std::str::FromStr>(block: &Element, name: &str) -> Result<Option<T>, ParseError> {
    parse_field(name, child_text(block, name).as_deref())
}

pub fn parse_observation(
    station_id: u32,
    block: &Element,
    standard: FixedOffset,
    tz: Tz,
) -> Result<Observation, ParseError> {
    let time = ObservationTime {
        year: time_attribute(block, "year")?,
        month: time_attribute(block, "month")?,
        day: time_attribute(block, "day")?,
        hour: time_attribute(block, "hour")?,
        minute: time_attribute(block, "minute")?,
    };
    let (obs_datetime_std, obs_datetime_dst) = match normalize(&time, standard, tz)? {
        Some((std, local)) => (Some(std), Some(local)),
        None => (None, None),
    };

    Ok(Observation {
        station_id,
        temp_c: reading(block, "temp")?,
        dewpoint_temp_c: reading(block, "dptemp")?,
        rel_humidity_pct: reading(block, "relhum")?,
        wind_dir_deg: parse_wind_direction(child_text(block, "winddir").as_deref())?,
        wind_speed_kph: reading(block, "windspd")?,
        visibility_km: reading(block, "visibility")?,
        station_pressure_kpa: reading(block, "stnpress")?,
        humidex: reading(block, "humidex")?,
        wind_chill: reading(block, "windchill")?,
        weather_desc: parse_text(child_text(block, "weather").as_deref()),
        obs_quality: parse_text(attribute(block, "quality")),
        obs_datetime_std,
        obs_datetime_dst,
    })
}
