use crate::error::ParseError;
use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;

/// Zones accepted for a station's local time.
pub const CANADIAN_ZONES: &[&str] = &[
    "America/Atikokan",
    "America/Blanc-Sablon",
    "America/Cambridge_Bay",
    "America/Creston",
    "America/Dawson",
    "America/Dawson_Creek",
    "America/Edmonton",
    "America/Fort_Nelson",
    "America/Glace_Bay",
    "America/Goose_Bay",
    "America/Halifax",
    "America/Inuvik",
    "America/Iqaluit",
    "America/Moncton",
    "America/Montreal",
    "America/Nipigon",
    "America/Pangnirtung",
    "America/Rainy_River",
    "America/Rankin_Inlet",
    "America/Regina",
    "America/Resolute",
    "America/St_Johns",
    "America/Swift_Current",
    "America/Thunder_Bay",
    "America/Toronto",
    "America/Vancouver",
    "America/Whitehorse",
    "America/Winnipeg",
    "America/Yellowknife",
];

pub fn parse_zone(name: &str) -> Result<Tz> {
    if !CANADIAN_ZONES.contains(&name) {
        return Err(anyhow!("{name} is not a Canadian timezone"));
    }
    name.parse::<Tz>().map_err(|e| anyhow!("{e}"))
}

/// The offset the zone had at the Unix epoch.
///
/// This is taken as the station's "standard time" even when the zone's
/// standard offset has since changed (Whitehorse was UTC-8 in 1970 and is
/// UTC-7 today), so readings from such zones are tagged with the 1970 offset.
pub fn standard_offset(tz: Tz) -> FixedOffset {
    // NaiveDateTime's default is 1970-01-01T00:00:00
    let epoch = NaiveDateTime::default();
    tz.offset_from_utc_datetime(&epoch).fix()
}

/// Date and time components as they appear on a `stationdata` block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObservationTime {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
}

/// Builds the standard-time instant and the same instant on the zone's wall
/// clock. Returns `None` when any component is missing.
pub fn normalize(
    time: &ObservationTime,
    standard: FixedOffset,
    tz: Tz,
) -> Result<Option<(DateTime<FixedOffset>, DateTime<Tz>)>, ParseError> {
    let (Some(year), Some(month), Some(day), Some(hour), Some(minute)) =
        (time.year, time.month, time.day, time.hour, time.minute)
    else {
        return Ok(None);
    };

    let Some(standard_time) = standard
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
    else {
        return Err(ParseError::InvalidTimestamp {
            year,
            month,
            day,
            hour,
            minute,
        });
    };
    let local = standard_time.with_timezone(&tz);
    Ok(Some((standard_time, local)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> ObservationTime {
        ObservationTime {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            hour: Some(hour),
            minute: Some(minute),
        }
    }

    #[test]
    fn toronto_standard_offset_is_minus_five() {
        let offset = standard_offset(Tz::America__Toronto);
        assert_eq!(offset.local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn epoch_offset_is_kept_for_zones_that_changed() {
        // Yukon moved to permanent UTC-7 in 2020
        let offset = standard_offset(Tz::America__Whitehorse);
        assert_eq!(offset.local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn winter_reading_is_identical_in_both_zones() {
        let tz = Tz::America__Toronto;
        let (std, local) = normalize(&time(2010, 1, 1, 13, 0), standard_offset(tz), tz)
            .unwrap()
            .unwrap();
        assert_eq!(std.to_rfc3339(), "2010-01-01T13:00:00-05:00");
        assert_eq!(local.to_rfc3339(), "2010-01-01T13:00:00-05:00");
        assert_eq!(std, local);
    }

    #[test]
    fn summer_reading_is_shifted_to_daylight_time() {
        let tz = Tz::America__Toronto;
        let (std, local) = normalize(&time(2010, 7, 1, 13, 0), standard_offset(tz), tz)
            .unwrap()
            .unwrap();
        assert_eq!(std.hour(), 13);
        assert_eq!(local.hour(), 14);
        assert_eq!(local.to_rfc3339(), "2010-07-01T14:00:00-04:00");
        assert_eq!(std, local);
    }

    #[test]
    fn seconds_are_zero() {
        let tz = Tz::America__Regina;
        let (std, _) = normalize(&time(2012, 3, 4, 5, 30), standard_offset(tz), tz)
            .unwrap()
            .unwrap();
        assert_eq!(std.second(), 0);
        assert_eq!(std.nanosecond(), 0);
    }

    #[test]
    fn missing_component_yields_none() {
        let tz = Tz::America__Toronto;
        let mut partial = time(2010, 1, 1, 13, 0);
        partial.minute = None;
        assert!(normalize(&partial, standard_offset(tz), tz).unwrap().is_none());
    }

    #[test]
    fn impossible_date_is_an_error() {
        let tz = Tz::America__Toronto;
        let result = normalize(&time(2010, 2, 30, 0, 0), standard_offset(tz), tz);
        assert!(matches!(result, Err(ParseError::InvalidTimestamp { .. })));
    }

    #[test]
    fn only_canadian_zones_are_accepted() {
        assert_eq!(parse_zone("America/Toronto").unwrap(), Tz::America__Toronto);
        assert!(parse_zone("Europe/London").is_err());
        assert!(parse_zone("America/Nowhere").is_err());
    }
}
