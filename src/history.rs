use crate::client::{PageRequest, PageSource};
use crate::observation::Observation;
use crate::page::parse_page;
use crate::station::Station;
use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use tracing::{debug, info};

/// An inclusive span of calendar months, fetched one page per month.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthRange {
    start: (i32, u32),
    end: (i32, u32),
    day_start: u32,
}

impl MonthRange {
    pub fn new(
        year_start: i32,
        month_start: u32,
        year_end: i32,
        month_end: u32,
        day_start: u32,
    ) -> Result<Self> {
        for month in [month_start, month_end] {
            if !(1..=12).contains(&month) {
                return Err(anyhow!("{month} is not a valid month"));
            }
        }
        if !(1..=31).contains(&day_start) {
            return Err(anyhow!("{day_start} is not a valid day"));
        }
        let start = (year_start, month_start);
        let end = (year_end, month_end);
        if end < start {
            return Err(anyhow!(
                "range ends ({year_end}-{month_end:02}) \
                 before it starts ({year_start}-{month_start:02})"
            ));
        }
        Ok(Self {
            start,
            end,
            day_start,
        })
    }

    pub fn day_start(&self) -> u32 {
        self.day_start
    }

    /// Each `(year, month)` in the range, oldest first.
    pub fn months(&self) -> impl Iterator<Item = (i32, u32)> {
        let end = self.end;
        let mut cursor = Some(self.start);
        std::iter::from_fn(move || {
            let current = cursor.filter(|c| *c <= end)?;
            let (year, month) = current;
            // There is no month after December of the last representable year
            cursor = if month == 12 {
                year.checked_add(1).map(|next| (next, 1))
            } else {
                Some((year, month + 1))
            };
            Some(current)
        })
    }
}

/// A station and every observation fetched for it over a range.
#[derive(Debug)]
pub struct History {
    pub station: Station,
    pub observations: Vec<Observation>,
}

/// Fetches and parses each month in turn. Station metadata comes from the
/// first page only, merged across its `stationinformation` blocks. Any
/// failure aborts the whole range.
pub fn fetch_range(
    source: &impl PageSource,
    station_id: u32,
    range: &MonthRange,
    tz: Tz,
) -> Result<History> {
    let mut station = Station::new(station_id, tz);
    let mut observations = Vec::new();
    let mut have_station = false;

    for (year, month) in range.months() {
        let request = PageRequest {
            station_id,
            year,
            month,
            day: range.day_start(),
        };
        info!("Fetching {year}-{month:02} for station {station_id}");
        let xml = source
            .fetch_page(&request)
            .with_context(|| format!("fetching {year}-{month:02} for station {station_id}"))?;
        let page = parse_page(&xml, station_id, tz)
            .with_context(|| format!("parsing {year}-{month:02} for station {station_id}"))?;
        debug!("{} observations in {year}-{month:02}", page.observations.len());

        if !have_station {
            for info in &page.information {
                station = station.with_information(info)?;
            }
            have_station = true;
        }
        observations.extend(page.observations);
    }

    info!(
        "Fetched {} observations for station {station_id}",
        observations.len()
    );
    Ok(History {
        station,
        observations,
    })
}
