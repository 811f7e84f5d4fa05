use crate::history::History;
use crate::observation::Observation;
use crate::station::Station;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Offset};
use chrono_tz::Tz;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use tracing::info;

const STATION_HEADERS: [&str; 8] = [
    "station_id",
    "name",
    "province",
    "latitude",
    "longitude",
    "elevation",
    "climate_identifier",
    "local_tz",
];

const OBSERVATION_HEADERS: [&str; 14] = [
    "station_id",
    "temp_c",
    "dewpoint_temp_c",
    "rel_humidity_pct",
    "wind_dir_deg",
    "wind_speed_kph",
    "visibility_km",
    "station_pressure_kpa",
    "humidex",
    "wind_chill",
    "weather_desc",
    "obs_quality",
    "obs_datetime_std",
    "obs_datetime_dst",
];

/// An observation row. Local time is written with its offset and put back
/// into the station's zone when read.
#[derive(Debug, Serialize, Deserialize)]
struct ObservationRecord {
    station_id: u32,
    temp_c: Option<f64>,
    dewpoint_temp_c: Option<f64>,
    rel_humidity_pct: Option<i32>,
    wind_dir_deg: Option<i32>,
    wind_speed_kph: Option<i32>,
    visibility_km: Option<f64>,
    station_pressure_kpa: Option<f64>,
    humidex: Option<f64>,
    wind_chill: Option<i32>,
    weather_desc: Option<String>,
    obs_quality: Option<String>,
    obs_datetime_std: Option<DateTime<FixedOffset>>,
    obs_datetime_dst: Option<DateTime<FixedOffset>>,
}

impl From<&Observation> for ObservationRecord {
    fn from(o: &Observation) -> Self {
        Self {
            station_id: o.station_id,
            temp_c: o.temp_c,
            dewpoint_temp_c: o.dewpoint_temp_c,
            rel_humidity_pct: o.rel_humidity_pct,
            wind_dir_deg: o.wind_dir_deg,
            wind_speed_kph: o.wind_speed_kph,
            visibility_km: o.visibility_km,
            station_pressure_kpa: o.station_pressure_kpa,
            humidex: o.humidex,
            wind_chill: o.wind_chill,
            weather_desc: o.weather_desc.clone(),
            obs_quality: o.obs_quality.clone(),
            obs_datetime_std: o.obs_datetime_std,
            obs_datetime_dst: o
                .obs_datetime_dst
                .map(|d| d.with_timezone(&d.offset().fix())),
        }
    }
}

impl ObservationRecord {
    fn into_observation(self, tz: Tz) -> Observation {
        Observation {
            station_id: self.station_id,
            temp_c: self.temp_c,
            dewpoint_temp_c: self.dewpoint_temp_c,
            rel_humidity_pct: self.rel_humidity_pct,
            wind_dir_deg: self.wind_dir_deg,
            wind_speed_kph: self.wind_speed_kph,
            visibility_km: self.visibility_km,
            station_pressure_kpa: self.station_pressure_kpa,
            humidex: self.humidex,
            wind_chill: self.wind_chill,
            weather_desc: self.weather_desc,
            obs_quality: self.obs_quality,
            obs_datetime_std: self.obs_datetime_std,
            obs_datetime_dst: self.obs_datetime_dst.map(|d| d.with_timezone(&tz)),
        }
    }
}

pub fn write_stations(path: &Path, stations: &[Station]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(STATION_HEADERS)?;
    for station in stations {
        writer.serialize(station)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_observations(path: &Path, observations: &[Observation]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(OBSERVATION_HEADERS)?;
    for observation in observations {
        writer.serialize(ObservationRecord::from(observation))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_stations(path: &Path) -> Result<Vec<Station>> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let mut stations = Vec::new();
    for record in reader.deserialize() {
        stations.push(record?);
    }
    Ok(stations)
}

pub fn read_observations(path: &Path, tz: Tz) -> Result<Vec<Observation>> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let mut observations = Vec::new();
    for record in reader.deserialize::<ObservationRecord>() {
        observations.push(record?.into_observation(tz));
    }
    Ok(observations)
}

/// Writes `station_<id>.csv` and `observations_<id>.csv` into `dir`.
pub fn save_history(dir: &Path, history: &History) -> Result<(PathBuf, PathBuf)> {
    create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let id = history.station.station_id;
    let station_path = dir.join(format!("station_{id}.csv"));
    let observations_path = dir.join(format!("observations_{id}.csv"));

    write_stations(&station_path, std::slice::from_ref(&history.station))?;
    info!("Wrote station to {}", station_path.display());
    write_observations(&observations_path, &history.observations)?;
    info!(
        "Wrote {} observations to {}",
        history.observations.len(),
        observations_path.display()
    );
    Ok((station_path, observations_path))
}
