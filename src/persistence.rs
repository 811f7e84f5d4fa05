use crate::history::History;
use crate::observation::Observation;
use crate::station::Station;
use anyhow::{anyhow, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use rusqlite::types::Value;
use rusqlite::{named_params, params, params_from_iter, Connection};
use std::path::PathBuf;
use tracing::{debug, info};

/// Keeps a multi-row insert under SQLite's bound parameter limit.
pub const MAX_BATCH_SIZE: usize = 2000;

const OBSERVATION_COLUMNS: [&str; 14] = [
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

pub struct Database {
    path: PathBuf,
    pub conn: Connection,
}

impl Database {
    pub fn from_path(path: PathBuf) -> Result<Database> {
        let connection = Connection::open(&path)?;
        Ok(Self {
            path,
            conn: connection,
        })
    }

    pub fn in_memory() -> Result<Database> {
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn init(&self) -> Result<()> {
        info!("creating database at {}", self.path.display());
        self.conn.execute_batch(include_str!("../sql/schema.sql"))?;
        Ok(())
    }

    /// Returns true when the station was not already present.
    pub fn insert_station_if_absent(&self, station: &Station) -> Result<bool> {
        insert_station(&self.conn, station)
    }

    pub fn insert_observations(
        &self,
        observations: &[Observation],
        batch_size: usize,
    ) -> Result<()> {
        insert_observations(&self.conn, observations, batch_size)
    }

    /// Writes the station and all observations in one transaction.
    pub fn save_history(&mut self, history: &History, batch_size: usize) -> Result<()> {
        let tx = self.conn.transaction()?;
        if insert_station(&tx, &history.station)? {
            info!("Added station {}", history.station.station_id);
        }
        insert_observations(&tx, &history.observations, batch_size)?;
        tx.commit()?;
        info!(
            "Saved {} observations to {}",
            history.observations.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn get_station(&self, station_id: u32) -> Result<Option<Station>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM station WHERE station_id = (?)")?;
        let mut binding = stmt.query(params![station_id])?;
        let Some(row) = binding.next()? else {
            return Ok(None);
        };
        let tz_name: String = row.get(7)?;

        Ok(Some(Station {
            station_id: row.get(0)?,
            name: row.get(1)?,
            province: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            elevation: row.get(5)?,
            climate_identifier: row.get(6)?,
            local_tz: parse_tz(&tz_name)?,
        }))
    }

    pub fn count_observations(&self, station_id: u32) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM observation WHERE station_id = (?)",
            params![station_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Observations for a station in insertion order.
    pub fn get_observations(&self, station_id: u32) -> Result<Vec<Observation>> {
        let Some(station) = self.get_station(station_id)? else {
            return Err(anyhow!(
                "No record of station {} in {}",
                station_id,
                self.path.display()
            ));
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM observation WHERE station_id = (?) ORDER BY id",
            OBSERVATION_COLUMNS.join(", ")
        ))?;
        let mut rows = stmt.query(params![station_id])?;

        let mut observations = Vec::new();
        while let Some(row) = rows.next()? {
            let standard: Option<String> = row.get(12)?;
            let local: Option<String> = row.get(13)?;
            observations.push(Observation {
                station_id: row.get(0)?,
                temp_c: row.get(1)?,
                dewpoint_temp_c: row.get(2)?,
                rel_humidity_pct: row.get(3)?,
                wind_dir_deg: row.get(4)?,
                wind_speed_kph: row.get(5)?,
                visibility_km: row.get(6)?,
                station_pressure_kpa: row.get(7)?,
                humidex: row.get(8)?,
                wind_chill: row.get(9)?,
                weather_desc: row.get(10)?,
                obs_quality: row.get(11)?,
                obs_datetime_std: standard
                    .map(|s| DateTime::parse_from_rfc3339(&s))
                    .transpose()?,
                obs_datetime_dst: local
                    .map(|s| DateTime::parse_from_rfc3339(&s))
                    .transpose()?
                    .map(|d| d.with_timezone(&station.local_tz)),
            });
        }
        Ok(observations)
    }
}

fn parse_tz(name: &str) -> Result<Tz> {
    name.parse().map_err(|e| anyhow!("{e}"))
}

fn insert_station(conn: &Connection, station: &Station) -> Result<bool> {
    let mut stmt = conn.prepare_cached(include_str!("../sql/insert_station.sql"))?;
    let inserted = stmt.execute(named_params! {
        ":station_id": station.station_id,
        ":name": station.name,
        ":province": station.province,
        ":latitude": station.latitude,
        ":longitude": station.longitude,
        ":elevation": station.elevation,
        ":climate_identifier": station.climate_identifier,
        ":local_tz": station.local_tz.name(),
    })?;
    Ok(inserted > 0)
}

fn observation_values(observation: &Observation) -> [Value; 14] {
    [
        Value::from(i64::from(observation.station_id)),
        Value::from(observation.temp_c),
        Value::from(observation.dewpoint_temp_c),
        Value::from(observation.rel_humidity_pct),
        Value::from(observation.wind_dir_deg),
        Value::from(observation.wind_speed_kph),
        Value::from(observation.visibility_km),
        Value::from(observation.station_pressure_kpa),
        Value::from(observation.humidex),
        Value::from(observation.wind_chill),
        Value::from(observation.weather_desc.clone()),
        Value::from(observation.obs_quality.clone()),
        Value::from(observation.obs_datetime_std.map(|d| d.to_rfc3339())),
        Value::from(observation.obs_datetime_dst.map(|d| d.to_rfc3339())),
    ]
}

fn insert_sql(rows: usize) -> String {
    let row = format!("({})", vec!["?"; OBSERVATION_COLUMNS.len()].join(", "));
    format!(
        "INSERT INTO observation ({}) VALUES {}",
        OBSERVATION_COLUMNS.join(", "),
        vec![row; rows].join(", ")
    )
}

/// Inserts in batches of `batch_size` rows; the last batch holds the remainder.
fn insert_observations(
    conn: &Connection,
    observations: &[Observation],
    batch_size: usize,
) -> Result<()> {
    if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
        return Err(anyhow!(
            "batch size must be between 1 and {MAX_BATCH_SIZE}, not {batch_size}"
        ));
    }
    for batch in observations.chunks(batch_size) {
        debug!("Inserting batch of {} observations", batch.len());
        let mut stmt = conn.prepare_cached(&insert_sql(batch.len()))?;
        let values = batch.iter().flat_map(observation_values);
        stmt.execute(params_from_iter(values))?;
    }
    Ok(())
}
