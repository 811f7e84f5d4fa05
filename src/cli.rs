use crate::client::Client;
use crate::config::Config;
use crate::csv_store;
use crate::history::{fetch_range, History, MonthRange};
use crate::logging::{setup_logging, LogLevel};
use crate::timestamp::parse_zone;
use anyhow::Result;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn default(path: &Path) -> String {
    format!("[default: {}]", path.as_os_str().to_string_lossy())
}

/// Environment Canada historical weather importer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long = "config", value_name = "FILE", help = default(&Config::default_path()))]
    pub config_path: Option<PathBuf>,

    /// [default: info]
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch hourly observations for a range of months and store them
    Import(ImportArgs),
    /// Write the effective configuration to the config file
    WriteConfig,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Destination {
    Csv,
    Sql,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Environment Canada station ID
    #[arg(long)]
    station_id: u32,
    #[arg(long)]
    year_start: i32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month_start: u32,
    #[arg(long)]
    year_end: i32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month_end: u32,
    /// Day of the month sent with every request
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=31))]
    day_start: u32,
    /// The station's local timezone, e.g. America/Toronto
    #[arg(long, value_parser = parse_zone)]
    timezone: Tz,
    #[arg(long, value_enum)]
    destination: Destination,
    /// Rows per INSERT when writing to the database [default: 100]
    #[arg(long)]
    batch_size: Option<usize>,
    /// Directory for CSV output [default: .]
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// SQLite database file
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    csv_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database_path: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        match &self.command {
            Commands::Import(args) => Overrides {
                batch_size: args.batch_size,
                csv_dir: args.output_dir.clone(),
                database_path: args.database.clone(),
            },
            Commands::WriteConfig => Overrides::default(),
        }
    }
}

pub fn cli() -> Result<()> {
    let args = Cli::parse();

    let mut config = Config::from_cli(&args)?;
    if let Some(level) = args.log_level {
        config.main.logging.console_level = level;
        config.main.logging.file_level = level;
    }
    let _guard = setup_logging(&config.main.logging)?;
    debug!("Command line arguments: {:#?}", &args);
    debug!("Config: {:#?}", &config);

    match &args.command {
        Commands::Import(import_args) => import(&config, import_args)?,
        Commands::WriteConfig => config.write_config_file()?,
    }
    Ok(())
}

fn import(config: &Config, args: &ImportArgs) -> Result<()> {
    let range = MonthRange::new(
        args.year_start,
        args.month_start,
        args.year_end,
        args.month_end,
        args.day_start,
    )?;
    let client = Client::new(&config.main);
    let history = fetch_range(&client, args.station_id, &range, args.timezone)?;

    match args.destination {
        Destination::Sql => {
            let mut database = config.get_database()?;
            database.save_history(&history, config.main.batch_size)?;
        }
        Destination::Csv => {
            csv_store::save_history(&config.main.csv_dir, &history)?;
        }
    }
    info!("Import of station {} complete", args.station_id);
    println!("{}", summary_table(&history));
    Ok(())
}

fn or_unknown<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn summary_table(history: &History) -> Table {
    let station = &history.station;
    let times: Vec<_> = history
        .observations
        .iter()
        .filter_map(|o| o.obs_datetime_std)
        .collect();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Station", &station.station_id.to_string()]);
    table.add_row(vec!["Name".to_string(), or_unknown(&station.name)]);
    table.add_row(vec!["Province".to_string(), or_unknown(&station.province)]);
    table.add_row(vec!["Latitude".to_string(), or_unknown(&station.latitude)]);
    table.add_row(vec!["Longitude".to_string(), or_unknown(&station.longitude)]);
    table.add_row(vec!["Elevation".to_string(), or_unknown(&station.elevation)]);
    table.add_row(vec![
        "Climate ID".to_string(),
        or_unknown(&station.climate_identifier),
    ]);
    table.add_row(vec!["Timezone".to_string(), station.local_tz.to_string()]);
    table.add_row(vec![
        "Observations".to_string(),
        history.observations.len().to_string(),
    ]);
    table.add_row(vec!["First".to_string(), or_unknown(&times.iter().min())]);
    table.add_row(vec!["Last".to_string(), or_unknown(&times.iter().max())]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::Station;

    #[test]
    fn import_arguments_are_parsed() {
        let args = Cli::parse_from([
            "ec-history",
            "import",
            "--station-id",
            "32008",
            "--year-start",
            "2010",
            "--month-start",
            "3",
            "--year-end",
            "2010",
            "--month-end",
            "4",
            "--timezone",
            "America/Toronto",
            "--destination",
            "sql",
            "--database",
            "weather.db",
        ]);
        let Commands::Import(import) = &args.command else {
            panic!("expected import");
        };
        assert_eq!(import.station_id, 32008);
        assert_eq!(import.day_start, 1);
        assert_eq!(import.timezone, Tz::America__Toronto);
        assert_eq!(import.destination, Destination::Sql);

        let overrides = args.overrides();
        assert_eq!(overrides.database_path, Some(PathBuf::from("weather.db")));
        assert_eq!(overrides.batch_size, None);
    }

    #[test]
    fn non_canadian_timezone_is_rejected() {
        let result = Cli::try_parse_from([
            "ec-history",
            "import",
            "--station-id",
            "1",
            "--year-start",
            "2010",
            "--month-start",
            "1",
            "--year-end",
            "2010",
            "--month-end",
            "1",
            "--timezone",
            "Europe/Paris",
            "--destination",
            "csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn summary_marks_missing_values_unknown() {
        let history = History {
            station: Station::new(42, Tz::America__Winnipeg),
            observations: Vec::new(),
        };
        let rendered = summary_table(&history).to_string();
        assert!(rendered.contains("42"));
        assert!(rendered.contains("unknown"));
        assert!(rendered.contains("America/Winnipeg"));
    }
}
