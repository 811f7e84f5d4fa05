use crate::cli::Cli;
use crate::client::URL_BASE;
use crate::logging::LoggingOptions;
use crate::persistence::{Database, MAX_BATCH_SIZE};
use anyhow::{anyhow, Result};
use etcetera::{choose_app_strategy, AppStrategy, AppStrategyArgs};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,
    pub main: MainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: Self::default_path(),
            main: MainConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MainConfig {
    pub base_url: String,
    /// Connect, read and write timeout for each request
    pub timeout_secs: u64,
    /// Extra attempts after a 408, 429 or 503
    pub retry_limit: u64,
    pub retry_delay_secs: u64,
    pub batch_size: usize,
    pub database_path: PathBuf,
    pub csv_dir: PathBuf,
    pub logging: LoggingOptions,
}

impl Default for MainConfig {
    fn default() -> Self {
        let dirs = Config::default_dirs();
        Self {
            base_url: URL_BASE.to_string(),
            timeout_secs: 30,
            retry_limit: 3,
            retry_delay_secs: 7,
            batch_size: 100,
            database_path: dirs.data.join("ec-history.db"),
            csv_dir: PathBuf::from("."),
            logging: LoggingOptions::default(),
        }
    }
}

impl MainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(anyhow!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, not {}",
                self.batch_size
            ));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = PathBuf::from(&Self::default_dirs().config);
        path.push("config.yml");
        path
    }

    pub fn default_dirs() -> &'static DefaultDirs {
        DEFAULT_DIRS.get_or_init(|| {
            let args = AppStrategyArgs {
                top_level_domain: "org".to_string(),
                author: "r24mille".to_string(),
                app_name: "EC History".to_string(),
            };
            match choose_app_strategy(args) {
                Ok(strategy) => DefaultDirs {
                    config: strategy.config_dir(),
                    data: strategy.data_dir(),
                },
                // No home directory; fall back to the working directory
                Err(_) => DefaultDirs {
                    config: PathBuf::from("."),
                    data: PathBuf::from("."),
                },
            }
        })
    }

    pub fn from_cli(args: &Cli) -> Result<Self> {
        let config_path = if let Some(path) = &args.config_path {
            path.to_owned()
        } else {
            Self::default_path()
        };

        let main: MainConfig = Figment::from(Serialized::defaults(MainConfig::default()))
            .merge(Yaml::file(&config_path))
            .merge(Env::prefixed("ECH_"))
            .merge(Serialized::defaults(args.overrides()))
            .extract()?;
        main.validate()?;

        Ok(Config { config_path, main })
    }

    pub fn write_config_file(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&self.main)?;
        fs::write(&self.config_path, yaml)?;
        info!("Wrote config to {}", self.config_path.display());
        Ok(())
    }

    pub fn get_database(&self) -> Result<Database> {
        let path = self.main.database_path.clone();
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        let database = Database::from_path(path)?;
        database.init()?;
        Ok(database)
    }
}

static DEFAULT_DIRS: OnceCell<DefaultDirs> = OnceCell::new();

#[derive(Debug, Deserialize, Serialize)]
pub struct DefaultDirs {
    pub config: PathBuf,
    pub data: PathBuf,
}
