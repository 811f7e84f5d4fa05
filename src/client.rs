use crate::config::MainConfig;
use anyhow::{anyhow, Result};
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, error};
use ureq::{Agent, AgentBuilder, Error};

pub const URL_BASE: &str = "https://climate.weather.gc.ca/climate_data/bulk_data_e.html";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
/// `timeframe=1` selects hourly observations.
const HOURLY_TIMEFRAME: u8 = 1;
/// Longest wait honoured from a `Retry-After` header, in seconds.
pub const MAX_RETRY_DELAY: u64 = 300;

/// Parameters of a single month-page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub station_id: u32,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Anything that can hand back the raw XML body for a month of data.
pub trait PageSource {
    fn fetch_page(&self, request: &PageRequest) -> Result<String>;
}

#[derive(Debug)]
pub struct Client {
    client: Agent,
    base_url: String,
    retry_limit: u64,
    retry_delay: u64,
}

impl Client {
    pub fn new(config: &MainConfig) -> Client {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(USER_AGENT)
            .build();
        Client {
            client,
            base_url: config.base_url.clone(),
            retry_limit: config.retry_limit,
            retry_delay: config.retry_delay_secs,
        }
    }

    /// The full URL for a request, as logged.
    pub fn url(&self, request: &PageRequest) -> String {
        format!(
            "{}?format=xml&stationID={}&Year={}&Month={}&Day={}&timeframe={HOURLY_TIMEFRAME}",
            self.base_url, request.station_id, request.year, request.month, request.day
        )
    }

    fn get(&self, url: &str) -> Result<String> {
        debug!("Fetching {url}");
        let mut attempts = 0;
        loop {
            match self.client.get(url).call() {
                Ok(response) => return Ok(response.into_string()?),
                Err(Error::Status(code, response)) => match code {
                    503 | 429 | 408 if attempts < self.retry_limit => {
                        let retry = retry_delay(response.header("retry-after"), self.retry_delay);
                        error!("{} for {}, retry in {}", code, url, retry);
                        attempts += 1;
                        sleep(Duration::from_secs(retry));
                    }
                    _ => {
                        let error = response.into_string()?;
                        error!("{code}: {error}");
                        return Err(anyhow!("{code} for {url}"));
                    }
                },
                Err(err) => {
                    let error = err.to_string();
                    error!("{error}");
                    let transport = err.into_transport();
                    if let Some(message) = transport.as_ref().and_then(|t| t.message()) {
                        error!("{message}");
                    }
                    return Err(anyhow!("{error}"));
                }
            }
        }
    }
}

/// Seconds to wait before retrying. A `Retry-After` that is not a number of
/// seconds (it may also be an HTTP date) falls back to `default`.
fn retry_delay(header: Option<&str>, default: u64) -> u64 {
    header
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
        .min(MAX_RETRY_DELAY)
}

impl PageSource for Client {
    fn fetch_page(&self, request: &PageRequest) -> Result<String> {
        self.get(&self.url(request))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(&MainConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_all_query_parameters() {
        let client = Client::default();
        let url = client.url(&PageRequest {
            station_id: 32008,
            year: 2010,
            month: 3,
            day: 1,
        });
        assert_eq!(
            url,
            format!("{URL_BASE}?format=xml&stationID=32008&Year=2010&Month=3&Day=1&timeframe=1")
        );
    }

    #[test]
    fn base_url_comes_from_config() {
        let config = MainConfig {
            base_url: "http://localhost:8080/bulk".to_string(),
            ..Default::default()
        };
        let client = Client::new(&config);
        let url = client.url(&PageRequest {
            station_id: 1,
            year: 1999,
            month: 12,
            day: 15,
        });
        assert!(url.starts_with(
            "http://localhost:8080/bulk?format=xml&stationID=1&Year=1999&Month=12&Day=15"
        ));
    }

    #[test]
    fn retry_after_seconds_are_honoured() {
        assert_eq!(retry_delay(Some("7"), 5), 7);
        assert_eq!(retry_delay(Some(" 0 "), 5), 0);
        assert_eq!(retry_delay(None, 5), 5);
    }

    #[test]
    fn unparseable_retry_after_uses_configured_delay() {
        assert_eq!(retry_delay(Some("Wed, 21 Oct 2015 07:28:00 GMT"), 5), 5);
        assert_eq!(retry_delay(Some("-1"), 5), 5);
        assert_eq!(retry_delay(Some(""), 5), 5);
    }

    #[test]
    fn retry_delay_is_capped() {
        assert_eq!(retry_delay(Some("86400"), 5), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(None, 100_000), MAX_RETRY_DELAY);
    }
}
