pub mod cli;
pub mod client;
pub mod coerce;
pub mod config;
pub mod csv_store;
pub mod error;
pub mod history;
pub mod logging;
pub mod observation;
pub mod page;
pub mod persistence;
pub mod station;
pub mod timestamp;
