//! Command-line interface parsing for energydash
//!
//! This module handles parsing of CLI arguments using clap. Most options can
//! also be supplied through `ENERGYDASH_*` environment variables.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::data::daily::DEFAULT_API_URL;
use crate::data::EARLIEST_DATE;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The date argument is not a valid YYYY-MM-DD date
    #[error("Invalid date: '{0}'. Expected format: YYYY-MM-DD")]
    InvalidDate(String),

    /// The date is outside the range the backend has data for
    #[error("Date {date} is out of range: pick a day between {earliest} and {latest}")]
    DateOutOfRange {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },
}

/// energydash - Daily energy consumption dashboard
#[derive(Parser, Debug)]
#[command(name = "energydash")]
#[command(about = "Daily energy consumption, demand peaks and phase distribution")]
#[command(version)]
pub struct Cli {
    /// Day to open, in YYYY-MM-DD form (defaults to today)
    ///
    /// Examples:
    ///   energydash                    # Open today's dashboard
    ///   energydash --date 2024-01-01  # Open New Year's Day
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,

    /// Endpoint of the daily consumption API
    #[arg(long, value_name = "URL", env = "ENERGYDASH_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory for cached responses (defaults to the XDG cache directory)
    #[arg(long, value_name = "PATH", env = "ENERGYDASH_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep responses in memory only
    #[arg(long)]
    pub no_cache: bool,

    /// Maximum number of cached days; 0 keeps every day
    #[arg(
        long,
        value_name = "N",
        env = "ENERGYDASH_MAX_CACHE_ENTRIES",
        default_value_t = DEFAULT_MAX_ENTRIES
    )]
    pub max_cache_entries: usize,

    /// Write logs to this file (logging is off otherwise)
    #[arg(long, value_name = "PATH", env = "ENERGYDASH_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Where responses are cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// XDG cache directory
    Default,
    /// User-supplied directory
    Dir(PathBuf),
    /// Process memory only
    Memory,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Day shown first
    pub initial_date: NaiveDate,
    /// Endpoint of the daily consumption API
    pub api_url: String,
    pub cache_location: CacheLocation,
    /// Entry bound for the cache; `None` is unbounded
    pub max_cache_entries: Option<usize>,
    pub log_file: Option<PathBuf>,
}

/// Parses a date argument and checks it against the selectable range.
///
/// # Arguments
/// * `s` - The date string from CLI
/// * `today` - The latest selectable day
///
/// # Returns
/// * `Ok(NaiveDate)` if the string is a date between 2022-01-01 and `today`
/// * `Err(CliError)` otherwise
pub fn parse_date_arg(s: &str, today: NaiveDate) -> Result<NaiveDate, CliError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::InvalidDate(s.to_string()))?;

    if date < EARLIEST_DATE || date > today {
        return Err(CliError::DateOutOfRange {
            date,
            earliest: EARLIEST_DATE,
            latest: today,
        });
    }
    Ok(date)
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    /// * `today` - Current local date, used as default and upper bound
    pub fn from_cli(cli: &Cli, today: NaiveDate) -> Result<Self, CliError> {
        let initial_date = match &cli.date {
            Some(date_str) => parse_date_arg(date_str, today)?,
            None => today,
        };

        let cache_location = match (&cli.cache_dir, cli.no_cache) {
            (_, true) => CacheLocation::Memory,
            (Some(dir), false) => CacheLocation::Dir(dir.clone()),
            (None, false) => CacheLocation::Default,
        };

        Ok(StartupConfig {
            initial_date,
            api_url: cli.api_url.clone(),
            cache_location,
            max_cache_entries: Some(cli.max_cache_entries).filter(|max| *max > 0),
            log_file: cli.log_file.clone(),
        })
    }
}
