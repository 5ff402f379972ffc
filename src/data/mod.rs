//! Core data models for energydash
//!
//! This module contains the daily consumption record returned by the backend,
//! the time series extracted from its embedded charts, and the query keys used
//! to cache one day's dataset.

pub mod daily;
pub mod series;

pub use daily::{ApiError, DailyConsumptionClient, DayView};
pub use series::extract;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key domain for daily consumption dashboard responses
pub const DAILY_CONSUMPTION_DOMAIN: &str = "daily-consumption";

/// First day the backend has data for
pub const EARLIEST_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2022, 1, 1) {
    Some(date) => date,
    None => panic!("invalid earliest date"),
};

/// Identifies one day's dataset in the cache
///
/// Renders as `<domain>-<YYYY-MM-DD>`, e.g. `daily-consumption-2024-01-01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    domain: &'static str,
    date: NaiveDate,
}

impl QueryKey {
    pub fn new(domain: &'static str, date: NaiveDate) -> Self {
        Self { domain, date }
    }

    /// Key for the daily consumption dashboard of `date`
    pub fn daily_consumption(date: NaiveDate) -> Self {
        Self::new(DAILY_CONSUMPTION_DOMAIN, date)
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// The calendar day this key refers to
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.domain, self.date.format("%Y-%m-%d"))
    }
}

/// One sample of an extracted chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// Chart samples in the order the source chart lists them
pub type TimeSeries = Vec<TimePoint>;

/// Electrical phase of a three-phase installation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::A => "Phase A",
            Phase::B => "Phase B",
            Phase::C => "Phase C",
        }
    }
}

/// Direction of a day-over-day variation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// Strictly higher than the previous day
    Up,
    /// Equal to or lower than the previous day
    Down,
}

impl Trend {
    pub fn from_variation(variation: f64) -> Self {
        if variation > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
        }
    }
}

/// Daily dashboard record as returned by the backend
///
/// Energy figures are in Wh, demand in W and variations in percent relative
/// to the previous day. The two chart fields hold serialized chart
/// configurations; see [`series::extract`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConsumption {
    #[serde(rename = "consumo-total")]
    pub total_consumption: f64,
    #[serde(rename = "variacao-consumo-total")]
    pub total_consumption_variation: f64,
    #[serde(rename = "demanda-media")]
    pub average_demand: f64,
    #[serde(rename = "variacao-demanda-media")]
    pub average_demand_variation: f64,
    #[serde(rename = "demanda-maxima")]
    pub peak_demand: f64,
    #[serde(rename = "variacao-demanda-maxima")]
    pub peak_demand_variation: f64,
    #[serde(rename = "horario-de-pico")]
    pub peak_time: String,
    #[serde(rename = "horario-de-pico-ontem")]
    pub previous_peak_time: String,
    #[serde(rename = "consumo-total-a")]
    pub phase_a_consumption: f64,
    #[serde(rename = "variacao-consumo-total-a")]
    pub phase_a_variation: f64,
    #[serde(rename = "consumo-total-b")]
    pub phase_b_consumption: f64,
    #[serde(rename = "variacao-consumo-total-b")]
    pub phase_b_variation: f64,
    #[serde(rename = "consumo-total-c")]
    pub phase_c_consumption: f64,
    #[serde(rename = "variacao-consumo-total-c")]
    pub phase_c_variation: f64,
    /// Embedded chart of the accumulated consumption over the day
    #[serde(rename = "consumo-acumulado")]
    pub accumulated_chart: String,
    /// Embedded chart of the load curve (demand profile)
    #[serde(rename = "curva-de-carga")]
    pub load_curve_chart: String,
}

impl DailyConsumption {
    pub fn total_kwh(&self) -> f64 {
        self.total_consumption / 1000.0
    }

    /// Energy consumed on `phase`, in Wh
    pub fn phase_consumption(&self, phase: Phase) -> f64 {
        match phase {
            Phase::A => self.phase_a_consumption,
            Phase::B => self.phase_b_consumption,
            Phase::C => self.phase_c_consumption,
        }
    }

    pub fn phase_variation(&self, phase: Phase) -> f64 {
        match phase {
            Phase::A => self.phase_a_variation,
            Phase::B => self.phase_b_variation,
            Phase::C => self.phase_c_variation,
        }
    }

    /// Share of the day's total consumed on `phase`, in percent
    ///
    /// Returns `None` when the total is zero.
    pub fn phase_share(&self, phase: Phase) -> Option<f64> {
        if self.total_consumption == 0.0 {
            return None;
        }
        Some(self.phase_consumption(phase) / self.total_consumption * 100.0)
    }
}
