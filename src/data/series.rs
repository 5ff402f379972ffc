//! Extraction of time series embedded in chart markup
//!
//! The backend ships its charts as serialized plotting configurations inside
//! plain strings (typically an HTML snippet). The data lives in two flat
//! array literals, `"x":[...]` with quoted timestamps and `"y":[...]` with
//! numbers. Only those two arrays are read; everything else in the blob is
//! ignored.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use super::{TimePoint, TimeSeries};

static X_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""x"\s*:\s*\[(.*?)\]"#).expect("valid x array pattern"));

static Y_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""y"\s*:\s*\[(.*?)\]"#).expect("valid y array pattern"));

/// Naive timestamp layouts accepted for x values, tried in order
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Extracts the series embedded in `blob`
///
/// Returns `None` if either array is missing, if any element fails to parse,
/// or if the arrays differ in length. Two empty arrays yield an empty series.
/// Points keep the order of the source arrays.
pub fn extract(blob: &str) -> Option<TimeSeries> {
    let x_raw = X_ARRAY.captures(blob)?.get(1)?.as_str();
    let y_raw = Y_ARRAY.captures(blob)?.get(1)?.as_str();

    let times = split_elements(x_raw)
        .into_iter()
        .map(parse_time)
        .collect::<Option<Vec<_>>>()?;
    let values = split_elements(y_raw)
        .into_iter()
        .map(|element| element.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    if times.len() != values.len() {
        return None;
    }

    Some(
        times
            .into_iter()
            .zip(values)
            .map(|(time, value)| TimePoint { time, value })
            .collect(),
    )
}

/// Splits an array body on commas
///
/// A final element that is empty after trimming is dropped, so `""` gives no
/// elements and a trailing comma is tolerated. Empty elements elsewhere are
/// kept and fail to parse.
fn split_elements(body: &str) -> Vec<&str> {
    let mut elements: Vec<&str> = body.split(',').map(str::trim).collect();
    if elements.last().is_some_and(|last| last.is_empty()) {
        elements.pop();
    }
    elements
}

/// Parses a quoted timestamp element
fn parse_time(element: &str) -> Option<NaiveDateTime> {
    let text = strip_quotes(element);

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(text, format) {
            return Some(time);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn strip_quotes(element: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = element
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    element
}
