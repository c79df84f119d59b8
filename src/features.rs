//! Calendar → feature vector encoding for the temperature model.
//!
//! Periodic calendar quantities are encoded as sin/cos pairs so the model sees
//! continuity across period boundaries (December → January, 23h → 0h).

use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;
use thiserror::Error;

/// Reference year for the `years_since_1950` trend feature.
pub const EPOCH_YEAR: i32 = 1950;

/// Accepted calendar years.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Every feature name the encoder produces, in output order.
pub const FEATURE_NAMES: [&str; 17] = [
    "year",
    "month",
    "day",
    "hour",
    "dayofweek",
    "weekofyear",
    "years_since_1950",
    "sin_hour",
    "cos_hour",
    "sin_dayofyear",
    "cos_dayofyear",
    "sin_week",
    "cos_week",
    "sin_month",
    "cos_month",
    "sin_dayofweek",
    "cos_dayofweek",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate { year: i32, month: i32, day: i32 },
    #[error("Invalid hour: {0}")]
    InvalidHour(i32),
    #[error("feature '{0}' is not produced by the encoder")]
    UnknownFeature(String),
}

/// Encoded calendar features. Values are stored in `FEATURE_NAMES` order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateFeatures {
    values: [f64; FEATURE_NAMES.len()],
    day_of_year: u32,
    week_of_year: u32,
}

impl ClimateFeatures {
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    pub fn day_of_year(&self) -> u32 {
        self.day_of_year
    }

    pub fn week_of_year(&self) -> u32 {
        self.week_of_year
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    /// Builds the model input row: only the requested features, in the requested order.
    pub fn select(&self, names: &[String]) -> Result<Vec<f64>, FeatureError> {
        names
            .iter()
            .map(|n| self.get(n).ok_or_else(|| FeatureError::UnknownFeature(n.clone())))
            .collect()
    }
}

/// Fails on the first name the encoder cannot produce.
pub fn check_feature_names(names: &[String]) -> Result<(), FeatureError> {
    match names.iter().find(|n| !FEATURE_NAMES.contains(&n.as_str())) {
        Some(unknown) => Err(FeatureError::UnknownFeature(unknown.clone())),
        None => Ok(()),
    }
}

fn cyclical(x: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * x / period;
    (angle.sin(), angle.cos())
}

/// Encode a calendar date/time. `dayofweek` is taken as given (0 = Monday by
/// convention) and not cross-checked against the date.
pub fn generate_climate_features(
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    dayofweek: i32,
) -> Result<ClimateFeatures, FeatureError> {
    let invalid = || FeatureError::InvalidDate { year, month, day };
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(invalid());
    }
    let m = u32::try_from(month).map_err(|_| invalid())?;
    let d = u32::try_from(day).map_err(|_| invalid())?;
    let date = NaiveDate::from_ymd_opt(year, m, d).ok_or_else(invalid)?;
    if !(0..24).contains(&hour) {
        return Err(FeatureError::InvalidHour(hour));
    }

    let day_of_year = date.ordinal();
    let week_of_year = date.iso_week().week();

    let (sin_hour, cos_hour) = cyclical(hour as f64, 24.0);
    let (sin_doy, cos_doy) = cyclical(day_of_year as f64, 365.25);
    let (sin_week, cos_week) = cyclical(week_of_year as f64, 52.0);
    let (sin_month, cos_month) = cyclical(month as f64, 12.0);
    let (sin_dow, cos_dow) = cyclical(dayofweek as f64, 7.0);

    Ok(ClimateFeatures {
        values: [
            year as f64,
            month as f64,
            day as f64,
            hour as f64,
            dayofweek as f64,
            week_of_year as f64,
            (year - EPOCH_YEAR) as f64,
            sin_hour,
            cos_hour,
            sin_doy,
            cos_doy,
            sin_week,
            cos_week,
            sin_month,
            cos_month,
            sin_dow,
            cos_dow,
        ],
        day_of_year,
        week_of_year,
    })
}
