//! Model invocation: shapes input rows for each predictor and turns raw output
//! vectors into rounded, named results.

use serde::{ser::SerializeMap, Serialize, Serializer};
use std::sync::Arc;

use crate::features::{ClimateFeatures, FeatureError};
use crate::model::{ModelError, ModelInfo, Predictor};

/// Interval half-width used when the model info carries no `std_dev`.
pub const DEFAULT_SPREAD: f64 = 1.5;

/// Values too large to scale are already integral and come back unchanged.
pub fn round_dp(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

fn log_row(kind: &str, row: &[f64]) {
    if std::env::var("LOG_PRED").ok().as_deref() == Some("1") {
        tracing::info!("{} input row[{}]: {:?}", kind, row.len(), row);
    }
}

fn check_finite(values: &[f64]) -> Result<(), ModelError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ModelError::NonFinite(i)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Range {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TemperatureForecast {
    pub prediction: f64,
    pub range: Range,
}

pub struct TemperatureForecaster {
    model: Arc<dyn Predictor>,
    info: ModelInfo,
}

impl TemperatureForecaster {
    /// Fails if the model info asks for a feature the encoder does not produce.
    pub fn new(model: Arc<dyn Predictor>, info: ModelInfo) -> Result<Self, FeatureError> {
        crate::features::check_feature_names(&info.features)?;
        Ok(Self { model, info })
    }

    pub fn features(&self) -> &[String] {
        &self.info.features
    }

    pub fn spread(&self) -> f64 {
        self.info.std_dev.unwrap_or(DEFAULT_SPREAD)
    }

    pub fn predict(&self, features: &ClimateFeatures) -> Result<TemperatureForecast, ModelError> {
        let row = features
            .select(&self.info.features)
            .map_err(|e| ModelError::Backend(e.to_string()))?;
        log_row("temperature", &row);

        let out = self.model.predict(&row)?;
        let value = *out
            .first()
            .ok_or(ModelError::OutputWidth { got: 0, expected: 1 })?;
        check_finite(&[value])?;

        let spread = self.spread();
        Ok(TemperatureForecast {
            prediction: round_dp(value, 2),
            range: Range {
                lower: round_dp(value - spread, 2),
                upper: round_dp(value + spread, 2),
            },
        })
    }

    /// Warm-up forward on an all-zero row.
    pub fn probe(&self) -> Result<(), ModelError> {
        let out = self.model.predict(&vec![0.0; self.info.features.len()])?;
        if out.is_empty() {
            return Err(ModelError::OutputWidth { got: 0, expected: 1 });
        }
        Ok(())
    }
}

/// Indicator name → rounded value, in the model's output order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet(Vec<(String, f64)>);

impl IndicatorSet {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for IndicatorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A model whose outputs are named indicators (environmental, economic).
pub struct IndicatorModel {
    kind: &'static str,
    model: Arc<dyn Predictor>,
    indicators: Vec<String>,
    input_width: usize,
}

impl IndicatorModel {
    pub fn new(
        kind: &'static str,
        model: Arc<dyn Predictor>,
        indicators: Vec<String>,
        input_width: usize,
    ) -> Self {
        Self { kind, model, indicators, input_width }
    }

    /// `[year, temperature]` → environmental indicators.
    pub fn environmental(model: Arc<dyn Predictor>, indicators: Vec<String>) -> Self {
        Self::new("environment", model, indicators, 2)
    }

    /// `[year]` → economic indicators.
    pub fn economic(model: Arc<dyn Predictor>, indicators: Vec<String>) -> Self {
        Self::new("economy", model, indicators, 1)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Output length must match the indicator list exactly.
    pub fn predict(&self, row: &[f64]) -> Result<IndicatorSet, ModelError> {
        if row.len() != self.input_width {
            return Err(ModelError::InputWidth { got: row.len(), expected: self.input_width });
        }
        log_row(self.kind, row);

        let out = self.model.predict(row)?;
        if out.len() != self.indicators.len() {
            return Err(ModelError::OutputWidth { got: out.len(), expected: self.indicators.len() });
        }
        check_finite(&out)?;

        Ok(IndicatorSet(
            self.indicators
                .iter()
                .cloned()
                .zip(out.into_iter().map(|v| round_dp(v, 3)))
                .collect(),
        ))
    }

    pub fn probe(&self) -> Result<(), ModelError> {
        let out = self.model.predict(&vec![0.0; self.input_width])?;
        if out.len() != self.indicators.len() {
            return Err(ModelError::OutputWidth { got: out.len(), expected: self.indicators.len() });
        }
        Ok(())
    }
}
