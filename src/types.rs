use serde_json::{Map, Value};

use crate::error::ApiError;

pub type Body = Map<String, Value>;

// ---------- Coercion rules ----------

/// Integers as-is, finite floats truncated toward zero, trimmed numeric strings.
/// Everything else (null, bool, containers, "12.5") is rejected.
pub fn coerce_int(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                let f = n.as_f64()?.trunc();
                (f.is_finite() && f >= i32::MIN as f64 && f <= i32::MAX as f64).then_some(f as i32)
            }
        }
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Numbers and trimmed numeric strings; result must be finite.
pub fn coerce_float(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Table key for a mortality lookup: numbers render as their JSON text and
/// strings are used verbatim, so `2030` and `"2030"` hit the same row while
/// `2030.5` simply misses. Anything else has no key.
pub fn year_key(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

pub fn require_object(body: Value) -> Result<Body, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::validation("Request body must be a JSON object")),
    }
}

// ---------- Requests ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureRequest {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub dayofweek: i32,
}

impl TemperatureRequest {
    pub const FIELDS: [&'static str; 5] = ["year", "month", "day", "hour", "dayofweek"];

    /// Reports every missing or invalid field, not only the first.
    pub fn from_body(body: &Body) -> Result<Self, ApiError> {
        let mut vals = [0i32; 5];
        let mut bad = Vec::new();
        for (slot, name) in vals.iter_mut().zip(Self::FIELDS) {
            match body.get(name).and_then(coerce_int) {
                Some(v) => *slot = v,
                None => bad.push(name),
            }
        }
        if !bad.is_empty() {
            return Err(ApiError::validation(format!(
                "Missing or invalid fields: {}",
                bad.join(", ")
            )));
        }
        let [year, month, day, hour, dayofweek] = vals;
        Ok(Self { year, month, day, hour, dayofweek })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentRequest {
    pub year: i32,
    pub temperature: f64,
}

impl EnvironmentRequest {
    pub fn from_body(body: &Body) -> Result<Self, ApiError> {
        let (Some(year), Some(temperature)) = (body.get("year"), body.get("temperature")) else {
            return Err(ApiError::validation("Missing 'year' or 'temperature'"));
        };
        Ok(Self {
            year: coerce_int(year)
                .ok_or_else(|| ApiError::validation("Invalid 'year': expected an integer"))?,
            temperature: coerce_float(temperature)
                .ok_or_else(|| ApiError::validation("Invalid 'temperature': expected a number"))?,
        })
    }

    pub fn row(&self) -> [f64; 2] {
        [self.year as f64, self.temperature]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EconomyRequest {
    pub year: i32,
}

impl EconomyRequest {
    pub fn from_body(body: &Body) -> Result<Self, ApiError> {
        let year = body.get("year").ok_or_else(|| ApiError::validation("Missing 'year'"))?;
        Ok(Self {
            year: coerce_int(year)
                .ok_or_else(|| ApiError::validation("Invalid 'year': expected an integer"))?,
        })
    }

    pub fn row(&self) -> [f64; 1] {
        [self.year as f64]
    }
}
