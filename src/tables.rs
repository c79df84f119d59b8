//! Year-keyed population and death-rate tables.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{collections::HashMap, fs, path::Path};

use crate::forecast::round_dp;

/// Year → value. Keys are the year as text, values may be null in the source file.
pub type YearTable = HashMap<String, Option<f64>>;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MortalityEstimate {
    pub population: Option<f64>,
    pub death_rate: Option<f64>,
    pub expected_deaths: Option<f64>,
}

impl MortalityEstimate {
    pub const UNKNOWN: Self = Self {
        population: None,
        death_rate: None,
        expected_deaths: None,
    };
}

#[derive(Debug, Clone, Default)]
pub struct YearlyStatistics {
    population: YearTable,
    death_rate: YearTable,
}

pub fn load_year_table(path: &Path) -> Result<YearTable> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read table at {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("failed to parse table {}", path.display()))
}

/// Zero and null count as absent.
fn present(v: Option<&Option<f64>>) -> Option<f64> {
    v.copied().flatten().filter(|x| *x != 0.0)
}

impl YearlyStatistics {
    pub fn new(population: YearTable, death_rate: YearTable) -> Self {
        Self { population, death_rate }
    }

    pub fn load(population_path: &Path, death_rate_path: &Path) -> Result<Self> {
        Ok(Self::new(
            load_year_table(population_path)?,
            load_year_table(death_rate_path)?,
        ))
    }

    pub fn years(&self) -> (usize, usize) {
        (self.population.len(), self.death_rate.len())
    }

    /// Deaths are `population * death_rate / 1000` (rate is per thousand), only
    /// when both inputs are present and non-zero.
    pub fn lookup(&self, year: &str) -> MortalityEstimate {
        let pop = present(self.population.get(year));
        let rate = present(self.death_rate.get(year));
        let deaths = match (pop, rate) {
            (Some(p), Some(r)) => Some(p * r / 1000.0).filter(|d| *d != 0.0),
            _ => None,
        };
        MortalityEstimate {
            population: pop.map(|p| round_dp(p, 3)),
            death_rate: rate.map(|r| round_dp(r, 3)),
            expected_deaths: deaths.map(|d| round_dp(d, 3)),
        }
    }
}
