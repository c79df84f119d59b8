use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::forecast::{IndicatorModel, TemperatureForecaster};
use crate::model::{load_bundle, load_predictor, ModelInfo};
use crate::tables::YearlyStatistics;

/// Everything loaded at startup. Read-only once built and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub temperature: Arc<TemperatureForecaster>,
    pub statistics: Arc<YearlyStatistics>,
    pub environment: Arc<IndicatorModel>,
    pub economy: Arc<IndicatorModel>,
}

impl AppState {
    pub fn new(
        temperature: TemperatureForecaster,
        statistics: YearlyStatistics,
        environment: IndicatorModel,
        economy: IndicatorModel,
    ) -> Self {
        Self {
            temperature: Arc::new(temperature),
            statistics: Arc::new(statistics),
            environment: Arc::new(environment),
            economy: Arc::new(economy),
        }
    }

    /// Load all artifacts and run a warm-up forward on each model.
    pub fn load(cfg: &ServerConfig) -> Result<Self> {
        let info = ModelInfo::load(&cfg.temp_meta_path)?;
        let temp_model = load_predictor(&cfg.temp_model_path)?;
        if let Some(w) = temp_model.input_width() {
            if w != info.features.len() {
                tracing::warn!(
                    "temperature model width ({}) != features.len() ({})",
                    w,
                    info.features.len()
                );
            }
        }
        let temperature = TemperatureForecaster::new(temp_model, info)
            .with_context(|| format!("bad feature list in {}", cfg.temp_meta_path.display()))?;
        tracing::info!(
            "loaded temperature model; features[{}]: {:?}, spread={}",
            temperature.features().len(),
            temperature.features(),
            temperature.spread()
        );

        let statistics = YearlyStatistics::load(&cfg.population_path, &cfg.death_rate_path)?;
        let (pop_years, rate_years) = statistics.years();
        tracing::info!("loaded tables; population years={} death-rate years={}", pop_years, rate_years);

        let (env_model, env_names) = load_bundle(&cfg.env_bundle_path)?;
        let environment = IndicatorModel::environmental(env_model, env_names);
        let (econ_model, econ_names) = load_bundle(&cfg.econ_bundle_path)?;
        let economy = IndicatorModel::economic(econ_model, econ_names);

        temperature.probe().context("temperature warmup failed")?;
        for m in [&environment, &economy] {
            m.probe().with_context(|| format!("{} warmup failed", m.kind()))?;
            tracing::info!("loaded {} model; indicators[{}]: {:?}", m.kind(), m.indicators().len(), m.indicators());
        }
        tracing::info!("warmup forward ok");

        Ok(Self::new(temperature, statistics, environment, economy))
    }
}
