use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    InputWidth { got: usize, expected: usize },
    #[error("model returned {got} values for {expected} outputs")]
    OutputWidth { got: usize, expected: usize },
    #[error("model returned a non-finite value at position {0}")]
    NonFinite(usize),
    #[error("model backend failure: {0}")]
    Backend(String),
}

/// A pre-trained model: one input row in, one output vector out.
///
/// Implementations must be usable from many requests at once and never mutate
/// themselves while predicting.
pub trait Predictor: Send + Sync {
    fn predict(&self, row: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Number of values `predict` expects in a row, when the model knows it.
    fn input_width(&self) -> Option<usize> {
        None
    }
}

/// Multi-output linear regression: `y_i = intercept_i + Σ_j coefficients[i][j]·x_j`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LinearModel {
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearModel {
    pub fn new(coefficients: Vec<Vec<f64>>, intercepts: Vec<f64>) -> Result<Self> {
        let m = Self { coefficients, intercepts };
        m.validate()?;
        Ok(m)
    }

    fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            bail!("linear model has no outputs");
        }
        if self.coefficients.len() != self.intercepts.len() {
            bail!(
                "linear model has {} coefficient rows but {} intercepts",
                self.coefficients.len(),
                self.intercepts.len()
            );
        }
        let width = self.coefficients[0].len();
        if let Some(i) = self.coefficients.iter().position(|r| r.len() != width) {
            bail!("coefficient row {} has {} values, expected {}", i, self.coefficients[i].len(), width);
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }
}

impl Predictor for LinearModel {
    fn predict(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let expected = self.width();
        if row.len() != expected {
            return Err(ModelError::InputWidth { got: row.len(), expected });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| b + w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>())
            .collect())
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.width())
    }
}

/// Where a bundled model comes from: inline linear coefficients, or a file next
/// to the bundle.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModelSource {
    File { path: PathBuf },
    Linear(LinearModel),
}

/// Model plus the ordered names of its outputs.
#[derive(Debug, Deserialize)]
struct BundleJson {
    indicators: Vec<String>,
    model: ModelSource,
}

/// Temperature model metadata (`features` + optional `std_dev`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub features: Vec<String>,
    #[serde(default)]
    pub std_dev: Option<f64>,
}

impl ModelInfo {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read model info at {}", path.display()))?;
        let info: ModelInfo = serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse model info {}", path.display()))?;
        if info.features.is_empty() {
            bail!("model info {} lists no features", path.display());
        }
        if let Some(s) = info.std_dev {
            if s < 0.0 || !s.is_finite() {
                bail!("model info {} has invalid std_dev {}", path.display(), s);
            }
        }
        Ok(info)
    }
}

/// Load a model file. `.json` is a linear model; `.pt`/`.ts` is TorchScript
/// (requires the `torch` feature).
pub fn load_predictor(path: &Path) -> Result<Arc<dyn Predictor>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        "json" => {
            let txt = fs::read_to_string(path)
                .with_context(|| format!("failed to read model at {}", path.display()))?;
            let model: LinearModel = serde_json::from_str(&txt)
                .with_context(|| format!("failed to parse linear model {}", path.display()))?;
            model
                .validate()
                .with_context(|| format!("invalid linear model {}", path.display()))?;
            Ok(Arc::new(model))
        }
        "pt" | "ts" => load_torchscript(path),
        other => bail!("unsupported model format '{}' for {}", other, path.display()),
    }
}

#[cfg(feature = "torch")]
fn load_torchscript(path: &Path) -> Result<Arc<dyn Predictor>> {
    Ok(Arc::new(crate::torch::TorchModel::load(path)?))
}

#[cfg(not(feature = "torch"))]
fn load_torchscript(path: &Path) -> Result<Arc<dyn Predictor>> {
    bail!(
        "{} is a TorchScript model; rebuild with `--features torch` to serve it",
        path.display()
    )
}

/// Load an indicator bundle, returning the model and its output names.
pub fn load_bundle(path: &Path) -> Result<(Arc<dyn Predictor>, Vec<String>)> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read bundle at {}", path.display()))?;
    let bundle: BundleJson = serde_json::from_str(&txt)
        .with_context(|| format!("failed to parse bundle {}", path.display()))?;
    if bundle.indicators.is_empty() {
        bail!("bundle {} lists no indicators", path.display());
    }
    let mut seen = HashSet::new();
    if let Some(dup) = bundle.indicators.iter().find(|n| !seen.insert(n.as_str())) {
        bail!("bundle {} lists indicator '{}' more than once", path.display(), dup);
    }

    let model: Arc<dyn Predictor> = match bundle.model {
        ModelSource::Linear(m) => {
            m.validate()
                .with_context(|| format!("invalid linear model in {}", path.display()))?;
            Arc::new(m)
        }
        ModelSource::File { path: rel } => {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            load_predictor(&base.join(rel))?
        }
    };
    Ok((model, bundle.indicators))
}
