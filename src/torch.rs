//! TorchScript backend (`--features torch`).

use anyhow::{Context, Result};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::model::{ModelError, Predictor};

pub struct TorchModel {
    model: CModule,
    device: Device,
}

impl TorchModel {
    pub fn load(path: &Path) -> Result<Self> {
        let device = Device::Cpu;
        let model = CModule::load_on_device(path, device)
            .with_context(|| format!("failed to load TorchScript {}", path.display()))?;
        Ok(Self { model, device })
    }
}

impl Predictor for TorchModel {
    /// Runs a `[1, n]` float forward pass and flattens whatever comes back.
    fn predict(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        let x: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&x)
            .reshape([1, row.len() as i64])
            .to_device(self.device);

        let out = self
            .model
            .forward_ts(&[input])
            .map_err(|e| ModelError::Backend(e.to_string()))?;
        let flat = out.to_kind(Kind::Double).flatten(0, -1);
        Vec::<f64>::try_from(&flat).map_err(|e| ModelError::Backend(e.to_string()))
    }
}
