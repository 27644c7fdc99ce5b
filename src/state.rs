// Shared state: the fitted artifacts, loaded once and read by every worker
use std::path::Path;
use std::sync::Arc;

use anyhow::{ensure, Context};
use log::debug;

use crate::error::{ModelError, PredictionError};
use crate::features::FeatureRow;
use crate::models::{self, Preprocessor, RegressionModel};

#[derive(Debug, Clone)]
pub struct AppState {
    pub preprocessor: Arc<Preprocessor>,
    pub model: Arc<RegressionModel>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(
        preprocessor: Preprocessor,
        model: RegressionModel,
        expose_error_details: bool,
    ) -> anyhow::Result<Self> {
        ensure!(
            preprocessor.output_width() == model.n_features,
            "preprocessor produces {} features but the {} model expects {}",
            preprocessor.output_width(),
            model.kind(),
            model.n_features
        );
        Ok(Self {
            preprocessor: Arc::new(preprocessor),
            model: Arc::new(model),
            expose_error_details,
        })
    }

    /// Loads both artifacts; any failure aborts startup.
    pub fn load(
        model_path: &Path,
        preprocessor_path: &Path,
        expose_error_details: bool,
    ) -> anyhow::Result<Self> {
        let model: RegressionModel = models::load(model_path)
            .with_context(|| format!("failed to load model from {}", model_path.display()))?;
        debug!(
            "Loaded {} model with {} input features",
            model.kind(),
            model.n_features
        );
        let preprocessor: Preprocessor = models::load(preprocessor_path).with_context(|| {
            format!(
                "failed to load preprocessor from {}",
                preprocessor_path.display()
            )
        })?;
        debug!(
            "Loaded preprocessor with {} transforms",
            preprocessor.transforms.len()
        );
        Self::new(preprocessor, model, expose_error_details)
    }

    /// Transform then predict a single row.
    pub fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
        let unused = self.preprocessor.unused_columns(row);
        if !unused.is_empty() {
            debug!("Ignoring unused features: {unused:?}");
        }

        debug!("Transforming the input row");
        let transformed = self.preprocessor.transform(std::slice::from_ref(row))?;
        debug!("Transformation completed: {transformed:?}");

        debug!("Applying the {} model", self.model.kind());
        let predictions = self.model.predict(&transformed)?;
        debug!("Prediction completed: {predictions:?}");

        predictions
            .first()
            .copied()
            .ok_or_else(|| ModelError::Empty.into())
    }
}
