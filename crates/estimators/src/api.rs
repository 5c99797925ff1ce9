use polars::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Numerical error: {0}")]
    Numerical(String),
    #[error("Training failed: {0}")]
    Training(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Model is not fitted")]
    NotFitted,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Numerical error: {0}")]
    Numerical(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Fit/predict contract over polars frames.
///
/// `Fitted` is the model artifact a successful fit produces. Estimators keep
/// their own copy for later predictions, so callers may drop the returned
/// value when they only need `predict`.
pub trait Estimator {
    type Fitted;

    fn fit(
        &mut self,
        x: &DataFrame,
        y: &DataFrame,
        sample_weights: Option<&Float64Chunked>,
    ) -> Result<Self::Fitted, FitError> {
        self._fit_impl(x, y, sample_weights)
    }

    fn _fit_impl(
        &mut self,
        _x: &DataFrame,
        _y: &DataFrame,
        _sample_weights: Option<&Float64Chunked>,
    ) -> Result<Self::Fitted, FitError> {
        Err(FitError::InvalidInput(
            "Default fit implementation not provided".to_string(),
        ))
    }

    fn predict(&self, x: &DataFrame) -> Result<DataFrame, PredictError> {
        self._predict_impl(x)
    }

    fn _predict_impl(&self, _x: &DataFrame) -> Result<DataFrame, PredictError> {
        Err(PredictError::NotFitted)
    }
}
