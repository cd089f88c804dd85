use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("{field} missing from config")]
    Configuration { field: &'static str },

    #[error("Not fitted: {0}")]
    NotFitted(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    External(String),
}

#[cfg(feature = "python")]
impl From<RecipeError> for pyo3::PyErr {
    fn from(err: RecipeError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for RecipeError {
    fn from(err: pyo3::PyErr) -> Self {
        RecipeError::External(err.to_string())
    }
}
