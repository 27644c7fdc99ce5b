// Error types for artifact loading and prediction
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read, decode or validate a serialized artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode JSON artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode binary artifact {path}: {source}")]
    Bincode {
        path: PathBuf,
        #[source]
        source: bincode::error::DecodeError,
    },

    #[error("unsupported artifact extension for {0} (expected .json or .bin)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

impl ArtifactError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// A request row that does not fit the preprocessor's columns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("expected a JSON object of feature values, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required feature '{0}'")]
    Missing(String),

    #[error("feature '{column}' must be {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("feature '{column}' has unsupported value type {found}")]
    UnsupportedValue { column: String, found: &'static str },

    #[error("found unknown category '{value}' in feature '{column}'")]
    UnknownCategory { column: String, value: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model expects {expected} features per row, got {found}")]
    WidthMismatch { expected: usize, found: usize },

    #[error("model produced a non-finite prediction ({0})")]
    NonFinite(f64),

    #[error("model returned no prediction")]
    Empty,
}

/// Anything that can go wrong between a parsed request body and a prediction.
#[derive(Error, Debug)]
pub enum PredictionError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
