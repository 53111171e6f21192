//! Error types for the crop yield core

use thiserror::Error;

use crate::gbdt::ModelError;

/// Errors raised while reading the historical yield dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Line {line}: invalid value {value:?} in column {column}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Line {line}: no {prefix}* column is set")]
    MissingCategory { line: u64, prefix: &'static str },

    #[error("Dataset has no {0} columns")]
    NoCategories(&'static str),

    #[error("Dataset is empty")]
    Empty,
}

/// Errors raised by selection and prediction-year validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("Unknown crop: {0}")]
    UnknownCrop(String),

    #[error("Invalid year range: {year_min} > {year_max}")]
    InvertedRange { year_min: i32, year_max: i32 },

    #[error("Year {year} is outside the observed range {first}-{last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },

    #[error("Prediction year {year} must be after the selected range end {year_max}")]
    PredictYearNotAfterRange { year: i32, year_max: i32 },

    #[error("Prediction year {year} is beyond the horizon limit {limit}")]
    PredictYearBeyondHorizon { year: i32, limit: i32 },
}

/// Errors raised while assembling features or running the model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("No historical data for {crop} in {country} ({year_min}-{year_max})")]
    EmptyHistory {
        country: String,
        crop: String,
        year_min: i32,
        year_max: i32,
    },

    #[error("Prediction failed: {0}")]
    Failed(String),
}

/// Umbrella error for pipeline operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid selection: {0}")]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
