//! Crop yield exploration and single-year prediction
//!
//! Loads a cleaned historical yield table and a GBDT regression model once,
//! then answers (country, crop, year range, target year) requests.
//!
//! Modules:
//! - `dataset`: CSV loading into immutable [`YieldRecord`]s
//! - `schema`: column names and the one-hot [`CategorySchema`]
//! - `filter`: [`Selection`] filter over records
//! - `features`: feature assembly and reindexing to the model schema
//! - `gbdt`: fixed-point GBDT model, canonical JSON, XGBoost dump import
//! - `predictor`: one inference over an aligned vector
//! - `validation`: selection and prediction-year bounds
//! - `trend`: time-ordered yield history
//! - `config`: TOML + environment configuration
//! - `explorer`: the request pipeline over loaded state

pub mod config;
pub mod dataset;
pub mod errors;
pub mod explorer;
pub mod features;
pub mod filter;
pub mod gbdt;
pub mod predictor;
pub mod schema;
pub mod serde_canon;
pub mod trend;
pub mod validation;

pub use config::ExplorerConfig;
pub use dataset::{Dataset, YieldRecord};
pub use errors::{CoreError, DatasetError, PredictionError, Result, SelectionError};
pub use explorer::{ExplorerState, Forecast, History, SchemaDrift, SelectorOptions};
pub use features::{
    numeric_means, reindex, EmptyHistory, FeatureAssembler, FeatureVector, NumericMeans,
};
pub use filter::{filter_records, Selection};
pub use gbdt::{Model, ModelError};
pub use predictor::predict;
pub use schema::CategorySchema;
pub use trend::{TrendPoint, TrendSummary, YieldTrend};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
