//! Request pipeline: validate, filter, assemble, predict
//!
//! [`ExplorerState`] owns the dataset and model loaded at startup. Every
//! request borrows it immutably and recomputes its result from scratch.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ExplorerConfig, PredictionConfig};
use crate::dataset::{Dataset, YieldRecord};
use crate::errors::Result;
use crate::features::{reindex, FeatureAssembler, FeatureVector, NumericMeans};
use crate::filter::Selection;
use crate::gbdt::Model;
use crate::predictor;
use crate::schema::{NUMERIC_FEATURES, YEAR_COLUMN};
use crate::trend::YieldTrend;
use crate::validation::{
    default_predict_year, max_predict_year, validate_predict_year, validate_selection,
};

/// Choices a user may make against the loaded dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorOptions {
    pub countries: Vec<String>,
    pub crops: Vec<String>,
    pub years: Vec<i32>,
    pub first_year: i32,
    pub last_year: i32,
    pub max_predict_year: i32,
}

/// Names present on one side of the dataset/model boundary only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDrift {
    /// Dataset columns the model was not trained on; dropped when assembling
    pub unknown_to_model: Vec<String>,
    /// Model inputs the dataset cannot produce; always 0
    pub missing_from_data: Vec<String>,
}

impl SchemaDrift {
    pub fn is_empty(&self) -> bool {
        self.unknown_to_model.is_empty() && self.missing_from_data.is_empty()
    }
}

/// Filtered rows and their trend
#[derive(Debug, Clone, Serialize)]
pub struct History<'a> {
    pub selection: Selection,
    pub rows: Vec<&'a YieldRecord>,
    pub trend: YieldTrend,
}

/// One prediction with everything that went into it
#[derive(Debug, Clone, Serialize)]
pub struct Forecast<'a> {
    pub history: History<'a>,
    pub predict_year: i32,
    pub means: NumericMeans,
    pub features: FeatureVector,
    /// Predicted yield in hg/ha
    pub prediction: f64,
}

/// Read-only state shared by every request
#[derive(Debug, Clone)]
pub struct ExplorerState {
    dataset: Dataset,
    model: Model,
    settings: PredictionConfig,
}

impl ExplorerState {
    pub fn new(dataset: Dataset, model: Model, settings: PredictionConfig) -> Self {
        let state = Self {
            dataset,
            model,
            settings,
        };
        let drift = state.schema_drift();
        if !drift.is_empty() {
            warn!(
                unknown_to_model = drift.unknown_to_model.len(),
                missing_from_data = drift.missing_from_data.len(),
                "Dataset and model feature schemas differ; reindexing will fill with 0"
            );
        }
        state
    }

    /// Load dataset and model as configured; any failure is fatal to the caller
    pub fn load(config: &ExplorerConfig) -> Result<Self> {
        let dataset = Dataset::from_csv(&config.data.path)?;
        let model = Model::load_verified(&config.model.path, config.model.expected_hash.as_deref())?;
        info!(
            rows = dataset.len(),
            trees = model.num_trees(),
            horizon_years = config.prediction.horizon_years,
            empty_history = %config.prediction.empty_history,
            "Explorer ready"
        );
        Ok(Self::new(dataset, model, config.prediction.clone()))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn settings(&self) -> &PredictionConfig {
        &self.settings
    }

    pub fn options(&self) -> SelectorOptions {
        let schema = self.dataset.schema();
        SelectorOptions {
            countries: schema.countries().to_vec(),
            crops: schema.crops().to_vec(),
            years: self.dataset.years().to_vec(),
            first_year: self.dataset.first_year(),
            last_year: self.dataset.last_year(),
            max_predict_year: max_predict_year(
                self.dataset.last_year(),
                self.settings.horizon_years,
            ),
        }
    }

    /// Selection over the full observed range, with optional bounds
    pub fn selection(
        &self,
        country: &str,
        crop: &str,
        year_min: Option<i32>,
        year_max: Option<i32>,
    ) -> Selection {
        Selection::new(
            country,
            crop,
            year_min.unwrap_or_else(|| self.dataset.first_year()),
            year_max.unwrap_or_else(|| self.dataset.last_year()),
        )
    }

    pub fn schema_drift(&self) -> SchemaDrift {
        let schema = self.dataset.schema();
        let mut produced: Vec<String> = std::iter::once(YEAR_COLUMN.to_string())
            .chain(NUMERIC_FEATURES.iter().map(|s| s.to_string()))
            .chain(schema.item_columns())
            .chain(schema.area_columns())
            .collect();
        produced.sort();

        let expected = self.model.feature_names();
        let unknown_to_model = produced
            .iter()
            .filter(|name| !expected.contains(name))
            .cloned()
            .collect();
        let missing_from_data = expected
            .iter()
            .filter(|name| produced.binary_search(name).is_err())
            .cloned()
            .collect();
        SchemaDrift {
            unknown_to_model,
            missing_from_data,
        }
    }

    /// Validated, filtered history for `selection`
    pub fn history(&self, selection: &Selection) -> Result<History<'_>> {
        validate_selection(&self.dataset, selection)?;
        let rows = selection.apply(self.dataset.records());
        let trend = YieldTrend::from_records(&rows);
        info!(
            country = %selection.country,
            crop = %selection.crop,
            year_min = selection.year_min,
            year_max = selection.year_max,
            rows = rows.len(),
            "Selection filtered"
        );
        Ok(History {
            selection: selection.clone(),
            rows,
            trend,
        })
    }

    /// Assemble features from `selection` and predict `predict_year`
    /// (default: the year after the selected range)
    pub fn forecast(&self, selection: &Selection, predict_year: Option<i32>) -> Result<Forecast<'_>> {
        let history = self.history(selection)?;
        let predict_year = predict_year.unwrap_or_else(|| default_predict_year(selection.year_max));
        validate_predict_year(
            predict_year,
            selection.year_max,
            self.dataset.last_year(),
            self.settings.horizon_years,
        )?;

        let assembler = FeatureAssembler::new(
            self.dataset.schema(),
            self.model.feature_names(),
            self.settings.empty_history,
            self.dataset.global_means(),
        );
        let means = assembler.history_means(&history.rows, selection)?;
        let raw = assembler.raw_features(&means, predict_year, &selection.country, &selection.crop);
        let features = reindex(&raw, self.model.feature_names());
        let prediction = predictor::predict(&self.model, &features)?;

        info!(predict_year, prediction, "Yield predicted");
        Ok(Forecast {
            history,
            predict_year,
            means,
            features,
            prediction,
        })
    }

    /// Feature vector alone, as the model would receive it
    pub fn assemble(&self, selection: &Selection, predict_year: i32) -> Result<FeatureVector> {
        let history = self.history(selection)?;
        validate_predict_year(
            predict_year,
            selection.year_max,
            self.dataset.last_year(),
            self.settings.horizon_years,
        )?;
        let assembler = FeatureAssembler::new(
            self.dataset.schema(),
            self.model.feature_names(),
            self.settings.empty_history,
            self.dataset.global_means(),
        );
        Ok(assembler.assemble(&history.rows, selection, predict_year)?)
    }
}
