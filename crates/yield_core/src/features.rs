//! Feature assembly for yield prediction
//!
//! Turns a filtered history plus a (country, crop, target year) selection into
//! one feature vector aligned to the model's trained feature list. Names the
//! model does not know are dropped; names it expects but the assembler did not
//! produce are filled with 0.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::dataset::YieldRecord;
use crate::errors::PredictionError;
use crate::filter::Selection;
use crate::schema::{
    area_column, item_column, CategorySchema, PESTICIDES_COLUMN, RAINFALL_COLUMN,
    TEMPERATURE_COLUMN, YEAR_COLUMN,
};

/// Means of the numeric features over a set of rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericMeans {
    pub rainfall_mm: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
}

impl NumericMeans {
    pub const ZERO: Self = Self {
        rainfall_mm: 0.0,
        pesticides_tonnes: 0.0,
        avg_temp: 0.0,
    };

    /// (column name, value) pairs in dataset column order
    pub fn columns(&self) -> [(&'static str, f64); 3] {
        [
            (RAINFALL_COLUMN, self.rainfall_mm),
            (PESTICIDES_COLUMN, self.pesticides_tonnes),
            (TEMPERATURE_COLUMN, self.avg_temp),
        ]
    }
}

/// Arithmetic mean of each numeric feature; `None` for an empty input
pub fn numeric_means<'a, I>(records: I) -> Option<NumericMeans>
where
    I: IntoIterator<Item = &'a YieldRecord>,
{
    let mut count = 0usize;
    let mut sums = [0.0f64; 3];
    for record in records {
        sums[0] += record.rainfall_mm;
        sums[1] += record.pesticides_tonnes;
        sums[2] += record.avg_temp;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(NumericMeans {
        rainfall_mm: sums[0] / n,
        pesticides_tonnes: sums[1] / n,
        avg_temp: sums[2] / n,
    })
}

/// What to feed the model when a selection has no historical rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyHistory {
    /// Refuse to predict and report the empty selection
    #[default]
    Reject,
    /// Use dataset-wide means
    GlobalMean,
    /// Use 0 for every numeric feature
    Zero,
}

impl FromStr for EmptyHistory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reject" => Ok(Self::Reject),
            "global_mean" => Ok(Self::GlobalMean),
            "zero" => Ok(Self::Zero),
            other => Err(format!(
                "unknown empty-history policy {other:?} (expected reject, global_mean or zero)"
            )),
        }
    }
}

impl fmt::Display for EmptyHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reject => "reject",
            Self::GlobalMean => "global_mean",
            Self::Zero => "zero",
        })
    }
}

/// Named, ordered model input
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair names with values; both must have the same length
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self, PredictionError> {
        if names.len() != values.len() {
            return Err(PredictionError::Failed(format!(
                "{} feature names but {} values",
                names.len(),
                values.len()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Reshape `assembled` to exactly `expected`, filling absent names with 0
pub fn reindex(assembled: &[(String, f64)], expected: &[String]) -> FeatureVector {
    let lookup: HashMap<&str, f64> = assembled
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();

    let mut filled = 0usize;
    let values: Vec<f64> = expected
        .iter()
        .map(|name| {
            lookup.get(name.as_str()).copied().unwrap_or_else(|| {
                filled += 1;
                0.0
            })
        })
        .collect();

    let dropped = assembled
        .iter()
        .filter(|(name, _)| !expected.iter().any(|e| e == name))
        .count();
    if filled > 0 || dropped > 0 {
        debug!(filled, dropped, "Feature schema drift absorbed by reindexing");
    }

    FeatureVector {
        names: expected.to_vec(),
        values,
    }
}

/// Builds model inputs for one dataset schema and one model schema
#[derive(Debug, Clone, Copy)]
pub struct FeatureAssembler<'a> {
    schema: &'a CategorySchema,
    expected: &'a [String],
    empty_history: EmptyHistory,
    global_means: &'a NumericMeans,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(
        schema: &'a CategorySchema,
        expected: &'a [String],
        empty_history: EmptyHistory,
        global_means: &'a NumericMeans,
    ) -> Self {
        Self {
            schema,
            expected,
            empty_history,
            global_means,
        }
    }

    /// Means over `history`, or the configured fallback when it is empty
    pub fn history_means(
        &self,
        history: &[&YieldRecord],
        selection: &Selection,
    ) -> Result<NumericMeans, PredictionError> {
        if let Some(means) = numeric_means(history.iter().copied()) {
            return Ok(means);
        }
        match self.empty_history {
            EmptyHistory::Reject => Err(PredictionError::EmptyHistory {
                country: selection.country.clone(),
                crop: selection.crop.clone(),
                year_min: selection.year_min,
                year_max: selection.year_max,
            }),
            EmptyHistory::GlobalMean => {
                warn!(
                    country = %selection.country,
                    crop = %selection.crop,
                    "No history for selection; using dataset-wide means"
                );
                Ok(*self.global_means)
            }
            EmptyHistory::Zero => {
                warn!(
                    country = %selection.country,
                    crop = %selection.crop,
                    "No history for selection; using zero features"
                );
                Ok(NumericMeans::ZERO)
            }
        }
    }

    /// Unaligned vector: year, numeric means, then one-hot crop and country columns
    pub fn raw_features(
        &self,
        means: &NumericMeans,
        target_year: i32,
        country: &str,
        crop: &str,
    ) -> Vec<(String, f64)> {
        let mut raw = Vec::with_capacity(
            1 + means.columns().len() + self.schema.crops().len() + self.schema.countries().len(),
        );
        raw.push((YEAR_COLUMN.to_string(), f64::from(target_year)));
        raw.extend(means.columns().map(|(name, value)| (name.to_string(), value)));

        let selected_item = item_column(crop);
        raw.extend(self.schema.item_columns().map(|col| {
            let hot = if col == selected_item { 1.0 } else { 0.0 };
            (col, hot)
        }));

        let selected_area = area_column(country);
        raw.extend(self.schema.area_columns().map(|col| {
            let hot = if col == selected_area { 1.0 } else { 0.0 };
            (col, hot)
        }));
        raw
    }

    /// Assemble the model input for predicting `target_year` from `history`
    pub fn assemble(
        &self,
        history: &[&YieldRecord],
        selection: &Selection,
        target_year: i32,
    ) -> Result<FeatureVector, PredictionError> {
        let means = self.history_means(history, selection)?;
        let raw = self.raw_features(&means, target_year, &selection.country, &selection.crop);
        Ok(reindex(&raw, self.expected))
    }
}
