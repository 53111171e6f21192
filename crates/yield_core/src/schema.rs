//! Column layout of the cleaned yield dataset and the one-hot category schema
//!
//! Countries and crops are encoded as boolean `Area_<name>` and `Item_<name>`
//! columns. The set of valid choices is derived from those column names once
//! at load time and kept in a [`CategorySchema`].

use serde::{Deserialize, Serialize};

/// Year column
pub const YEAR_COLUMN: &str = "Year";

/// Historical target column
pub const YIELD_COLUMN: &str = "hg/ha_yield";

/// Rainfall column
pub const RAINFALL_COLUMN: &str = "average_rain_fall_mm_per_year";

/// Pesticide usage column
pub const PESTICIDES_COLUMN: &str = "pesticides_tonnes";

/// Temperature column
pub const TEMPERATURE_COLUMN: &str = "avg_temp";

/// Numeric features averaged over a selection, in dataset order
pub const NUMERIC_FEATURES: [&str; 3] = [RAINFALL_COLUMN, PESTICIDES_COLUMN, TEMPERATURE_COLUMN];

/// Prefix of country one-hot columns
pub const AREA_PREFIX: &str = "Area_";

/// Prefix of crop one-hot columns
pub const ITEM_PREFIX: &str = "Item_";

/// Column name for a country
pub fn area_column(country: &str) -> String {
    format!("{AREA_PREFIX}{country}")
}

/// Column name for a crop
pub fn item_column(crop: &str) -> String {
    format!("{ITEM_PREFIX}{crop}")
}

/// Known countries and crops, sorted, as found in the dataset header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySchema {
    countries: Vec<String>,
    crops: Vec<String>,
}

impl CategorySchema {
    /// Build a schema from explicit category names
    pub fn new<I, J, S, T>(countries: I, crops: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut countries: Vec<String> = countries.into_iter().map(Into::into).collect();
        let mut crops: Vec<String> = crops.into_iter().map(Into::into).collect();
        countries.sort();
        countries.dedup();
        crops.sort();
        crops.dedup();
        Self { countries, crops }
    }

    /// Derive the schema from a header row by stripping the one-hot prefixes
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut countries = Vec::new();
        let mut crops = Vec::new();
        for header in headers {
            if let Some(country) = header.strip_prefix(AREA_PREFIX) {
                countries.push(country.to_string());
            } else if let Some(crop) = header.strip_prefix(ITEM_PREFIX) {
                crops.push(crop.to_string());
            }
        }
        Self::new(countries, crops)
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn crops(&self) -> &[String] {
        &self.crops
    }

    pub fn has_country(&self, country: &str) -> bool {
        self.countries.binary_search_by(|c| c.as_str().cmp(country)).is_ok()
    }

    pub fn has_crop(&self, crop: &str) -> bool {
        self.crops.binary_search_by(|c| c.as_str().cmp(crop)).is_ok()
    }

    /// `Area_*` column names in schema order
    pub fn area_columns(&self) -> impl Iterator<Item = String> + '_ {
        self.countries.iter().map(|c| area_column(c))
    }

    /// `Item_*` column names in schema order
    pub fn item_columns(&self) -> impl Iterator<Item = String> + '_ {
        self.crops.iter().map(|c| item_column(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_headers_strips_prefixes_and_sorts() {
        let headers = [
            "Year",
            "Area_Zimbabwe",
            "Area_Albania",
            "Item_Maize",
            "Item_Cassava",
            "hg/ha_yield",
        ];
        let schema = CategorySchema::from_headers(headers);

        assert_eq!(schema.countries(), ["Albania", "Zimbabwe"]);
        assert_eq!(schema.crops(), ["Cassava", "Maize"]);
        assert!(schema.has_country("Albania"));
        assert!(!schema.has_country("Area_Albania"));
        assert!(schema.has_crop("Maize"));
    }

    #[test]
    fn test_names_with_spaces_and_commas() {
        let schema = CategorySchema::from_headers(["Item_Rice, paddy", "Area_United Kingdom"]);
        assert!(schema.has_crop("Rice, paddy"));
        assert_eq!(schema.area_columns().collect::<Vec<_>>(), ["Area_United Kingdom"]);
    }
}
