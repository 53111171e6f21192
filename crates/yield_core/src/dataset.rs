//! CSV dataset loading
//!
//! Reads the cleaned crop-yield table (one-hot `Area_*`/`Item_*` columns plus
//! numeric climate features) into memory once. The dataset is immutable after
//! load; selections borrow from it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::DatasetError;
use crate::features::{numeric_means, NumericMeans};
use crate::schema::{
    CategorySchema, AREA_PREFIX, ITEM_PREFIX, PESTICIDES_COLUMN, RAINFALL_COLUMN,
    TEMPERATURE_COLUMN, YEAR_COLUMN, YIELD_COLUMN,
};

/// One historical observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldRecord {
    pub year: i32,
    pub country: String,
    pub crop: String,
    pub rainfall_mm: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
    /// Yield in hectograms per hectare
    pub yield_hg_ha: f64,
}

/// Historical yield dataset with its derived category schema
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<YieldRecord>,
    schema: CategorySchema,
    years: Vec<i32>,
    global_means: NumericMeans,
}

struct ColumnIndex {
    year: usize,
    yield_: usize,
    rainfall: usize,
    pesticides: usize,
    temperature: usize,
    areas: Vec<(usize, String)>,
    items: Vec<(usize, String)>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let mut areas = Vec::new();
        let mut items = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            let header = header.trim();
            if let Some(country) = header.strip_prefix(AREA_PREFIX) {
                areas.push((idx, country.to_string()));
            } else if let Some(crop) = header.strip_prefix(ITEM_PREFIX) {
                items.push((idx, crop.to_string()));
            }
        }
        if areas.is_empty() {
            return Err(DatasetError::NoCategories(AREA_PREFIX));
        }
        if items.is_empty() {
            return Err(DatasetError::NoCategories(ITEM_PREFIX));
        }

        Ok(Self {
            year: find(YEAR_COLUMN)?,
            yield_: find(YIELD_COLUMN)?,
            rainfall: find(RAINFALL_COLUMN)?,
            pesticides: find(PESTICIDES_COLUMN)?,
            temperature: find(TEMPERATURE_COLUMN)?,
            areas,
            items,
        })
    }
}

impl Dataset {
    /// Load dataset from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        info!("Loading yield dataset from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load dataset from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::from_headers(&headers)?;
        let schema = CategorySchema::from_headers(headers.iter().map(str::trim));

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            records.push(parse_row(&row, line, &headers, &columns)?);
        }

        Self::from_records(records, schema)
    }

    /// Build a dataset from already parsed records
    pub fn from_records(
        records: Vec<YieldRecord>,
        schema: CategorySchema,
    ) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut years: Vec<i32> = records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();

        let global_means = numeric_means(&records).ok_or(DatasetError::Empty)?;

        info!(
            rows = records.len(),
            countries = schema.countries().len(),
            crops = schema.crops().len(),
            first_year = years[0],
            last_year = years[years.len() - 1],
            "Yield dataset loaded"
        );

        Ok(Self {
            records,
            schema,
            years,
            global_means,
        })
    }

    pub fn records(&self) -> &[YieldRecord] {
        &self.records
    }

    pub fn schema(&self) -> &CategorySchema {
        &self.schema
    }

    /// Get number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct observed years, ascending
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn first_year(&self) -> i32 {
        self.years[0]
    }

    pub fn last_year(&self) -> i32 {
        self.years[self.years.len() - 1]
    }

    /// Dataset-wide means of the numeric features
    pub fn global_means(&self) -> &NumericMeans {
        &self.global_means
    }
}

fn parse_row(
    row: &StringRecord,
    line: u64,
    headers: &StringRecord,
    columns: &ColumnIndex,
) -> Result<YieldRecord, DatasetError> {
    let field = |idx: usize| row.get(idx).unwrap_or("");
    let invalid = |idx: usize| DatasetError::InvalidValue {
        line,
        column: headers.get(idx).unwrap_or("?").to_string(),
        value: field(idx).to_string(),
    };
    let float = |idx: usize| -> Result<f64, DatasetError> {
        field(idx)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(idx))
    };

    // pandas may write integral years as "1990.0"
    let year_raw = field(columns.year);
    let year = year_raw
        .parse::<i32>()
        .ok()
        .or_else(|| {
            year_raw
                .parse::<f64>()
                .ok()
                .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
                .map(|y| y as i32)
        })
        .ok_or_else(|| invalid(columns.year))?;

    let country = first_flagged(row, &columns.areas, line, headers)?
        .ok_or(DatasetError::MissingCategory {
            line,
            prefix: AREA_PREFIX,
        })?;
    let crop = first_flagged(row, &columns.items, line, headers)?
        .ok_or(DatasetError::MissingCategory {
            line,
            prefix: ITEM_PREFIX,
        })?;

    let record = YieldRecord {
        year,
        country,
        crop,
        rainfall_mm: float(columns.rainfall)?,
        pesticides_tonnes: float(columns.pesticides)?,
        avg_temp: float(columns.temperature)?,
        yield_hg_ha: float(columns.yield_)?,
    };
    debug!(line, year, country = %record.country, crop = %record.crop, "Parsed row");
    Ok(record)
}

/// Name of the first one-hot column set in this row
fn first_flagged(
    row: &StringRecord,
    candidates: &[(usize, String)],
    line: u64,
    headers: &StringRecord,
) -> Result<Option<String>, DatasetError> {
    for (idx, name) in candidates {
        let raw = row.get(*idx).unwrap_or("");
        let flag = parse_flag(raw).ok_or_else(|| DatasetError::InvalidValue {
            line,
            column: headers.get(*idx).unwrap_or("?").to_string(),
            value: raw.to_string(),
        })?;
        if flag {
            return Ok(Some(name.clone()));
        }
    }
    Ok(None)
}

/// Parse a one-hot flag as written by pandas (`True`/`False`) or as 0/1
fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "True" | "true" | "TRUE" | "1" | "1.0" => Some(true),
        "False" | "false" | "FALSE" | "0" | "0.0" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Year,average_rain_fall_mm_per_year,pesticides_tonnes,avg_temp,hg/ha_yield,Area_Albania,Area_India,Item_Maize,Item_Wheat";

    fn create_test_csv() -> anyhow::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{HEADER}")?;
        writeln!(file, "1990,1485.0,121.0,16.37,36613,True,False,True,False")?;
        writeln!(file, "1991,1485.0,121.0,15.36,29068,True,False,True,False")?;
        writeln!(file, "1990,1083.0,75000.0,25.6,18876,False,True,False,True")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_csv() -> anyhow::Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.schema().countries(), ["Albania", "India"]);
        assert_eq!(dataset.schema().crops(), ["Maize", "Wheat"]);
        assert_eq!(dataset.years(), [1990, 1991]);
        assert_eq!(dataset.first_year(), 1990);
        assert_eq!(dataset.last_year(), 1991);

        let first = &dataset.records()[0];
        assert_eq!(first.country, "Albania");
        assert_eq!(first.crop, "Maize");
        assert_eq!(first.yield_hg_ha, 36613.0);

        let last = &dataset.records()[2];
        assert_eq!(last.country, "India");
        assert_eq!(last.crop, "Wheat");
        assert_eq!(last.pesticides_tonnes, 75000.0);

        Ok(())
    }

    #[test]
    fn test_index_column_and_numeric_flags() -> anyhow::Result<()> {
        let csv = "\
,Year,average_rain_fall_mm_per_year,pesticides_tonnes,avg_temp,hg/ha_yield,Area_Albania,Item_Maize
0,1990.0,1485.0,121.0,16.37,36613,1,1
";
        let dataset = Dataset::from_reader(csv.as_bytes())?;
        assert_eq!(dataset.records()[0].year, 1990);
        assert_eq!(dataset.records()[0].country, "Albania");
        Ok(())
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let csv = "Year,pesticides_tonnes,avg_temp,hg/ha_yield,Area_Albania,Item_Maize\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "average_rain_fall_mm_per_year"));
    }

    #[test]
    fn test_row_without_area_is_rejected() {
        let csv = format!("{HEADER}\n1990,1485.0,121.0,16.37,36613,False,False,True,False\n");
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingCategory { line: 2, prefix: "Area_" }
        ));
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let csv = format!("{HEADER}\n1990,abc,121.0,16.37,36613,True,False,True,False\n");
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        match err {
            DatasetError::InvalidValue { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "average_rain_fall_mm_per_year");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let err = Dataset::from_reader(format!("{HEADER}\n").as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }
}
