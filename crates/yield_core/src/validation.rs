//! Input validation for selections and prediction years
//!
//! Bounds come from the loaded dataset: categories from its one-hot columns,
//! years from its observed range.

use crate::dataset::Dataset;
use crate::errors::SelectionError;
use crate::filter::Selection;

/// Default number of years past the last observation that may be predicted
pub const DEFAULT_HORIZON_YEARS: i32 = 5;

/// Check that the selection names known categories and an observed year range
pub fn validate_selection(dataset: &Dataset, selection: &Selection) -> Result<(), SelectionError> {
    let schema = dataset.schema();
    if !schema.has_country(&selection.country) {
        return Err(SelectionError::UnknownCountry(selection.country.clone()));
    }
    if !schema.has_crop(&selection.crop) {
        return Err(SelectionError::UnknownCrop(selection.crop.clone()));
    }
    if selection.year_min > selection.year_max {
        return Err(SelectionError::InvertedRange {
            year_min: selection.year_min,
            year_max: selection.year_max,
        });
    }

    let (first, last) = (dataset.first_year(), dataset.last_year());
    for year in [selection.year_min, selection.year_max] {
        if year < first || year > last {
            return Err(SelectionError::YearOutOfRange { year, first, last });
        }
    }
    Ok(())
}

/// Latest year that may be predicted
pub fn max_predict_year(last_observed: i32, horizon_years: i32) -> i32 {
    last_observed.saturating_add(horizon_years)
}

/// Accept `year` only if `year_max < year <= last_observed + horizon_years`
pub fn validate_predict_year(
    year: i32,
    year_max: i32,
    last_observed: i32,
    horizon_years: i32,
) -> Result<(), SelectionError> {
    if year <= year_max {
        return Err(SelectionError::PredictYearNotAfterRange { year, year_max });
    }
    let limit = max_predict_year(last_observed, horizon_years);
    if year > limit {
        return Err(SelectionError::PredictYearBeyondHorizon { year, limit });
    }
    Ok(())
}

/// The year predicted when none is requested
pub fn default_predict_year(year_max: i32) -> i32 {
    year_max + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::YieldRecord;
    use crate::schema::CategorySchema;

    fn dataset() -> Dataset {
        let records = (1990..=2013)
            .map(|year| YieldRecord {
                year,
                country: "Albania".to_string(),
                crop: "Maize".to_string(),
                rainfall_mm: 1485.0,
                pesticides_tonnes: 121.0,
                avg_temp: 16.0,
                yield_hg_ha: 36613.0,
            })
            .collect();
        Dataset::from_records(records, CategorySchema::new(["Albania", "India"], ["Maize"])).unwrap()
    }

    #[test]
    fn test_valid_selection() {
        let ds = dataset();
        assert!(validate_selection(&ds, &Selection::new("Albania", "Maize", 1990, 2013)).is_ok());
        // Known category without rows is still a valid choice
        assert!(validate_selection(&ds, &Selection::new("India", "Maize", 2000, 2000)).is_ok());
    }

    #[test]
    fn test_rejects_unknown_categories() {
        let ds = dataset();
        assert_eq!(
            validate_selection(&ds, &Selection::new("Narnia", "Maize", 1990, 2000)),
            Err(SelectionError::UnknownCountry("Narnia".to_string()))
        );
        assert_eq!(
            validate_selection(&ds, &Selection::new("Albania", "Rice", 1990, 2000)),
            Err(SelectionError::UnknownCrop("Rice".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_ranges() {
        let ds = dataset();
        assert!(matches!(
            validate_selection(&ds, &Selection::new("Albania", "Maize", 2000, 1990)),
            Err(SelectionError::InvertedRange { .. })
        ));
        assert_eq!(
            validate_selection(&ds, &Selection::new("Albania", "Maize", 1985, 2000)),
            Err(SelectionError::YearOutOfRange {
                year: 1985,
                first: 1990,
                last: 2013
            })
        );
        assert!(validate_selection(&ds, &Selection::new("Albania", "Maize", 1990, 2014)).is_err());
    }

    #[test]
    fn test_predict_year_boundaries() {
        // year_max + 1 is the first acceptable year
        assert!(validate_predict_year(2001, 2000, 2013, 5).is_ok());
        assert_eq!(
            validate_predict_year(2000, 2000, 2013, 5),
            Err(SelectionError::PredictYearNotAfterRange {
                year: 2000,
                year_max: 2000
            })
        );
        assert!(validate_predict_year(1995, 2000, 2013, 5).is_err());

        assert!(validate_predict_year(2018, 2013, 2013, 5).is_ok());
        assert_eq!(
            validate_predict_year(2019, 2013, 2013, 5),
            Err(SelectionError::PredictYearBeyondHorizon {
                year: 2019,
                limit: 2018
            })
        );
        assert_eq!(default_predict_year(2000), 2001);
    }
}
