//! Selection filter over historical records

use serde::{Deserialize, Serialize};

use crate::dataset::YieldRecord;

/// A (country, crop, inclusive year range) choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub country: String,
    pub crop: String,
    pub year_min: i32,
    pub year_max: i32,
}

impl Selection {
    pub fn new(
        country: impl Into<String>,
        crop: impl Into<String>,
        year_min: i32,
        year_max: i32,
    ) -> Self {
        Self {
            country: country.into(),
            crop: crop.into(),
            year_min,
            year_max,
        }
    }

    /// Whether `record` satisfies all three predicates
    pub fn matches(&self, record: &YieldRecord) -> bool {
        record.country == self.country
            && record.crop == self.crop
            && (self.year_min..=self.year_max).contains(&record.year)
    }

    /// Matching records, in dataset order
    pub fn apply<'a>(&self, records: &'a [YieldRecord]) -> Vec<&'a YieldRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Records for `country` and `crop` with `year_min <= Year <= year_max`
pub fn filter_records<'a>(
    records: &'a [YieldRecord],
    country: &str,
    crop: &str,
    year_min: i32,
    year_max: i32,
) -> Vec<&'a YieldRecord> {
    Selection::new(country, crop, year_min, year_max).apply(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const COUNTRIES: [&str; 3] = ["Albania", "India", "Peru"];
    const CROPS: [&str; 3] = ["Maize", "Potatoes", "Wheat"];

    fn record(country: &str, crop: &str, year: i32) -> YieldRecord {
        YieldRecord {
            year,
            country: country.to_string(),
            crop: crop.to_string(),
            rainfall_mm: 1000.0,
            pesticides_tonnes: 10.0,
            avg_temp: 15.0,
            yield_hg_ha: 20000.0,
        }
    }

    fn arbitrary_record() -> impl Strategy<Value = YieldRecord> {
        (0usize..3, 0usize..3, 1990i32..=2013)
            .prop_map(|(c, i, year)| record(COUNTRIES[c], CROPS[i], year))
    }

    #[test]
    fn test_inclusive_bounds() {
        let rows: Vec<YieldRecord> = (1989..=2001).map(|y| record("Albania", "Maize", y)).collect();
        let subset = filter_records(&rows, "Albania", "Maize", 1990, 2000);
        assert_eq!(subset.len(), 11);
        assert_eq!(subset.first().map(|r| r.year), Some(1990));
        assert_eq!(subset.last().map(|r| r.year), Some(2000));
    }

    #[test]
    fn test_other_categories_excluded() {
        let rows = vec![
            record("Albania", "Maize", 1995),
            record("Albania", "Wheat", 1995),
            record("India", "Maize", 1995),
        ];
        let subset = Selection::new("Albania", "Maize", 1990, 2000).apply(&rows);
        assert_eq!(subset, vec![&rows[0]]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let rows = vec![record("Albania", "Maize", 1995)];
        assert!(filter_records(&rows, "Peru", "Maize", 1990, 2000).is_empty());
        assert!(filter_records(&rows, "Albania", "Maize", 1996, 2000).is_empty());
    }

    proptest! {
        #[test]
        fn filter_returns_only_matching_rows(
            rows in prop::collection::vec(arbitrary_record(), 0..60),
            c in 0usize..3,
            i in 0usize..3,
            a in 1990i32..=2013,
            b in 1990i32..=2013,
        ) {
            let (year_min, year_max) = (a.min(b), a.max(b));
            let selection = Selection::new(COUNTRIES[c], CROPS[i], year_min, year_max);
            let subset = selection.apply(&rows);

            for r in &subset {
                prop_assert_eq!(r.country.as_str(), COUNTRIES[c]);
                prop_assert_eq!(r.crop.as_str(), CROPS[i]);
                prop_assert!(r.year >= year_min && r.year <= year_max);
                // Borrowed straight from the input, never fabricated
                prop_assert!(rows.iter().any(|row| std::ptr::eq(row, *r)));
            }

            let expected = rows.iter().filter(|r| selection.matches(r)).count();
            prop_assert_eq!(subset.len(), expected);
            prop_assert_eq!(
                subset,
                filter_records(&rows, COUNTRIES[c], CROPS[i], year_min, year_max)
            );
        }
    }
}
