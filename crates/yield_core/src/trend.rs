//! Time-ordered yield history for a selection

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::YieldRecord;

/// Yield for one year; duplicate rows for a year are averaged
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub yield_hg_ha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSummary {
    pub first_year: i32,
    pub last_year: i32,
    pub min_yield: f64,
    pub max_yield: f64,
    pub mean_yield: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YieldTrend {
    pub points: Vec<TrendPoint>,
}

impl YieldTrend {
    pub fn from_records(history: &[&YieldRecord]) -> Self {
        let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
        for record in history {
            let entry = by_year.entry(record.year).or_insert((0.0, 0));
            entry.0 += record.yield_hg_ha;
            entry.1 += 1;
        }
        let points = by_year
            .into_iter()
            .map(|(year, (sum, n))| TrendPoint {
                year,
                yield_hg_ha: sum / n as f64,
            })
            .collect();
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn summary(&self) -> Option<TrendSummary> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        let (min, max, sum) = self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), p| (min.min(p.yield_hg_ha), max.max(p.yield_hg_ha), sum + p.yield_hg_ha),
        );
        Some(TrendSummary {
            first_year: first.year,
            last_year: last.year,
            min_yield: min,
            max_yield: max,
            mean_yield: sum / self.points.len() as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, yield_hg_ha: f64) -> YieldRecord {
        YieldRecord {
            year,
            country: "India".to_string(),
            crop: "Wheat".to_string(),
            rainfall_mm: 1083.0,
            pesticides_tonnes: 75000.0,
            avg_temp: 25.0,
            yield_hg_ha,
        }
    }

    #[test]
    fn test_sorted_and_averaged() {
        // India has several temperature stations per year in the source data
        let rows = [
            record(1992, 300.0),
            record(1990, 100.0),
            record(1990, 200.0),
            record(1991, 250.0),
        ];
        let history: Vec<&YieldRecord> = rows.iter().collect();
        let trend = YieldTrend::from_records(&history);

        let years: Vec<i32> = trend.points.iter().map(|p| p.year).collect();
        assert_eq!(years, [1990, 1991, 1992]);
        assert_eq!(trend.points[0].yield_hg_ha, 150.0);

        let summary = trend.summary().unwrap();
        assert_eq!(summary.first_year, 1990);
        assert_eq!(summary.last_year, 1992);
        assert_eq!(summary.min_yield, 150.0);
        assert_eq!(summary.max_yield, 300.0);
        assert_eq!(summary.mean_yield, 700.0 / 3.0);
    }

    #[test]
    fn test_empty_trend() {
        let trend = YieldTrend::from_records(&[]);
        assert!(trend.is_empty());
        assert!(trend.summary().is_none());
    }
}
