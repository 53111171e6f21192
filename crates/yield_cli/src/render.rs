//! Plain-text rendering of explorer results

use std::fmt::Write as _;

use cropcast_core::explorer::{Forecast, History, SelectorOptions};
use cropcast_core::schema::{AREA_PREFIX, ITEM_PREFIX};
use cropcast_core::YieldRecord;

/// Width of the longest bar in the trend chart
pub const CHART_WIDTH: usize = 40;

pub fn render_options(options: &SelectorOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Countries ({}):", options.countries.len());
    for country in &options.countries {
        let _ = writeln!(out, "  {country}");
    }
    let _ = writeln!(out, "Crops ({}):", options.crops.len());
    for crop in &options.crops {
        let _ = writeln!(out, "  {crop}");
    }
    let _ = writeln!(
        out,
        "Historical years: {}-{}",
        options.first_year, options.last_year
    );
    let _ = writeln!(
        out,
        "Predictable years: up to {}",
        options.max_predict_year
    );
    out
}

/// Horizontal bar chart, one line per year, scaled to the largest yield
pub fn render_trend(history: &History<'_>, width: usize) -> String {
    let selection = &history.selection;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Historical yield: {} in {} ({}-{})",
        selection.crop, selection.country, selection.year_min, selection.year_max
    );

    let Some(summary) = history.trend.summary() else {
        let _ = writeln!(out, "  No historical data for this selection");
        return out;
    };

    let scale = if summary.max_yield > 0.0 {
        width as f64 / summary.max_yield
    } else {
        0.0
    };
    for point in &history.trend.points {
        let len = (point.yield_hg_ha.max(0.0) * scale).round() as usize;
        let _ = writeln!(
            out,
            "  {:>4} | {:<width$} {:.0}",
            point.year,
            "#".repeat(len),
            point.yield_hg_ha,
        );
    }
    let _ = writeln!(
        out,
        "  min {:.0}  max {:.0}  mean {:.0} hg/ha over {} years",
        summary.min_yield,
        summary.max_yield,
        summary.mean_yield,
        history.trend.len()
    );
    out
}

/// Raw filtered rows
pub fn render_table(rows: &[&YieldRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:>12}  {:>14}  {:>8}  {:>12}",
        "Year", "rain_mm", "pesticides_t", "avg_temp", "yield_hg_ha"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:>4}  {:>12.1}  {:>14.2}  {:>8.2}  {:>12.0}",
            row.year, row.rainfall_mm, row.pesticides_tonnes, row.avg_temp, row.yield_hg_ha
        );
    }
    out
}

/// Feature averages and the predicted value
pub fn render_forecast(forecast: &Forecast<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Features for {}:", forecast.predict_year);
    for (name, value) in forecast.means.columns() {
        let _ = writeln!(out, "  {name:<30} {value:.2}");
    }
    let hot: Vec<&str> = forecast
        .features
        .iter()
        .filter(|(name, value)| {
            *value != 0.0 && (name.starts_with(AREA_PREFIX) || name.starts_with(ITEM_PREFIX))
        })
        .map(|(name, _)| name)
        .collect();
    let _ = writeln!(
        out,
        "  {:<30} {}",
        "categories",
        if hot.is_empty() {
            "(none known to the model)".to_string()
        } else {
            hot.join(", ")
        }
    );
    let _ = writeln!(
        out,
        "Predicted yield for {}: {:.2} hg/ha",
        forecast.predict_year, forecast.prediction
    );
    out
}
