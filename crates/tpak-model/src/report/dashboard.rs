//! The participation-rate dashboard page.
use std::path::Path;

use anyhow::Result;
use maud::html;

use crate::error::PredictError;
use crate::io::{Indicator, MergedDataset};
use crate::metrics::EvaluationMetrics;
use crate::predictor::{ModelSource, Prediction, Predictor};
use crate::report::plots::{plot_feature_sensitivity, plot_indicator_scatter, plot_yearly_trend};
use crate::report::report::{Report, ReportSection};
use crate::schema::{FeatureVector, SCHOOLING};

/// Rows shown in the data table before it is cut off.
const MAX_TABLE_ROWS: usize = 50;

/// Everything the dashboard shows.
pub struct DashboardContext<'a> {
    pub app_name: String,
    pub version: String,
    pub predictor: &'a Predictor,
    pub metrics: EvaluationMetrics,
    pub dataset: Option<&'a MergedDataset>,
    /// Outcome of the requested prediction. An error is shown as a
    /// validation message in the Prediction section.
    pub prediction: Option<Result<(FeatureVector, Prediction), PredictError>>,
}

pub fn build_dashboard(ctx: &DashboardContext) -> Result<Report> {
    let mut report = Report::new(
        &ctx.app_name,
        &ctx.version,
        "Labor Force Participation Rate (TPaK) Prediction",
    );

    /* Overview */
    {
        let mut section = ReportSection::new("Overview");
        let schema = ctx.predictor.schema();
        section.add_content(html! {
            @match ctx.predictor.source() {
                ModelSource::Persisted => {
                    div class="banner ok" { "Model and scaler loaded from persisted artifacts." }
                }
                ModelSource::Synthetic => {
                    div class="banner warn" {
                        "Model artifacts were not found or could not be read. "
                        "Predictions come from a synthetic single-sample model and are for demonstration only."
                    }
                }
            }
            p {
                "Estimates the labor force participation rate of a region from population "
                "and education indicators with an ordinary least squares linear regression."
            }
            table {
                tr { th { "Feature" } th { "Unit" } th { "Domain" } th { "Weight" } }
                @for (spec, weight) in schema.fields().iter().zip(&ctx.predictor.model().weights) {
                    tr {
                        td { (spec.label) }
                        td { (spec.unit) }
                        td { (format_domain(spec.min, spec.max)) }
                        td { (format!("{:.4}", weight)) }
                    }
                }
                tr { td { "Intercept" } td {} td {} td { (format!("{:.4}", ctx.predictor.model().intercept)) } }
            }
        });
        report.add_section(section);
    }

    /* Data exploration */
    if let Some(dataset) = ctx.dataset.filter(|d| !d.is_empty()) {
        let mut section = ReportSection::new("Data exploration");
        section.add_content(html! {
            p { (dataset.len()) " region-year rows across years " (format_years(&dataset.years())) "." }
            table {
                tr {
                    th { "Region" } th { "Year" }
                    @for indicator in &dataset.indicators { th { (indicator.label()) } }
                }
                @for row in dataset.rows.iter().take(MAX_TABLE_ROWS) {
                    tr {
                        td { (row.region) } td { (row.year) }
                        @for indicator in &dataset.indicators {
                            td { (row.get(*indicator).map(|v| format!("{:.2}", v)).unwrap_or_default()) }
                        }
                    }
                }
            }
            @if dataset.len() > MAX_TABLE_ROWS {
                p { "Showing the first " (MAX_TABLE_ROWS) " rows." }
            }
        });
        if dataset.indicators.contains(&Indicator::ParticipationRate) {
            section.add_plot(plot_yearly_trend(
                dataset,
                Indicator::ParticipationRate,
                "Average participation rate per year",
            ));
        }
        for indicator in dataset
            .indicators
            .iter()
            .filter(|i| **i != Indicator::ParticipationRate)
        {
            section.add_plot(plot_indicator_scatter(
                dataset,
                *indicator,
                &format!("{} vs participation rate", indicator.label()),
            ));
        }
        report.add_section(section);
    }

    /* Evaluation */
    {
        let mut section = ReportSection::new("Model evaluation");
        let m = &ctx.metrics;
        section.add_content(html! {
            div class="metric" { "MAE" b { (format!("{:.3}", m.mae)) } }
            div class="metric" { "MSE" b { (format!("{:.3}", m.mse)) } }
            div class="metric" { "RMSE" b { (format!("{:.3}", m.rmse)) } }
            div class="metric" { "R²" b { (format!("{:.3}", m.r2)) } }
            p { "Source: " (m.source) }
        });
        report.add_section(section);
    }

    /* Prediction */
    if let Some(Err(e)) = &ctx.prediction {
        let mut section = ReportSection::new("Prediction");
        section.add_content(html! {
            @match e {
                PredictError::InvalidInput { field, reason } => {
                    div class="banner error" {
                        "Invalid input for " code { (field) } ": " (reason)
                    }
                }
                PredictError::ModelUnavailable(msg) => {
                    div class="banner error" { "Prediction unavailable: " (msg) }
                }
            }
        });
        report.add_section(section);
    }

    if let Some(Ok((features, prediction))) = &ctx.prediction {
        let mut section = ReportSection::new("Prediction");
        let schema = ctx.predictor.schema();
        section.add_content(html! {
            table {
                @for spec in schema.fields() {
                    tr {
                        td { (spec.label) " (" (spec.unit) ")" }
                        td { (features.get(&spec.name).map(|v| format!("{:.2}", v)).unwrap_or_default()) }
                    }
                }
            }
            p class="result" { (prediction.display_percent()) }
            p { "Estimated labor force participation rate" }
            @if prediction.clamped {
                p { "Raw model output " (format!("{:.2}", prediction.raw)) " was clamped to [0, 100]." }
            }
        });
        if schema.contains(SCHOOLING) {
            section.add_plot(plot_feature_sensitivity(ctx.predictor, features, SCHOOLING, 50)?);
        }
        report.add_section(section);
    }

    Ok(report)
}

/// Build and write the dashboard to `path`.
pub fn save_dashboard<P: AsRef<Path>>(ctx: &DashboardContext, path: P) -> Result<()> {
    let report = build_dashboard(ctx)?;
    report.save_to_file(&path)?;
    log::info!("Dashboard written to {}", path.as_ref().display());
    Ok(())
}

fn format_domain(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("[{}, {}]", lo, hi),
        (Some(lo), None) => format!("≥ {}", lo),
        (None, Some(hi)) => format!("≤ {}", hi),
        (None, None) => "any".to_string(),
    }
}

fn format_years(years: &[i32]) -> String {
    match (years.first(), years.last()) {
        (Some(first), Some(last)) if first != last => format!("{}–{}", first, last),
        (Some(first), _) => first.to_string(),
        _ => "-".to_string(),
    }
}
