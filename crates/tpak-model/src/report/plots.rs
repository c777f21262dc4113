use itertools_num::linspace;
use plotly::common::{Line, Marker, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::error::PredictError;
use crate::io::{Indicator, MergedDataset};
use crate::predictor::Predictor;
use crate::schema::FeatureVector;

/// Mean of an indicator per year across regions.
pub fn plot_yearly_trend(dataset: &MergedDataset, indicator: Indicator, title: &str) -> Plot {
    let (years, means): (Vec<i32>, Vec<f64>) = dataset.yearly_mean(indicator).into_iter().unzip();

    let trace = Scatter::new(years, means)
        .mode(Mode::LinesMarkers)
        .name(indicator.label());

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Year").dtick(1.0))
            .y_axis(Axis::new().title(indicator.label())),
    );
    plot
}

/// One marker per (region, year): `indicator` against participation rate.
pub fn plot_indicator_scatter(dataset: &MergedDataset, indicator: Indicator, title: &str) -> Plot {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut labels = Vec::new();
    for row in &dataset.rows {
        if let (Some(x), Some(y)) = (row.get(indicator), row.get(Indicator::ParticipationRate)) {
            xs.push(x);
            ys.push(y);
            labels.push(format!("{} {}", row.region, row.year));
        }
    }

    let trace = Scatter::new(xs, ys)
        .mode(Mode::Markers)
        .text_array(labels)
        .marker(Marker::new().size(8).opacity(0.7))
        .name("Regions");

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title(indicator.label()))
            .y_axis(Axis::new().title(Indicator::ParticipationRate.label())),
    );
    plot
}

/// Predicted rate while sweeping one bounded feature over its domain,
/// holding the others at `base`.
pub fn plot_feature_sensitivity(
    predictor: &Predictor,
    base: &FeatureVector,
    feature: &str,
    n_points: usize,
) -> Result<Plot, PredictError> {
    let spec = predictor
        .schema()
        .field(feature)
        .ok_or_else(|| PredictError::invalid(feature, "field is not part of the active schema"))?;
    let (Some(lo), Some(hi)) = (spec.min, spec.max) else {
        return Err(PredictError::invalid(
            feature,
            "sensitivity sweep needs a bounded domain",
        ));
    };

    let xs: Vec<f64> = linspace(lo, hi, n_points.max(2)).collect();
    let ys = xs
        .iter()
        .map(|&x| {
            let mut point = base.clone();
            point.insert(feature, x);
            predictor.predict(&point).map(|p| p.value)
        })
        .collect::<Result<Vec<f64>, PredictError>>()?;

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(xs, ys)
            .mode(Mode::Lines)
            .name("Predicted rate")
            .line(Line::new().color("rgba(199, 125, 0, 1.0)")),
    );
    if let Some(current) = base.get(feature) {
        let current_pred = predictor.predict(base)?;
        plot.add_trace(
            Scatter::new(vec![current], vec![current_pred.value])
                .mode(Mode::Markers)
                .marker(Marker::new().size(12).color("red"))
                .name("Current input"),
        );
    }
    plot.set_layout(
        Layout::new()
            .title(format!("Sensitivity to {}", spec.label).as_str())
            .x_axis(Axis::new().title(format!("{} ({})", spec.label, spec.unit).as_str()))
            .y_axis(Axis::new().title("Predicted rate (%)")),
    );
    Ok(plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::ClampPolicy;
    use crate::schema::{FormInputs, SchemaVariant, POPULATION, SCHOOLING};

    #[test]
    fn sensitivity_requires_bounded_feature() {
        let p = Predictor::synthetic(SchemaVariant::ThreeFeature, ClampPolicy::Clamp).unwrap();
        let base = FormInputs::default().to_feature_vector(p.schema()).unwrap();
        assert!(plot_feature_sensitivity(&p, &base, SCHOOLING, 20).is_ok());
        assert!(plot_feature_sensitivity(&p, &base, POPULATION, 20).is_err());
        assert!(plot_feature_sensitivity(&p, &base, "unknown", 20).is_err());
    }
}
