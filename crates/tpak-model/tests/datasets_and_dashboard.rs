//! Integration tests for regional tables, metrics on joined rows, and the
//! rendered dashboard.

use std::fs;
use std::path::{Path, PathBuf};

use tpak_model::io::{load_datasets, DatasetPaths, Indicator};
use tpak_model::metrics::{evaluate_predictor, EvaluationMetrics, MetricsSource};
use tpak_model::report::{build_dashboard, save_dashboard, DashboardContext};
use tpak_model::{ClampPolicy, FormInputs, Predictor, SchemaVariant};

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn fixture(dir: &Path) -> DatasetPaths {
    DatasetPaths {
        participation_rate: Some(write(
            dir,
            "tpak.csv",
            "Kabupaten/Kota;2022;2023;2024\n\
             Bogor;63,51;64,20;65,02\n\
             Bandung;66,10;66,85;-\n\
             Depok;61,44;62,05;62,90\n",
        )),
        population: Some(write(
            dir,
            "population.csv",
            "Kabupaten/Kota;2022;2023;2024\n\
             Bogor;5.427,07;5.556,11;5.682,30\n\
             Bandung;3.665,66;3.721,11;3.774,40\n\
             Depok;2.085,94;2.123,35;2.163,64\n",
        )),
        poor_population: Some(write(
            dir,
            "poor.csv",
            "Kabupaten/Kota;2022;2023;2024\n\
             Bogor;474,39;466,52;451,10\n\
             Bandung;254,11;249,72;243,30\n\
             Depok;52,87;51,01;49,85\n",
        )),
        schooling: Some(write(
            dir,
            "schooling.csv",
            "Kabupaten/Kota;2022;2023;2024\n\
             Bogor;8,31;8,47;8,62\n\
             Bandung;9,05;9,12;9,30\n\
             Depok;11,28;11,40;11,52\n",
        )),
        minimum_wage: Some(write(
            dir,
            "wage.csv",
            "Kabupaten/Kota;2022;2023;2024\n\
             Bogor;4.217.206;4.520.212;4.579.541\n\
             Bandung;3.241.929;3.492.465;3.527.967\n\
             Depok;4.377.231;4.694.493;4.878.612\n",
        )),
    }
}

#[test]
fn tables_are_unpivoted_and_inner_joined() {
    let dir = tempfile::tempdir().unwrap();
    let merged = load_datasets(&fixture(dir.path())).unwrap().unwrap();

    // Bandung 2024 has no participation rate and drops out of the join.
    assert_eq!(merged.len(), 8);
    assert_eq!(merged.years(), vec![2022, 2023, 2024]);
    assert_eq!(merged.indicators.len(), 5);

    let bogor_2022 = merged
        .rows
        .iter()
        .find(|r| r.region == "Bogor" && r.year == 2022)
        .unwrap();
    assert_eq!(bogor_2022.get(Indicator::Population), Some(5427.07));
    assert_eq!(bogor_2022.get(Indicator::MinimumWage), Some(4_217_206.0));

    // Rows are ordered by region, then year.
    assert_eq!(merged.rows[0].region, "Bandung");
    assert_eq!(merged.rows[0].year, 2022);
}

#[test]
fn no_configured_tables_yields_none() {
    assert!(load_datasets(&DatasetPaths::default()).unwrap().is_none());
}

#[test]
fn unreadable_table_is_an_error() {
    let paths = DatasetPaths {
        population: Some(PathBuf::from("/nonexistent/population.csv")),
        ..DatasetPaths::default()
    };
    assert!(load_datasets(&paths).is_err());
}

#[test]
fn computed_metrics_on_joined_rows() {
    let dir = tempfile::tempdir().unwrap();
    let merged = load_datasets(&fixture(dir.path())).unwrap().unwrap();
    let predictor = Predictor::synthetic(SchemaVariant::FourFeature, ClampPolicy::Clamp).unwrap();

    let rows = merged.feature_rows(predictor.schema());
    assert_eq!(rows.len(), 8);

    let metrics = evaluate_predictor(&predictor, &rows).unwrap();
    assert_eq!(metrics.source, MetricsSource::Computed { samples: 8 });
    assert!(metrics.mae > 0.0);
    assert!((metrics.rmse - metrics.mse.sqrt()).abs() < 1e-12);
}

#[test]
fn dashboard_is_written_with_all_sections() {
    let dir = tempfile::tempdir().unwrap();
    let merged = load_datasets(&fixture(dir.path())).unwrap().unwrap();
    let predictor = Predictor::synthetic(SchemaVariant::FourFeature, ClampPolicy::Clamp).unwrap();
    let features = FormInputs::default()
        .to_feature_vector(predictor.schema())
        .unwrap();
    let prediction = predictor.predict(&features).unwrap();

    let ctx = DashboardContext {
        app_name: "tpak".to_string(),
        version: "0.1.0".to_string(),
        predictor: &predictor,
        metrics: EvaluationMetrics::reference(),
        dataset: Some(&merged),
        prediction: Some(Ok((features, prediction))),
    };

    let out = dir.path().join("dashboard.html");
    save_dashboard(&ctx, &out).unwrap();
    let html = fs::read_to_string(&out).unwrap();
    for section in ["Overview", "Data exploration", "Model evaluation", "Prediction"] {
        assert!(html.contains(section), "missing section {}", section);
    }
    assert!(html.contains("Bogor"));
    assert!(html.contains("3.067"));
    assert!(html.contains("65.00 %"));
}

#[test]
fn dashboard_without_prediction_omits_prediction_section() {
    let predictor = Predictor::synthetic(SchemaVariant::ThreeFeature, ClampPolicy::Clamp).unwrap();
    let ctx = DashboardContext {
        app_name: "tpak".to_string(),
        version: "0.1.0".to_string(),
        predictor: &predictor,
        metrics: EvaluationMetrics::reference(),
        dataset: None,
        prediction: None,
    };
    let html = build_dashboard(&ctx).unwrap().render().into_string();
    assert!(html.contains("Model evaluation"));
    assert!(!html.contains("id=\"prediction\""));
}
