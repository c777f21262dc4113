//! Integration tests for config parsing, CLI overrides, and util helpers.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use tpak_cli::config::DashboardConfig;
use tpak_cli::util::validate_html_output;
use tpak_model::{ClampPolicy, SchemaVariant};

fn write_json(dir: &std::path::Path, body: &str) -> PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, body).unwrap();
    path
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

#[test]
fn default_config_values() {
    let cfg = DashboardConfig::default();
    assert_eq!(cfg.variant, SchemaVariant::FourFeature);
    assert!(cfg.clamp);
    assert_eq!(cfg.clamp_policy(), ClampPolicy::Clamp);
    assert_eq!(cfg.scaler_path, PathBuf::from("scaler.json"));
    assert_eq!(cfg.model_path, PathBuf::from("model_regression.json"));
    assert_eq!(cfg.inputs.minimum_wage_millions, Some(4.0));
    assert!(cfg.datasets.is_empty());
}

#[test]
fn template_round_trips() {
    let json = DashboardConfig::template_json().unwrap();
    let cfg: DashboardConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, DashboardConfig::default());
}

#[test]
fn partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(dir.path(), r#"{ "variant": "three_feature", "clamp": false }"#);
    let cfg = DashboardConfig::from_file(&path).unwrap();
    assert_eq!(cfg.variant, SchemaVariant::ThreeFeature);
    assert_eq!(cfg.clamp_policy(), ClampPolicy::Unclamped);
    assert_eq!(cfg.report_file, DashboardConfig::default().report_file);
}

#[test]
fn invalid_field_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(dir.path(), r#"{ "variant": "seven_feature", "clamp": "yes" }"#);
    let cfg = DashboardConfig::from_file(&path).unwrap();
    assert_eq!(cfg.variant, SchemaVariant::FourFeature);
    assert!(cfg.clamp);
}

#[test]
fn dataset_paths_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(
        dir.path(),
        r#"{ "datasets": { "participation_rate": "tpak.csv", "schooling": "rls.csv" } }"#,
    );
    let cfg = DashboardConfig::from_file(&path).unwrap();
    assert_eq!(cfg.datasets.entries().len(), 2);
    assert_eq!(cfg.datasets.schooling, Some(PathBuf::from("rls.csv")));
}

#[test]
fn malformed_json_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(dir.path(), "{ variant: ");
    assert!(DashboardConfig::from_file(&path).is_err());
}

#[test]
fn cli_overrides_win_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(dir.path(), r#"{ "variant": "four_feature" }"#);

    let command = Command::new("test")
        .arg(Arg::new("variant").long("variant"))
        .arg(Arg::new("schooling").long("schooling").value_parser(clap::value_parser!(f64)))
        .arg(Arg::new("no_clamp").long("no-clamp").action(ArgAction::SetTrue));
    let matches = command
        .try_get_matches_from(["test", "--variant", "three_feature", "--schooling", "12.5", "--no-clamp"])
        .unwrap();

    let cfg = DashboardConfig::from_arguments(&path, &matches).unwrap();
    assert_eq!(cfg.variant, SchemaVariant::ThreeFeature);
    assert_eq!(cfg.inputs.avg_schooling_years, 12.5);
    assert!(!cfg.clamp);
    // Not defined on this command, so untouched.
    assert_eq!(cfg.inputs.population_thousands, 1500.0);
}

// ---------------------------------------------------------------------------
// validate_html_output
// ---------------------------------------------------------------------------

#[test]
fn html_output_accepts_html_in_existing_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(validate_html_output(&dir.path().join("out.html")).is_ok());
    assert!(validate_html_output(std::path::Path::new("out.HTML")).is_ok());
}

#[test]
fn html_output_rejects_wrong_extension_or_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(validate_html_output(&dir.path().join("out.csv")).is_err());
    assert!(validate_html_output(std::path::Path::new("/nonexistent/dir/out.html")).is_err());
}
