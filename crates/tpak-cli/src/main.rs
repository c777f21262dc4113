use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use tpak_cli::config::DashboardConfig;
use tpak_cli::dashboard::run_dashboard;
use tpak_cli::evaluate::run_evaluate;
use tpak_cli::predict::run_predict;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("TPAK_LOG", "error,tpak=info"))
        .init();

    let matches = Command::new("tpak")
        .version(clap::crate_version!())
        .about("\u{1F4C8} TPaK - Labor force participation rate prediction")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("predict")
                .about("Predict the participation rate for one set of regional inputs")
                .arg(config_arg())
                .args(model_args())
                .args(input_args())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the prediction as a JSON record.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("evaluate")
                .about("Compute MAE, MSE, RMSE and R2 on the configured regional tables")
                .arg(config_arg())
                .args(model_args())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the metrics as JSON.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Render the HTML dashboard")
                .arg(config_arg())
                .args(model_args())
                .args(input_args())
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help(
                            "Path of the HTML report. Overrides the report_file \
                             specified in the configuration file.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        Some(("dashboard", sub_m)) => handle_dashboard(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn config_arg() -> Arg {
    Arg::new("config")
        .help("Path to the JSON configuration file. Prints a template when omitted.")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn model_args() -> Vec<Arg> {
    vec![
        Arg::new("variant")
            .long("variant")
            .help("Feature schema. Overrides the variant specified in the configuration file.")
            .value_parser(["three_feature", "four_feature"]),
        Arg::new("scaler_path")
            .short('s')
            .long("scaler")
            .help("Path to the fitted scaler (*.json)")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("model_path")
            .short('m')
            .long("model")
            .help("Path to the fitted regression model (*.json)")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("no_clamp")
            .long("no-clamp")
            .help("Report the raw model output instead of clamping to [0, 100].")
            .action(ArgAction::SetTrue),
    ]
}

fn input_args() -> Vec<Arg> {
    vec![
        Arg::new("population")
            .long("population")
            .help("Population, in thousands of persons")
            .value_parser(clap::value_parser!(f64)),
        Arg::new("poor")
            .long("poor")
            .help("Poor population, in thousands of persons")
            .value_parser(clap::value_parser!(f64)),
        Arg::new("schooling")
            .long("schooling")
            .help("Average years of schooling")
            .value_parser(clap::value_parser!(f64)),
        Arg::new("wage")
            .long("wage")
            .help("Regional minimum wage, in millions of rupiah (four_feature only)")
            .value_parser(clap::value_parser!(f64)),
    ]
}

/// `None` after printing the default config when no file was given.
fn resolve_config(matches: &ArgMatches) -> Result<Option<DashboardConfig>> {
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        log::warn!("No config file provided; printing the default configuration");
        println!("{}", DashboardConfig::template_json()?);
        return Ok(None);
    };
    log::info!("[TPaK] Using config: {:?}", config_path);
    DashboardConfig::from_arguments(config_path, matches).map(Some)
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let Some(config) = resolve_config(matches)? else {
        return Ok(());
    };
    match run_predict(&config, matches.get_flag("json")) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    let Some(config) = resolve_config(matches)? else {
        return Ok(());
    };
    match run_evaluate(&config, matches.get_flag("json")) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Evaluation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_dashboard(matches: &ArgMatches) -> Result<()> {
    let Some(config) = resolve_config(matches)? else {
        return Ok(());
    };
    match run_dashboard(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Dashboard failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
