use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use dementia_classifiers::config::ModelType;
use dementia_cli::classifiers::input::ClassifierRunConfig;
use dementia_cli::classifiers::naive_bayes::run_naive_bayes;
use dementia_cli::classifiers::neural::run_neural;

fn data_args() -> Vec<Arg> {
    vec![
        Arg::new("config")
            .help("Path to JSON configuration file")
            .required(false)
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("train_data")
            .short('t')
            .long("train-data")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .help(
                "Path to the training table. Overrides the training data file \
                 specified in the configuration file.",
            )
            .value_hint(ValueHint::FilePath),
        Arg::new("test_data")
            .short('T')
            .long("test-data")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .help(
                "Path to the test table. Overrides the test data file \
                 specified in the configuration file.",
            )
            .value_hint(ValueHint::FilePath),
        Arg::new("plot_dir")
            .long("plot-dir")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .help("Directory that HTML plots are written to.")
            .value_hint(ValueHint::DirPath),
        Arg::new("report")
            .long("report")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .help("Write an HTML report with metrics, plots and configuration to this file.")
            .value_hint(ValueHint::FilePath),
    ]
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("DEMENTIA_LOG", "error,dementia=info"))
        .init();

    let matches = Command::new("dementia")
        .version(clap::crate_version!())
        .about("Dementia detection from speech-transcript features")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("naive-bayes")
                .about("Cross-validate a Gaussian Naive Bayes classifier and score it")
                .args(data_args())
                .arg(
                    Arg::new("fold_selection")
                        .long("fold-selection")
                        .help("Which cross-validation fold's fit is evaluated.")
                        .value_parser(["last-fold", "best-validation"]),
                )
                .arg(
                    Arg::new("plot_correlation")
                        .long("plot-correlation")
                        .help("Plot the feature correlation heatmap of the training set.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("plot_frequency")
                        .long("plot-frequency")
                        .value_name("FEATURE")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Plot a frequency histogram of one training-set feature."),
                ),
        )
        .subcommand(
            Command::new("neural")
                .about("Train a feed-forward network with early stopping and score it")
                .args(data_args())
                .arg(
                    Arg::new("epochs")
                        .long("epochs")
                        .value_parser(clap::value_parser!(usize))
                        .help("Maximum number of training epochs."),
                )
                .arg(
                    Arg::new("patience")
                        .long("patience")
                        .value_parser(clap::value_parser!(usize))
                        .help("Epochs without validation-loss improvement before stopping."),
                )
                .arg(
                    Arg::new("plot_history")
                        .long("plot-history")
                        .help("Plot accuracy and loss per epoch.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("scale_features")
                        .long("scale-features")
                        .help("Standardise every feature column using the training rows.")
                        .action(ArgAction::SetTrue),
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
        Some(("naive-bayes", sub_m)) => {
            let config = load_config(sub_m, ModelType::gaussian_nb())?;
            match run_naive_bayes(&config) {
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("Naive Bayes run failed: {:#}", e);
                    std::process::exit(1)
                }
            }
        }
        Some(("neural", sub_m)) => {
            let config = load_config(sub_m, ModelType::feed_forward())?;
            match run_neural(&config) {
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("Neural network run failed: {:#}", e);
                    std::process::exit(1)
                }
            }
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn load_config(matches: &ArgMatches, default_model: ModelType) -> Result<ClassifierRunConfig> {
    let config_path = matches.get_one::<PathBuf>("config");
    match config_path {
        Some(path) => log::info!("[dementia] Using config: {:?}", path),
        None => eprintln!("[dementia] No config file provided; using defaults."),
    }

    let config = ClassifierRunConfig::from_arguments(config_path, matches, default_model)?;

    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&config)?;
        eprintln!("[dementia] Default config:\n{}", default_json);
    }
    config.validate_data_files()?;
    Ok(config)
}
