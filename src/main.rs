//! hepatoscreen command-line front end.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use hepatoscreen::evaluation::{render_dataset_summary, render_summary};
use hepatoscreen::logging::{init_logging, LogConfig, LogFormat};
use hepatoscreen::screening::{age_from_birth_date, PatientRecord};
use hepatoscreen::{
    AppConfig, EvaluationScope, FsArtifactStore, IlpdCsvLoader, ModelEvaluator,
    ModelLifecycleManager, ModelRegistry, Resolution, SplitConfig,
};

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, PredictArgs};

fn main() {
    let cli = Cli::parse();
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(format)
        .with_ansi(io::stderr().is_terminal());
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    if let Err(error) = run(&cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let registry = initialize(&config)?;

    match &cli.command {
        Command::Init => {
            for split in registry.splits() {
                let how = match registry.resolution(split) {
                    Some(Resolution::Loaded) => "loaded",
                    Some(Resolution::Trained) => "trained",
                    None => "missing",
                };
                println!("{split:<8} {how}");
            }
            println!(
                "{} split(s): {} loaded, {} trained",
                registry.splits().len(),
                registry.loaded_count(),
                registry.trained_count()
            );
        }
        Command::Predict(args) => predict(&registry, args)?,
        Command::Stats { held_out, describe } => {
            if *describe {
                println!("{}", render_dataset_summary(&registry.dataset().summary()));
            }
            let scope = if *held_out {
                EvaluationScope::HeldOut {
                    seed: registry.seed(),
                }
            } else {
                EvaluationScope::FullDataset
            };
            let reports = ModelEvaluator::evaluate(&registry, scope).context("evaluating models")?;
            print!("{}", render_summary(&reports));
        }
    }
    Ok(())
}

fn initialize(config: &AppConfig) -> Result<ModelRegistry> {
    let splits = config.split_configs().context("invalid test_fractions")?;
    let manager = ModelLifecycleManager::new(
        FsArtifactStore::new(&config.artifact_dir),
        IlpdCsvLoader::with_timeout(config.fetch_timeout()),
        config.dataset_source(),
        config.trainer.clone(),
    );
    manager
        .initialize(&splits)
        .with_context(|| format!("initializing models in {}", config.artifact_dir.display()))
}

fn predict(registry: &ModelRegistry, args: &PredictArgs) -> Result<()> {
    let age = match (&args.birth_date, args.age) {
        (Some(dob), _) => {
            let today = chrono::Local::now().date_naive();
            f64::from(age_from_birth_date(dob, today)?)
        }
        (None, Some(age)) => age,
        (None, None) => anyhow::bail!("either --age or --birth-date is required"),
    };

    let record = PatientRecord {
        age,
        gender: args.gender,
        total_bilirubin: args.total_bilirubin,
        direct_bilirubin: args.direct_bilirubin,
        alkaline_phosphotase: args.alkaline_phosphotase,
        alamine_aminotransferase: args.alamine_aminotransferase,
        aspartate_aminotransferase: args.aspartate_aminotransferase,
        total_proteins: args.total_proteins,
        albumin: args.albumin,
        albumin_globulin_ratio: args.albumin_globulin_ratio,
    };
    record.validate().context("invalid patient record")?;

    let split = SplitConfig::from_percent(args.split)?;
    let prediction = registry.predict(split, &record.features(), args.model.into())?;

    println!("model:       {} (split {split})", prediction.model.description());
    println!("label:       {}", prediction.label);
    println!("probability: {:.1}%", prediction.probability * 100.0);
    println!("result:      {} [{}]", prediction.risk.label(), prediction.risk.color());
    Ok(())
}
