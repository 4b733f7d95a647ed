//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use hepatoscreen::screening::Gender;
use hepatoscreen::ClassifierKind;

#[derive(Parser)]
#[command(
    name = "hepatoscreen",
    version,
    about = "Liver-disease risk screening on the ILPD dataset",
    long_about = "Trains or restores SVM and MLP classifiers for each configured \
                  train/test split, scores patient records and reports metrics."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file (defaults are used when omitted).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load or train the models for every configured split.
    Init,

    /// Score one patient record.
    Predict(PredictArgs),

    /// Evaluate every split and model.
    Stats {
        /// Score only each split's held-out rows instead of the full table.
        #[arg(long)]
        held_out: bool,

        /// Also print per-feature statistics and the class balance.
        #[arg(long)]
        describe: bool,
    },
}

#[derive(Args)]
pub struct PredictArgs {
    /// Test-set percentage of the split whose models are used.
    #[arg(long, default_value_t = 20)]
    pub split: u8,

    #[arg(long, value_enum, default_value = "svm")]
    pub model: ModelArg,

    /// Age in years.
    #[arg(long, required_unless_present = "birth_date", conflicts_with = "birth_date")]
    pub age: Option<f64>,

    /// Birth date (YYYY-MM-DD), used to derive the age.
    #[arg(long, value_name = "DATE")]
    pub birth_date: Option<String>,

    /// male | female
    #[arg(long)]
    pub gender: Gender,

    #[arg(long)]
    pub total_bilirubin: f64,

    #[arg(long)]
    pub direct_bilirubin: f64,

    #[arg(long)]
    pub alkaline_phosphotase: f64,

    /// ALT (SGPT)
    #[arg(long)]
    pub alamine_aminotransferase: f64,

    /// AST (SGOT)
    #[arg(long)]
    pub aspartate_aminotransferase: f64,

    #[arg(long)]
    pub total_proteins: f64,

    #[arg(long)]
    pub albumin: f64,

    #[arg(long)]
    pub albumin_globulin_ratio: f64,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModelArg {
    Svm,
    Mlp,
}

impl From<ModelArg> for ClassifierKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Svm => ClassifierKind::Svm,
            ModelArg::Mlp => ClassifierKind::Mlp,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
