use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Martin Sicho",
    version,
    about = "scaffviz CLI - Annotate compound tables with descriptors, scaffolds and embeddings, and explore them as interactive scatter plots.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute descriptors, scaffolds, scaffold groups and an optional embedding for a table.
    Prepare(PrepareArgs),
    /// Prepare a table and export its scatter plot as JSON or standalone HTML.
    Plot(PlotArgs),
    /// Prepare one or more tables and serve each as an interactive plot on its own port.
    Serve(ServeArgs),
    /// Overlay model predictions on prepared tables and serve the resulting plots.
    Perf(PerfArgs),
    /// Show the columns of a table and the state of its column cache.
    Info(InfoArgs),
    /// Remove columns from a table.
    Drop(DropArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScaffoldChoice {
    Murcko,
    GenericMurcko,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ManifoldChoice {
    Pca,
    Tsne,
    None,
}

impl ManifoldChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ManifoldChoice::Pca => "pca",
            ManifoldChoice::Tsne => "tsne",
            ManifoldChoice::None => "none",
        }
    }
}

/// Options shared by every command that computes derived columns.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name of the column holding SMILES strings.
    #[arg(long, value_name = "NAME")]
    pub smiles_column: Option<String>,

    // --- Descriptors ---
    /// Radius of the Morgan fingerprint.
    #[arg(long, value_name = "INT")]
    pub morgan_radius: Option<u32>,

    /// Length of the Morgan fingerprint bit vector.
    #[arg(long, value_name = "INT")]
    pub morgan_bits: Option<usize>,

    /// Do not compute Morgan fingerprints.
    #[arg(long)]
    pub no_morgan: bool,

    /// Also compute physicochemical descriptors.
    #[arg(long)]
    pub physchem: bool,

    // --- Scaffolds ---
    /// Scaffold generators to apply. Can be used multiple times.
    #[arg(long = "scaffold", value_enum, value_name = "KIND")]
    pub scaffolds: Vec<ScaffoldChoice>,

    /// Minimum number of molecules sharing a scaffold for it to get its own group.
    #[arg(short = 'm', long, value_name = "INT")]
    pub mols_per_group: Option<usize>,

    // --- Manifold ---
    /// Dimensionality reduction used for the plot axes.
    #[arg(long, value_enum, value_name = "METHOD")]
    pub manifold: Option<ManifoldChoice>,

    /// Number of embedding dimensions.
    #[arg(long, value_name = "INT")]
    pub components: Option<usize>,

    /// t-SNE perplexity.
    #[arg(long, value_name = "FLOAT")]
    pub perplexity: Option<f64>,

    /// Number of t-SNE iterations.
    #[arg(long, value_name = "INT")]
    pub iterations: Option<usize>,

    /// Seed for stochastic embeddings.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Recompute derived columns even if they are up to date.
    #[arg(long)]
    pub recalculate: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S plot.height=600
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Options controlling how a plot is drawn.
#[derive(Args, Debug, Clone, Default)]
pub struct PlotOptions {
    /// Column used for the x axis instead of the embedding.
    #[arg(short = 'x', long, value_name = "COLUMN")]
    pub x: Option<String>,

    /// Column used for the y axis instead of the embedding.
    #[arg(short = 'y', long, value_name = "COLUMN")]
    pub y: Option<String>,

    /// Column that determines point colours.
    #[arg(long, value_name = "COLUMN")]
    pub color_by: Option<String>,

    /// Column shown as the title of hover cards.
    #[arg(long, value_name = "COLUMN")]
    pub title_column: Option<String>,

    /// Column shown on hover cards. Can be used multiple times.
    #[arg(long = "card", value_name = "COLUMN")]
    pub card_columns: Vec<String>,

    /// Plot height in pixels.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Plot width in pixels. Defaults to twice the height.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,
}

/// Options for the HTTP viewer.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerOptions {
    /// Address the viewers bind to.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port of each view, in input order. Can be used multiple times.
    /// Without it, views use consecutive ports from the configured one.
    #[arg(short, long = "port", value_name = "PORT")]
    pub ports: Vec<u16>,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Path to the compound table (TSV).
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Path to the compound table (TSV).
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output path. Files ending in `.html` get a standalone page, anything else the plot as JSON.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub plot: PlotOptions,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Paths to compound tables (TSV), one view per table.
    #[arg(required = true, num_args(1..), value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub plot: PlotOptions,

    #[command(flatten)]
    pub server: ServerOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskChoice {
    Regression,
    Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PerfKindChoice {
    Errors,
    Splits,
    Predictions,
    Labels,
}

#[derive(Args, Debug)]
pub struct PerfArgs {
    /// Paths to compound tables (TSV), one view per table.
    #[arg(required = true, num_args(1..), value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Prediction files for each table, in input order. Several files for one
    /// table are joined with commas, e.g. `cv.tsv,independent.tsv`.
    #[arg(short = 'P', long = "predictions", required = true, value_name = "PATHS")]
    pub predictions: Vec<String>,

    /// Name of the modelled property. Prediction columns are `<target>_Label` and `<target>_Prediction`.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub target: String,

    /// Type of the model.
    #[arg(long, value_enum, default_value = "regression")]
    pub task: TaskChoice,

    /// What colours the points.
    #[arg(short, long, value_enum, default_value = "errors")]
    pub kind: PerfKindChoice,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub plot: PlotOptions,

    #[command(flatten)]
    pub server: ServerOptions,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the compound table (TSV).
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Name of the column holding SMILES strings.
    #[arg(long, value_name = "NAME", default_value = "SMILES")]
    pub smiles_column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupChoice {
    Descriptors,
    Scaffolds,
    ScaffoldGroups,
    Manifold,
}

#[derive(Args, Debug)]
pub struct DropArgs {
    /// Path to the compound table (TSV).
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Columns to remove.
    #[arg(value_name = "COLUMN")]
    pub columns: Vec<String>,

    /// Remove every column of a derived kind. Can be used multiple times.
    #[arg(long = "kind", value_enum, value_name = "KIND")]
    pub kinds: Vec<GroupChoice>,

    /// Name of the column holding SMILES strings.
    #[arg(long, value_name = "NAME", default_value = "SMILES")]
    pub smiles_column: String,
}
