//! ofpost CLI - render the post-processing artifacts of solver cases
//!
//! Exit status: 0 when no artifact failed, 1 when at least one did (or a
//! case could not be read), 2 on a configuration error.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ofpost_rs::context::{resolve, Compressibility, ContextFlags, Dimensionality, ImageFormat, TimeRegime, VectorDisplay};
use ofpost_rs::error::{PostError, PostResult};
use ofpost_rs::output::export::{export_summary_csv, CsvConfig, CsvMetadata};
use ofpost_rs::output::PlottersPrimitive;
use ofpost_rs::pipeline::{Pipeline, RunSummary};

/// ofpost - headless rendering of CFD post-processing output
#[derive(Parser)]
#[command(name = "ofpost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Case directories to process
    #[arg(required = true)]
    cases: Vec<PathBuf>,

    /// Output directory (default: `images` inside each case)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Spatial dimensionality of the simulation
    #[arg(long, value_enum)]
    dim: Option<DimArg>,

    /// Transient results: one image per time step
    #[arg(long)]
    transient: bool,

    /// Incompressible simulation
    #[arg(long, value_enum)]
    incomp: Option<YesNo>,

    /// Image format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// How vector fields are shown
    #[arg(long, value_enum)]
    vector: Option<VectorArg>,

    /// Only render these fields (comma separated)
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// TOML file with context flags; command-line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a CSV report of the run
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DimArg {
    #[value(name = "2d", alias = "2D")]
    Two,
    #[value(name = "3d", alias = "3D")]
    Three,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum YesNo {
    Yes,
    No,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Png,
    Bmp,
    #[value(alias = "jpg")]
    Jpeg,
    Svg,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VectorArg {
    Magnitude,
    X,
    Y,
    Z,
    All,
}

impl Cli {
    /// Flags given on the command line
    fn flags(&self) -> ContextFlags {
        ContextFlags {
            dimensionality: self.dim.map(|d| match d {
                DimArg::Two => Dimensionality::Two,
                DimArg::Three => Dimensionality::Three,
            }),
            regime: self.transient.then_some(TimeRegime::Transient),
            compressibility: self.incomp.map(|i| match i {
                YesNo::Yes => Compressibility::Incompressible,
                YesNo::No => Compressibility::Compressible,
            }),
            image_format: self.format.map(|f| match f {
                FormatArg::Png => ImageFormat::Png,
                FormatArg::Bmp => ImageFormat::Bmp,
                FormatArg::Jpeg => ImageFormat::Jpeg,
                FormatArg::Svg => ImageFormat::Svg,
            }),
            vector_display: self.vector.map(|v| match v {
                VectorArg::Magnitude => VectorDisplay::Magnitude,
                VectorArg::X => VectorDisplay::X,
                VectorArg::Y => VectorDisplay::Y,
                VectorArg::Z => VectorDisplay::Z,
                VectorArg::All => VectorDisplay::All,
            }),
            fields: self.fields.clone(),
            width: self.width,
            height: self.height,
        }
    }

    /// Output root for one case
    fn output_for(&self, case: &Path) -> PathBuf {
        match &self.output {
            Some(root) if self.cases.len() > 1 => {
                let name = case.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("case"));
                root.join(name)
            }
            Some(root) => root.clone(),
            None => case.join("images"),
        }
    }
}

fn run(cli: &Cli) -> PostResult<RunSummary> {
    let flags = match &cli.config {
        Some(path) => ContextFlags::from_toml_file(path)?.merge(cli.flags()),
        None => cli.flags(),
    };
    let policy = resolve(&flags);
    policy.validate()?;

    let primitive = PlottersPrimitive::default();
    let mut summary = RunSummary::default();
    let mut unreadable = 0;

    for case in &cli.cases {
        let pipeline = Pipeline::new(policy.clone(), cli.output_for(case), &primitive);
        match pipeline.run(case) {
            Ok(result) => summary = summary.merge(result),
            Err(e @ PostError::Configuration(_)) => return Err(e),
            Err(e) => {
                // an unreadable case counts as a failure, the other cases still run
                error!("{}", e);
                unreadable += 1;
            }
        }
    }
    summary.failed += unreadable;

    if let Some(path) = &cli.summary {
        let case = cli
            .cases
            .iter()
            .map(|c| c.display().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let metadata = CsvMetadata::from_run(&case, &policy).with_entry("Cases", cli.cases.len());
        let config = CsvConfig::default().with_metadata(metadata);
        export_summary_csv(&summary, path, Some(&config))?;
        info!("summary written to {}", path.display());
    }

    Ok(summary)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("cannot install logger: {}", e);
    }

    match run(&cli) {
        Ok(summary) => {
            println!("{}", summary);
            for report in summary.failures() {
                println!("  {}: {}", report.artifact.path.display(), report.outcome);
            }
            if summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e @ PostError::Configuration(_)) => {
            error!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}
