//! Download the sample MRI template and cortical atlas as NIfTI files

// standard library
use std::path::PathBuf;

// nidata modules
use nidata::sample::{run, RemoteSource, DEFAULT_OUTPUT_DIR};

// external crates
use anyhow::{Context, Result};
use clap::Parser;

/// Fetch sample neuroimaging data
///
/// Writes the MNI152 T1 template and the Harvard-Oxford cortical atlas
/// (cort-maxprob-thr0-1mm) to OUTPUT as sample_mri.nii.gz and
/// sample_segmentation.nii.gz.
#[derive(Parser, Debug)]
#[command(name = "sample-data", version, about)]
struct Cli {
    /// Directory to write the sample volumes to
    #[arg(default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Dataset cache directory (default $NIDATA_DATA or ~/nidata_data)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let source = match &cli.data_dir {
        Some(dir) => RemoteSource::with_data_dir(dir),
        None => RemoteSource::new(),
    };

    let outputs = run(&source, &cli.output)
        .with_context(|| format!("failed to write sample data to {}", cli.output.display()))?;

    log::debug!("{outputs:?}");
    Ok(())
}

/// Logs go to stderr at info level unless told otherwise
fn init_logging(cli: &Cli) -> Result<()> {
    stderrlog::new()
        .modules([module_path!(), "nidata", "nidata_datasets", "nidata_volume"])
        .quiet(cli.quiet)
        .verbosity(2 + cli.verbose as usize)
        .init()
        .context("failed to initialise logging")
}
