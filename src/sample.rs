//! Produce a directory of sample MRI and segmentation volumes
//!
//! Four steps, in order, with no retries:
//!
//! 1. Create the output directory if it is missing
//! 2. Fetch the MNI152 template and save it as `sample_mri.nii.gz`
//! 3. Fetch the Harvard-Oxford cortical atlas
//! 4. Save the atlas maps as `sample_segmentation.nii.gz`
//!
//! Volumes are written exactly as they were fetched.

// standard library
use std::path::{Path, PathBuf};

// crate modules
use crate::error::{Error, Result};

// nidata modules
use nidata_datasets::{fetch_atlas_harvard_oxford, load_mni152_template, Atlas};
use nidata_volume::{write_volume, Volume};

// external crates
use log::{debug, info};

/// Output directory used when none is given
pub const DEFAULT_OUTPUT_DIR: &str = "sample_nifti_data";

/// File name for the template volume
pub const SAMPLE_MRI_FILE: &str = "sample_mri.nii.gz";

/// File name for the atlas volume
pub const SAMPLE_SEGMENTATION_FILE: &str = "sample_segmentation.nii.gz";

/// Harvard-Oxford variant used as the sample segmentation
pub const SAMPLE_ATLAS: &str = "cort-maxprob-thr0-1mm";

/// Where the sample volumes come from
pub trait SampleSource {
    /// Template MRI volume
    fn template(&self) -> Result<Volume>;

    /// Atlas whose maps are used as the segmentation volume
    fn atlas(&self) -> Result<Atlas>;
}

/// Fetch the sample volumes through the dataset cache
#[derive(Debug, Default)]
pub struct RemoteSource {
    data_dir: Option<PathBuf>,
}

impl RemoteSource {
    /// Use the default dataset cache location
    pub fn new() -> Self {
        Default::default()
    }

    /// Use a specific dataset cache location
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: Some(data_dir.as_ref().to_path_buf()),
        }
    }
}

impl SampleSource for RemoteSource {
    fn template(&self) -> Result<Volume> {
        Ok(load_mni152_template(None, self.data_dir.as_deref())?)
    }

    fn atlas(&self) -> Result<Atlas> {
        Ok(fetch_atlas_harvard_oxford(
            SAMPLE_ATLAS,
            self.data_dir.as_deref(),
        )?)
    }
}

/// Paths written by [run()]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOutputs {
    /// Whether the output directory had to be created
    pub created_directory: bool,
    /// Saved template volume
    pub mri: PathBuf,
    /// Saved atlas volume
    pub segmentation: PathBuf,
}

/// Create the output directory if it does not exist yet
///
/// Returns `true` if the directory was created, and `false` if it was already
/// there, in which case it is left untouched.
pub fn ensure_output_directory<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();

    if path.is_dir() {
        info!("Output directory already exists: {}", path.display());
        Ok(false)
    } else if path.exists() {
        Err(Error::NotADirectory(path.to_path_buf()))
    } else {
        std::fs::create_dir_all(path)?;
        info!("Created output directory: {}", path.display());
        Ok(true)
    }
}

/// Fetch both sample volumes from `source` and save them under `output`
///
/// ```rust, no_run
/// # use nidata::sample::{run, RemoteSource, DEFAULT_OUTPUT_DIR};
/// # use std::path::Path;
/// let outputs = run(&RemoteSource::new(), Path::new(DEFAULT_OUTPUT_DIR)).unwrap();
/// println!("{}", outputs.mri.display());
/// ```
pub fn run<S: SampleSource + ?Sized>(source: &S, output: &Path) -> Result<SampleOutputs> {
    info!("Setting up output directory...");
    let created_directory = ensure_output_directory(output)?;
    debug!("output = {}", output.display());

    info!("Downloading MNI152 template as sample MRI data...");
    let template = source.template()?;
    debug!("template = {template}");

    info!("Saving sample MRI data...");
    let mri = output.join(SAMPLE_MRI_FILE);
    write_volume(&template, &mri)?;
    info!("Saved sample MRI data to {}", mri.display());

    info!("Downloading Harvard-Oxford cortical atlas as sample segmentation data...");
    let atlas = source.atlas()?;
    debug!("atlas = {atlas}");

    info!("Saving sample segmentation data...");
    let segmentation = output.join(SAMPLE_SEGMENTATION_FILE);
    write_volume(&atlas.maps, &segmentation)?;
    info!("Saved sample segmentation data to {}", segmentation.display());

    info!("Sample data download and save completed");
    Ok(SampleOutputs {
        created_directory,
        mri,
        segmentation,
    })
}
