//! MNI152 ICBM 2009a symmetric T1 template

// standard library
use std::path::Path;

// internal modules
use crate::data_dir::get_dataset_dir;
use crate::download::fetch_file;
use crate::error::{Error, Result};

// nidata modules
use nidata_volume::{read_volume, Volume};

// external crates
use log::{debug, warn};

/// Converted 1 mm template as distributed with nilearn
pub const MNI152_URL: &str = "https://raw.githubusercontent.com/nilearn/nilearn/main/nilearn/datasets/data/mni_icbm152_t1_tal_nlin_sym_09a_converted.nii.gz";

/// Name the template is cached under
const MNI152_FILE: &str = "mni_icbm152_t1_tal_nlin_sym_09a_converted.nii.gz";

/// Name of the cache directory for the template
const DATASET_NAME: &str = "mni152";

/// Load the MNI152 T1 template, downloading it on first use
///
/// The template is returned as float32 rescaled to a maximum of 1.0. Only the
/// native 1 mm `resolution` is available, and `None` means 1 mm.
///
/// ```rust, no_run
/// # use nidata_datasets::load_mni152_template;
/// let template = load_mni152_template(None, None).unwrap();
/// println!("{template}");
/// ```
pub fn load_mni152_template(resolution: Option<u32>, data_dir: Option<&Path>) -> Result<Volume> {
    let resolution = resolution.unwrap_or(1);
    if resolution != 1 {
        return Err(Error::UnsupportedResolution(resolution));
    }

    let path = get_dataset_dir(DATASET_NAME, data_dir)?.join(MNI152_FILE);
    fetch_file(MNI152_URL, &path)?;

    let template = read_volume(&path)?;
    debug!("Raw template:\n{template}");

    let values = rescale_to_unit_max(template.to_f32()?);
    Ok(Volume::from_f32(&template.header, &values)?)
}

/// Divide through by the largest value so the maximum becomes 1.0
///
/// Left alone if there is no positive finite maximum to divide by.
fn rescale_to_unit_max(mut values: Vec<f32>) -> Vec<f32> {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);

    if max > 0.0 {
        values.iter_mut().for_each(|v| *v /= max);
    } else {
        warn!("Template has no positive maximum ({max}), values left unscaled");
    }

    values
}
