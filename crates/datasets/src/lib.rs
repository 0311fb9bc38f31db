//! Fetch reference neuroimaging datasets
//!
//! Datasets are downloaded once into a local cache and loaded from there on
//! every later call. See [get_data_dir()] for where the cache lives.
//!
//! Two datasets are available:
//!
//! - The MNI152 ICBM 2009a T1 template, see [load_mni152_template()]
//! - The Harvard-Oxford structural atlases, see [fetch_atlas_harvard_oxford()]
//!
//! ```rust, no_run
//! # use nidata_datasets::{fetch_atlas_harvard_oxford, load_mni152_template};
//! // Template volume, float32 scaled to a maximum of 1
//! let template = load_mni152_template(None, None).unwrap();
//!
//! // Cortical atlas labels and maps
//! let atlas = fetch_atlas_harvard_oxford("cort-maxprob-thr0-1mm", None).unwrap();
//! println!("{} regions", atlas.labels.len() - 1);
//! ```
//!
//! Downloads are blocking and show a progress bar on stderr. There are no
//! retries, and cached files are never checked.

// Modules
mod data_dir;
mod download;
mod error;
mod harvard_oxford;
mod labels;
mod mni;

#[cfg(test)]
mod test_server;

// Re-exports of anything important with in-lined documentation for simplicity
#[doc(inline)]
pub use data_dir::{get_data_dir, get_dataset_dir, DATA_DIR_ENV};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use harvard_oxford::{
    fetch_atlas_harvard_oxford, Atlas, AtlasName, MapType, Structures, HARVARD_OXFORD_URL,
};

#[doc(inline)]
pub use mni::{load_mni152_template, MNI152_URL};
