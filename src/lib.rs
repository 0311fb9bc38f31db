//! `nidata` fetches reference neuroimaging data and writes it out as NIfTI
//!
//! The toolkit crates are re-exported here:
//!
//! - [format] for shared formatting helpers
//! - [volume] for reading and writing NIfTI-1 volumes
//! - [datasets] for the cached template and atlas fetchers
//!
//! The [sample] module ties them together to produce a directory of sample
//! data, which is what the `sample-data` binary runs.
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use nidata_format as format;

#[doc(inline)]
pub use nidata_volume as volume;

#[doc(inline)]
pub use nidata_datasets as datasets;

// Sample data workflow
mod error;
pub mod sample;

#[doc(inline)]
pub use error::{Error, Result};
