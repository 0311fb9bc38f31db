//! Blocking downloads and archive extraction

// standard library
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// internal modules
use crate::error::{Error, Result};

// nidata modules
use nidata_format::{byte_size, f};

// external crates
use flate2::read::GzDecoder;
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, info};

/// Give up on a request after this many seconds
const TIMEOUT_SECS: u64 = 300;

/// Bytes received between progress bar updates
const PROGRESS_CHUNK: usize = 64 * 1024;

/// Download `url` to `path` unless `path` already exists
///
/// Existing files are trusted as-is, nothing is re-downloaded or checked.
pub(crate) fn fetch_file(url: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        debug!("Using cached {}", path.display());
        return Ok(());
    }

    download(url, path)
}

/// Download `url` to `path`, overwriting anything already there
///
/// The body is held in memory and only written once complete.
pub(crate) fn download(url: &str, path: &Path) -> Result<()> {
    info!("Downloading {url}");

    let response = minreq::get(url).with_timeout(TIMEOUT_SECS).send_lazy()?;

    if !(200..300).contains(&response.status_code) {
        return Err(Error::BadStatus {
            url: url.to_string(),
            status: response.status_code,
            reason: response.reason_phrase.clone(),
        });
    }

    let total = response
        .headers
        .get("content-length")
        .and_then(|length| length.trim().parse::<usize>().ok());
    debug!("Content length: {total:?}");

    let mut progress_bar = init_progress_bar(total)?;
    let mut bytes = Vec::with_capacity(total.unwrap_or_default());

    for byte in response {
        let (byte, _) = byte?;
        bytes.push(byte);
        if bytes.len() % PROGRESS_CHUNK == 0 {
            progress_bar.update_to(bytes.len())?;
        }
    }

    progress_bar.update_to(bytes.len())?;
    eprintln!();

    std::fs::write(path, &bytes)?;
    info!(
        "Saved {} to {}",
        byte_size(bytes.len() as u64),
        path.display()
    );
    Ok(())
}

/// Unpack a `.tar.gz` / `.tgz` archive into `destination`
pub(crate) fn extract_tar_gz(archive: &Path, destination: &Path) -> Result<()> {
    info!(
        "Extracting {} to {}",
        archive.display(),
        destination.display()
    );

    let decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
    tar::Archive::new(decoder).unpack(destination)?;
    Ok(())
}

/// Initialise the download progress bar, sized if the length is known
fn init_progress_bar(total: Option<usize>) -> Result<Bar> {
    BarBuilder::default()
        .total(total.unwrap_or_default())
        .desc("Downloading")
        .unit("B")
        .unit_scale(true)
        .unit_divisor(1024)
        .build()
        .map_err(|e| Error::ProgressBar(f!("{e}")))
}
