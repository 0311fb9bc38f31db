//! Harvard-Oxford cortical and subcortical structural atlases
//!
//! Distributed with FSL as a single archive containing every variant of the
//! atlas maps alongside XML files describing the regions.

// standard library
use std::path::{Path, PathBuf};
use std::str::FromStr;

// internal modules
use crate::data_dir::get_dataset_dir;
use crate::download::{download, extract_tar_gz};
use crate::error::{Error, Result};
use crate::labels::read_label_file;

// nidata modules
use nidata_format::f;
use nidata_volume::{read_volume, Volume};

// external crates
use log::{debug, info};

// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::combinator::{all_consuming, map, value};
use nom::sequence::{preceded, terminated, tuple};
use nom::IResult;

/// FSL archive containing all Harvard-Oxford atlases
pub const HARVARD_OXFORD_URL: &str = "https://www.nitrc.org/frs/download.php/9902/HarvardOxford.tgz";

/// Name of the cache directory shared by FSL datasets
const DATASET_NAME: &str = "fsl";

/// Location of the atlas files relative to the extracted archive
const ATLAS_ROOT: &str = "data/atlases";

/// Set of structures covered by an atlas
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Structures {
    /// Cortical regions, both hemispheres share a label (`cort`)
    Cortical,
    /// Cortical regions split into left and right (`cortl`)
    CorticalLateralized,
    /// Subcortical regions (`sub`)
    Subcortical,
}

/// Kind of map stored in the atlas volume
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapType {
    /// 3D label volume, voxels below the probability threshold (%) unlabelled
    MaxProb(u8),
    /// 4D volume of one probability map per region
    Prob,
}

/// One of the published Harvard-Oxford atlas variants
///
/// Names take the form `<structures>-<map type>-<resolution>`, for example
/// `cort-maxprob-thr0-1mm` or `sub-prob-2mm`.
///
/// ```rust
/// # use nidata_datasets::{AtlasName, MapType, Structures};
/// # use std::str::FromStr;
/// let name = AtlasName::from_str("cort-maxprob-thr25-2mm").unwrap();
/// assert_eq!(name.structures, Structures::Cortical);
/// assert_eq!(name.map_type, MapType::MaxProb(25));
/// assert_eq!(name.resolution, 2);
/// assert_eq!(name.to_string(), "cort-maxprob-thr25-2mm");
///
/// assert!(AtlasName::from_str("cort-maxprob-thr10-1mm").is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AtlasName {
    /// Structures covered
    pub structures: Structures,
    /// Label volume or probability maps
    pub map_type: MapType,
    /// Isotropic voxel size in mm
    pub resolution: u8,
}

impl AtlasName {
    /// Every published variant, 24 in total
    pub fn all() -> Vec<AtlasName> {
        let mut names = Vec::with_capacity(24);
        for structures in [
            Structures::Cortical,
            Structures::CorticalLateralized,
            Structures::Subcortical,
        ] {
            for map_type in [
                MapType::MaxProb(0),
                MapType::MaxProb(25),
                MapType::MaxProb(50),
                MapType::Prob,
            ] {
                for resolution in [1, 2] {
                    names.push(AtlasName {
                        structures,
                        map_type,
                        resolution,
                    });
                }
            }
        }
        names
    }

    /// Whether left and right hemispheres have separate labels
    pub fn is_lateralized(&self) -> bool {
        self.structures == Structures::CorticalLateralized
    }

    /// Maps volume relative to the extracted archive
    pub fn maps_file(&self) -> PathBuf {
        Path::new(ATLAS_ROOT)
            .join("HarvardOxford")
            .join(f!("HarvardOxford-{self}.nii.gz"))
    }

    /// Region description file relative to the extracted archive
    pub fn labels_file(&self) -> PathBuf {
        let name = match self.structures {
            Structures::Cortical => "HarvardOxford-Cortical.xml",
            Structures::CorticalLateralized => "HarvardOxford-Cortical-Lateralized.xml",
            Structures::Subcortical => "HarvardOxford-Subcortical.xml",
        };
        Path::new(ATLAS_ROOT).join(name)
    }
}

impl FromStr for AtlasName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (_, name) = all_consuming(atlas_name)(s).map_err(|_| Error::UnknownAtlas {
            name: s.to_string(),
            valid: AtlasName::all()
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<String>>()
                .join(", "),
        })?;
        Ok(name)
    }
}

impl std::fmt::Display for AtlasName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let structures = match self.structures {
            Structures::Cortical => "cort",
            Structures::CorticalLateralized => "cortl",
            Structures::Subcortical => "sub",
        };
        let map_type = match self.map_type {
            MapType::MaxProb(threshold) => f!("maxprob-thr{threshold}"),
            MapType::Prob => "prob".to_string(),
        };
        write!(f, "{structures}-{map_type}-{}mm", self.resolution)
    }
}

/// Full `<structures>-<map type>-<resolution>` name
fn atlas_name(i: &str) -> IResult<&str, AtlasName> {
    let (i, (structures, map_type, resolution)) = tuple((
        terminated(structures, tag("-")),
        terminated(map_type, tag("-")),
        terminated(alt((value(1, tag("1")), value(2, tag("2")))), tag("mm")),
    ))(i)?;

    Ok((
        i,
        AtlasName {
            structures,
            map_type,
            resolution,
        },
    ))
}

/// `cortl` has to be tried before `cort`
fn structures(i: &str) -> IResult<&str, Structures> {
    alt((
        value(Structures::CorticalLateralized, tag("cortl")),
        value(Structures::Cortical, tag("cort")),
        value(Structures::Subcortical, tag("sub")),
    ))(i)
}

fn map_type(i: &str) -> IResult<&str, MapType> {
    alt((
        map(
            preceded(
                tag("maxprob-thr"),
                alt((
                    value(0, tag("0")),
                    value(25, tag("25")),
                    value(50, tag("50")),
                )),
            ),
            MapType::MaxProb,
        ),
        value(MapType::Prob, tag("prob")),
    ))(i)
}

/// A fetched Harvard-Oxford atlas
#[derive(Debug)]
pub struct Atlas {
    /// Which variant this is
    pub name: AtlasName,
    /// Label volume (maxprob) or stacked probability maps (prob)
    pub maps: Volume,
    /// Region names, index 0 is always "Background"
    pub labels: Vec<String>,
    /// Path of the cached maps volume
    pub filename: PathBuf,
    /// Whether left and right hemispheres have separate labels
    pub is_lateralized: bool,
}

impl std::fmt::Display for Atlas {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = "Atlas {\n".to_string();
        s += &f!("    name: {}\n", self.name);
        s += &f!("    filename: {}\n", self.filename.display());
        s += &f!("    labels: {}\n", self.labels.len());
        s += &f!("    lateralized: {}\n", self.is_lateralized);
        s += &f!("    maps: {}\n}}", self.maps.to_string().replace('\n', "\n    "));

        write!(f, "{}", s)
    }
}

/// Load a Harvard-Oxford atlas, downloading it on first use
///
/// The FSL archive is downloaded to the `fsl` dataset directory (see
/// [get_data_dir()](crate::get_data_dir)), extracted, and the archive removed.
/// Later calls only read the extracted files.
///
/// ```rust, no_run
/// # use nidata_datasets::fetch_atlas_harvard_oxford;
/// let atlas = fetch_atlas_harvard_oxford("cort-maxprob-thr0-1mm", None).unwrap();
///
/// assert_eq!(atlas.labels[0], "Background");
/// println!("{}", atlas.maps);
/// ```
pub fn fetch_atlas_harvard_oxford(atlas_name: &str, data_dir: Option<&Path>) -> Result<Atlas> {
    fetch_atlas_from(HARVARD_OXFORD_URL, atlas_name, data_dir)
}

/// Load an atlas, downloading the FSL archive from `url` if needed
pub(crate) fn fetch_atlas_from(
    url: &str,
    atlas_name: &str,
    data_dir: Option<&Path>,
) -> Result<Atlas> {
    let name = AtlasName::from_str(atlas_name)?;
    let root = get_dataset_dir(DATASET_NAME, data_dir)?;

    let maps_path = root.join(name.maps_file());
    let labels_path = root.join(name.labels_file());

    if !maps_path.is_file() || !labels_path.is_file() {
        let archive = root.join("HarvardOxford.tgz");
        download(url, &archive)?;
        extract_tar_gz(&archive, &root)?;
        std::fs::remove_file(&archive)?;
    } else {
        debug!("Using cached {name} in {}", root.display());
    }

    for path in [&maps_path, &labels_path] {
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
    }

    let maps = read_volume(&maps_path)?;
    let mut labels = vec!["Background".to_string()];
    labels.extend(read_label_file(&labels_path)?);
    info!("Loaded {name} with {} labels", labels.len());

    Ok(Atlas {
        name,
        maps,
        labels,
        filename: maps_path,
        is_lateralized: name.is_lateralized(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;
    use nidata_volume::{write_volume, DataType, Header};

    const CORTICAL_XML: &[u8] = br#"<?xml version="1.0" encoding="ISO-8859-1"?>
<atlas version="1.0">
<data>
<label index="0" x="48" y="94" z="35">Frontal Pole</label>
<label index="1" x="86" y="184" z="31">Insular Cortex</label>
</data>
</atlas>
"#;

    /// Gzipped tar holding `files` as (path, content) pairs
    fn tgz(files: &[(PathBuf, Vec<u8>)]) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_slice())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Compressed NIfTI bytes of a small label volume
    fn maps_bytes(dir: &Path) -> (Volume, Vec<u8>) {
        let header = Header::new(&[3, 2, 2], DataType::Uint8).unwrap();
        let volume = Volume::new(header, (0..12).map(|v| v % 3).collect()).unwrap();
        let path = dir.join("maps.nii.gz");
        write_volume(&volume, &path).unwrap();
        (volume, std::fs::read(&path).unwrap())
    }

    #[test]
    fn archive_is_fetched_extracted_and_removed() {
        let scratch = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let name = AtlasName::from_str("cort-maxprob-thr25-2mm").unwrap();

        let (volume, maps) = maps_bytes(scratch.path());
        let archive = tgz(&[
            (name.maps_file(), maps),
            (name.labels_file(), CORTICAL_XML.to_vec()),
        ]);
        let url = serve_once("200 OK", archive);

        let atlas =
            fetch_atlas_from(&url, "cort-maxprob-thr25-2mm", Some(cache.path())).unwrap();
        assert_eq!(atlas.maps.data, volume.data);
        assert_eq!(
            atlas.labels,
            vec!["Background", "Frontal Pole", "Insular Cortex"]
        );

        let root = cache.path().join(DATASET_NAME);
        assert!(!root.join("HarvardOxford.tgz").exists());
        assert!(root.join(name.maps_file()).is_file());
        assert!(root.join(name.labels_file()).is_file());
    }

    #[test]
    fn archive_without_the_map() {
        let cache = tempfile::tempdir().unwrap();
        let name = AtlasName::from_str("sub-prob-1mm").unwrap();

        let archive = tgz(&[(name.labels_file(), CORTICAL_XML.to_vec())]);
        let url = serve_once("200 OK", archive);

        match fetch_atlas_from(&url, "sub-prob-1mm", Some(cache.path())) {
            Err(Error::MissingFile(path)) => assert!(path.ends_with(name.maps_file())),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn every_name_round_trips() {
        let all = AtlasName::all();
        assert_eq!(all.len(), 24);
        for name in all {
            assert_eq!(AtlasName::from_str(&name.to_string()).unwrap(), name);
        }
    }

    #[test]
    fn lateralized_prefix() {
        let name = AtlasName::from_str("cortl-prob-1mm").unwrap();
        assert_eq!(name.structures, Structures::CorticalLateralized);
        assert!(name.is_lateralized());
        assert_eq!(
            name.labels_file(),
            Path::new("data/atlases/HarvardOxford-Cortical-Lateralized.xml")
        );
    }

    #[test]
    fn file_locations() {
        let name = AtlasName::from_str("cort-maxprob-thr0-1mm").unwrap();
        assert_eq!(
            name.maps_file(),
            Path::new("data/atlases/HarvardOxford/HarvardOxford-cort-maxprob-thr0-1mm.nii.gz")
        );
        assert_eq!(
            name.labels_file(),
            Path::new("data/atlases/HarvardOxford-Cortical.xml")
        );
    }

    #[test]
    fn unknown_names_list_valid_ones() {
        for bad in ["", "cort", "cort-maxprob-thr0-3mm", "cort-prob-1mm-extra"] {
            match AtlasName::from_str(bad) {
                Err(Error::UnknownAtlas { name, valid }) => {
                    assert_eq!(name, bad);
                    assert!(valid.contains("sub-maxprob-thr50-2mm"));
                }
                other => panic!("expected UnknownAtlas for {bad:?}, got {other:?}"),
            }
        }
    }
}
