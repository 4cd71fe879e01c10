use crate::package::{Package, PackageVersion, ReleaseArtifact};
use crate::requirement::RequirementError;
use crate::resolver::StaticProvider;
use crate::version::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One release record in a local JSON index. Artifact fields are optional;
/// records without them resolve fine but cannot be installed.
#[derive(Debug, Deserialize)]
pub struct IndexRelease {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read index {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse index json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Requirement(#[from] RequirementError),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Load a JSON index file into a static provider usable by the resolver.
pub fn load_index_from_path(path: impl AsRef<Path>) -> Result<StaticProvider> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| IndexError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    let records: Vec<IndexRelease> = serde_json::from_str(&data)?;
    build_provider(records)
}

fn build_provider(records: Vec<IndexRelease>) -> Result<StaticProvider> {
    let mut releases: BTreeMap<String, Vec<PackageVersion>> = BTreeMap::new();
    for record in records {
        let dependencies = record
            .dependencies
            .iter()
            .map(|dep| dep.parse())
            .collect::<std::result::Result<Vec<_>, RequirementError>>()?;
        let artifact = match (record.download_url, record.file_name, record.sha1) {
            (Some(download_url), Some(file_name), Some(sha1)) => Some(ReleaseArtifact {
                download_url,
                file_name,
                sha1,
            }),
            _ => None,
        };
        releases.entry(record.name.clone()).or_default().push(PackageVersion {
            name: record.name,
            version: record.version,
            dependencies,
            artifact,
        });
    }
    Ok(StaticProvider::new(
        releases
            .into_iter()
            .map(|(name, releases)| Package { name, releases }),
    ))
}
