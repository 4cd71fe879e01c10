use crate::package::PackageVersion;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed lockfile: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LockfileError>;

/// One locked mod: everything `install` needs without running the resolver
/// again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub name: String,
    pub version: Version,
    pub download_url: String,
    pub file_name: String,
    pub sha1: String,
}

/// The lockfile is a JSON array of entries sorted by mod name, so repeated
/// updates against unchanged portal data produce identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lockfile {
    pub entries: Vec<LockEntry>,
}

impl Lockfile {
    /// Lock every selected release that has something to download. Bundled
    /// mods carry no artifact and stay out of the file.
    pub fn from_resolution(resolved: &HashSet<PackageVersion>) -> Self {
        let mut entries: Vec<LockEntry> = resolved
            .iter()
            .filter_map(|release| {
                let artifact = release.artifact.as_ref()?;
                Some(LockEntry {
                    name: release.name.clone(),
                    version: release.version.clone(),
                    download_url: artifact.download_url.clone(),
                    file_name: artifact.file_name.clone(),
                    sha1: artifact.sha1.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        fs::write(path, body)?;
        Ok(())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ReleaseArtifact;

    #[test]
    fn entries_are_sorted_and_artifactless_releases_skipped() {
        let resolved = HashSet::from([
            PackageVersion {
                name: "zzz".into(),
                version: Version::from(1),
                dependencies: vec![],
                artifact: Some(ReleaseArtifact {
                    download_url: "/download/zzz".into(),
                    file_name: "zzz_1.zip".into(),
                    sha1: "aa".into(),
                }),
            },
            PackageVersion {
                name: "aaa".into(),
                version: Version::from(2),
                dependencies: vec![],
                artifact: Some(ReleaseArtifact {
                    download_url: "/download/aaa".into(),
                    file_name: "aaa_2.zip".into(),
                    sha1: "bb".into(),
                }),
            },
            PackageVersion {
                name: "base".into(),
                version: Version::new([2, 0, 28]),
                dependencies: vec![],
                artifact: None,
            },
        ]);

        let lock = Lockfile::from_resolution(&resolved);
        let names: Vec<&str> = lock.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["aaa", "zzz"]);
    }
}
