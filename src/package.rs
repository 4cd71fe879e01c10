use crate::requirement::Requirement;
use crate::version::Version;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("package {name} has no release {version}")]
pub struct MissingVersion {
    pub name: String,
    pub version: Version,
}

/// Download metadata attached to portal releases. Bundled (internal)
/// releases carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    pub download_url: String,
    pub file_name: String,
    pub sha1: String,
}

/// One release of a package: its version and declared dependencies.
///
/// Equality and hashing cover the (name, version, dependencies) triple;
/// artifact metadata rides along without affecting identity.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    pub name: String,
    pub version: Version,
    pub dependencies: Vec<Requirement>,
    pub artifact: Option<ReleaseArtifact>,
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.dependencies == other.dependencies
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.dependencies.hash(state);
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.version)
    }
}

/// Immutable snapshot of every known release of one package. Releases keep
/// their package's name rather than a back-reference; anything that needs
/// the `Package` goes back through the provider.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub releases: Vec<PackageVersion>,
}

impl Package {
    /// Build a package whose releases carry no artifact metadata.
    pub fn new(
        name: impl Into<String>,
        versions: impl IntoIterator<Item = (Version, Vec<Requirement>)>,
    ) -> Self {
        let name = name.into();
        let releases = versions
            .into_iter()
            .map(|(version, dependencies)| PackageVersion {
                name: name.clone(),
                version,
                dependencies,
                artifact: None,
            })
            .collect();
        Self { name, releases }
    }

    /// Exact-version lookup.
    pub fn release(&self, version: &Version) -> Result<&PackageVersion, MissingVersion> {
        self.releases
            .iter()
            .find(|release| release.version == *version)
            .ok_or_else(|| MissingVersion {
                name: self.name.clone(),
                version: version.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_lookup_is_length_agnostic() {
        let package = Package::new("mod-a", [(Version::new([1, 0, 0]), Vec::new())]);
        assert_eq!(package.release(&Version::from(1)).unwrap().version, Version::from(1));
        let missing = package.release(&Version::from(2)).unwrap_err();
        assert_eq!(missing.name, "mod-a");
    }

    #[test]
    fn identity_excludes_the_artifact() {
        let plain = PackageVersion {
            name: "mod-a".into(),
            version: Version::from(1),
            dependencies: Vec::new(),
            artifact: None,
        };
        let mut with_artifact = plain.clone();
        with_artifact.artifact = Some(ReleaseArtifact {
            download_url: "/download/mod-a/1".into(),
            file_name: "mod-a_1.0.0.zip".into(),
            sha1: "da39a3ee5e6b4b0d3255bfef95601890afd80709".into(),
        });
        assert_eq!(plain, with_artifact);
    }
}
