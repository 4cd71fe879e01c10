use crate::package::{Package, PackageVersion, ReleaseArtifact};
use crate::requirement::Requirement;
use crate::resolver::{self, PackageProvider, ResolveError};
use crate::version::Version;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub const MOD_PORTAL_URL: &str = "https://mods.factorio.com";

/// Mods bundled with the game; the portal does not serve them.
pub const INTERNAL_MODS: &[&str] = &["base", "space-age", "elevated-rails", "quality"];

pub const DEFAULT_GAME_VERSION: &str = "2.0.28";

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("invalid portal url {0:?}")]
    InvalidBaseUrl(String),
    #[error("mod {0:?} is not on the portal")]
    UnknownMod(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("malformed manifest for {name}: {message}")]
    Manifest { name: String, message: String },
}

impl From<reqwest::Error> for PortalError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value.to_string())
    }
}

/// Full mod manifest as served by `GET /api/mods/{name}/full`.
#[derive(Debug, Deserialize)]
struct ModManifest {
    name: String,
    releases: Vec<ManifestRelease>,
}

#[derive(Debug, Deserialize)]
struct ManifestRelease {
    version: String,
    download_url: String,
    file_name: String,
    sha1: String,
    #[serde(default)]
    info_json: InfoJson,
}

#[derive(Debug, Default, Deserialize)]
struct InfoJson {
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Blocking client for the mod portal. The resolver is synchronous, so
/// metadata lookups block in place; only artifact downloads go async.
pub struct PortalClient {
    base: Url,
    http: Client,
}

impl PortalClient {
    /// Portal at the default address, or wherever `MODLOCK_PORTAL_URL`
    /// points.
    pub fn from_env() -> Result<Self, PortalError> {
        let base =
            std::env::var("MODLOCK_PORTAL_URL").unwrap_or_else(|_| MOD_PORTAL_URL.to_string());
        Self::new(&base)
    }

    pub fn new(base: &str) -> Result<Self, PortalError> {
        let base = Url::parse(base).map_err(|_| PortalError::InvalidBaseUrl(base.to_string()))?;
        let http = Client::builder()
            .user_agent(concat!("modlock/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { base, http })
    }

    /// Fetch the full manifest for one mod and turn it into a package.
    pub fn fetch_package(&self, name: &str) -> Result<Package, PortalError> {
        let url = self
            .base
            .join(&format!("api/mods/{name}/full"))
            .map_err(|e| PortalError::Manifest { name: name.to_string(), message: e.to_string() })?;
        let response = self.http.get(url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PortalError::UnknownMod(name.to_string()));
        }
        let response = response.error_for_status()?;
        let manifest: ModManifest = response.json().map_err(|e| PortalError::Manifest {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        if manifest.name != name {
            return Err(PortalError::Manifest {
                name: name.to_string(),
                message: format!("manifest is for {:?}", manifest.name),
            });
        }
        build_package(manifest)
    }

    /// Authenticated download URL for a locked release. `download_url` is
    /// the path the manifest handed out; credentials travel as query
    /// parameters.
    pub fn download_url(
        &self,
        download_url: &str,
        username: &str,
        token: &str,
    ) -> Result<Url, PortalError> {
        let mut url = self
            .base
            .join(download_url)
            .map_err(|_| PortalError::InvalidBaseUrl(download_url.to_string()))?;
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("token", token);
        Ok(url)
    }
}

fn build_package(manifest: ModManifest) -> Result<Package, PortalError> {
    let name = manifest.name;
    let mut releases = Vec::with_capacity(manifest.releases.len());
    for release in manifest.releases {
        let version: Version = release.version.parse().map_err(|e| PortalError::Manifest {
            name: name.clone(),
            message: format!("{e}"),
        })?;
        let dependencies = release
            .info_json
            .dependencies
            .iter()
            .map(|dep| dep.parse::<Requirement>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PortalError::Manifest { name: name.clone(), message: format!("{e}") })?;
        releases.push(PackageVersion {
            name: name.clone(),
            version,
            dependencies,
            artifact: Some(ReleaseArtifact {
                download_url: release.download_url,
                file_name: release.file_name,
                sha1: release.sha1,
            }),
        });
    }
    Ok(Package { name, releases })
}

/// Portal-backed provider with a per-run memoizing cache. Internal mods are
/// synthesized as a single dependency-free release at the configured game
/// version.
pub struct PortalProvider {
    client: PortalClient,
    game_version: Version,
    cache: RefCell<HashMap<String, Arc<Package>>>,
}

impl PortalProvider {
    pub fn new(client: PortalClient, game_version: Version) -> Self {
        Self {
            client,
            game_version,
            cache: RefCell::new(HashMap::new()),
        }
    }

}

impl PackageProvider for PortalProvider {
    fn find(&self, name: &str) -> resolver::Result<Arc<Package>> {
        if let Some(package) = self.cache.borrow().get(name) {
            return Ok(Arc::clone(package));
        }
        let package = if INTERNAL_MODS.contains(&name) {
            Package::new(name, [(self.game_version.clone(), Vec::new())])
        } else {
            eprintln!("fetching metadata for {name}");
            self.client.fetch_package(name).map_err(|e| match e {
                PortalError::UnknownMod(name) => ResolveError::UnknownPackage(name),
                other => ResolveError::Portal(other.to_string()),
            })?
        };
        let package = Arc::new(package);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), Arc::clone(&package));
        Ok(package)
    }
}
