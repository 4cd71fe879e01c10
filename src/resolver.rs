use crate::package::{Package, PackageVersion};
use crate::requirement::{Prefix, Requirement};
use crate::version::{Version, VersionComparison};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Synthetic package whose sole release depends on the root requirements.
const ROOT: &str = "$root";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No assignment of one release per required package satisfies every
    /// collected constraint.
    #[error("requirements are inconsistent")]
    Inconsistent,
    #[error("unknown package {0:?}")]
    UnknownPackage(String),
    #[error("portal error: {0}")]
    Portal(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;

/// Source of packages for the resolver.
///
/// `find` must be deterministic for the lifetime of one resolution. It may
/// block (the portal provider performs network I/O here) and it may fail;
/// a failure aborts the whole search.
pub trait PackageProvider {
    fn find(&self, name: &str) -> Result<Arc<Package>>;

    /// Resolve root requirements into a mutually consistent release set.
    fn resolve(&self, requirements: &[Requirement]) -> Result<HashSet<PackageVersion>> {
        resolve(self, requirements)
    }
}

/// Provider backed by a fixed list of packages.
pub struct StaticProvider {
    packages: Vec<Arc<Package>>,
}

impl StaticProvider {
    pub fn new(packages: impl IntoIterator<Item = Package>) -> Self {
        Self {
            packages: packages.into_iter().map(Arc::new).collect(),
        }
    }
}

impl PackageProvider for StaticProvider {
    fn find(&self, name: &str) -> Result<Arc<Package>> {
        self.packages
            .iter()
            .find(|package| package.name == name)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownPackage(name.to_string()))
    }
}

/// Accumulated restriction on which release of one package may be selected.
/// Kept as data rather than closures so a layer is cheap to build and clone.
#[derive(Debug, Clone)]
enum Constraint {
    Unconstrained,
    /// The package must not appear in the resolution at all.
    Forbidden,
    /// Locked to the version already selected for this package.
    Exactly(Version),
    Matches(VersionComparison),
    Both(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    fn from_requirement(requirement: &Requirement) -> Self {
        if requirement.prefix == Prefix::Incompatible {
            return Constraint::Forbidden;
        }
        match &requirement.vercomp {
            Some(vercomp) => Constraint::Matches(vercomp.clone()),
            None => Constraint::Unconstrained,
        }
    }

    fn and(self, other: Constraint) -> Constraint {
        match (self, other) {
            (Constraint::Unconstrained, other) => other,
            (this, Constraint::Unconstrained) => this,
            (this, other) => Constraint::Both(Box::new(this), Box::new(other)),
        }
    }

    fn permits(&self, version: &Version) -> bool {
        match self {
            Constraint::Unconstrained => true,
            Constraint::Forbidden => false,
            Constraint::Exactly(locked) => version == locked,
            Constraint::Matches(vercomp) => vercomp.matches(version),
            Constraint::Both(a, b) => a.permits(version) && b.permits(version),
        }
    }
}

/// One layer of the constraint chain, keyed by package name. A layer is
/// pushed per recursion step and discarded implicitly on backtrack; lookup
/// walks toward the root.
struct Scope<'a> {
    bindings: HashMap<String, Constraint>,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Constraint> {
        match self.bindings.get(name) {
            Some(constraint) => Some(constraint),
            None => self.parent?.lookup(name),
        }
    }

    fn permits(&self, release: &PackageVersion) -> bool {
        self.lookup(&release.name)
            .is_none_or(|constraint| constraint.permits(&release.version))
    }
}

/// Resolve a list of root requirements into a consistent set of releases,
/// one per required package name.
pub fn resolve<P: PackageProvider + ?Sized>(
    provider: &P,
    requirements: &[Requirement],
) -> Result<HashSet<PackageVersion>> {
    let root = Package::new(ROOT, [(Version::new([0, 0, 0]), requirements.to_vec())]);
    let scope = Scope { bindings: HashMap::new(), parent: None };
    let mut selected = search(provider, vec![Arc::new(root)], &scope, &HashMap::new())?;
    selected.remove(ROOT);
    Ok(selected.into_values().collect())
}

/// Depth-first search over release assignments.
///
/// `packages` is the LIFO worklist of packages still needing a version.
/// Each recursion pops one, tries its admissible releases newest-first, and
/// for the tried release extends the constraint scope, pushes newly
/// required packages, and recurses. A candidate that fails (a dependency
/// contradicting an already-selected release, or `Inconsistent` from the
/// recursion) is abandoned for the next-older one; running out of
/// candidates propagates `Inconsistent` to the caller so it can move past
/// its own current choice. Provider failures abort the search unchanged.
fn search<P: PackageProvider + ?Sized>(
    provider: &P,
    mut packages: Vec<Arc<Package>>,
    reqs: &Scope<'_>,
    selected: &HashMap<String, PackageVersion>,
) -> Result<HashMap<String, PackageVersion>> {
    let Some(package) = packages.pop() else {
        // Worklist drained: the selection must satisfy every constraint it
        // accumulated, or the search itself is buggy.
        debug_assert!(selected.values().all(|release| reqs.permits(release)));
        return Ok(selected.clone());
    };

    let constraint = reqs.lookup(&package.name);
    let mut candidates: Vec<&PackageVersion> = package
        .releases
        .iter()
        .filter(|release| constraint.is_none_or(|c| c.permits(&release.version)))
        .collect();
    // Newest first; older releases are only reached by backtracking.
    candidates.sort_by(|a, b| b.version.cmp(&a.version));

    'candidates: for release in candidates {
        for dep in &release.dependencies {
            if let Some(chosen) = selected.get(&dep.name)
                && !Constraint::from_requirement(dep).permits(&chosen.version)
            {
                // Contradicts a release that is already locked in.
                continue 'candidates;
            }
        }

        let mut bindings = HashMap::new();
        for dep in &release.dependencies {
            let prev = reqs
                .lookup(&dep.name)
                .cloned()
                .unwrap_or(Constraint::Unconstrained);
            bindings.insert(dep.name.clone(), prev.and(Constraint::from_requirement(dep)));
        }
        bindings.insert(package.name.clone(), Constraint::Exactly(release.version.clone()));
        let layer = Scope { bindings, parent: Some(reqs) };

        // Optional and incompatible dependencies contribute constraints but
        // never materialize packages; already-selected names never re-enter
        // the worklist, which is what terminates dependency cycles.
        let mut next_packages = packages.clone();
        for dep in &release.dependencies {
            if dep.is_required() && !selected.contains_key(&dep.name) {
                next_packages.push(provider.find(&dep.name)?);
            }
        }

        let mut next_selected = selected.clone();
        next_selected.insert(package.name.clone(), release.clone());

        match search(provider, next_packages, &layer, &next_selected) {
            Ok(result) => return Ok(result),
            Err(ResolveError::Inconsistent) => {}
            Err(fatal) => return Err(fatal),
        }
    }

    Err(ResolveError::Inconsistent)
}
