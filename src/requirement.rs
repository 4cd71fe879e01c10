use crate::version::{Comparison, Version, VersionComparison, VersionError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
    #[error("invalid requirement string {0:?}")]
    Invalid(String),
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Dependency prefix, as written on the mod portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// Hard dependency.
    None,
    /// `!` - the named mod must not be present.
    Incompatible,
    /// `?` - if present, the constraint applies; presence is not forced.
    Optional,
    /// `(?)` - optional, hidden from the in-game mod browser.
    HiddenOptional,
    /// `~` - required, but carries no load-order hint.
    Unordered,
}

impl Prefix {
    /// Whether the requirement forces the named mod into the resolution.
    pub fn is_required(self) -> bool {
        matches!(self, Prefix::None | Prefix::Unordered)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Prefix::None => "",
            Prefix::Incompatible => "!",
            Prefix::Optional => "?",
            Prefix::HiddenOptional => "(?)",
            Prefix::Unordered => "~",
        })
    }
}

/// One dependency clause: `[prefix] name [comparison version]`.
///
/// Invariant: an incompatibility never carries a version bound; any bound
/// written after a `!` prefix is dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub prefix: Prefix,
    pub name: String,
    pub vercomp: Option<VersionComparison>,
}

impl Requirement {
    pub fn new(
        prefix: Prefix,
        name: impl Into<String>,
        vercomp: Option<VersionComparison>,
    ) -> Self {
        let vercomp = if prefix == Prefix::Incompatible { None } else { vercomp };
        Self { prefix, name: name.into(), vercomp }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self::new(Prefix::None, name, None)
    }

    pub fn is_required(&self) -> bool {
        self.prefix.is_required()
    }
}

impl FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let s = input.trim();

        let (prefix, rest) = if let Some(rest) = s.strip_prefix("(?)") {
            (Prefix::HiddenOptional, rest)
        } else if let Some(rest) = s.strip_prefix('!') {
            (Prefix::Incompatible, rest)
        } else if let Some(rest) = s.strip_prefix('?') {
            (Prefix::Optional, rest)
        } else if let Some(rest) = s.strip_prefix('~') {
            (Prefix::Unordered, rest)
        } else {
            (Prefix::None, s)
        };

        // Mod names may contain interior whitespace; they end at the first
        // comparison character.
        let rest = rest.trim_start();
        let name_end = rest.find(['<', '=', '>']).unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_end);
        let name = name.trim_end();
        if name.is_empty() {
            return Err(RequirementError::Invalid(input.to_string()));
        }

        let vercomp = if tail.is_empty() {
            None
        } else {
            let (comparison, after) = if let Some(after) = tail.strip_prefix("<=") {
                (Comparison::Le, after)
            } else if let Some(after) = tail.strip_prefix(">=") {
                (Comparison::Ge, after)
            } else if let Some(after) = tail.strip_prefix('<') {
                (Comparison::Lt, after)
            } else if let Some(after) = tail.strip_prefix('>') {
                (Comparison::Gt, after)
            } else if let Some(after) = tail.strip_prefix('=') {
                (Comparison::Eq, after)
            } else {
                return Err(RequirementError::Invalid(input.to_string()));
            };
            // The whole remainder must be the version; a second comparison
            // ("a < 1 > 2") fails here.
            let version: Version = after.trim_start().parse()?;
            Some(VersionComparison::new(comparison, version))
        };

        Ok(Self::new(prefix, name, vercomp))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix != Prefix::None {
            write!(f, "{} ", self.prefix)?;
        }
        f.write_str(&self.name)?;
        if let Some(vercomp) = &self.vercomp {
            write!(f, " {vercomp}")?;
        }
        Ok(())
    }
}
