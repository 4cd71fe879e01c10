use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version string {0:?}")]
pub struct VersionError(pub String);

/// Mod version: a sequence of numeric components, at least one, each in
/// `[0, 65535]`. Ordering and equality are length-agnostic: the shorter
/// version is treated as zero-padded, so `1 == 1.0 == 1.0.0`.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u16>,
}

impl Version {
    pub fn new(parts: impl IntoIterator<Item = u16>) -> Self {
        let parts: Vec<u16> = parts.into_iter().collect();
        debug_assert!(!parts.is_empty());
        Self { parts }
    }

    pub fn parts(&self) -> &[u16] {
        &self.parts
    }

    fn significant(&self) -> &[u16] {
        let len = self.parts.iter().rposition(|&p| p != 0).map_or(0, |i| i + 1);
        &self.parts[..len]
    }
}

impl From<u16> for Version {
    fn from(part: u16) -> Self {
        Self { parts: vec![part] }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    // Trailing zero components are insignificant for equality, so they must
    // not feed the hash either.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let parts = input
            .split('.')
            .map(|piece| parse_component(piece).ok_or_else(|| VersionError(input.to_string())))
            .collect::<Result<Vec<u16>, VersionError>>()?;
        Ok(Self { parts })
    }
}

/// Strict base-10 component: digits only, no sign, no whitespace. `u16`
/// covers exactly the permitted `[0, 65535]` range.
fn parse_component(piece: &str) -> Option<u16> {
    if piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    piece.parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Comparison {
    fn evaluate(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ge => ordering != Ordering::Less,
            Comparison::Gt => ordering == Ordering::Greater,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "=",
            Comparison::Ge => ">=",
            Comparison::Gt => ">",
        })
    }
}

/// A comparison operator bound to a version, e.g. `>= 1.2.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionComparison {
    pub comparison: Comparison,
    pub version: Version,
}

impl VersionComparison {
    pub fn new(comparison: Comparison, version: Version) -> Self {
        Self { comparison, version }
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.comparison.evaluate(version.cmp(&self.version))
    }
}

impl fmt::Display for VersionComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.comparison, self.version)
    }
}
