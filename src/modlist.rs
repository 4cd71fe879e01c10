use crate::lockfile::LockEntry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

pub const FILE_NAME: &str = "mod-list.json";

/// `mod-list.json`, read by the game to decide which installed mods to
/// enable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModList {
    pub mods: Vec<ModListEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModListEntry {
    pub name: String,
    pub enabled: bool,
}

impl ModList {
    /// A list enabling every locked mod.
    pub fn enabling(entries: &[LockEntry]) -> Self {
        Self {
            mods: entries
                .iter()
                .map(|entry| ModListEntry {
                    name: entry.name.clone(),
                    enabled: true,
                })
                .collect(),
        }
    }

    pub fn write_to_dir(&self, dir: &Path) -> io::Result<()> {
        let mut body = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        body.push('\n');
        fs::write(dir.join(FILE_NAME), body)
    }
}
