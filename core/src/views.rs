//! Last address viewed per unit, kept in `views.toml` under the leaddesk home
//! so a later session reopens the same view.

use crate::address;
use crate::config::ConfigError;
use leaddesk_protocol::UnitId;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

pub const VIEWS_FILE: &str = "views.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedViews {
    #[serde(default)]
    units: BTreeMap<UnitId, String>,
}

impl SavedViews {
    /// Missing file means no saved views.
    pub fn load(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(VIEWS_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    pub fn save(&self, home: &Path) -> Result<PathBuf, ConfigError> {
        let path = home.join(VIEWS_FILE);
        let contents = toml::to_string(self)
            .map_err(|err| ConfigError::Invalid(format!("failed to serialize views: {err}")))?;
        std::fs::create_dir_all(home).map_err(|source| ConfigError::Io {
            path: home.to_path_buf(),
            source,
        })?;
        std::fs::write(&path, contents).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn get(&self, unit_id: &str) -> Option<&str> {
        self.units.get(unit_id).map(String::as_str)
    }

    /// Stores the normalized form of `addr`; the default view is forgotten
    /// rather than stored as an empty string.
    pub fn set(&mut self, unit_id: &str, addr: &str) {
        let normalized = address::normalize(addr);
        if normalized.is_empty() {
            self.units.remove(unit_id);
        } else {
            self.units.insert(unit_id.to_string(), normalized);
        }
    }
}
