//! Display labels for region keys.
//!
//! States get their labels from the static catalog. Municipality names are
//! only known once a population table has been loaded, so they are
//! registered in a [`RegionDirectory`] as `"Municipio, Entidad"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::RegionKey;
use crate::states::{region_label, state_abbr};

/// How state labels are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStyle {
    /// Short name (`"Ciudad de México"`).
    #[default]
    Name,
    /// Electoral abbreviation (`"CDMX"`).
    Abbreviation,
}

/// Lookup of display labels for regions that are not in the state catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionDirectory {
    labels: BTreeMap<RegionKey, String>,
}

impl RegionDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the label for a region.
    pub fn insert(&mut self, key: RegionKey, label: impl Into<String>) {
        self.labels.insert(key, label.into());
    }

    /// Number of registered labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no labels are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a region.
    ///
    /// Registered labels win; otherwise states use the catalog (name or
    /// abbreviation per `style`) and municipalities fall back to their
    /// padded code.
    #[must_use]
    pub fn label(&self, key: RegionKey, style: LabelStyle) -> String {
        if let Some(label) = self.labels.get(&key) {
            return label.clone();
        }
        match (key, style) {
            (RegionKey::State(code), LabelStyle::Abbreviation) => state_abbr(code).to_string(),
            _ => region_label(key),
        }
    }
}

impl FromIterator<(RegionKey, String)> for RegionDirectory {
    fn from_iter<T: IntoIterator<Item = (RegionKey, String)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}
