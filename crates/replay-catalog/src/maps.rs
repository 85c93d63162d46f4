//! Map catalog keyed by arena id
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{read_cache, CatalogError, MapNames, UNKNOWN};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 time the entry was written to the cache.
    #[serde(default)]
    pub cached_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    maps: HashMap<String, MapRecord>,
}

impl MapCatalog {
    pub fn load(path: impl AsRef<Path>) -> Self {
        match read_cache::<MapRecord>(path.as_ref()) {
            Ok(maps) => {
                tracing::info!(entries = maps.len(), "map catalog loaded");
                Self { maps }
            }
            Err(CatalogError::NotFound(path)) => {
                tracing::debug!(%path, "no map cache, starting empty");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "map lookup will return '{}'", UNKNOWN);
                Self::default()
            }
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = (i64, MapRecord)>) -> Self {
        Self {
            maps: records
                .into_iter()
                .map(|(id, record)| (id.to_string(), record))
                .collect(),
        }
    }

    pub fn get(&self, arena_id: i64) -> Option<&MapRecord> {
        self.maps.get(&arena_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl MapNames for MapCatalog {
    fn map_name(&self, arena_id: i64) -> String {
        match self.get(arena_id).and_then(|m| m.name.clone()) {
            Some(name) => {
                tracing::trace!(arena_id, %name, "resolved map name");
                name
            }
            None => {
                tracing::debug!(arena_id, "arena id not found in map cache");
                UNKNOWN.to_string()
            }
        }
    }
}
