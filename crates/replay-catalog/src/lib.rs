//! Replay Catalog: vehicle and map names for ids found in replays
//!
//! Both catalogs are read from local JSON cache files keyed by the numeric id
//! as a string. Loading never fails the caller: a missing or unreadable cache
//! yields an empty catalog, and every lookup miss resolves to [`UNKNOWN`].

pub mod maps;
pub mod vehicles;

pub use maps::{MapCatalog, MapRecord};
pub use vehicles::{NameStyle, VehicleCatalog, VehicleRecord};

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Placeholder returned for ids a catalog does not know.
pub const UNKNOWN: &str = "Unknown";

/// Resolves a vehicle type (`typeCompDescr`) to a display name.
pub trait VehicleNames: Send + Sync {
    fn vehicle_name(&self, type_comp_descr: i64) -> String;
}

/// Resolves an arena/map id to a display name.
pub trait MapNames: Send + Sync {
    fn map_name(&self, arena_id: i64) -> String;
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("CATALOG/cache file not found: {0}")]
    NotFound(String),

    #[error("CATALOG/failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CATALOG/failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a `{ "<id>": record }` cache file.
pub(crate) fn read_cache<T: DeserializeOwned>(
    path: &Path,
) -> Result<HashMap<String, T>, CatalogError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CatalogError::NotFound(display.clone())
        } else {
            CatalogError::Io {
                path: display.clone(),
                source,
            }
        }
    })?;

    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: display,
        source,
    })
}
