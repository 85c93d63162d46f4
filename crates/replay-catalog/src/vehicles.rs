//! Vehicle catalog keyed by `typeCompDescr`
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::{read_cache, CatalogError, VehicleNames, UNKNOWN};

/// One encyclopedia entry. Other fields in the cache file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameStyle {
    /// `short_name`, falling back to `name`.
    #[default]
    Short,
    Full,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleCatalog {
    vehicles: HashMap<String, VehicleRecord>,
}

impl VehicleCatalog {
    /// Loads the cache, logging and returning an empty catalog on any failure.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(catalog) => {
                tracing::info!(entries = catalog.len(), "vehicle catalog loaded");
                catalog
            }
            Err(e) => {
                tracing::warn!(error = %e, "vehicle lookup will return '{}'", UNKNOWN);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, CatalogError> {
        let entries: HashMap<String, Option<VehicleRecord>> = read_cache(path)?;
        let vehicles = entries
            .into_iter()
            .filter_map(|(id, record)| record.map(|r| (id, r)))
            .collect();
        Ok(Self { vehicles })
    }

    pub fn from_records(records: impl IntoIterator<Item = (i64, VehicleRecord)>) -> Self {
        Self {
            vehicles: records
                .into_iter()
                .map(|(id, record)| (id.to_string(), record))
                .collect(),
        }
    }

    pub fn name(&self, type_comp_descr: i64, style: NameStyle) -> String {
        let Some(record) = self.vehicles.get(&type_comp_descr.to_string()) else {
            return UNKNOWN.to_string();
        };
        let preferred = match style {
            NameStyle::Short => record.short_name.as_ref().or(record.name.as_ref()),
            NameStyle::Full => record.name.as_ref(),
        };
        preferred.cloned().unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

impl VehicleNames for VehicleCatalog {
    fn vehicle_name(&self, type_comp_descr: i64) -> String {
        self.name(type_comp_descr, NameStyle::Short)
    }
}
