//! Integration tests for replay-catalog loading real cache files.

use replay_catalog::{MapCatalog, MapNames, NameStyle, VehicleCatalog, VehicleNames, UNKNOWN};
use std::io::Write;
use tempfile::NamedTempFile;

fn cache_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_vehicle_cache_roundtrip() {
    let file = cache_file(
        r#"{
            "1": {"name": "T-34-85 Medium", "short_name": "T-34-85", "tier": 6, "nation": "ussr"},
            "2": {"name": "Tiger I"},
            "3": null
        }"#,
    );
    let catalog = VehicleCatalog::load(file.path());

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.vehicle_name(1), "T-34-85");
    assert_eq!(catalog.name(1, NameStyle::Full), "T-34-85 Medium");
    assert_eq!(catalog.vehicle_name(2), "Tiger I");
    assert_eq!(catalog.vehicle_name(3), UNKNOWN);
}

#[test]
fn test_missing_vehicle_cache_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = VehicleCatalog::load(dir.path().join("vehicles.json"));
    assert!(catalog.is_empty());
    assert_eq!(catalog.vehicle_name(1), UNKNOWN);

    assert!(VehicleCatalog::try_load(&dir.path().join("vehicles.json")).is_err());
}

#[test]
fn test_corrupt_vehicle_cache_is_empty() {
    let file = cache_file("{ this is not json");
    let catalog = VehicleCatalog::load(file.path());
    assert!(catalog.is_empty());
    assert_eq!(catalog.vehicle_name(1), UNKNOWN);
}

#[test]
fn test_map_cache() {
    let file = cache_file(
        r#"{
            "4": {"name": "Himmelsdorf", "description": "city", "cached_at": "2024-01-01T00:00:00"},
            "7": {"description": "unnamed"}
        }"#,
    );
    let catalog = MapCatalog::load(file.path());

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.map_name(4), "Himmelsdorf");
    assert_eq!(catalog.map_name(7), UNKNOWN);
    assert_eq!(catalog.get(4).unwrap().description.as_deref(), Some("city"));
}

#[test]
fn test_missing_and_corrupt_map_cache() {
    let dir = tempfile::tempdir().unwrap();
    assert!(MapCatalog::load(dir.path().join("maps_cache.json")).is_empty());

    let file = cache_file("[1, 2, 3]");
    let catalog = MapCatalog::load(file.path());
    assert!(catalog.is_empty());
    assert_eq!(catalog.map_name(1), UNKNOWN);
}
