//! Subcommand handlers. Results go to stdout as JSON, logs to stderr.
use anyhow::{bail, Context};
use replay_catalog::{MapNames, VehicleNames, UNKNOWN};
use replay_core::{parse_replay, ParsedReplay};
use replay_ingest::{ingest_replay, inspect_replay, BattleStore, IngestError, MemoryStore};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseOutput {
    map_name: String,
    #[serde(flatten)]
    parsed: ParsedReplay,
}

fn read_replay(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read replay {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Display name of the battle's map: metadata first, then the map catalog.
fn resolve_map_name(parsed: &ParsedReplay, maps: &dyn MapNames) -> String {
    if let Some(name) = &parsed.metadata.map_display_name {
        return name.clone();
    }
    parsed
        .battle_record
        .as_ref()
        .and_then(|b| b.arena_type_id())
        .map(|id| maps.map_name(id))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn parse(file: &Path, sorted: bool, maps: &dyn MapNames) -> anyhow::Result<()> {
    let raw = read_replay(file)?;
    let mut parsed = parse_replay(&raw);
    if parsed.battle_record.is_none() {
        tracing::warn!(file = %file.display(), "no battle data found in replay");
    }
    if sorted {
        parsed.sort_stats();
    }
    print_json(&ParseOutput {
        map_name: resolve_map_name(&parsed, maps),
        parsed,
    })
}

pub fn ingest(files: &[PathBuf], battle_name: &str, vehicles: &dyn VehicleNames) -> anyhow::Result<()> {
    let mut store = MemoryStore::new();
    let mut failed = 0usize;

    for file in files {
        let raw = read_replay(file)?;
        match ingest_replay(&raw, battle_name, &mut store, vehicles) {
            Ok(report) => print_json(&report)?,
            Err(IngestError::NoBattleData(e)) => {
                tracing::error!(file = %file.display(), error = %e, "skipping replay");
                failed += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("failed to ingest {}", file.display())),
        }
    }

    let battles: Vec<_> = store
        .list_battles()
        .into_iter()
        .map(|summary| {
            let details = store.battle_details(summary.id);
            json!({ "battle": summary, "team_averages": details.team_averages })
        })
        .collect();
    print_json(&json!({ "battles": battles }))?;

    if failed > 0 {
        bail!("{} of {} replay(s) had no battle data", failed, files.len());
    }
    Ok(())
}

pub fn inspect(file: &Path) -> anyhow::Result<()> {
    let raw = read_replay(file)?;
    match inspect_replay(&raw) {
        Some(inspection) => print_json(&inspection),
        None => bail!("no players found in {}", file.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_catalog::{MapCatalog, MapRecord};

    fn maps() -> MapCatalog {
        MapCatalog::from_records([(
            4,
            MapRecord {
                name: Some("Himmelsdorf".into()),
                ..Default::default()
            },
        )])
    }

    #[test]
    fn test_map_name_prefers_metadata() {
        let parsed = parse_replay(br#"{"mapDisplayName":"Mines"}{"common":{"arenaTypeID":4}}"#);
        assert_eq!(resolve_map_name(&parsed, &maps()), "Mines");
    }

    #[test]
    fn test_map_name_from_catalog() {
        let parsed = parse_replay(br#"{}{"common":{"arenaTypeID":4}}"#);
        assert_eq!(resolve_map_name(&parsed, &maps()), "Himmelsdorf");

        let unknown = parse_replay(br#"{}{"common":{}}"#);
        assert_eq!(resolve_map_name(&unknown, &maps()), UNKNOWN);
    }
}
