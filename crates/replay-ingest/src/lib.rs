//! Replay Ingest: stores a parsed replay and reports what was stored
//!
//! # Example
//!
//! ```ignore
//! use replay_catalog::VehicleCatalog;
//! use replay_ingest::{ingest_replay, MemoryStore};
//!
//! let vehicles = VehicleCatalog::load("data/vehicles.json");
//! let mut store = MemoryStore::new();
//! let raw = std::fs::read("battle.wotreplay")?;
//!
//! let report = ingest_replay(&raw, "Clan war", &mut store, &vehicles)?;
//! println!("battle {} -> {} rows", report.battle_id, report.stats.len());
//! ```

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{
    BattleDetails, BattleId, BattleStore, BattleSummary, DateRange, DeleteOutcome, StatRow,
    StoreError, UserOverview, UserSummary,
};

use chrono::{DateTime, Utc};
use replay_catalog::VehicleNames;
use replay_core::{parse_replay, PlayerInfo, ReplayError};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Battle name used when the caller does not give one.
pub const DEFAULT_BATTLE_NAME: &str = "Battle";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    NoBattleData(#[from] ReplayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of ingesting one replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReport {
    pub battle_id: BattleId,
    pub stats: Vec<StatReportRow>,
}

/// A derived stat joined with player and vehicle names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatReportRow {
    /// `common.arenaCreateTime` exactly as found in the replay.
    pub battle_start_time: Option<Number>,
    pub name: Option<String>,
    pub team: Option<i64>,
    pub clan_abbrev: Option<String>,
    pub vehicle_name: String,
    pub shots: i64,
    pub hits: i64,
    pub penetrations: i64,
    pub damage_dealt: i64,
    pub accuracy: f64,
    pub penetration_rate: f64,
    pub pen_to_shot_ratio: f64,
}

/// Shape of the first player entry and the raw vehicle table, for debugging
/// replays whose layout differs from what the builder expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayInspection {
    pub first_player_keys: Vec<String>,
    pub first_player_data: Value,
    pub sample_vehicles: Map<String, Value>,
}

/// Parses `raw` and writes the battle, its players, vehicles and stat rows.
///
/// Nothing is written when the replay has no battle record.
pub fn ingest_replay<S>(
    raw: &[u8],
    battle_name: &str,
    store: &mut S,
    vehicles: &dyn VehicleNames,
) -> Result<UploadReport, IngestError>
where
    S: BattleStore + ?Sized,
{
    let parsed = parse_replay(raw);
    let battle = parsed.battle()?;

    let created_at = battle.arena_create_time().and_then(to_datetime);
    let battle_id = store.create_battle(battle_name, created_at)?;
    let battle_start_time = match battle.common.get("arenaCreateTime") {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    };

    let mut players: HashMap<i64, PlayerInfo> = HashMap::new();
    for player in battle.player_infos() {
        let clan_id = player.clan_dbid.filter(|id| *id != 0);
        if let Some(clan_id) = clan_id {
            store.upsert_clan(clan_id, player.clan_abbrev.as_deref())?;
        }
        let name = player.name.as_deref().unwrap_or_default();
        store.upsert_user(player.account_id, name, clan_id)?;
        players.insert(player.account_id, player);
    }

    let mut stats = Vec::with_capacity(parsed.derived_stats.len());
    for stat in &parsed.derived_stats {
        let vehicle_name = vehicles.vehicle_name(stat.vehicle_type_id);
        store.upsert_vehicle(stat.vehicle_type_id, &vehicle_name)?;
        store.insert_player_stats(StatRow::new(battle_id, stat))?;

        let player = players.get(&stat.account_id);
        stats.push(StatReportRow {
            battle_start_time: battle_start_time.clone(),
            name: player.and_then(|p| p.name.clone()),
            team: stat.team,
            clan_abbrev: player.and_then(|p| p.clan_abbrev.clone()),
            vehicle_name,
            shots: stat.shots,
            hits: stat.hits,
            penetrations: stat.penetrations,
            damage_dealt: stat.damage_dealt,
            accuracy: stat.accuracy,
            penetration_rate: stat.penetration_rate,
            pen_to_shot_ratio: stat.pen_to_shot_ratio,
        });
    }

    tracing::info!(
        battle_id,
        arena = ?battle.arena_unique_id,
        players = players.len(),
        rows = stats.len(),
        "replay ingested"
    );

    Ok(UploadReport { battle_id, stats })
}

/// `None` when the replay has no battle record or no players.
pub fn inspect_replay(raw: &[u8]) -> Option<ReplayInspection> {
    let parsed = parse_replay(raw);
    let battle = parsed.battle_record?;
    let (_, first_player) = battle.players.iter().next()?;

    let first_player_keys = match first_player {
        Value::Object(fields) => fields.keys().cloned().collect(),
        _ => Vec::new(),
    };

    Some(ReplayInspection {
        first_player_keys,
        first_player_data: first_player.clone(),
        sample_vehicles: battle.vehicles.clone(),
    })
}

/// Unix seconds (possibly fractional) to a UTC timestamp.
fn to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_datetime() {
        assert_eq!(to_datetime(1000.0).unwrap().timestamp(), 1000);
        assert_eq!(to_datetime(1000.5).unwrap().timestamp_subsec_millis(), 500);
        assert!(to_datetime(0.0).is_none());
        assert!(to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_inspect_without_battle() {
        assert!(inspect_replay(br#"{"playerName":"X"}"#).is_none());
        assert!(inspect_replay(br#"{}{"players":{}}"#).is_none());
    }
}
