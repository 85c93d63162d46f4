//! Battle Record Builder: positional selection and stat derivation
//!
//! Object 0 of a replay is the session metadata, object 1 the battle record.
//! Anything after that is ignored.

use crate::data_model::{
    BattleRecord, DecodedObject, DerivedVehicleStat, ParsedReplay, PlayerInfo, SessionMetadata,
    VehicleEntry,
};

const METADATA_INDEX: usize = 0;
const BATTLE_INDEX: usize = 1;

pub fn select_metadata(objects: &[DecodedObject]) -> Option<&DecodedObject> {
    objects.get(METADATA_INDEX)
}

pub fn select_battle(objects: &[DecodedObject]) -> Option<&DecodedObject> {
    objects.get(BATTLE_INDEX)
}

/// Interprets scanned objects. Never fails: missing pieces come back empty.
pub fn build(objects: &[DecodedObject]) -> ParsedReplay {
    let metadata = select_metadata(objects)
        .map(SessionMetadata::from_object)
        .unwrap_or_default();
    let battle_record = select_battle(objects).map(BattleRecord::from_object);
    let derived_stats = battle_record
        .as_ref()
        .map(derive_stats)
        .unwrap_or_default();

    if battle_record.is_none() {
        tracing::debug!(objects = objects.len(), "no battle record in replay");
    }

    ParsedReplay {
        objects_found: objects.len(),
        metadata,
        battle_record,
        derived_stats,
    }
}

/// One stat per (player, vehicle) pair sharing an account id, players first.
pub fn derive_stats(record: &BattleRecord) -> Vec<DerivedVehicleStat> {
    let players: Vec<PlayerInfo> = record.player_infos().collect();
    let vehicles: Vec<VehicleEntry> = record.vehicle_entries().collect();

    let stats: Vec<DerivedVehicleStat> = players
        .iter()
        .flat_map(|player| {
            vehicles
                .iter()
                .filter(move |v| v.account_dbid == player.account_id)
                .map(move |v| DerivedVehicleStat::new(player, v))
        })
        .collect();

    tracing::debug!(
        players = players.len(),
        vehicles = vehicles.len(),
        stats = stats.len(),
        "derived vehicle stats"
    );
    stats
}
