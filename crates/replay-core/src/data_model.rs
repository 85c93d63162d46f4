//! Data Model: SessionMetadata, BattleRecord, DerivedVehicleStat
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReplayError;
use crate::stats::percentage;

/// One JSON object recovered from a replay file.
pub type DecodedObject = Map<String, Value>;

/// Client/session information carried by the first object of a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub client_version_from_xml: Option<String>,
    pub client_version_from_exe: Option<String>,
    pub map_display_name: Option<String>,
    pub region_code: Option<String>,
    pub player_name: Option<String>,
    pub server_name: Option<String>,
}

impl SessionMetadata {
    pub fn from_object(object: &DecodedObject) -> Self {
        Self {
            client_version_from_xml: text_field(object, "clientVersionFromXml"),
            client_version_from_exe: text_field(object, "clientVersionFromExe"),
            map_display_name: text_field(object, "mapDisplayName"),
            region_code: text_field(object, "regionCode"),
            player_name: text_field(object, "playerName"),
            server_name: text_field(object, "serverName"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The battle-data object: the second object of a replay.
///
/// The nested collections are kept as decoded; typed views are produced by
/// [`BattleRecord::player_infos`] and [`BattleRecord::vehicle_entries`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleRecord {
    #[serde(rename = "arenaUniqueID")]
    pub arena_unique_id: Option<i64>,
    pub common: Map<String, Value>,
    pub players: Map<String, Value>,
    pub vehicles: Map<String, Value>,
}

impl BattleRecord {
    pub fn from_object(object: &DecodedObject) -> Self {
        Self {
            arena_unique_id: object.get("arenaUniqueID").and_then(as_integer),
            common: mapping_field(object, "common"),
            players: mapping_field(object, "players"),
            vehicles: mapping_field(object, "vehicles"),
        }
    }

    /// `common.arenaCreateTime` as Unix seconds.
    pub fn arena_create_time(&self) -> Option<f64> {
        self.common.get("arenaCreateTime").and_then(Value::as_f64)
    }

    /// `common.arenaTypeID`, the map identifier used by the arena catalog.
    pub fn arena_type_id(&self) -> Option<i64> {
        self.common.get("arenaTypeID").and_then(as_integer)
    }

    /// Players whose key parses as an account id and whose value is a mapping.
    pub fn player_infos(&self) -> impl Iterator<Item = PlayerInfo> + '_ {
        self.players.iter().filter_map(|(key, value)| {
            let parsed = PlayerInfo::from_entry(key, value);
            if parsed.is_none() {
                tracing::debug!(player = %key, "skipping malformed player entry");
            }
            parsed
        })
    }

    /// Vehicle entries of the expected `[ { ... } ]` shape.
    pub fn vehicle_entries(&self) -> impl Iterator<Item = VehicleEntry> + '_ {
        self.vehicles.iter().filter_map(|(key, value)| {
            let parsed = VehicleEntry::from_entry(key, value);
            if parsed.is_none() {
                tracing::debug!(vehicle = %key, "skipping malformed vehicle entry");
            }
            parsed
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub account_id: i64,
    pub name: Option<String>,
    pub clan_dbid: Option<i64>,
    pub clan_abbrev: Option<String>,
    pub team: Option<i64>,
}

impl PlayerInfo {
    fn from_entry(key: &str, value: &Value) -> Option<Self> {
        let account_id = key.trim().parse().ok()?;
        let info = value.as_object()?;
        Some(Self {
            account_id,
            name: info.get("name").and_then(Value::as_str).map(str::to_string),
            clan_dbid: info.get("clanDBID").and_then(as_integer),
            clan_abbrev: info.get("clanAbbrev").and_then(Value::as_str).map(str::to_string),
            team: info.get("team").and_then(as_integer),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleEntry {
    /// Vehicle-instance key inside `vehicles`.
    pub vehicle_id: String,
    pub account_dbid: i64,
    pub type_comp_descr: i64,
    pub counters: VehicleCounters,
}

impl VehicleEntry {
    fn from_entry(key: &str, value: &Value) -> Option<Self> {
        let info = value.as_array()?.first()?.as_object()?;
        Some(Self {
            vehicle_id: key.to_string(),
            account_dbid: info.get("accountDBID").and_then(as_integer)?,
            type_comp_descr: info.get("typeCompDescr").and_then(as_integer)?,
            counters: VehicleCounters::from_entry(info),
        })
    }
}

/// Combat counters of one vehicle. Absent and zero are the same thing here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleCounters {
    pub shots: i64,
    pub direct_hits: i64,
    pub piercings: i64,
    pub damage_dealt: i64,
}

impl VehicleCounters {
    pub fn from_entry(info: &Map<String, Value>) -> Self {
        let counter = |name: &str| info.get(name).and_then(as_integer).unwrap_or(0);
        Self {
            shots: counter("shots"),
            direct_hits: counter("directHits"),
            piercings: counter("piercings"),
            damage_dealt: counter("damageDealt"),
        }
    }
}

/// Per-account, per-vehicle combat statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedVehicleStat {
    pub account_id: i64,
    pub vehicle_type_id: i64,
    pub team: Option<i64>,
    pub shots: i64,
    pub hits: i64,
    pub penetrations: i64,
    pub damage_dealt: i64,
    /// Hits per shot, percent.
    pub accuracy: f64,
    /// Penetrations per hit, percent.
    pub penetration_rate: f64,
    /// Penetrations per shot, percent.
    pub pen_to_shot_ratio: f64,
}

impl DerivedVehicleStat {
    pub fn new(player: &PlayerInfo, vehicle: &VehicleEntry) -> Self {
        let c = vehicle.counters;
        Self {
            account_id: player.account_id,
            vehicle_type_id: vehicle.type_comp_descr,
            team: player.team,
            shots: c.shots,
            hits: c.direct_hits,
            penetrations: c.piercings,
            damage_dealt: c.damage_dealt,
            accuracy: percentage(c.direct_hits, c.shots),
            penetration_rate: percentage(c.piercings, c.direct_hits),
            pen_to_shot_ratio: percentage(c.piercings, c.shots),
        }
    }
}

/// Everything recovered from one replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReplay {
    /// Number of JSON objects the scanner recovered.
    pub objects_found: usize,
    pub metadata: SessionMetadata,
    pub battle_record: Option<BattleRecord>,
    pub derived_stats: Vec<DerivedVehicleStat>,
}

impl ParsedReplay {
    /// The battle record, or `NoBattleData` when the replay carried none.
    pub fn battle(&self) -> Result<&BattleRecord, ReplayError> {
        self.battle_record.as_ref().ok_or(ReplayError::NoBattleData {
            found: self.objects_found,
        })
    }

    /// Stats of one account, in derivation order.
    pub fn stats_for(&self, account_id: i64) -> impl Iterator<Item = &DerivedVehicleStat> + '_ {
        self.derived_stats
            .iter()
            .filter(move |s| s.account_id == account_id)
    }

    /// Orders stats by account id, then vehicle type id.
    pub fn sort_stats(&mut self) {
        self.derived_stats
            .sort_by_key(|s| (s.account_id, s.vehicle_type_id));
    }
}

/// Integer identity of a JSON value: integers, integral floats, numeric strings.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(object: &DecodedObject, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn mapping_field(object: &DecodedObject, key: &str) -> Map<String, Value> {
    match object.get(key) {
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            tracing::debug!(field = key, "battle record field is not a mapping, treating as empty");
            Map::new()
        }
        None => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> DecodedObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_metadata_absent_fields_stay_absent() {
        let meta = SessionMetadata::from_object(&object(json!({
            "playerName": "X",
            "regionCode": null,
            "unrelated": 1
        })));
        assert_eq!(meta.player_name.as_deref(), Some("X"));
        assert_eq!(meta.region_code, None);
        assert_eq!(meta.server_name, None);
        assert!(!meta.is_empty());
        assert!(SessionMetadata::default().is_empty());
    }

    #[test]
    fn test_metadata_serializes_with_original_names() {
        let meta = SessionMetadata::from_object(&object(json!({"mapDisplayName": "Himmelsdorf"})));
        let out = serde_json::to_value(&meta).unwrap();
        assert_eq!(out["mapDisplayName"], "Himmelsdorf");
        assert!(out["clientVersionFromXml"].is_null());
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(as_integer(&json!(5)), Some(5));
        assert_eq!(as_integer(&json!("5")), Some(5));
        assert_eq!(as_integer(&json!(5.0)), Some(5));
        assert_eq!(as_integer(&json!("five")), None);
        assert_eq!(as_integer(&json!(null)), None);
        assert_eq!(as_integer(&json!([5])), None);
    }

    #[test]
    fn test_counters_default_to_zero() {
        let counters = VehicleCounters::from_entry(&object(json!({"shots": 3, "piercings": null})));
        assert_eq!(
            counters,
            VehicleCounters { shots: 3, direct_hits: 0, piercings: 0, damage_dealt: 0 }
        );
    }

    #[test]
    fn test_battle_record_wrong_shapes_become_empty() {
        let record = BattleRecord::from_object(&object(json!({
            "arenaUniqueID": "7",
            "players": [],
            "common": {"arenaCreateTime": 1000.5, "arenaTypeID": 4}
        })));
        assert_eq!(record.arena_unique_id, Some(7));
        assert!(record.players.is_empty());
        assert!(record.vehicles.is_empty());
        assert_eq!(record.arena_create_time(), Some(1000.5));
        assert_eq!(record.arena_type_id(), Some(4));
    }

    #[test]
    fn test_vehicle_entry_shapes() {
        let record = BattleRecord::from_object(&object(json!({
            "vehicles": {
                "1": [{"accountDBID": 5, "typeCompDescr": 111}],
                "2": [],
                "3": {"accountDBID": 5, "typeCompDescr": 222},
                "4": [{"typeCompDescr": 333}],
                "5": ["nope"]
            }
        })));
        let entries: Vec<_> = record.vehicle_entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].vehicle_id, "1");
        assert_eq!(entries[0].type_comp_descr, 111);
    }

    #[test]
    fn test_no_battle_is_reported() {
        let parsed = ParsedReplay { objects_found: 1, ..Default::default() };
        assert_eq!(parsed.battle(), Err(ReplayError::NoBattleData { found: 1 }));
    }
}
