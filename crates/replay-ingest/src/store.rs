//! Battle store contract and the rows it exchanges
use chrono::{DateTime, Utc};
use replay_core::DerivedVehicleStat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BattleId = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("STORE/unknown battle {0}")]
    UnknownBattle(BattleId),
}

/// Persistence collaborator for ingested replays.
///
/// Upserts follow insert-if-absent semantics except for users, whose name and
/// clan are refreshed on every upsert.
pub trait BattleStore {
    fn create_battle(
        &mut self,
        name: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<BattleId, StoreError>;

    fn upsert_clan(&mut self, clan_id: i64, tag: Option<&str>) -> Result<(), StoreError>;

    /// Also makes sure the clan row exists.
    fn upsert_user(
        &mut self,
        account_id: i64,
        name: &str,
        clan_id: Option<i64>,
    ) -> Result<(), StoreError>;

    fn upsert_vehicle(&mut self, type_comp_descr: i64, name: &str) -> Result<(), StoreError>;

    fn insert_player_stats(&mut self, row: StatRow) -> Result<(), StoreError>;

    /// Newest battles first.
    fn list_battles(&self) -> Vec<BattleSummary>;

    fn battle_details(&self, battle_id: BattleId) -> BattleDetails;

    /// Number of battles renamed (0 or 1).
    fn rename_battle(&mut self, battle_id: BattleId, name: &str) -> usize;

    fn delete_battle(&mut self, battle_id: BattleId) -> DeleteOutcome;

    fn users(&self, range: DateRange) -> Vec<UserOverview>;

    fn user_summary(&self, account_id: i64, range: DateRange) -> Option<UserSummary>;
}

/// One stored stat line, keyed by (battle, account, vehicle type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub battle_id: BattleId,
    pub account_id: i64,
    pub vehicle_type: i64,
    pub team: Option<i64>,
    pub shots: i64,
    pub hits: i64,
    pub penetrations: i64,
    pub damage_dealt: i64,
    pub accuracy: f64,
    pub penetration_rate: f64,
    pub pen_to_shot_ratio: f64,
}

impl StatRow {
    pub fn new(battle_id: BattleId, stat: &DerivedVehicleStat) -> Self {
        Self {
            battle_id,
            account_id: stat.account_id,
            vehicle_type: stat.vehicle_type_id,
            team: stat.team,
            shots: stat.shots,
            hits: stat.hits,
            penetrations: stat.penetrations,
            damage_dealt: stat.damage_dealt,
            accuracy: stat.accuracy,
            penetration_rate: stat.penetration_rate,
            pen_to_shot_ratio: stat.pen_to_shot_ratio,
        }
    }
}

/// Inclusive bounds on battle creation time. Unset bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleSummary {
    pub id: BattleId,
    pub battle_name: String,
    pub created_at: DateTime<Utc>,
    pub player_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatView {
    pub name: String,
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAverage {
    pub team: Option<i64>,
    pub avg_accuracy: f64,
    pub avg_penetration_rate: f64,
    pub avg_pen_to_shot_ratio: f64,
    pub player_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BattleDetails {
    pub players: Vec<PlayerStatView>,
    pub team_averages: Vec<TeamAverage>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub player_stats_deleted: usize,
    pub battles_deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserOverview {
    pub account_id: i64,
    pub name: String,
    #[serde(rename = "clanAbbrev")]
    pub clan_abbrev: Option<String>,
    pub battle_count: usize,
    /// `None` when the user has no recorded shots.
    pub overall_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserTotals {
    pub name: String,
    pub account_id: i64,
    #[serde(rename = "clanAbbrev")]
    pub clan_abbrev: Option<String>,
    pub total_battles: usize,
    pub total_shots: i64,
    pub total_hits: i64,
    pub total_penetrations: i64,
    pub total_damage: i64,
    pub avg_accuracy: f64,
    pub avg_penetration_rate: f64,
    pub avg_pen_to_shot_ratio: f64,
    pub overall_accuracy: Option<f64>,
    pub overall_pen_rate: Option<f64>,
    pub overall_pen_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleTotals {
    pub vehicle_name: String,
    pub battles: usize,
    pub shots: i64,
    pub hits: i64,
    pub penetrations: i64,
    pub damage: i64,
    pub accuracy: Option<f64>,
    pub pen_rate: Option<f64>,
    pub pen_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleLine {
    pub battle_id: BattleId,
    pub battle_name: String,
    pub created_at: DateTime<Utc>,
    pub vehicle_name: String,
    pub team: Option<i64>,
    pub shots: i64,
    pub hits: i64,
    pub penetrations: i64,
    pub damage: i64,
    pub accuracy: f64,
    pub pen_rate: f64,
    pub pen_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub overall: UserTotals,
    pub per_vehicle: Vec<VehicleTotals>,
    pub per_battle: Vec<BattleLine>,
}
