//! In-memory battle store
//!
//! Holds battles, clans, users, vehicles and stat rows in ordered maps. Reads
//! join them the way the upload report and the battle/user views expect.

use chrono::{DateTime, Utc};
use replay_core::stats::{percentage, round2};
use std::collections::{BTreeMap, BTreeSet};

use crate::store::{
    BattleDetails, BattleId, BattleLine, BattleStore, BattleSummary, DateRange, DeleteOutcome,
    PlayerStatView, StatRow, StoreError, TeamAverage, UserOverview, UserSummary, UserTotals,
    VehicleTotals,
};

#[derive(Debug, Clone, PartialEq)]
struct Battle {
    name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
struct User {
    name: String,
    clan_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    last_battle_id: BattleId,
    battles: BTreeMap<BattleId, Battle>,
    clans: BTreeMap<i64, Option<String>>,
    users: BTreeMap<i64, User>,
    vehicles: BTreeMap<i64, String>,
    stats: Vec<StatRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stat_rows(&self) -> &[StatRow] {
        &self.stats
    }

    pub fn user_name(&self, account_id: i64) -> Option<&str> {
        self.users.get(&account_id).map(|u| u.name.as_str())
    }

    pub fn clan_tag(&self, clan_id: i64) -> Option<&str> {
        self.clans.get(&clan_id)?.as_deref()
    }

    pub fn vehicle_name(&self, type_comp_descr: i64) -> Option<&str> {
        self.vehicles.get(&type_comp_descr).map(String::as_str)
    }

    fn clan_abbrev(&self, user: &User) -> Option<String> {
        user.clan_id
            .and_then(|id| self.clan_tag(id))
            .map(str::to_string)
    }

    /// Stat rows of one account whose battle falls inside `range`.
    fn rows_for(&self, account_id: i64, range: DateRange) -> Vec<(&StatRow, BattleId, &Battle)> {
        self.stats
            .iter()
            .filter(|row| row.account_id == account_id)
            .filter_map(|row| {
                let battle = self.battles.get(&row.battle_id)?;
                range
                    .contains(battle.created_at)
                    .then_some((row, row.battle_id, battle))
            })
            .collect()
    }
}

impl BattleStore for MemoryStore {
    fn create_battle(
        &mut self,
        name: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<BattleId, StoreError> {
        self.last_battle_id += 1;
        let id = self.last_battle_id;
        self.battles.insert(
            id,
            Battle {
                name: name.to_string(),
                created_at: created_at.unwrap_or_else(Utc::now),
            },
        );
        Ok(id)
    }

    fn upsert_clan(&mut self, clan_id: i64, tag: Option<&str>) -> Result<(), StoreError> {
        self.clans
            .entry(clan_id)
            .or_insert_with(|| tag.map(str::to_string));
        Ok(())
    }

    fn upsert_user(
        &mut self,
        account_id: i64,
        name: &str,
        clan_id: Option<i64>,
    ) -> Result<(), StoreError> {
        if let Some(clan_id) = clan_id {
            self.upsert_clan(clan_id, None)?;
        }
        self.users.insert(
            account_id,
            User {
                name: name.to_string(),
                clan_id,
            },
        );
        Ok(())
    }

    fn upsert_vehicle(&mut self, type_comp_descr: i64, name: &str) -> Result<(), StoreError> {
        self.vehicles
            .entry(type_comp_descr)
            .or_insert_with(|| name.to_string());
        Ok(())
    }

    fn insert_player_stats(&mut self, row: StatRow) -> Result<(), StoreError> {
        if !self.battles.contains_key(&row.battle_id) {
            return Err(StoreError::UnknownBattle(row.battle_id));
        }
        self.stats.push(row);
        Ok(())
    }

    fn list_battles(&self) -> Vec<BattleSummary> {
        let mut battles: Vec<BattleSummary> = self
            .battles
            .iter()
            .map(|(&id, battle)| BattleSummary {
                id,
                battle_name: battle.name.clone(),
                created_at: battle.created_at,
                player_count: self
                    .stats
                    .iter()
                    .filter(|row| row.battle_id == id)
                    .map(|row| row.account_id)
                    .collect::<BTreeSet<_>>()
                    .len(),
            })
            .collect();
        battles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        battles
    }

    fn battle_details(&self, battle_id: BattleId) -> BattleDetails {
        let rows: Vec<&StatRow> = self
            .stats
            .iter()
            .filter(|row| row.battle_id == battle_id)
            .collect();

        let mut players: Vec<PlayerStatView> = rows
            .iter()
            .filter_map(|row| {
                let user = self.users.get(&row.account_id)?;
                let vehicle_name = self.vehicles.get(&row.vehicle_type)?;
                Some(PlayerStatView {
                    name: user.name.clone(),
                    team: row.team,
                    clan_abbrev: self.clan_abbrev(user),
                    vehicle_name: vehicle_name.clone(),
                    shots: row.shots,
                    hits: row.hits,
                    penetrations: row.penetrations,
                    damage_dealt: row.damage_dealt,
                    accuracy: row.accuracy,
                    penetration_rate: row.penetration_rate,
                    pen_to_shot_ratio: row.pen_to_shot_ratio,
                })
            })
            .collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));

        let mut by_team: BTreeMap<Option<i64>, Vec<&StatRow>> = BTreeMap::new();
        for row in &rows {
            by_team.entry(row.team).or_default().push(*row);
        }
        let team_averages = by_team
            .into_iter()
            .map(|(team, rows)| TeamAverage {
                team,
                avg_accuracy: mean(rows.iter().map(|r| r.accuracy)),
                avg_penetration_rate: mean(rows.iter().map(|r| r.penetration_rate)),
                avg_pen_to_shot_ratio: mean(rows.iter().map(|r| r.pen_to_shot_ratio)),
                player_count: rows.len(),
            })
            .collect();

        BattleDetails {
            players,
            team_averages,
        }
    }

    fn rename_battle(&mut self, battle_id: BattleId, name: &str) -> usize {
        match self.battles.get_mut(&battle_id) {
            Some(battle) => {
                battle.name = name.to_string();
                1
            }
            None => 0,
        }
    }

    fn delete_battle(&mut self, battle_id: BattleId) -> DeleteOutcome {
        let before = self.stats.len();
        self.stats.retain(|row| row.battle_id != battle_id);
        DeleteOutcome {
            player_stats_deleted: before - self.stats.len(),
            battles_deleted: usize::from(self.battles.remove(&battle_id).is_some()),
        }
    }

    fn users(&self, range: DateRange) -> Vec<UserOverview> {
        let mut users: Vec<UserOverview> = self
            .users
            .iter()
            .filter_map(|(&account_id, user)| {
                let rows = self.rows_for(account_id, range);
                if rows.is_empty() && !range.is_open() {
                    return None;
                }
                let shots: i64 = rows.iter().map(|(r, _, _)| r.shots).sum();
                let hits: i64 = rows.iter().map(|(r, _, _)| r.hits).sum();
                Some(UserOverview {
                    account_id,
                    name: user.name.clone(),
                    clan_abbrev: self.clan_abbrev(user),
                    battle_count: rows
                        .iter()
                        .map(|(_, id, _)| *id)
                        .collect::<BTreeSet<_>>()
                        .len(),
                    overall_accuracy: ratio(hits, shots),
                })
            })
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    fn user_summary(&self, account_id: i64, range: DateRange) -> Option<UserSummary> {
        let user = self.users.get(&account_id)?;
        let rows = self.rows_for(account_id, range);
        if rows.is_empty() {
            return None;
        }

        let sum = |f: fn(&StatRow) -> i64| rows.iter().map(|(r, _, _)| f(r)).sum::<i64>();
        let (shots, hits, pens) = (sum(|r| r.shots), sum(|r| r.hits), sum(|r| r.penetrations));

        let overall = UserTotals {
            name: user.name.clone(),
            account_id,
            clan_abbrev: self.clan_abbrev(user),
            total_battles: rows
                .iter()
                .map(|(_, id, _)| *id)
                .collect::<BTreeSet<_>>()
                .len(),
            total_shots: shots,
            total_hits: hits,
            total_penetrations: pens,
            total_damage: sum(|r| r.damage_dealt),
            avg_accuracy: mean(rows.iter().map(|(r, _, _)| r.accuracy)),
            avg_penetration_rate: mean(rows.iter().map(|(r, _, _)| r.penetration_rate)),
            avg_pen_to_shot_ratio: mean(rows.iter().map(|(r, _, _)| r.pen_to_shot_ratio)),
            overall_accuracy: ratio(hits, shots),
            overall_pen_rate: ratio(pens, hits),
            overall_pen_ratio: ratio(pens, shots),
        };

        let mut by_vehicle: BTreeMap<i64, Vec<(&StatRow, BattleId)>> = BTreeMap::new();
        for (row, battle_id, _) in &rows {
            if self.vehicles.contains_key(&row.vehicle_type) {
                by_vehicle
                    .entry(row.vehicle_type)
                    .or_default()
                    .push((*row, *battle_id));
            }
        }
        let mut per_vehicle: Vec<VehicleTotals> = by_vehicle
            .into_iter()
            .map(|(vehicle_type, group)| {
                let total = |f: fn(&StatRow) -> i64| group.iter().map(|(r, _)| f(r)).sum::<i64>();
                let (shots, hits, pens) =
                    (total(|r| r.shots), total(|r| r.hits), total(|r| r.penetrations));
                VehicleTotals {
                    vehicle_name: self.vehicles[&vehicle_type].clone(),
                    battles: group.iter().map(|(_, id)| *id).collect::<BTreeSet<_>>().len(),
                    shots,
                    hits,
                    penetrations: pens,
                    damage: total(|r| r.damage_dealt),
                    accuracy: ratio(hits, shots),
                    pen_rate: ratio(pens, hits),
                    pen_ratio: ratio(pens, shots),
                }
            })
            .collect();
        per_vehicle.sort_by(|a, b| b.battles.cmp(&a.battles).then(b.damage.cmp(&a.damage)));

        let mut per_battle: Vec<BattleLine> = rows
            .iter()
            .filter_map(|(row, battle_id, battle)| {
                Some(BattleLine {
                    battle_id: *battle_id,
                    battle_name: battle.name.clone(),
                    created_at: battle.created_at,
                    vehicle_name: self.vehicles.get(&row.vehicle_type)?.clone(),
                    team: row.team,
                    shots: row.shots,
                    hits: row.hits,
                    penetrations: row.penetrations,
                    damage: row.damage_dealt,
                    accuracy: row.accuracy,
                    pen_rate: row.penetration_rate,
                    pen_ratio: row.pen_to_shot_ratio,
                })
            })
            .collect();
        per_battle.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Some(UserSummary {
            overall,
            per_vehicle,
            per_battle,
        })
    }
}

/// Aggregate percentage, `None` when nothing was attempted.
fn ratio(numerator: i64, denominator: i64) -> Option<f64> {
    (denominator > 0).then(|| percentage(numerator, denominator))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(battle_id: BattleId, account_id: i64, vehicle: i64, team: i64, shots: i64, hits: i64) -> StatRow {
        StatRow {
            battle_id,
            account_id,
            vehicle_type: vehicle,
            team: Some(team),
            shots,
            hits,
            penetrations: hits / 2,
            damage_dealt: hits * 100,
            accuracy: percentage(hits, shots),
            penetration_rate: percentage(hits / 2, hits),
            pen_to_shot_ratio: percentage(hits / 2, shots),
        }
    }

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(secs, 0).single()
    }

    #[test]
    fn test_mean_rounds_half_to_even() {
        assert_eq!(mean([3.0, 3.25].into_iter()), 3.12);
        assert_eq!(mean([0.125].into_iter()), 0.12);
        assert_eq!(mean(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_stats_require_battle() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.insert_player_stats(row(9, 1, 1, 1, 1, 1)),
            Err(StoreError::UnknownBattle(9))
        );
    }

    #[test]
    fn test_upsert_semantics() {
        let mut store = MemoryStore::new();
        store.upsert_clan(10, Some("ABC")).unwrap();
        store.upsert_clan(10, Some("XYZ")).unwrap();
        store.upsert_user(1, "old", Some(10)).unwrap();
        store.upsert_user(1, "new", Some(11)).unwrap();
        store.upsert_vehicle(5, "first").unwrap();
        store.upsert_vehicle(5, "second").unwrap();

        assert_eq!(store.clan_tag(10), Some("ABC"));
        assert_eq!(store.clan_tag(11), None);
        assert_eq!(store.user_name(1), Some("new"));
        assert_eq!(store.vehicle_name(5), Some("first"));
    }

    #[test]
    fn test_battle_lifecycle() {
        let mut store = MemoryStore::new();
        let old = store.create_battle("old", at(1_000)).unwrap();
        let new = store.create_battle("new", at(2_000)).unwrap();
        store.upsert_user(1, "A", None).unwrap();
        store.upsert_vehicle(7, "Tank").unwrap();
        store.insert_player_stats(row(old, 1, 7, 1, 10, 5)).unwrap();
        store.insert_player_stats(row(new, 1, 7, 1, 10, 5)).unwrap();

        let listed: Vec<_> = store.list_battles().iter().map(|b| b.id).collect();
        assert_eq!(listed, vec![new, old]);

        assert_eq!(store.rename_battle(old, "renamed"), 1);
        assert_eq!(store.rename_battle(99, "nope"), 0);

        assert_eq!(
            store.delete_battle(old),
            DeleteOutcome { player_stats_deleted: 1, battles_deleted: 1 }
        );
        assert_eq!(store.delete_battle(old), DeleteOutcome::default());
        assert_eq!(store.stat_rows().len(), 1);
    }

    #[test]
    fn test_team_averages() {
        let mut store = MemoryStore::new();
        let id = store.create_battle("b", at(0)).unwrap();
        store.insert_player_stats(row(id, 1, 7, 1, 10, 5)).unwrap();
        store.insert_player_stats(row(id, 2, 7, 1, 4, 1)).unwrap();
        store.insert_player_stats(row(id, 3, 7, 2, 3, 1)).unwrap();

        let details = store.battle_details(id);
        // No users or vehicles were stored, so the joined view is empty.
        assert!(details.players.is_empty());
        assert_eq!(details.team_averages.len(), 2);
        assert_eq!(details.team_averages[0].team, Some(1));
        assert_eq!(details.team_averages[0].avg_accuracy, 37.5);
        assert_eq!(details.team_averages[0].player_count, 2);
        assert_eq!(details.team_averages[1].avg_accuracy, 33.33);
    }

    #[test]
    fn test_user_queries_respect_range() {
        let mut store = MemoryStore::new();
        let early = store.create_battle("early", at(1_000)).unwrap();
        let late = store.create_battle("late", at(5_000)).unwrap();
        store.upsert_user(1, "A", None).unwrap();
        store.upsert_user(2, "B", None).unwrap();
        store.upsert_vehicle(7, "Tank").unwrap();
        store.insert_player_stats(row(early, 1, 7, 1, 10, 4)).unwrap();
        store.insert_player_stats(row(late, 1, 7, 1, 10, 6)).unwrap();

        let everyone = store.users(DateRange::all());
        assert_eq!(everyone.len(), 2);
        assert_eq!(everyone[0].overall_accuracy, Some(50.0));
        assert_eq!(everyone[1].overall_accuracy, None);

        let range = DateRange { start: at(4_000), end: None };
        let recent = store.users(range);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].battle_count, 1);
        assert_eq!(recent[0].overall_accuracy, Some(60.0));

        let summary = store.user_summary(1, DateRange::all()).unwrap();
        assert_eq!(summary.overall.total_battles, 2);
        assert_eq!(summary.overall.total_shots, 20);
        assert_eq!(summary.overall.avg_accuracy, 50.0);
        assert_eq!(summary.per_vehicle.len(), 1);
        assert_eq!(summary.per_vehicle[0].battles, 2);
        assert_eq!(summary.per_battle[0].battle_id, late);

        assert!(store.user_summary(2, DateRange::all()).is_none());
        assert!(store.user_summary(3, DateRange::all()).is_none());
    }
}
