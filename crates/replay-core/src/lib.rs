//! Replay Core: object scanner, battle record builder, derived combat stats
//!
//! `parse_replay` is a pure function from replay bytes to a [`ParsedReplay`].
//! It does no I/O and never fails; absent data shows up as empty fields.

pub mod builder;
pub mod data_model;
pub mod error;
pub mod scanner;
pub mod stats;

pub use builder::{build, derive_stats};
pub use data_model::{
    BattleRecord, DecodedObject, DerivedVehicleStat, ParsedReplay, PlayerInfo, SessionMetadata,
    VehicleCounters, VehicleEntry,
};
pub use error::ReplayError;
pub use scanner::{scan, ReplayScanner};

/// Scans `raw` for embedded objects and derives the battle stats.
pub fn parse_replay(raw: &[u8]) -> ParsedReplay {
    let objects = scan(raw);
    build(&objects)
}
