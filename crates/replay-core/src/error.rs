//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// Fewer than two objects were recovered, so there is no battle record.
    #[error("REPLAY/no battle data found (recovered {found} object(s))")]
    NoBattleData { found: usize },
}
