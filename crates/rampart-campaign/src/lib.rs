//! Campaign bookkeeping for RAMPART.
//!
//! Per-session money/lives/score, cross-session progression and unlocks,
//! meta upgrades, and persistence of the three progression documents.

pub mod economy;
pub mod persistence;
pub mod progression;
pub mod upgrades;

pub use economy::EconomyLedger;
pub use persistence::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use progression::ProgressionGate;
