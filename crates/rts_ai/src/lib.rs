//! # RTS AI
//!
//! Deterministic computer-opponent decision engine for Post-Scarcity RTS.
//!
//! Everything here is driven purely by game-time ticks and the host's
//! [`host::HostView`] snapshot — no wall-clock reads, no system randomness,
//! no floating-point decision logic (see `rts_core`'s own determinism
//! guarantees, which this crate depends on for the same reasons: lockstep
//! multiplayer and replay-stable computer opponents).
//!
//! ## Crate Structure
//!
//! - [`engine`] - [`engine::AiEngine`], the single entry point: `think()` and
//!   the host notification hooks
//! - [`host`] - the narrow [`host::HostView`] trait the engine depends on,
//!   plus the [`host::FixtureHost`] test double
//! - [`field_index`] - spatial indices over owned territory
//! - [`observers`] - mutable per-building-type/ware/economy/site statistics
//! - [`scheduler`] - cooperative due-time bookkeeping for every sub-phase
//! - [`construction`] - the Construction Planner
//! - [`mine_planner`] - the Mine Planner
//! - [`site_supervisor`] - per-site dismantle/upgrade/start-stop review
//! - [`road_optimizer`] - road splitting, dead-end bulldoze, shortcut building
//! - [`attack_planner`] - opponent strength comparison and target selection
//! - [`hooks`] - translating host notifications into index/observer updates
//! - [`personality`] - tunable, RON-loadable engine constants
//! - [`hex`] - axial hex coordinates and 6-neighbor connectivity
//! - [`error`] - [`error::AiError`] and the crate's [`error::Result`] alias

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attack_planner;
pub mod construction;
pub mod engine;
pub mod error;
pub mod field_index;
pub mod hex;
pub mod hooks;
pub mod host;
pub mod mine_planner;
pub mod observers;
pub mod personality;
pub mod road_optimizer;
pub mod scheduler;
pub mod site_supervisor;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::engine::AiEngine;
    pub use crate::error::{AiError, Result};
    pub use crate::field_index::{BuildableField, FieldIndex, MineableField};
    pub use crate::hex::{HexCoord, HexDirection};
    pub use crate::host::{Command, HostView, Notification};
    pub use crate::observers::{BuildingKind, BuildingObserver, ObserverTables};
    pub use crate::personality::{Aggressiveness, EnginePersonality};
}
