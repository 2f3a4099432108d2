//! Mutable per-building-type, per-ware, per-flag, per-economy, per-site
//! statistics (§3, §9).

use std::collections::HashMap;

use rts_core::components::EntityId;
use rts_core::production::BuildingTypeId;

use crate::host::{BuildingDescriptorView, EconomyId, FlagId, WareId};

/// What role a building type plays, read once from its descriptor at
/// late-initialization.
///
/// This is the tagged enum the "runtime-typed dispatch on descriptor kind"
/// design note (§9) calls for, replacing the source's type-identity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingKind {
    /// Produces wares from inputs (or from nothing, for raw-material sites).
    ProductionSite,
    /// Extracts a resource from a mineable tile.
    Mine,
    /// Houses soldiers and projects territorial control.
    MilitarySite,
    /// Stores wares for an economy.
    Warehouse,
    /// Trains soldiers.
    TrainingSite,
    /// A building still being built.
    ConstructionSite,
    /// None of the above (decorative, or a type the planner does not score).
    Boring,
}

impl BuildingKind {
    /// Classify a descriptor once, at late-initialization.
    #[must_use]
    pub fn from_descriptor(desc: &BuildingDescriptorView) -> Self {
        if desc.is_mine {
            BuildingKind::Mine
        } else if desc.fighting_type {
            BuildingKind::MilitarySite
        } else if desc.recruitment {
            BuildingKind::TrainingSite
        } else if !desc.outputs.is_empty() || !desc.inputs.is_empty() || desc.production_hint.is_some() {
            BuildingKind::ProductionSite
        } else {
            BuildingKind::Boring
        }
    }
}

/// Mutable statistics tracked per building type.
#[derive(Debug, Clone)]
pub struct BuildingObserver {
    /// Building type this observer tracks.
    pub building: BuildingTypeId,
    /// Human-readable name (for logging / error messages).
    pub name: String,
    /// Classified role.
    pub kind: BuildingKind,
    /// Completed buildings of this type.
    pub cnt_built: u32,
    /// Buildings of this type currently under construction.
    pub cnt_under_construction: u32,
    /// Target quantity the planner aims to keep built (piecewise-monotone:
    /// temporary targets are always ≥ the permanent target and decay by one
    /// per consumption, per the §3 invariant).
    pub cnt_target: u32,
    /// Sites unoccupied (no worker currently active).
    pub unoccupied: u32,
    /// Most recently observed statistics percent (0..=100) across sites.
    pub current_stats: u8,
    /// Economy-wide stock level of this building's primary output.
    pub stocklevel: u32,
    /// Game-time the stocklevel was last sampled.
    pub stocklevel_time: u64,
    /// Game-time of the last construction decision involving this type.
    pub construction_decision_time: u64,
    /// Game-time this type was last dismantled.
    pub last_dismantle_time: Option<u64>,
}

impl BuildingObserver {
    /// Create an observer for a freshly classified building type.
    #[must_use]
    pub fn new(building: BuildingTypeId, name: String, desc: &BuildingDescriptorView) -> Self {
        Self {
            building,
            name,
            kind: BuildingKind::from_descriptor(desc),
            cnt_built: 0,
            cnt_under_construction: 0,
            cnt_target: 1,
            unoccupied: 0,
            current_stats: 0,
            stocklevel: 0,
            stocklevel_time: 0,
            construction_decision_time: 0,
            last_dismantle_time: None,
        }
    }

    /// Whether this type has never been built and has none under construction.
    #[must_use]
    pub fn is_first_of_kind(&self) -> bool {
        self.cnt_built == 0 && self.cnt_under_construction == 0
    }
}

/// Statistics tracked per ware.
#[derive(Debug, Clone, Default)]
pub struct WareObserver {
    /// Building types that produce this ware.
    pub producers: Vec<BuildingTypeId>,
    /// Building types that consume this ware.
    pub consumers: Vec<BuildingTypeId>,
    /// Static tie-breaker for demand (from the ware descriptor).
    pub preciousness: u32,
}

/// Statistics tracked per economy (connected flag component).
#[derive(Debug, Clone, Default)]
pub struct EconomyObserver {
    /// Flags belonging to this economy, in discovery order.
    pub flags: Vec<FlagId>,
    /// Consecutive failed attempts to connect a stranded building.
    pub failed_connection_tries: u32,
}

/// Per-site statistics for a production site or mine.
#[derive(Debug, Clone)]
pub struct SiteObserver {
    /// The site entity.
    pub site: EntityId,
    /// Building type this site is an instance of.
    pub building: BuildingTypeId,
    /// Game-time the site was built.
    pub built_time: u64,
    /// Game-time until which the site is considered unoccupied.
    pub unoccupied_till: Option<u64>,
    /// Whether the site's statistics have read zero on the last check.
    pub stats_zero: bool,
    /// Consecutive out-of-resources notifications (mines).
    pub no_resources_count: u32,
}

impl SiteObserver {
    /// Create a new site observer for a just-completed building.
    #[must_use]
    pub fn new(site: EntityId, building: BuildingTypeId, built_time: u64) -> Self {
        Self {
            site,
            building,
            built_time,
            unoccupied_till: None,
            stats_zero: false,
            no_resources_count: 0,
        }
    }
}

/// Per-site statistics for a military site.
#[derive(Debug, Clone)]
pub struct MilitarySiteObserver {
    /// The site entity.
    pub site: EntityId,
    /// Building type this site is an instance of.
    pub building: BuildingTypeId,
    /// Number of review passes this site has undergone.
    pub checks: u32,
    /// Whether an enemy was seen within vision+4 on the last review.
    pub enemies_nearby: bool,
}

impl MilitarySiteObserver {
    /// Create a new observer for a just-completed military site.
    #[must_use]
    pub fn new(site: EntityId, building: BuildingTypeId) -> Self {
        Self {
            site,
            building,
            checks: 0,
            enemies_nearby: false,
        }
    }
}

/// The full set of observer tables.
#[derive(Debug, Default)]
pub struct ObserverTables {
    /// Building-type observers, keyed by type.
    pub buildings: HashMap<BuildingTypeId, BuildingObserver>,
    /// Ware observers, keyed by ware.
    pub wares: HashMap<WareId, WareObserver>,
    /// Economy observers, keyed by economy.
    pub economies: HashMap<EconomyId, EconomyObserver>,
    /// Production/mine site observers, keyed by site entity.
    pub sites: HashMap<EntityId, SiteObserver>,
    /// Military site observers, keyed by site entity.
    pub military_sites: HashMap<EntityId, MilitarySiteObserver>,
}

impl ObserverTables {
    /// Create empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total active construction sites across all building observers
    /// (invariant 2, §8).
    #[must_use]
    pub fn total_under_construction(&self) -> u32 {
        self.buildings.values().map(|b| b.cnt_under_construction).sum()
    }

    /// Total completed buildings across all building observers (invariant 2, §8).
    #[must_use]
    pub fn total_built(&self) -> u32 {
        self.buildings.values().map(|b| b.cnt_built).sum()
    }
}
