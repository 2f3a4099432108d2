//! The narrow read/command interface the engine consumes from the host.
//!
//! The game simulation, map, pathfinding primitives, command queue,
//! notification bus, and descriptor tables are all external collaborators
//! (see `SPEC_FULL.md` §6) — the engine never reaches into
//! `rts_core::simulation::Simulation` directly. Everything it needs is a
//! [`HostView`] method, mirroring the decoupling
//! `rts_core::player_facade::PlayerFacade` gives the rest of the game.

use std::collections::HashMap;

use rts_core::components::EntityId;
use rts_core::production::BuildingTypeId;

use crate::hex::HexCoord;

/// What can be built on a tile, per the host's build-capability bitmask.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildCap {
    /// Nothing can be built here.
    #[default]
    None,
    /// Only a flag.
    Flag,
    /// Small buildings fit.
    Small,
    /// Medium buildings fit (also implies small fits).
    Medium,
    /// Big buildings fit (also implies medium and small fit).
    Big,
    /// A mine can be built here.
    Mine,
}

impl BuildCap {
    /// Whether this cap can hold a building needing at least `min` size.
    ///
    /// Mine capability is categorically distinct from the size ladder: a
    /// mine tile does not "fit" small/medium/big buildings and vice versa.
    #[must_use]
    pub fn fits(self, min: BuildCap) -> bool {
        match (self, min) {
            (BuildCap::Mine, BuildCap::Mine) => true,
            (BuildCap::Mine, _) | (_, BuildCap::Mine) => false,
            _ => self >= min,
        }
    }
}

/// Resource identifier, looked up by name from the host's resource table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u16);

/// Ware identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WareId(pub u16);

/// A flag: the transport graph node attached to each building and road junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagId(pub EntityId);

/// The connected component of flags through roads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EconomyId(pub u32);

/// A road segment, identified by its owning flag-to-flag span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoadId(pub EntityId);

/// Soldier preference for a military site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoldierPreference {
    /// Prefer inexperienced soldiers (used when no enemy is nearby).
    Rookies,
    /// Prefer veteran soldiers (used when an enemy is nearby).
    Heroes,
}

/// Static per-building-type capability hints, read once at late-initialization.
#[derive(Debug, Clone, Default)]
pub struct BuildingDescriptorView {
    /// Human-readable name, used only for logging and `AiError::UnknownBuilding`.
    pub name: String,
    /// Tile footprint size required.
    pub size: BuildCap,
    /// Whether this building type is a mine.
    pub is_mine: bool,
    /// Enhancement (upgrade) target, if any.
    pub enhancement: Option<BuildingTypeId>,
    /// Tiles revealed around the site.
    pub vision_range: u32,
    /// Maximum soldiers a military site can hold.
    pub max_soldiers: u32,
    /// Needs trees nearby (lumberjacks).
    pub need_trees: bool,
    /// Needs stones nearby (quarries).
    pub need_stones: bool,
    /// Needs water nearby (wells, fishers, breeders).
    pub need_water: bool,
    /// Consumes ground water (wells).
    pub mines_water: bool,
    /// Hunts wild critters.
    pub is_hunter: bool,
    /// Fishes from nearby water.
    pub is_fisher: bool,
    /// Plants trees (rangers).
    pub plants_trees: bool,
    /// Occupies surrounding tiles while operating (farms, vineyards).
    pub space_consumer: bool,
    /// Trains or houses new soldiers.
    pub recruitment: bool,
    /// Claims unowned territory on construction.
    pub expansion_type: bool,
    /// Claims mountainous/mine-bearing territory.
    pub mountain_conqueror: bool,
    /// Is a military (fighting) building.
    pub fighting_type: bool,
    /// Resource id mined, if `is_mine`.
    pub mines_resource: Option<ResourceId>,
    /// Percent chance of finding the resource per dig.
    pub mines_percent: u8,
    /// Ware this building's production hint targets (e.g. rangers -> logs).
    pub production_hint: Option<WareId>,
    /// Game-time (ms) before which this building cannot be built at all.
    pub prohibited_till: u64,
    /// Game-time (ms) after which this building is force-built if still absent.
    pub forced_after: u64,
    /// Input wares consumed.
    pub inputs: Vec<WareId>,
    /// Output wares produced.
    pub outputs: Vec<WareId>,
}

/// Static per-ware data.
#[derive(Debug, Clone, Copy, Default)]
pub struct WareDescriptorView {
    /// Static tie-breaker for demand: higher is more urgently needed.
    pub preciousness: u32,
}

/// Commands the engine may push to the host's command queue.
///
/// Fire-and-forget: the host gives no feedback channel (§7). Rejected
/// commands are simply absent from the next tick's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start construction of `building` at `coords`.
    Build {
        /// Target tile.
        coords: HexCoord,
        /// Building type to construct.
        building: BuildingTypeId,
    },
    /// Dismantle (gracefully take down) a building.
    Dismantle(EntityId),
    /// Bulldoze (immediately remove) an immovable.
    Bulldoze(EntityId),
    /// Build a flag at `coords`.
    BuildFlag(HexCoord),
    /// Build a road along `path`.
    BuildRoad(Vec<HexCoord>),
    /// Upgrade a site to its enhanced building type.
    Enhance {
        /// Site to enhance.
        site: EntityId,
        /// Target building type.
        building: BuildingTypeId,
    },
    /// Toggle a production site between running and stopped.
    StartStopBuilding(EntityId),
    /// Change a military site's soldier capacity by `delta` (may be negative).
    ChangeSoldierCapacity {
        /// Military site.
        site: EntityId,
        /// Signed capacity change.
        delta: i32,
    },
    /// Set a military site's soldier preference.
    SetSoldierPreference {
        /// Military site.
        site: EntityId,
        /// Preference to set.
        preference: SoldierPreference,
    },
    /// Launch an attack against `target_flag`.
    EnemyFlagAction {
        /// Flag to attack.
        target_flag: FlagId,
        /// Attacking player.
        attackers_player: u32,
        /// Number of attacking units to commit.
        count: u32,
    },
}

/// Notifications the host delivers to event hooks (§4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The player gained ownership of a tile.
    FieldGained(HexCoord),
    /// The player lost ownership of a tile.
    FieldLost(HexCoord),
    /// An immovable (building, flag, road) finished appearing at `coords`.
    ImmovableGained {
        /// Location.
        coords: HexCoord,
        /// What appeared.
        kind: ImmovableKind,
    },
    /// An immovable disappeared from `coords`.
    ImmovableLost {
        /// Location.
        coords: HexCoord,
        /// What disappeared.
        kind: ImmovableKind,
    },
    /// A production site ran out of input resources.
    ProductionSiteOutOfResources(EntityId),
}

/// The kind of immovable an [`Notification::ImmovableGained`]/`ImmovableLost`
/// event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmovableKind {
    /// A construction site for `building` (not yet complete).
    ConstructionSite {
        /// The building type under construction.
        building: BuildingTypeId,
        /// The construction site entity.
        site: EntityId,
    },
    /// A completed building.
    Building {
        /// The building type.
        building: BuildingTypeId,
        /// The building entity.
        site: EntityId,
    },
    /// A flag.
    Flag(FlagId),
    /// A road segment.
    Road(RoadId),
    /// A tree.
    Tree,
    /// A stone deposit.
    Stone,
    /// An opposing player's immovable (any kind), at `owner`.
    Enemy {
        /// Owning player.
        owner: u32,
    },
}

/// A mobile map object ("bob" in the source terminology): fish schools and
/// wild critters, found via [`HostView::find_bobs`] rather than
/// [`HostView::find_immovables`] since they are not stationary (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BobKind {
    /// A fish school in a water tile.
    Fish,
    /// A wild critter (huntable game).
    Critter,
}

/// Filter used by [`HostView::find_bobs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BobFilter {
    /// Only fish.
    Fish,
    /// Only critters.
    Critter,
}

/// Per-player aggregate military strength, as tracked by the host's
/// statistics subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MilitaryStrength(pub u32);

/// A road segment between two flags, with its full tile path (§4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadView {
    /// Road identity.
    pub id: RoadId,
    /// One endpoint flag.
    pub from: FlagId,
    /// The other endpoint flag.
    pub to: FlagId,
    /// Tile path from `from` to `to`, inclusive of both endpoints.
    pub path: Vec<HexCoord>,
}

/// A flag's static and dynamic properties, as seen by the road optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagView {
    /// Flag identity.
    pub id: FlagId,
    /// Tile location.
    pub coords: HexCoord,
    /// Economy this flag belongs to.
    pub economy: EconomyId,
    /// Wares currently waiting at this flag.
    pub wares: u32,
}

/// A candidate target for the Attack Planner (§4.7): an enemy military
/// building or warehouse visible from one of our own military sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackTarget {
    /// The flag in front of the target building.
    pub flag: FlagId,
    /// Owning (enemy) player.
    pub owner: u32,
    /// Whether the target is a warehouse (assumed undefended, gets a priority push).
    pub is_warehouse: bool,
    /// Soldiers currently defending the target.
    pub present_defenders: u32,
    /// Nearby enemy sites that could reinforce the target if attacked.
    pub defend_ready_nearby: u32,
}

/// The narrow read/command interface the engine consumes.
///
/// Implementations own the actual map, descriptor tables, economy
/// bookkeeping, and command queue; the engine only ever calls through this
/// trait. Everything returned is a snapshot as of the call — the engine
/// never holds references into host state across ticks.
pub trait HostView {
    /// This player's id.
    fn player_id(&self) -> u32;

    /// Current game time, in milliseconds. Never wall-clock.
    fn game_time(&self) -> u64;

    /// Build-capability of a tile.
    fn build_cap(&self, coords: HexCoord) -> BuildCap;

    /// Owning player of a tile, if any.
    fn tile_owner(&self, coords: HexCoord) -> Option<u32>;

    /// Resource id and remaining amount under a tile, if any.
    fn tile_resource(&self, coords: HexCoord) -> Option<(ResourceId, u32)>;

    /// Whether `a` is hostile to `b`.
    fn is_hostile(&self, a: u32, b: u32) -> bool;

    /// Whether this player is allowed to build `building` at all.
    fn building_type_allowed(&self, building: BuildingTypeId) -> bool;

    /// Descriptor for a building type. `None` only for genuinely unknown ids —
    /// callers should treat that as [`crate::error::AiError::UnknownBuilding`].
    fn building_descriptor(&self, building: BuildingTypeId) -> Option<&BuildingDescriptorView>;

    /// Descriptor for a ware.
    fn ware_descriptor(&self, ware: WareId) -> Option<&WareDescriptorView>;

    /// All building type ids the host exposes (used to iterate observers at
    /// late-initialization).
    fn all_building_types(&self) -> Vec<BuildingTypeId>;

    /// Find all immovables within `radius` hex-steps of `center`.
    fn find_immovables(&self, center: HexCoord, radius: u32) -> Vec<(HexCoord, ImmovableKind)>;

    /// Find all owned-tile coordinates within `radius` matching `filter`.
    fn find_fields(&self, center: HexCoord, radius: u32, filter: FieldFilter) -> Vec<HexCoord>;

    /// Find all mobile bobs (fish schools, critters) within `radius` of
    /// `center` matching `filter` (§6): distinct from [`Self::find_immovables`]
    /// because bobs are not stationary map objects.
    fn find_bobs(&self, center: HexCoord, radius: u32, filter: BobFilter) -> Vec<HexCoord>;

    /// Compute a concrete path between two tiles, respecting buildability,
    /// or `None` if unreachable within the host's search limits.
    fn find_path(&self, from: HexCoord, to: HexCoord) -> Option<Vec<HexCoord>>;

    /// Wares currently stocked for `ware` across an economy's warehouses.
    fn stock_ware(&self, economy: EconomyId, ware: WareId) -> u32;

    /// Whether an economy currently needs more of `ware`.
    fn needs_ware(&self, economy: EconomyId, ware: WareId) -> bool;

    /// Whether an economy contains at least one warehouse.
    fn economy_has_warehouse(&self, economy: EconomyId) -> bool;

    /// Per-site statistics percent (0..=100), if the site is currently tracked.
    fn site_statistics_percent(&self, site: EntityId) -> Option<u8>;

    /// Per-player military strength time series, most recent last.
    fn military_strength(&self, player: u32) -> Option<MilitaryStrength>;

    /// All known opponent player ids.
    fn opponents(&self) -> Vec<u32>;

    /// Every road this player currently owns (§4.6).
    fn roads(&self) -> Vec<RoadView>;

    /// Every flag this player currently owns (§4.6).
    fn flags(&self) -> Vec<FlagView>;

    /// Whether a tile could host a flag (flaggable), used by the road
    /// splitter and shortcut builder to find valid insertion points.
    fn is_road_flaggable(&self, coords: HexCoord) -> bool;

    /// Location of a production/mine/military site.
    fn site_coords(&self, site: EntityId) -> Option<HexCoord>;

    /// Economy a site's flag belongs to.
    fn site_economy(&self, site: EntityId) -> Option<EconomyId>;

    /// Whether a site currently has the workers it needs to operate.
    fn site_can_work(&self, site: EntityId) -> bool;

    /// Current soldier capacity of a military site.
    fn soldier_capacity(&self, site: EntityId) -> Option<u32>;

    /// This player's own military sites (for Attack Planner sampling, §4.7).
    fn own_military_sites(&self) -> Vec<EntityId>;

    /// Attackable enemy targets visible from `site`'s vision range (§4.7).
    fn attackable_targets(&self, site: EntityId) -> Vec<AttackTarget>;

    /// Number of attacking soldiers this player could commit against `flag`.
    fn find_attack_soldiers(&self, flag: FlagId) -> u32;

    /// Push a command onto the host's command queue.
    fn push_command(&mut self, command: Command);
}

/// Filter used by [`HostView::find_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFilter {
    /// Tiles owned by this player.
    Owned,
    /// Tiles owned by nobody.
    Unowned,
    /// Tiles owned by a hostile player.
    Enemy,
}

/// A simple in-memory `HostView` fixture for tests and benchmarks: backed
/// by plain maps rather than a live [`rts_core::simulation::Simulation`],
/// following the same test-isolation idiom as
/// `rts_core::player_facade::SimulationPlayerFacade`'s own test module.
#[derive(Debug, Default)]
pub struct FixtureHost {
    /// This fixture's player id.
    pub player_id: u32,
    /// Current game time.
    pub game_time: u64,
    /// Tile ownership.
    pub owners: HashMap<HexCoord, u32>,
    /// Tile build caps.
    pub caps: HashMap<HexCoord, BuildCap>,
    /// Tile resources.
    pub resources: HashMap<HexCoord, (ResourceId, u32)>,
    /// Immovables present, keyed by coordinate.
    pub immovables: HashMap<HexCoord, ImmovableKind>,
    /// Mobile bobs (fish, critters) present, keyed by coordinate.
    pub bobs: HashMap<HexCoord, BobKind>,
    /// Building descriptors.
    pub descriptors: HashMap<BuildingTypeId, BuildingDescriptorView>,
    /// Ware descriptors.
    pub wares: HashMap<WareId, WareDescriptorView>,
    /// Economy warehouse presence.
    pub economy_warehouses: HashMap<EconomyId, bool>,
    /// Economy ware stock.
    pub economy_stock: HashMap<(EconomyId, WareId), u32>,
    /// Economy ware needs.
    pub economy_needs: HashMap<(EconomyId, WareId), bool>,
    /// Site statistics.
    pub site_stats: HashMap<EntityId, u8>,
    /// Military strength per player.
    pub strengths: HashMap<u32, MilitaryStrength>,
    /// Hostility pairs (symmetric lookup expected from caller).
    pub hostile_pairs: std::collections::HashSet<(u32, u32)>,
    /// Commands pushed so far, in order.
    pub commands: Vec<Command>,
    /// Roads owned by this player.
    pub roads: Vec<RoadView>,
    /// Flags owned by this player.
    pub flags: Vec<FlagView>,
    /// Tiles that could host a flag.
    pub flaggable: std::collections::HashSet<HexCoord>,
    /// Site locations.
    pub site_coords: HashMap<EntityId, HexCoord>,
    /// Site economies.
    pub site_economies: HashMap<EntityId, EconomyId>,
    /// Sites that currently have workers (defaults to `true` if absent).
    pub site_working: HashMap<EntityId, bool>,
    /// Military site soldier capacities.
    pub soldier_capacities: HashMap<EntityId, u32>,
    /// This player's military sites.
    pub military_site_ids: Vec<EntityId>,
    /// Attack targets visible from each military site.
    pub attack_targets: HashMap<EntityId, Vec<AttackTarget>>,
    /// Attacking soldiers available per flag.
    pub attack_soldiers: HashMap<FlagId, u32>,
}

impl FixtureHost {
    /// Create an empty fixture for the given player at tick 0.
    #[must_use]
    pub fn new(player_id: u32) -> Self {
        Self {
            player_id,
            ..Default::default()
        }
    }
}

impl HostView for FixtureHost {
    fn player_id(&self) -> u32 {
        self.player_id
    }

    fn game_time(&self) -> u64 {
        self.game_time
    }

    fn build_cap(&self, coords: HexCoord) -> BuildCap {
        self.caps.get(&coords).copied().unwrap_or(BuildCap::None)
    }

    fn tile_owner(&self, coords: HexCoord) -> Option<u32> {
        self.owners.get(&coords).copied()
    }

    fn tile_resource(&self, coords: HexCoord) -> Option<(ResourceId, u32)> {
        self.resources.get(&coords).copied()
    }

    fn is_hostile(&self, a: u32, b: u32) -> bool {
        a != b && self.hostile_pairs.contains(&(a, b))
    }

    fn building_type_allowed(&self, _building: BuildingTypeId) -> bool {
        true
    }

    fn building_descriptor(&self, building: BuildingTypeId) -> Option<&BuildingDescriptorView> {
        self.descriptors.get(&building)
    }

    fn ware_descriptor(&self, ware: WareId) -> Option<&WareDescriptorView> {
        self.wares.get(&ware)
    }

    fn all_building_types(&self) -> Vec<BuildingTypeId> {
        self.descriptors.keys().copied().collect()
    }

    fn find_immovables(&self, center: HexCoord, radius: u32) -> Vec<(HexCoord, ImmovableKind)> {
        self.immovables
            .iter()
            .filter(|(coords, _)| center.distance(**coords) <= radius)
            .map(|(coords, kind)| (*coords, *kind))
            .collect()
    }

    fn find_fields(&self, center: HexCoord, radius: u32, filter: FieldFilter) -> Vec<HexCoord> {
        center
            .ring_area(radius as i32)
            .into_iter()
            .filter(|coords| match filter {
                FieldFilter::Owned => self.owners.get(coords) == Some(&self.player_id),
                FieldFilter::Unowned => !self.owners.contains_key(coords),
                FieldFilter::Enemy => self
                    .owners
                    .get(coords)
                    .is_some_and(|&owner| self.is_hostile(self.player_id, owner)),
            })
            .collect()
    }

    fn find_bobs(&self, center: HexCoord, radius: u32, filter: BobFilter) -> Vec<HexCoord> {
        self.bobs
            .iter()
            .filter(|(coords, kind)| {
                center.distance(**coords) <= radius
                    && match filter {
                        BobFilter::Fish => matches!(kind, BobKind::Fish),
                        BobFilter::Critter => matches!(kind, BobKind::Critter),
                    }
            })
            .map(|(coords, _)| *coords)
            .collect()
    }

    fn find_path(&self, from: HexCoord, to: HexCoord) -> Option<Vec<HexCoord>> {
        if from == to {
            return Some(vec![from]);
        }
        Some(vec![from, to])
    }

    fn stock_ware(&self, economy: EconomyId, ware: WareId) -> u32 {
        self.economy_stock.get(&(economy, ware)).copied().unwrap_or(0)
    }

    fn needs_ware(&self, economy: EconomyId, ware: WareId) -> bool {
        self.economy_needs
            .get(&(economy, ware))
            .copied()
            .unwrap_or(false)
    }

    fn economy_has_warehouse(&self, economy: EconomyId) -> bool {
        self.economy_warehouses.get(&economy).copied().unwrap_or(false)
    }

    fn site_statistics_percent(&self, site: EntityId) -> Option<u8> {
        self.site_stats.get(&site).copied()
    }

    fn military_strength(&self, player: u32) -> Option<MilitaryStrength> {
        self.strengths.get(&player).copied()
    }

    fn opponents(&self) -> Vec<u32> {
        self.strengths.keys().copied().filter(|&p| p != self.player_id).collect()
    }

    fn roads(&self) -> Vec<RoadView> {
        self.roads.clone()
    }

    fn flags(&self) -> Vec<FlagView> {
        self.flags.clone()
    }

    fn is_road_flaggable(&self, coords: HexCoord) -> bool {
        self.flaggable.contains(&coords)
    }

    fn site_coords(&self, site: EntityId) -> Option<HexCoord> {
        self.site_coords.get(&site).copied()
    }

    fn site_economy(&self, site: EntityId) -> Option<EconomyId> {
        self.site_economies.get(&site).copied()
    }

    fn site_can_work(&self, site: EntityId) -> bool {
        self.site_working.get(&site).copied().unwrap_or(true)
    }

    fn soldier_capacity(&self, site: EntityId) -> Option<u32> {
        self.soldier_capacities.get(&site).copied()
    }

    fn own_military_sites(&self) -> Vec<EntityId> {
        self.military_site_ids.clone()
    }

    fn attackable_targets(&self, site: EntityId) -> Vec<AttackTarget> {
        self.attack_targets.get(&site).cloned().unwrap_or_default()
    }

    fn find_attack_soldiers(&self, flag: FlagId) -> u32 {
        self.attack_soldiers.get(&flag).copied().unwrap_or(0)
    }

    fn push_command(&mut self, command: Command) {
        self.commands.push(command);
    }
}
