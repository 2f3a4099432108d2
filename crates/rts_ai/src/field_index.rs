//! Spatial indices over owned territory (§3, §4.2).
//!
//! Every owned tile lives in exactly one of three queues — unusable,
//! buildable, mineable — and is incrementally refreshed as ownership and
//! build-capability change.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::host::{BuildCap, FieldFilter, HostView, ImmovableKind, WareId};
use crate::hex::{HexCoord, HexDirection};

/// Radii used by [`update_buildable_field`] sub-scans (§4.2).
pub const WATER_SCAN_RADIUS: u32 = 5;
/// Fish are scanned at a slightly wider radius than open water.
pub const FISH_SCAN_RADIUS: u32 = 6;
/// Critters are scanned at the same radius as fish.
pub const CRITTER_SCAN_RADIUS: u32 = 6;
/// Water/fish/critter counts are slow-changing; re-scan every Nth update.
pub const SLOW_FEATURE_RESCAN_PERIOD: u64 = 10;
/// Minimum radius used for a military-triggered re-scan.
pub const MILITARY_RESCAN_MIN_RADIUS: u32 = 10;
/// Scan radius [`update_buildable_field`] uses for the periodic general sweep.
pub const GENERAL_SCAN_RADIUS: u32 = 10;
/// Tiles within this many steps of unowned land count as "near border".
pub const NEAR_BORDER_RADIUS: u32 = 4;

/// Per-tile feature vector for a buildable field (build-cap ≥ SMALL).
#[derive(Debug, Clone)]
pub struct BuildableField {
    /// Tile location.
    pub coords: HexCoord,
    /// Trees found in the general scan radius.
    pub trees_nearby: u32,
    /// Stone deposits. Only re-counted while `> 0`: stones don't regenerate.
    pub stones_nearby: u32,
    /// Water tiles within [`WATER_SCAN_RADIUS`].
    pub water_nearby: u32,
    /// Whether water exists but only beyond the immediate scan radius.
    pub distant_water: bool,
    /// Fish count within [`FISH_SCAN_RADIUS`]. `None` until first computed —
    /// deliberately not a sentinel `-1` compared with `==`, to avoid the
    /// assignment-vs-equality defect called out in SPEC_FULL.md §9.
    pub fish_nearby: Option<u32>,
    /// Huntable critters within [`CRITTER_SCAN_RADIUS`].
    pub critters_nearby: u32,
    /// Unowned tiles within the general scan radius.
    pub unowned_land_nearby: u32,
    /// Unowned tiles that could plausibly host a mine.
    pub unowned_mines_potential_nearby: u32,
    /// Whether unowned land exists within [`NEAR_BORDER_RADIUS`].
    pub near_border: bool,
    /// Ground water level. Monotonically non-increasing as wells consume it.
    pub ground_water: u32,
    /// Producers of each ware found nearby.
    pub producers_nearby: HashMap<WareId, u32>,
    /// Consumers of each ware found nearby.
    pub consumers_nearby: HashMap<WareId, u32>,
    /// Space-consuming buildings (farms, vineyards) found nearby.
    pub space_consumers_nearby: u32,
    /// Sum of max_soldiers across nearby friendly military sites.
    pub military_capacity: u32,
    /// Sum of soldiers actually present at nearby friendly military sites.
    pub military_presence: u32,
    /// Count of nearby friendly military sites with any soldiers stationed.
    pub military_stationed: u32,
    /// Nearby friendly military sites still under construction.
    pub military_in_construction_nearby: u32,
    /// 1000 = no friendly military nearby at all; lower = more crowded.
    pub military_loneliness: u32,
    /// Game-time the nearest enemy immovable was last observed, if any.
    pub enemy_nearby: Option<u64>,
    /// Whether the SE neighbor already hosts a flag or flaggable road.
    pub preferred: bool,
    /// Next game-time this field is due for a feature re-scan.
    pub next_update_due: u64,
}

impl BuildableField {
    pub(crate) fn new(coords: HexCoord) -> Self {
        Self {
            coords,
            trees_nearby: 0,
            stones_nearby: 0,
            water_nearby: 0,
            distant_water: false,
            fish_nearby: None,
            critters_nearby: 0,
            unowned_land_nearby: 0,
            unowned_mines_potential_nearby: 0,
            near_border: false,
            ground_water: 0,
            producers_nearby: HashMap::new(),
            consumers_nearby: HashMap::new(),
            space_consumers_nearby: 0,
            military_capacity: 0,
            military_presence: 0,
            military_stationed: 0,
            military_in_construction_nearby: 0,
            military_loneliness: 1000,
            enemy_nearby: None,
            preferred: false,
            next_update_due: 0,
        }
    }
}

/// Per-tile state for a mineable field (build-cap MINE).
#[derive(Debug, Clone)]
pub struct MineableField {
    /// Tile location.
    pub coords: HexCoord,
    /// Number of same-resource mines already nearby.
    pub mines_nearby: u32,
    /// Whether the SE neighbor already hosts a flag or flaggable road.
    pub preferred: bool,
    /// Next game-time this field is due for re-scan.
    pub next_update_due: u64,
}

/// An owned tile not (yet) classifiable as buildable or mineable.
#[derive(Debug, Clone, Copy)]
pub struct UnusableField {
    /// Tile location.
    pub coords: HexCoord,
}

/// A temporary reservation preventing a tile from being reconsidered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedField {
    /// Blocked tile.
    pub tile: HexCoord,
    /// Game-time at which the block expires.
    pub blocked_until_tick: u64,
}

/// The three spatial indices over owned territory, plus the blocked list.
#[derive(Debug, Default)]
pub struct FieldIndex {
    buildable: VecDeque<BuildableField>,
    mineable: VecDeque<MineableField>,
    unusable: VecDeque<UnusableField>,
    blocked: Vec<BlockedField>,
}

/// Max buildable fields processed per [`FieldIndex::sweep_buildable`] call.
pub const BUILDABLE_SWEEP_BATCH: usize = 25;
/// Max mineable fields processed per [`FieldIndex::sweep_mineable`] call.
pub const MINEABLE_SWEEP_BATCH: usize = 40;
/// Max unusable fields processed per [`FieldIndex::sweep_unusable`] call.
pub const UNUSABLE_SWEEP_BATCH: usize = 50;

impl FieldIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buildable fields currently tracked.
    #[must_use]
    pub fn buildable_len(&self) -> usize {
        self.buildable.len()
    }

    /// Number of mineable fields currently tracked.
    #[must_use]
    pub fn mineable_len(&self) -> usize {
        self.mineable.len()
    }

    /// Number of unusable fields currently tracked.
    #[must_use]
    pub fn unusable_len(&self) -> usize {
        self.unusable.len()
    }

    /// Iterate buildable fields.
    pub fn buildable_fields(&self) -> impl Iterator<Item = &BuildableField> {
        self.buildable.iter()
    }

    /// Iterate mineable fields.
    pub fn mineable_fields(&self) -> impl Iterator<Item = &MineableField> {
        self.mineable.iter()
    }

    /// Find a buildable field by coordinate.
    #[must_use]
    pub fn buildable_at(&self, coords: HexCoord) -> Option<&BuildableField> {
        self.buildable.iter().find(|f| f.coords == coords)
    }

    /// Mutable lookup of a buildable field by coordinate.
    pub fn buildable_at_mut(&mut self, coords: HexCoord) -> Option<&mut BuildableField> {
        self.buildable.iter_mut().find(|f| f.coords == coords)
    }

    /// Whether any tile is currently tracked as unusable.
    #[must_use]
    pub fn has_unusable(&self) -> bool {
        !self.unusable.is_empty()
    }

    /// A tile has just become owned: append to the unusable list (§4.8).
    pub fn on_field_gained(&mut self, coords: HexCoord) {
        self.unusable.push_back(UnusableField { coords });
    }

    /// A tile has just stopped being owned: remove it from whichever list
    /// holds it.
    pub fn on_field_lost(&mut self, coords: HexCoord) {
        self.buildable.retain(|f| f.coords != coords);
        self.mineable.retain(|f| f.coords != coords);
        self.unusable.retain(|f| f.coords != coords);
    }

    /// Reserve `coords` (and every tile within `ring` hex-steps) until
    /// `blocked_until_tick`.
    pub fn block_ring(&mut self, center: HexCoord, ring: i32, blocked_until_tick: u64) {
        for tile in center.ring_area(ring) {
            self.blocked.push(BlockedField {
                tile,
                blocked_until_tick,
            });
        }
    }

    /// Drop every blocked entry whose expiry has passed `current_tick`
    /// (invariant 3, §8: a stale blocked entry is removed before any scan
    /// uses it).
    pub fn expire_blocked(&mut self, current_tick: u64) {
        self.blocked.retain(|b| b.blocked_until_tick > current_tick);
    }

    /// Whether `coords` is currently blocked as of `current_tick`.
    #[must_use]
    pub fn is_blocked(&self, coords: HexCoord, current_tick: u64) -> bool {
        self.blocked
            .iter()
            .any(|b| b.tile == coords && b.blocked_until_tick > current_tick)
    }

    /// Process up to [`UNUSABLE_SWEEP_BATCH`] due unusable tiles: verify
    /// ownership, promote to buildable/mineable if build-cap appeared,
    /// otherwise rotate to the back (§4.2).
    pub fn sweep_unusable(&mut self, host: &impl HostView, current_tick: u64) {
        let batch = self.unusable.len().min(UNUSABLE_SWEEP_BATCH);
        for _ in 0..batch {
            let Some(field) = self.unusable.pop_front() else {
                break;
            };
            if host.tile_owner(field.coords) != Some(host.player_id()) {
                continue; // dropped: ownership lost
            }
            match host.build_cap(field.coords) {
                BuildCap::None => self.unusable.push_back(field),
                BuildCap::Mine => self.mineable.push_back(MineableField {
                    coords: field.coords,
                    mines_nearby: 0,
                    preferred: false,
                    next_update_due: current_tick,
                }),
                _ => self.buildable.push_back(BuildableField::new(field.coords)),
            }
        }
    }

    /// Process up to [`BUILDABLE_SWEEP_BATCH`] due buildable fields.
    pub fn sweep_buildable(&mut self, host: &impl HostView, current_tick: u64) {
        let mut due = Vec::new();
        let mut remaining = VecDeque::new();
        while let Some(field) = self.buildable.pop_front() {
            if due.len() < BUILDABLE_SWEEP_BATCH && field.next_update_due <= current_tick {
                due.push(field);
            } else {
                remaining.push_back(field);
            }
        }
        self.buildable = remaining;

        for mut field in due {
            if host.tile_owner(field.coords) != Some(host.player_id()) {
                continue;
            }
            let cap = host.build_cap(field.coords);
            if cap == BuildCap::None {
                self.unusable.push_back(UnusableField { coords: field.coords });
                continue;
            }
            if cap == BuildCap::Mine {
                self.mineable.push_back(MineableField {
                    coords: field.coords,
                    mines_nearby: 0,
                    preferred: false,
                    next_update_due: current_tick,
                });
                continue;
            }
            update_buildable_field(host, &mut field, current_tick, GENERAL_SCAN_RADIUS, false);
            field.next_update_due = current_tick + 6_000;
            self.buildable.push_back(field);
        }
    }

    /// Process up to [`MINEABLE_SWEEP_BATCH`] due mineable fields.
    pub fn sweep_mineable(&mut self, host: &impl HostView, current_tick: u64) {
        let mut due = Vec::new();
        let mut remaining = VecDeque::new();
        while let Some(field) = self.mineable.pop_front() {
            if due.len() < MINEABLE_SWEEP_BATCH && field.next_update_due <= current_tick {
                due.push(field);
            } else {
                remaining.push_back(field);
            }
        }
        self.mineable = remaining;

        for mut field in due {
            if host.tile_owner(field.coords) != Some(host.player_id()) {
                continue;
            }
            if host.build_cap(field.coords) != BuildCap::Mine {
                self.unusable.push_back(UnusableField { coords: field.coords });
                continue;
            }
            update_mineable_field(host, &mut field);
            field.next_update_due = current_tick + 6_000;
            self.mineable.push_back(field);
        }
    }
}

/// Recompute a buildable field's feature vector (§4.2).
///
/// `range` is the caller-supplied scan radius for the general update;
/// `military_only` marks this as a military-triggered re-scan, which widens
/// the effective radius to at least [`MILITARY_RESCAN_MIN_RADIUS`] but
/// otherwise recomputes the same full vector (§4.2's distinction between
/// the two callers is the radius, not which fields get refreshed).
pub fn update_buildable_field(
    host: &impl HostView,
    field: &mut BuildableField,
    current_tick: u64,
    range: u32,
    military_only: bool,
) {
    let range = if military_only {
        range.max(MILITARY_RESCAN_MIN_RADIUS)
    } else {
        range
    };

    // Military metrics reset at the start of every general update (§4.2).
    field.military_capacity = 0;
    field.military_presence = 0;
    field.military_stationed = 0;
    field.military_in_construction_nearby = 0;
    field.military_loneliness = 1000;

    field.producers_nearby.clear();
    field.consumers_nearby.clear();
    field.space_consumers_nearby = 0;
    field.enemy_nearby = None;

    let stale_stones = field.stones_nearby == 0;
    field.trees_nearby = 0;
    if !stale_stones {
        field.stones_nearby = 0;
    }

    for (coords, immovable) in host.find_immovables(field.coords, range) {
        match immovable {
            ImmovableKind::Enemy { .. } => {
                field.enemy_nearby = Some(current_tick);
            }
            ImmovableKind::ConstructionSite { building, .. } => {
                if let Some(desc) = host.building_descriptor(building) {
                    if desc.fighting_type {
                        field.military_in_construction_nearby += 1;
                    }
                    for ware in &desc.outputs {
                        *field.producers_nearby.entry(*ware).or_insert(0) += 1;
                    }
                    for ware in &desc.inputs {
                        *field.consumers_nearby.entry(*ware).or_insert(0) += 1;
                    }
                    if desc.space_consumer {
                        field.space_consumers_nearby += 1;
                    }
                }
            }
            ImmovableKind::Building { building, site } => {
                if let Some(desc) = host.building_descriptor(building) {
                    if desc.fighting_type {
                        let distance = field.coords.distance(coords).max(1);
                        let radius = desc.vision_range.max(1);
                        field.military_capacity += desc.max_soldiers;
                        if let Some(stats) = host.site_statistics_percent(site) {
                            if stats > 0 {
                                field.military_presence += 1;
                                field.military_stationed += 1;
                            }
                        }
                        let factor = distance.min(radius) as f64 / radius as f64;
                        field.military_loneliness =
                            ((field.military_loneliness as f64) * factor).round() as u32;
                    } else {
                        for ware in &desc.outputs {
                            *field.producers_nearby.entry(*ware).or_insert(0) += 1;
                        }
                        for ware in &desc.inputs {
                            *field.consumers_nearby.entry(*ware).or_insert(0) += 1;
                        }
                        if desc.space_consumer {
                            field.space_consumers_nearby += 1;
                        }
                    }
                }
            }
            ImmovableKind::Tree => field.trees_nearby += 1,
            ImmovableKind::Stone if !stale_stones => field.stones_nearby += 1,
            _ => {}
        }
    }

    field.unowned_land_nearby = host
        .find_fields(field.coords, range, FieldFilter::Unowned)
        .len() as u32;
    field.unowned_mines_potential_nearby = field.unowned_land_nearby / 4;
    field.near_border = !host
        .find_fields(field.coords, NEAR_BORDER_RADIUS, FieldFilter::Unowned)
        .is_empty();

    if current_tick % (SLOW_FEATURE_RESCAN_PERIOD * 1000) == 0 || field.fish_nearby.is_none() {
        let water = host.find_fields(field.coords, WATER_SCAN_RADIUS, FieldFilter::Owned);
        field.water_nearby = water.len() as u32;
        field.distant_water = field.water_nearby == 0
            && !host
                .find_fields(field.coords, WATER_SCAN_RADIUS * 2, FieldFilter::Owned)
                .is_empty();
        let fish_count = host
            .find_bobs(field.coords, FISH_SCAN_RADIUS, crate::host::BobFilter::Fish)
            .len() as u32;
        field.fish_nearby = Some(fish_count);
        field.critters_nearby = host
            .find_bobs(field.coords, CRITTER_SCAN_RADIUS, crate::host::BobFilter::Critter)
            .len() as u32;
    }

    field.preferred = host
        .find_immovables(field.coords.neighbor(HexDirection::SouthEast), 0)
        .iter()
        .any(|(_, kind)| matches!(kind, ImmovableKind::Flag(_) | ImmovableKind::Road(_)));

    debug!(
        tile = ?field.coords,
        trees = field.trees_nearby,
        stones = field.stones_nearby,
        military_loneliness = field.military_loneliness,
        "buildable field updated"
    );
}

/// Recompute a mineable field's nearby-mine count (§4.2).
pub fn update_mineable_field(host: &impl HostView, field: &mut MineableField) {
    field.mines_nearby = host
        .find_immovables(field.coords, 6)
        .iter()
        .filter(|(_, kind)| matches!(kind, ImmovableKind::Building { .. }))
        .count() as u32;
    field.preferred = host
        .find_immovables(field.coords.neighbor(HexDirection::SouthEast), 0)
        .iter()
        .any(|(_, kind)| matches!(kind, ImmovableKind::Flag(_) | ImmovableKind::Road(_)));
}
