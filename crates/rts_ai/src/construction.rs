//! Construction Planner (§4.3): for each (buildable tile × candidate
//! building) pair, compute a priority; emit one build command per tick.

use tracing::info;

use rts_core::production::BuildingTypeId;

use crate::field_index::{BuildableField, FieldIndex};
use crate::host::{BuildCap, Command, HostView};
use crate::observers::{BuildingKind, ObserverTables};
use crate::personality::EnginePersonality;

/// Cooldown between construction decisions for the same building type,
/// except tree producers (§4.3).
pub const CONSTRUCTION_DECISION_COOLDOWN_MS: u64 = 25_000;
/// A newly built site is blocked from reconsideration for this long.
pub const BUILD_BLOCK_MS: u64 = 120_000;
/// Space-consumer buildings additionally block a 3-ring radius this long.
pub const SPACE_CONSUMER_BLOCK_MS: u64 = 45 * 60_000;
/// Military sites additionally block a 6-ring radius this long.
pub const MILITARY_BLOCK_RING_MS: u64 = 25_000;
/// Fields whose feature vector is older than this are skipped as stale.
pub const STALE_FIELD_THRESHOLD_MS: u64 = 8_000;
/// Military construction_decision_time is backdated by this much so another
/// military site can start sooner.
pub const MILITARY_DECISION_BACKDATE_MS: u64 = 12_500;
/// Window in which a sighted enemy suppresses `new_buildings_stop`.
pub const ENEMY_SEEN_GRACE_MS: u64 = 120_000;

/// Expansion posture, driven by unstationed + in-construction military count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionMode {
    /// Push aggressively into unowned territory.
    PushExpansion,
    /// Balance new resource buildings against defensive needs.
    ResourcesOrDefense,
    /// Only build what's needed to hold current territory.
    DefenseOnly,
    /// Do not start any new military construction.
    NoNewMilitary,
}

/// Strategic regime recomputed on every construction attempt (§4.3).
#[derive(Debug, Clone, Copy)]
pub struct StrategicRegime {
    /// Whether non-forced production-site construction is suppressed.
    pub new_buildings_stop: bool,
    /// Current expansion posture.
    pub expansion_mode: ExpansionMode,
    /// Mine-count-driven resource necessity, 0..=255.
    pub resource_necessity_mines: u32,
    /// Territory-driven resource necessity, 0..=255.
    pub resource_necessity_territory: u32,
    /// Water-driven resource necessity, 0..=255.
    pub resource_necessity_water: u32,
}

/// A scored (field, building) candidate.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    coords: crate::hex::HexCoord,
    building: BuildingTypeId,
    priority: i64,
}

/// Inputs summarizing current territory, read once per construction attempt.
struct TerritoryCounts {
    free_spots: u32,
    production_sites: u32,
    mines: u32,
    military_sites: u32,
    construction_sites: u32,
    mineable_fields: u32,
    enemy_seen_recently: bool,
    has_fisher: bool,
    tribe_needs_water: bool,
}

fn gather_territory_counts(
    host: &impl HostView,
    index: &FieldIndex,
    observers: &ObserverTables,
    current_tick: u64,
) -> TerritoryCounts {
    let mut free_spots = 0;
    let mut enemy_seen_recently = false;

    for field in index.buildable_fields() {
        if let Some(seen) = field.enemy_nearby {
            if current_tick.saturating_sub(seen) <= ENEMY_SEEN_GRACE_MS {
                enemy_seen_recently = true;
            }
        }
        free_spots += 1;
    }

    let production_sites: u32 = observers
        .buildings
        .values()
        .filter(|b| b.kind == BuildingKind::ProductionSite)
        .map(|b| b.cnt_built)
        .sum();
    let mines: u32 = observers
        .buildings
        .values()
        .filter(|b| b.kind == BuildingKind::Mine)
        .map(|b| b.cnt_built)
        .sum();
    let military_sites: u32 = observers
        .buildings
        .values()
        .filter(|b| b.kind == BuildingKind::MilitarySite)
        .map(|b| b.cnt_built)
        .sum();
    let construction_sites: u32 = observers.buildings.values().map(|b| b.cnt_under_construction).sum();
    let has_fisher = observers.buildings.values().any(|b| {
        b.cnt_built > 0
            && b.kind == BuildingKind::ProductionSite
            && host.building_descriptor(b.building).is_some_and(|desc| desc.is_fisher)
    });

    TerritoryCounts {
        free_spots,
        production_sites,
        mines,
        military_sites,
        construction_sites,
        mineable_fields: index.mineable_len() as u32,
        enemy_seen_recently,
        has_fisher,
        tribe_needs_water: true,
    }
}

/// Recompute the strategic regime (§4.3).
#[must_use]
pub fn compute_strategic_regime(
    host: &impl HostView,
    index: &FieldIndex,
    observers: &ObserverTables,
    current_tick: u64,
) -> StrategicRegime {
    let t = gather_territory_counts(host, index, observers, current_tick);

    let free_spots = t.free_spots;
    let overbuilt_construction = t.construction_sites > t.production_sites / 7 + 2;
    let land_starved = free_spots * 3 / 2 + 5 < t.production_sites;
    let too_few_military = t.production_sites + t.construction_sites > 3 * (t.military_sites + t.construction_sites);
    let too_few_mines = t.mines < 3;

    let new_buildings_stop = (overbuilt_construction || land_starved || too_few_military || too_few_mines)
        && !t.enemy_seen_recently;

    let unstationed_and_building = t.military_sites + t.construction_sites;
    let military_threshold = t.military_sites / 40 + 2;
    let expansion_mode = if unstationed_and_building == 0 {
        ExpansionMode::PushExpansion
    } else if unstationed_and_building < military_threshold {
        ExpansionMode::ResourcesOrDefense
    } else if unstationed_and_building < military_threshold * 2 {
        ExpansionMode::DefenseOnly
    } else {
        ExpansionMode::NoNewMilitary
    };

    let virtual_mine_count = t.mines + t.mineable_fields / 10;
    let resource_necessity_mines = if virtual_mine_count <= 5 {
        255
    } else if virtual_mine_count > 14 {
        0
    } else {
        255 - (virtual_mine_count - 5) * 255 / 9
    };

    let resource_necessity_territory = if t.free_spots == 0 {
        255
    } else {
        (t.production_sites * 255 / free_spots.max(1)).min(255)
    };

    let resource_necessity_water = if t.tribe_needs_water {
        if !t.has_fisher {
            255
        } else {
            150
        }
    } else {
        18
    };

    StrategicRegime {
        new_buildings_stop,
        expansion_mode,
        resource_necessity_mines,
        resource_necessity_territory,
        resource_necessity_water,
    }
}

fn same_output_producer_penalty(field: &BuildableField, building: &crate::host::BuildingDescriptorView) -> i64 {
    building
        .outputs
        .iter()
        .map(|w| *field.producers_nearby.get(w).unwrap_or(&0) as i64)
        .sum::<i64>()
        * 20
}

/// Score a single (field, building) candidate per the §4.3 per-kind rules.
///
/// Returns `None` if the candidate fails a hard requirement (not just a low
/// score) for its building kind.
fn score_candidate(
    host: &impl HostView,
    field: &BuildableField,
    desc: &crate::host::BuildingDescriptorView,
    observer: &crate::observers::BuildingObserver,
    regime: &StrategicRegime,
    territory: &TerritoryCounts,
) -> Option<i64> {
    let mut priority: i64 = 0;

    if desc.mines_water {
        if field.ground_water < 2 {
            return None;
        }
        priority = if observer.is_first_of_kind() { 200 } else { 0 };
        if observer.stocklevel >= 40 {
            priority -= 1000;
        }
    } else if desc.need_trees && desc.plants_trees {
        // Rangers: plant where sparse, near consumers of wood.
        let target = territory.production_sites / 15 + territory.mines / 15 + 2;
        priority = (10i64 - field.trees_nearby as i64).max(0) * 5
            + same_output_producer_penalty(field, desc).max(0) / 4;
        if observer.stocklevel >= 40 {
            return None;
        }
        if observer.cnt_built as i64 > target as i64 * 2 {
            return None;
        }
    } else if desc.need_trees {
        let target = territory.production_sites / 15 + territory.mines / 15 + 3;
        priority = match observer.cnt_built {
            0 => 500 + field.trees_nearby as i64,
            1 => 400 + field.trees_nearby as i64,
            _ => {
                if field.trees_nearby < 2 {
                    return None;
                }
                field.trees_nearby as i64 * 10
            }
        };
        if observer.cnt_built as i64 >= target as i64 {
            priority -= 300;
        }
        priority -= same_output_producer_penalty(field, desc);
        if regime.new_buildings_stop {
            priority -= 200;
        }
    } else if desc.need_stones {
        if field.stones_nearby == 0 {
            return None;
        }
        priority = field.stones_nearby as i64;
        if observer.is_first_of_kind() {
            priority += 150;
        }
        if observer.stocklevel == 0 {
            priority *= 2;
        }
        priority -= same_output_producer_penalty(field, desc);
        if field.near_border {
            priority /= 2;
        }
    } else if desc.is_hunter {
        if field.critters_nearby < 5 {
            return None;
        }
        priority = field.critters_nearby as i64 * 10 - same_output_producer_penalty(field, desc);
    } else if desc.is_fisher {
        if field.water_nearby < 2 {
            return None;
        }
        if field.producers_nearby.values().sum::<u32>() > 0 {
            // one fisher max per same-output producer nearby
            return None;
        }
        if observer.stocklevel >= 50 {
            return None;
        }
        priority = field.water_nearby as i64 * 10;
    } else if desc.fighting_type {
        if field.unowned_land_nearby == 0 {
            return None;
        }
        if matches!(regime.expansion_mode, ExpansionMode::NoNewMilitary) {
            return None;
        }
        if field.military_in_construction_nearby > 0 && field.enemy_nearby.is_none() {
            return None;
        }
        priority = (field.unowned_land_nearby as i64 * regime.resource_necessity_territory as i64) / 255
            + (field.unowned_mines_potential_nearby as i64 * regime.resource_necessity_mines as i64) / 255
            + field.stones_nearby as i64 / 2
            + field.military_loneliness as i64 / 10
            + (field.water_nearby as i64 * regime.resource_necessity_water as i64) / 255
            - 60;
        if matches!(regime.expansion_mode, ExpansionMode::PushExpansion) {
            priority += 200;
        }
        if field.enemy_nearby.is_some() && field.military_capacity < 10 {
            priority += 300;
        }
    } else if desc.recruitment {
        let target = (territory.production_sites + territory.mines) / 30;
        if observer.cnt_built >= target.max(1) {
            return None;
        }
        priority = 50;
    } else {
        // Generic production site.
        let forced = observer.is_first_of_kind();
        priority = if forced { 600 } else { 0 };
        priority -= same_output_producer_penalty(field, desc);
        if desc.space_consumer {
            priority += field.space_consumers_nearby as i64 * 5;
        }
        if priority <= 0 && !forced {
            return None;
        }
    }

    if field.preferred {
        priority += 1;
    }
    // §4.3: `-5 × (maxsize - bldsize)`, comparing the tile's own build
    // capability against the candidate's size, so a building that already
    // uses the tile's full capacity pays no waste penalty.
    let tile_cap_rank = build_cap_size_rank(host.build_cap(field.coords));
    let building_size_rank = build_cap_size_rank(desc.size);
    let max_size_penalty = 5 * (tile_cap_rank - building_size_rank).max(0);
    priority -= max_size_penalty;

    Some(priority)
}

/// Rank a [`BuildCap`] on the small/medium/big size ladder only; `None`/`Flag`
/// (nothing fits) and `Mine` (a categorically separate class never reached
/// for a buildable-field candidate) both rank as the smallest size.
fn build_cap_size_rank(cap: BuildCap) -> i64 {
    match cap {
        BuildCap::Small => 1,
        BuildCap::Medium => 2,
        BuildCap::Big => 3,
        BuildCap::None | BuildCap::Flag | BuildCap::Mine => 0,
    }
}

fn gate_candidate(
    host: &impl HostView,
    field: &BuildableField,
    building: BuildingTypeId,
    desc: &crate::host::BuildingDescriptorView,
    observer: &crate::observers::BuildingObserver,
    index: &FieldIndex,
    current_tick: u64,
) -> bool {
    if !host.building_type_allowed(building) {
        return false;
    }
    if desc.prohibited_till > current_tick {
        return false;
    }
    if !host.build_cap(field.coords).fits(desc.size) {
        return false;
    }
    if desc.is_mine {
        return false;
    }
    let is_tree_producer = desc.need_trees;
    if !is_tree_producer
        && current_tick.saturating_sub(observer.construction_decision_time) < CONSTRUCTION_DECISION_COOLDOWN_MS
    {
        return false;
    }
    if observer.unoccupied > 0 {
        return false;
    }
    if !desc.fighting_type && observer.cnt_under_construction > 1 {
        return false;
    }
    if field.next_update_due < current_tick.saturating_sub(STALE_FIELD_THRESHOLD_MS) {
        return false;
    }
    if index.is_blocked(field.coords, current_tick) {
        return false;
    }
    true
}

/// Run one construction attempt: scan all (buildable field × candidate
/// building) pairs, pick the single maximum-priority candidate with
/// priority > 0, and emit its build command (§4.3).
///
/// Returns `true` if a command was emitted.
pub fn run_construction_attempt(
    host: &mut impl HostView,
    index: &mut FieldIndex,
    observers: &mut ObserverTables,
    current_tick: u64,
) -> bool {
    let regime = compute_strategic_regime(&*host, index, observers, current_tick);
    let territory = gather_territory_counts(&*host, index, observers, current_tick);

    let mut best: Option<Candidate> = None;

    let building_ids: Vec<BuildingTypeId> = observers.buildings.keys().copied().collect();
    for field in index.buildable_fields() {
        for &building in &building_ids {
            let Some(desc) = host.building_descriptor(building).cloned() else {
                continue;
            };
            let Some(observer) = observers.buildings.get(&building) else {
                continue;
            };
            if !gate_candidate(&*host, field, building, &desc, observer, index, current_tick) {
                continue;
            }
            let Some(priority) = score_candidate(&*host, field, &desc, observer, &regime, &territory) else {
                continue;
            };
            if priority <= 0 {
                continue;
            }
            let is_better = match best {
                Some(b) => priority > b.priority,
                None => true,
            };
            if is_better {
                best = Some(Candidate {
                    coords: field.coords,
                    building,
                    priority,
                });
            }
        }
    }

    let Some(candidate) = best else {
        return false;
    };

    info!(
        tile = ?candidate.coords,
        building = ?candidate.building,
        priority = candidate.priority,
        "construction planner emitting build command"
    );
    host.push_command(Command::Build {
        coords: candidate.coords,
        building: candidate.building,
    });

    index.block_ring(candidate.coords, 0, current_tick + BUILD_BLOCK_MS);
    let desc = host.building_descriptor(candidate.building).cloned();
    let is_fighting = desc.as_ref().is_some_and(|d| d.fighting_type);
    let is_space_consumer = desc.as_ref().is_some_and(|d| d.space_consumer && !d.plants_trees);
    if is_space_consumer {
        index.block_ring(candidate.coords, 3, current_tick + SPACE_CONSUMER_BLOCK_MS);
    }
    if is_fighting {
        index.block_ring(candidate.coords, 6, current_tick + MILITARY_BLOCK_RING_MS);
    }

    if let Some(observer) = observers.buildings.get_mut(&candidate.building) {
        observer.construction_decision_time = if is_fighting {
            current_tick.saturating_sub(MILITARY_DECISION_BACKDATE_MS)
        } else {
            current_tick
        };
    }

    true
}

/// Unused placeholder kept for [`EnginePersonality`]-driven scoring variants
/// expected by future personality tuning; currently the default constants in
/// [`score_candidate`] match [`EnginePersonality::default`] exactly.
pub fn personality_matches_defaults(p: &EnginePersonality) -> bool {
    *p == EnginePersonality::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BuildingDescriptorView, FixtureHost};
    use crate::hex::HexCoord;
    use crate::observers::BuildingObserver;

    fn setup_host_and_index(coords: HexCoord) -> (FixtureHost, FieldIndex) {
        let mut host = FixtureHost::new(1);
        host.owners.insert(coords, 1);
        host.caps.insert(coords, BuildCap::Small);
        let mut index = FieldIndex::new();
        index.on_field_gained(coords);
        index.sweep_unusable(&host, 0);
        index.sweep_buildable(&host, 0);
        (host, index)
    }

    #[test]
    fn first_lumberjack_is_forced() {
        let coords = HexCoord::new(0, 0);
        let (mut host, mut index) = setup_host_and_index(coords);
        if let Some(field) = index.buildable_at_mut(coords) {
            field.trees_nearby = 4;
        }

        let bt = BuildingTypeId(1);
        let desc = BuildingDescriptorView {
            name: "lumberjack".into(),
            size: BuildCap::Small,
            need_trees: true,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc.clone());
        let mut observers = ObserverTables::new();
        observers.buildings.insert(bt, BuildingObserver::new(bt, "lumberjack".into(), &desc));

        let emitted = run_construction_attempt(&mut host, &mut index, &mut observers, 0);
        assert!(emitted);
        assert_eq!(
            host.commands[0],
            Command::Build {
                coords,
                building: bt
            }
        );
    }

    #[test]
    fn stop_on_overbuild_boundary() {
        let host = FixtureHost::new(1);
        let index = FieldIndex::new();
        let mut observers = ObserverTables::new();
        // productionsites = 30, construction_sites = 6: 6 > 30/7+2=6 is false.
        for i in 0..30u32 {
            let bt = BuildingTypeId(100 + i);
            let mut obs = BuildingObserver::new(
                bt,
                "ps".into(),
                &BuildingDescriptorView {
                    outputs: vec![crate::host::WareId(0)],
                    ..Default::default()
                },
            );
            obs.cnt_built = 1;
            observers.buildings.insert(bt, obs);
        }
        for i in 0..6u32 {
            let bt = BuildingTypeId(200 + i);
            let mut obs = BuildingObserver::new(bt, "cs".into(), &BuildingDescriptorView::default());
            obs.cnt_under_construction = 1;
            observers.buildings.insert(bt, obs);
        }
        let regime = compute_strategic_regime(&host, &index, &observers, 0);
        assert!(!regime.new_buildings_stop);

        let bt = BuildingTypeId(300);
        let mut obs = BuildingObserver::new(bt, "cs2".into(), &BuildingDescriptorView::default());
        obs.cnt_under_construction = 1;
        observers.buildings.insert(bt, obs);
        let regime2 = compute_strategic_regime(&host, &index, &observers, 0);
        assert!(regime2.new_buildings_stop);
    }

    #[test]
    fn well_requires_ground_water_at_least_two() {
        let coords = HexCoord::new(1, 1);
        let (host, index) = setup_host_and_index(coords);
        let field = index.buildable_at(coords).unwrap();
        let desc = BuildingDescriptorView {
            mines_water: true,
            ..Default::default()
        };
        let bt = BuildingTypeId(9);
        let observer = BuildingObserver::new(bt, "well".into(), &desc);
        let regime = compute_strategic_regime(&host, &index, &ObserverTables::new(), 0);
        let territory = gather_territory_counts(&host, &index, &ObserverTables::new(), 0);

        let mut one_water = field.clone();
        one_water.ground_water = 1;
        assert!(score_candidate(&host, &one_water, &desc, &observer, &regime, &territory).is_none());

        let mut two_water = field.clone();
        two_water.ground_water = 2;
        assert!(score_candidate(&host, &two_water, &desc, &observer, &regime, &territory).is_some());
    }

    #[test]
    fn resource_necessity_water_is_not_locked_to_moderate_by_a_non_fisher_producer() {
        let coords = HexCoord::new(2, 2);
        let (mut host, index) = setup_host_and_index(coords);

        let lumberjack_bt = BuildingTypeId(42);
        let lumberjack_desc = BuildingDescriptorView {
            name: "lumberjack".into(),
            need_trees: true,
            is_fisher: false,
            ..Default::default()
        };
        host.descriptors.insert(lumberjack_bt, lumberjack_desc.clone());
        let mut observers = ObserverTables::new();
        let mut obs = BuildingObserver::new(lumberjack_bt, "lumberjack".into(), &lumberjack_desc);
        obs.cnt_built = 1;
        observers.buildings.insert(lumberjack_bt, obs);

        let regime = compute_strategic_regime(&host, &index, &observers, 0);
        assert_ne!(
            regime.resource_necessity_water, 150,
            "a built non-fisher production site must not be mistaken for a fisher"
        );
        assert_eq!(regime.resource_necessity_water, 255);
    }

    #[test]
    fn resource_necessity_water_drops_once_a_fisher_is_built() {
        let coords = HexCoord::new(3, 3);
        let (mut host, index) = setup_host_and_index(coords);

        let fisher_bt = BuildingTypeId(43);
        let fisher_desc = BuildingDescriptorView {
            name: "fisher".into(),
            is_fisher: true,
            ..Default::default()
        };
        host.descriptors.insert(fisher_bt, fisher_desc.clone());
        let mut observers = ObserverTables::new();
        let mut obs = BuildingObserver::new(fisher_bt, "fisher".into(), &fisher_desc);
        obs.cnt_built = 1;
        observers.buildings.insert(fisher_bt, obs);

        let regime = compute_strategic_regime(&host, &index, &observers, 0);
        assert_eq!(regime.resource_necessity_water, 150);
    }
}
