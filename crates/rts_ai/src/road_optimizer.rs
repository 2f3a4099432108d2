//! Road Optimizer (§4.6): split overlong roads, remove redundant roads, and
//! connect isolated flags via shortest buildable paths to economies with
//! warehouses.

use std::collections::{BinaryHeap, HashMap};

use tracing::info;

use crate::field_index::FieldIndex;
use crate::hex::HexCoord;
use crate::host::{Command, EconomyId, FlagId, FlagView, HostView, RoadView};
use crate::observers::ObserverTables;

/// A road longer than this many path steps is a candidate for splitting.
pub const SPLIT_STEP_THRESHOLD: usize = 3;
/// Splitting only happens while at least this many buildable spots are free.
pub const MIN_FREE_SPOTS_FOR_SPLIT: u32 = 20;
/// Wide shortcut search radius, tried whenever a flag has ≤1 road or every
/// [`WIDE_SHORTCUT_PERIOD`]th rotation.
pub const WIDE_SHORTCUT_RADIUS: u32 = 13;
/// Minimum road-length reduction required to build a wide shortcut.
pub const WIDE_SHORTCUT_MIN_REDUCTION: u32 = 20;
/// Rotation period for the wide shortcut attempt on well-connected flags.
pub const WIDE_SHORTCUT_PERIOD: u64 = 200;
/// Narrower, congestion-relief shortcut search radius.
pub const BUSY_SHORTCUT_RADIUS: u32 = 9;
/// A flag holding more than this many wares is considered congested.
pub const BUSY_FLAG_WARE_THRESHOLD: u32 = 6;
/// Rotation period for the congestion-relief shortcut attempt.
pub const BUSY_SHORTCUT_PERIOD: u64 = 10;
/// Virtual distance assumed between two flags in the same economy before a
/// real road distance is known.
pub const VIRTUAL_DISTANCE_SAME_ECONOMY: u32 = 50;
/// Virtual distance assumed across economies before a real road distance is known.
pub const VIRTUAL_DISTANCE_CROSS_ECONOMY: u32 = 100;
/// How long a stranded building's tile stays blocked after giving up on it.
pub const STRANDED_BLOCK_MS: u64 = 15 * 60_000;

/// Rotation state for the road optimizer's periodic flag/economy review.
#[derive(Debug, Default)]
pub struct RoadOptimizer {
    call_count: u64,
    flag_cursor: usize,
}

impl RoadOptimizer {
    /// Create a fresh optimizer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one road-improvement pass. Returns `true` if a command was emitted.
    pub fn run_once(
        &mut self,
        host: &mut impl HostView,
        index: &mut FieldIndex,
        observers: &mut ObserverTables,
        current_tick: u64,
    ) -> bool {
        self.call_count += 1;

        if self.try_split_or_remove_overlong_road(host, index, current_tick) {
            return true;
        }

        self.review_leading_flag(host, index, observers, current_tick)
    }

    fn try_split_or_remove_overlong_road(
        &self,
        host: &mut impl HostView,
        index: &FieldIndex,
        current_tick: u64,
    ) -> bool {
        if index.buildable_len() < MIN_FREE_SPOTS_FOR_SPLIT as usize {
            return false;
        }
        let mut roads = host.roads();
        roads.sort_by_key(|r| (r.from.0, r.to.0, r.id.0));

        for road in &roads {
            if road.path.len() <= SPLIT_STEP_THRESHOLD + 1 {
                continue;
            }
            if let Some(split_tile) = find_flaggable_from_both_ends(host, road) {
                info!(road_id = ?road.id, tile = ?split_tile, "road optimizer splitting overlong road");
                host.push_command(Command::BuildFlag(split_tile));
            } else {
                info!(road_id = ?road.id, "road optimizer bulldozing overlong road with no split point");
                host.push_command(Command::Bulldoze(road.id.0));
            }
            let _ = current_tick;
            return true;
        }
        false
    }

    fn review_leading_flag(
        &mut self,
        host: &mut impl HostView,
        index: &mut FieldIndex,
        observers: &mut ObserverTables,
        current_tick: u64,
    ) -> bool {
        let mut flags = host.flags();
        if flags.is_empty() {
            return false;
        }
        flags.sort_by_key(|f| f.id.0);
        self.flag_cursor %= flags.len();
        let flag = flags[self.flag_cursor];
        self.flag_cursor = (self.flag_cursor + 1) % flags.len();

        let roads = host.roads();
        let degree = roads
            .iter()
            .filter(|r| r.from == flag.id || r.to == flag.id)
            .count();

        if degree == 0 && flag.wares == 0 {
            info!(flag_id = ?flag.id, "road optimizer bulldozing dead-end flag");
            host.push_command(Command::Bulldoze(flag.id.0));
            return true;
        }

        if degree <= 1 || self.call_count % WIDE_SHORTCUT_PERIOD == 0 {
            if self.create_shortcut_road(
                host,
                index,
                observers,
                flag,
                WIDE_SHORTCUT_RADIUS,
                WIDE_SHORTCUT_MIN_REDUCTION,
                current_tick,
            ) {
                return true;
            }
        }

        if flag.wares > BUSY_FLAG_WARE_THRESHOLD && self.call_count % BUSY_SHORTCUT_PERIOD == 0 {
            if self.create_shortcut_road(host, index, observers, flag, BUSY_SHORTCUT_RADIUS, 0, current_tick) {
                return true;
            }
        }

        false
    }

    /// Attempt to connect `flag` to a nearer point in the road network
    /// (§4.6). Escalates to bulldoze-and-block for economies whose connection
    /// keeps failing, proportional to economy size.
    fn create_shortcut_road(
        &self,
        host: &mut impl HostView,
        index: &mut FieldIndex,
        observers: &mut ObserverTables,
        flag: FlagView,
        radius: u32,
        min_reduction: u32,
        current_tick: u64,
    ) -> bool {
        if !host.economy_has_warehouse(flag.economy) {
            let flags_in_economy = host.flags().iter().filter(|f| f.economy == flag.economy).count() as u32;
            let observer = observers.economies.entry(flag.economy).or_default();
            observer.failed_connection_tries += 1;
            if observer.failed_connection_tries > 3 + flags_in_economy * flags_in_economy {
                info!(flag_id = ?flag.id, economy = ?flag.economy, "road optimizer giving up on stranded economy");
                host.push_command(Command::Bulldoze(flag.id.0));
                index.block_ring(flag.coords, 0, current_tick + STRANDED_BLOCK_MS);
                return true;
            }
        }

        let all_flags = host.flags();
        let roads = host.roads();
        let road_distances = dijkstra_flag_distances(&roads, flag.id);

        let mut candidates: Vec<(FlagView, u32)> = all_flags
            .into_iter()
            .filter(|f| f.id != flag.id)
            .filter_map(|f| {
                let crow = flag.coords.distance(f.coords);
                if crow > radius {
                    return None;
                }
                let virtual_distance = if f.economy == flag.economy {
                    VIRTUAL_DISTANCE_SAME_ECONOMY
                } else {
                    VIRTUAL_DISTANCE_CROSS_ECONOMY
                };
                let mut cost = virtual_distance + crow;
                if let Some(&real) = road_distances.get(&f.id) {
                    cost = cost.min(real);
                }
                Some((f, cost))
            })
            .collect();

        candidates.sort_by(|(fa, ca), (fb, cb)| {
            let reduction_a = ca.saturating_sub(flag.coords.distance(fa.coords));
            let reduction_b = cb.saturating_sub(flag.coords.distance(fb.coords));
            reduction_b
                .cmp(&reduction_a)
                .then_with(|| fa.id.0.cmp(&fb.id.0))
        });

        for (candidate, existing_cost) in candidates {
            let crow = flag.coords.distance(candidate.coords);
            if crow < 2 || crow >= radius.saturating_sub(2) {
                continue;
            }
            let Some(path) = host.find_path(flag.coords, candidate.coords) else {
                continue;
            };
            let new_len = path.len().saturating_sub(1) as u32;
            if existing_cost > new_len && existing_cost - new_len >= min_reduction {
                info!(from = ?flag.id, to = ?candidate.id, new_len, "road optimizer building shortcut road");
                host.push_command(Command::BuildRoad(path));
                return true;
            }
        }

        false
    }
}

fn find_flaggable_from_both_ends(host: &impl HostView, road: &RoadView) -> Option<HexCoord> {
    if road.path.len() < 3 {
        return None;
    }
    let last = road.path.len() - 1;
    let mut front = 1usize;
    let mut back = last.saturating_sub(1);
    while front <= back {
        if host.is_road_flaggable(road.path[front]) {
            return Some(road.path[front]);
        }
        if back != front && host.is_road_flaggable(road.path[back]) {
            return Some(road.path[back]);
        }
        front += 1;
        if back == 0 {
            break;
        }
        back -= 1;
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DijkstraEntry {
    cost: u32,
    tie_breaker: u64,
    flag: FlagId,
}

impl Ord for DijkstraEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.tie_breaker.cmp(&self.tie_breaker))
    }
}

impl PartialOrd for DijkstraEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Classic Dijkstra over the flag graph induced by `roads`, edge weight the
/// road's path length, starting from `source`. Only reachability within a
/// caller-bounded radius is needed, so no full shortest-path tree is built
/// beyond what the open set naturally explores (§9 design note).
fn dijkstra_flag_distances(roads: &[RoadView], source: FlagId) -> HashMap<FlagId, u32> {
    let mut adjacency: HashMap<FlagId, Vec<(FlagId, u32)>> = HashMap::new();
    for road in roads {
        let weight = road.path.len().saturating_sub(1) as u32;
        adjacency.entry(road.from).or_default().push((road.to, weight));
        adjacency.entry(road.to).or_default().push((road.from, weight));
    }

    let mut dist: HashMap<FlagId, u32> = HashMap::new();
    let mut heap = BinaryHeap::new();
    dist.insert(source, 0);
    heap.push(DijkstraEntry {
        cost: 0,
        tie_breaker: source.0,
        flag: source,
    });

    while let Some(DijkstraEntry { cost, flag, .. }) = heap.pop() {
        if cost > *dist.get(&flag).unwrap_or(&u32::MAX) {
            continue;
        }
        let Some(neighbors) = adjacency.get(&flag) else {
            continue;
        };
        for &(next, weight) in neighbors {
            let next_cost = cost + weight;
            if next_cost < *dist.get(&next).unwrap_or(&u32::MAX) {
                dist.insert(next, next_cost);
                heap.push(DijkstraEntry {
                    cost: next_cost,
                    tie_breaker: next.0,
                    flag: next,
                });
            }
        }
    }

    dist.remove(&source);
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BuildCap, FixtureHost, RoadId};
    use rts_core::components::EntityId;

    fn flag(id: EntityId, coords: HexCoord, economy: EconomyId, wares: u32) -> FlagView {
        FlagView {
            id: FlagId(id),
            coords,
            economy,
            wares,
        }
    }

    #[test]
    fn dead_end_flag_with_no_wares_is_bulldozed() {
        let mut host = FixtureHost::new(1);
        host.flags.push(flag(1, HexCoord::new(0, 0), EconomyId(1), 0));
        let mut index = FieldIndex::new();
        let mut observers = ObserverTables::new();
        let mut optimizer = RoadOptimizer::new();

        let emitted = optimizer.run_once(&mut host, &mut index, &mut observers, 0);
        assert!(emitted);
        assert_eq!(host.commands[0], Command::Bulldoze(1));
    }

    #[test]
    fn overlong_road_splits_at_first_flaggable_tile() {
        let mut host = FixtureHost::new(1);
        for i in 0..30 {
            let c = HexCoord::new(i, 0);
            host.owners.insert(c, 1);
            host.caps.insert(c, BuildCap::Small);
        }
        let path = vec![
            HexCoord::new(0, 0),
            HexCoord::new(1, 0),
            HexCoord::new(2, 0),
            HexCoord::new(3, 0),
            HexCoord::new(4, 0),
        ];
        host.roads.push(RoadView {
            id: RoadId(9),
            from: FlagId(1),
            to: FlagId(2),
            path: path.clone(),
        });
        host.flaggable.insert(HexCoord::new(2, 0));

        let mut index = FieldIndex::new();
        for i in 0..25 {
            index.on_field_gained(HexCoord::new(i, 1));
            index.sweep_unusable(&host, 0);
        }
        for i in 0..25 {
            host.owners.insert(HexCoord::new(i, 1), 1);
            host.caps.insert(HexCoord::new(i, 1), BuildCap::Small);
        }
        index.sweep_unusable(&host, 0);

        let mut observers = ObserverTables::new();
        let mut optimizer = RoadOptimizer::new();
        let emitted = optimizer.run_once(&mut host, &mut index, &mut observers, 0);
        assert!(emitted);
        assert_eq!(host.commands[0], Command::BuildFlag(HexCoord::new(2, 0)));
    }

    #[test]
    fn dijkstra_finds_multi_hop_distance() {
        let roads = vec![
            RoadView {
                id: RoadId(1),
                from: FlagId(1),
                to: FlagId(2),
                path: vec![HexCoord::new(0, 0), HexCoord::new(1, 0), HexCoord::new(2, 0)],
            },
            RoadView {
                id: RoadId(2),
                from: FlagId(2),
                to: FlagId(3),
                path: vec![HexCoord::new(2, 0), HexCoord::new(3, 0)],
            },
        ];
        let distances = dijkstra_flag_distances(&roads, FlagId(1));
        assert_eq!(distances[&FlagId(2)], 2);
        assert_eq!(distances[&FlagId(3)], 3);
    }

    #[test]
    fn stranded_economy_escalates_to_bulldoze_after_enough_failures() {
        let mut host = FixtureHost::new(1);
        let economy = EconomyId(1);
        host.flags.push(flag(1, HexCoord::new(0, 0), economy, 0));
        host.roads.push(RoadView {
            id: RoadId(5),
            from: FlagId(1),
            to: FlagId(1),
            path: vec![HexCoord::new(0, 0), HexCoord::new(1, 0)],
        });
        // economy has no warehouse -> failed_connection_tries escalates.
        let mut index = FieldIndex::new();
        let mut observers = ObserverTables::new();
        observers.economies.entry(economy).or_default().failed_connection_tries = 10;

        let mut optimizer = RoadOptimizer::new();
        let f = flag(1, HexCoord::new(0, 0), economy, 0);
        let emitted = optimizer.create_shortcut_road(&mut host, &mut index, &mut observers, f, 13, 20, 0);
        assert!(emitted);
        assert!(host.commands.iter().any(|c| matches!(c, Command::Bulldoze(1))));
    }

    /// Invariant 5 (§8): shortcut candidate selection is stable given
    /// identical inputs — shuffling `host.flags()`' insertion order must not
    /// change which candidate `create_shortcut_road` picks.
    fn host_with_shortcut_candidates(flag_order: &[u64]) -> (FixtureHost, EconomyId) {
        let economy = EconomyId(1);
        let mut host = FixtureHost::new(1);
        host.economy_warehouses.insert(economy, true);
        host.flags.push(flag(1, HexCoord::new(0, 0), economy, 0));
        for &id in flag_order {
            host.flags.push(flag(id, HexCoord::new(id as i32, 0), economy, 0));
        }
        (host, economy)
    }

    #[test]
    fn shortcut_candidate_pick_is_independent_of_flag_insertion_order() {
        let source = flag(1, HexCoord::new(0, 0), EconomyId(1), 0);

        let (mut host_a, _) = host_with_shortcut_candidates(&[2, 3, 4]);
        let mut index_a = FieldIndex::new();
        let mut observers_a = ObserverTables::new();
        let optimizer_a = RoadOptimizer::new();
        optimizer_a.create_shortcut_road(&mut host_a, &mut index_a, &mut observers_a, source, 13, 0, 0);

        let (mut host_b, _) = host_with_shortcut_candidates(&[4, 2, 3]);
        let mut index_b = FieldIndex::new();
        let mut observers_b = ObserverTables::new();
        let optimizer_b = RoadOptimizer::new();
        optimizer_b.create_shortcut_road(&mut host_b, &mut index_b, &mut observers_b, source, 13, 0, 0);

        assert_eq!(host_a.commands, host_b.commands);
    }
}
