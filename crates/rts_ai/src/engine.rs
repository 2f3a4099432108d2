//! `AiEngine`: the top-level struct wiring the field index, observer tables,
//! scheduler, and every sub-phase together behind a single `think` entry
//! point (§4.1, §5, §10).

use std::collections::HashMap;

use tracing::info;

use rts_core::production::BuildingTypeId;

use crate::attack_planner;
use crate::construction;
use crate::field_index::FieldIndex;
use crate::host::{Command, HostView, Notification};
use crate::hooks;
use crate::mine_planner;
use crate::observers::ObserverTables;
use crate::personality::EnginePersonality;
use crate::road_optimizer::RoadOptimizer;
use crate::scheduler::Scheduler;
use crate::site_supervisor::SiteSupervisor;

/// The computer opponent's decision engine for a single player.
///
/// Owns every piece of mutable AI state exclusively (§5): the host
/// simulation is never reached into directly, only queried and commanded
/// through [`HostView`].
#[derive(Debug, Default)]
pub struct AiEngine {
    index: FieldIndex,
    observers: ObserverTables,
    scheduler: Scheduler,
    site_supervisor: SiteSupervisor,
    road_optimizer: RoadOptimizer,
    personality: EnginePersonality,
}

impl AiEngine {
    /// Create a fresh engine with the given tunable personality.
    #[must_use]
    pub fn new(personality: EnginePersonality) -> Self {
        Self {
            personality,
            ..Self::default()
        }
    }

    /// Register every building type the host exposes, at late-initialization
    /// (§3, §9: the `BuildingKind` tag is computed once here).
    pub fn register_building_types(&mut self, host: &impl HostView) {
        for building in host.all_building_types() {
            if self.observers.buildings.contains_key(&building) {
                continue;
            }
            let Some(desc) = host.building_descriptor(building) else {
                continue;
            };
            let observer = crate::observers::BuildingObserver::new(building, desc.name.clone(), desc);
            self.observers.buildings.insert(building, observer);
        }
    }

    /// Deliver a host notification synchronously (§4.8, §5 ordering guarantee).
    pub fn notify(&mut self, current_tick: u64, notification: Notification) {
        hooks::handle_notification(&mut self.index, &mut self.observers, current_tick, notification);
    }

    /// Run one tick of decision-making. Dispatches sub-phases in the fixed
    /// order of §4.1's table; the first phase to emit a command returns
    /// immediately, except index maintenance and statistics refresh (which
    /// never emit commands) and the military-site check (a supervisory
    /// phase that does not interact with the spatial model, §5).
    ///
    /// Returns `true` if a command was pushed to the host this tick.
    pub fn think(&mut self, host: &mut impl HostView, current_tick: u64) -> bool {
        self.index.expire_blocked(current_tick);

        if self.index.has_unusable() {
            self.index.sweep_unusable(host, current_tick);
        }

        if self.scheduler.is_buildable_sweep_due(current_tick) {
            self.index.sweep_buildable(host, current_tick);
            self.index.sweep_mineable(host, current_tick);
            self.scheduler.mark_buildable_swept(current_tick);
        }

        if self.scheduler.is_road_improvement_due(current_tick) {
            let emitted = self
                .road_optimizer
                .run_once(host, &mut self.index, &mut self.observers, current_tick);
            self.scheduler.mark_road_improved(current_tick);
            if emitted {
                return true;
            }
        }

        if self.scheduler.is_statistics_due(current_tick) {
            refresh_statistics(host, &mut self.observers, current_tick);
            self.scheduler.mark_statistics_refreshed(current_tick);
        }

        if self.scheduler.is_construction_due(current_tick) {
            let emitted = construction::run_construction_attempt(host, &mut self.index, &mut self.observers, current_tick);
            self.scheduler.mark_construction_attempted(current_tick);
            if emitted {
                return true;
            }
        }

        if self.scheduler.is_production_check_due(current_tick) {
            let emitted = self.site_supervisor.tick_production(host, &mut self.observers, current_tick);
            self.scheduler.mark_production_checked(current_tick);
            if emitted {
                return true;
            }
        }

        if self.scheduler.is_mine_check_due(current_tick) {
            let emitted = self.site_supervisor.tick_mine(host, &mut self.observers, current_tick);
            self.scheduler.mark_mine_checked(current_tick);
            if emitted {
                return true;
            }
        }

        if self.scheduler.is_military_check_due(current_tick) {
            self.site_supervisor.tick_military(host, &mut self.observers, current_tick);
            self.scheduler.mark_military_checked(current_tick);
        }

        if self.scheduler.is_attack_due(current_tick) {
            let emitted = attack_planner::run_attack_consideration(host, &self.personality, current_tick);
            self.scheduler.mark_attack_considered(current_tick, emitted);
            if emitted {
                return true;
            }
        }

        if self.scheduler.is_helper_site_due(current_tick) {
            let emitted = self.run_helper_site_check(host, current_tick);
            self.scheduler.mark_helper_site_checked(current_tick);
            if emitted {
                return true;
            }
        }

        if self.scheduler.is_mine_construction_due(current_tick) {
            let emitted = mine_planner::run_mine_construction_attempt(host, &mut self.index, &mut self.observers, current_tick);
            self.scheduler.mark_mine_construction_considered(current_tick, emitted);
            if emitted {
                return true;
            }
        }

        false
    }

    /// Force-build the first still-missing building type whose
    /// `forced_after` has passed (§4.1 "Helper-site check", §4.3 generic
    /// production site forcing), bypassing the construction planner's normal
    /// cooldown gate since this phase only fires every 180s.
    fn run_helper_site_check(&mut self, host: &mut impl HostView, current_tick: u64) -> bool {
        let mut candidates: Vec<BuildingTypeId> = self
            .observers
            .buildings
            .values()
            .filter(|b| b.cnt_built == 0 && b.cnt_under_construction == 0)
            .filter_map(|b| host.building_descriptor(b.building).map(|d| (b.building, d.forced_after)))
            .filter(|&(_, forced_after)| forced_after > 0 && forced_after <= current_tick)
            .map(|(building, _)| building)
            .collect();
        candidates.sort_by_key(|b| b.0);

        for building in candidates {
            if !host.building_type_allowed(building) {
                continue;
            }
            let Some(desc) = host.building_descriptor(building).cloned() else {
                continue;
            };
            let index = &self.index;
            let Some(coords) = index
                .buildable_fields()
                .find(|f| host.build_cap(f.coords).fits(desc.size) && !index.is_blocked(f.coords, current_tick))
                .map(|f| f.coords)
            else {
                continue;
            };

            info!(tile = ?coords, building = ?building, "engine forcing overdue helper site");
            host.push_command(Command::Build { coords, building });
            self.index.block_ring(coords, 0, current_tick + construction::BUILD_BLOCK_MS);
            if let Some(obs) = self.observers.buildings.get_mut(&building) {
                obs.construction_decision_time = current_tick;
            }
            return true;
        }

        false
    }
}

/// Refresh per-building-type aggregate statistics from the host (§3
/// Observers): average statistics-percent, representative economy
/// stocklevel, and unoccupied-site count.
fn refresh_statistics(host: &impl HostView, observers: &mut ObserverTables, current_tick: u64) {
    let mut stats_sum: HashMap<BuildingTypeId, (u32, u32)> = HashMap::new();
    let mut unoccupied: HashMap<BuildingTypeId, u32> = HashMap::new();
    let mut stocklevel: HashMap<BuildingTypeId, u32> = HashMap::new();

    for (&site, site_obs) in &observers.sites {
        let pct = host.site_statistics_percent(site).unwrap_or(0) as u32;
        let entry = stats_sum.entry(site_obs.building).or_insert((0, 0));
        entry.0 += pct;
        entry.1 += 1;

        if !host.site_can_work(site) {
            *unoccupied.entry(site_obs.building).or_insert(0) += 1;
        }

        if let std::collections::hash_map::Entry::Vacant(slot) = stocklevel.entry(site_obs.building) {
            if let Some(desc) = host.building_descriptor(site_obs.building) {
                if let Some(ware) = desc.outputs.first().copied() {
                    if let Some(economy) = host.site_economy(site) {
                        slot.insert(host.stock_ware(economy, ware));
                    }
                }
            }
        }
    }

    for obs in observers.buildings.values_mut() {
        if let Some(&(sum, count)) = stats_sum.get(&obs.building) {
            obs.current_stats = if count > 0 { (sum / count) as u8 } else { 0 };
        }
        obs.unoccupied = unoccupied.get(&obs.building).copied().unwrap_or(0);
        if let Some(&level) = stocklevel.get(&obs.building) {
            obs.stocklevel = level;
            obs.stocklevel_time = current_tick;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BuildCap, BuildingDescriptorView, FixtureHost};
    use crate::hex::HexCoord;

    #[test]
    fn fresh_engine_sweeps_then_forces_first_lumberjack_in_one_tick() {
        let coords = HexCoord::new(0, 0);
        let mut host = FixtureHost::new(1);
        host.owners.insert(coords, 1);
        host.caps.insert(coords, BuildCap::Small);

        let mut engine = AiEngine::new(EnginePersonality::default());
        engine.notify(0, Notification::FieldGained(coords));

        let bt = BuildingTypeId(1);
        let desc = BuildingDescriptorView {
            name: "lumberjack".into(),
            size: BuildCap::Small,
            need_trees: true,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc);
        engine.register_building_types(&host);

        // A fresh scheduler has every phase due at tick 0: the unusable and
        // buildable sweeps promote and scan the field, and the construction
        // attempt that runs later the same tick forces the first lumberjack.
        let emitted = engine.think(&mut host, 0);
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
    fn notify_updates_observers_before_next_think() {
        let mut engine = AiEngine::new(EnginePersonality::default());
        let mut host = FixtureHost::new(1);
        let bt = BuildingTypeId(2);
        let desc = BuildingDescriptorView {
            name: "hut".into(),
            size: BuildCap::Small,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc);
        engine.register_building_types(&host);

        engine.notify(
            0,
            Notification::ImmovableGained {
                coords: HexCoord::new(0, 0),
                kind: crate::host::ImmovableKind::Building { building: bt, site: 1 },
            },
        );

        assert_eq!(engine.observers.buildings[&bt].cnt_built, 1);
    }

    #[test]
    fn helper_site_forces_overdue_building_type() {
        let coords = HexCoord::new(0, 0);
        let mut host = FixtureHost::new(1);
        host.owners.insert(coords, 1);
        host.caps.insert(coords, BuildCap::Small);

        let mut engine = AiEngine::new(EnginePersonality::default());
        engine.notify(0, Notification::FieldGained(coords));
        engine.index.sweep_unusable(&host, 0);
        engine.index.sweep_buildable(&host, 0);

        let bt = BuildingTypeId(3);
        let desc = BuildingDescriptorView {
            name: "forced hut".into(),
            size: BuildCap::Small,
            forced_after: 10,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc);
        engine.register_building_types(&host);

        let emitted = engine.run_helper_site_check(&mut host, 20);
        assert!(emitted);
        assert_eq!(
            host.commands[0],
            Command::Build {
                coords,
                building: bt
            }
        );
    }
}
