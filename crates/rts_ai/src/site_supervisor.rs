//! Site Supervisor (§4.5): periodic review of production sites, mines, and
//! military sites — dismantle, upgrade, stop/start, adjust soldier
//! capacity/preference.
//!
//! Each site kind is reviewed from its own rotating queue so that a single
//! scheduler cadence call only ever touches one site, capping per-tick cost
//! the same way the Construction Planner caps itself to one build command.

use std::collections::VecDeque;

use tracing::info;

use rts_core::components::EntityId;

use crate::field_index::{update_buildable_field, BuildableField, MILITARY_RESCAN_MIN_RADIUS};
use crate::host::{BuildingDescriptorView, Command, HostView, SoldierPreference, WareId};
use crate::observers::{BuildingObserver, ObserverTables};

/// A building type may not be dismantled again within this long (§4.5).
pub const DISMANTLE_COOLDOWN_MS: u64 = 30_000;
/// "Unoccupied" / zero-stats window before a no-input site is reconsidered.
pub const SIX_MINUTES_MS: u64 = 6 * 60_000;
/// Long-run unoccupied threshold for sites with inputs / no-input generic sites.
pub const TEN_MINUTES_MS: u64 = 10 * 60_000;
/// Gap required between successive well dismantles driven purely by stock.
pub const WELL_STOCK_DISMANTLE_GAP_MS: u64 = 90_000;
/// Mine dismantle threshold: workers missing this long after construction.
pub const MINE_WORKERLESS_THRESHOLD_MS: u64 = SIX_MINUTES_MS;
/// Mine `no_resources_count` at which an upgrade is considered.
pub const MINE_UPGRADE_CONSIDERATION_COUNT: u32 = 4;
/// Mine `no_resources_count` at which the mine is dismantled outright.
pub const MINE_DISMANTLE_COUNT: u32 = 12;
/// Workarea radius used for tree/stone counts in lumberjack/quarry reviews.
pub const WORKAREA_SCAN_RADIUS: u32 = 2;
/// Supporting-site (e.g. ranger) stocklevel band: stop production above this.
pub const SUPPORTING_SITE_STOP_STOCK: u32 = 120;
/// Supporting-site stocklevel band: resume production below this.
pub const SUPPORTING_SITE_RESUME_STOCK: u32 = 80;
/// Supporting-site stocklevel above which it is dismantled if over target.
pub const SUPPORTING_SITE_DISMANTLE_STOCK: u32 = 200;
/// `military_loneliness` below this counts as the "low loneliness" demolition
/// signal (§4.5): the site is crowded by other friendly military nearby.
pub const DEMOLITION_LONELINESS_THRESHOLD: u32 = 500;
/// `unowned_land_nearby` below this counts as the "little unowned land"
/// demolition signal: nothing left nearby worth expanding into.
pub const DEMOLITION_LOW_UNOWNED_LAND: u32 = 3;
/// Number of positive demolition signals required to dismantle an overbuilt,
/// peaceful military site (§4.5).
pub const DEMOLITION_SIGNAL_COUNT: u32 = 4;

/// Rotating review queues for each site kind.
#[derive(Debug, Default)]
pub struct SiteSupervisor {
    production_queue: VecDeque<EntityId>,
    mine_queue: VecDeque<EntityId>,
    military_queue: VecDeque<EntityId>,
}

impl SiteSupervisor {
    /// Create an empty supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sync_production_mine_queues(&mut self, observers: &ObserverTables) {
        for (&site, obs) in &observers.sites {
            let queue = if obs_is_mine(observers, obs.building) {
                &mut self.mine_queue
            } else {
                &mut self.production_queue
            };
            if !queue.contains(&site) {
                queue.push_back(site);
            }
        }
        self.production_queue.retain(|s| observers.sites.contains_key(s));
        self.mine_queue.retain(|s| observers.sites.contains_key(s));
        for &site in observers.military_sites.keys() {
            if !self.military_queue.contains(&site) {
                self.military_queue.push_back(site);
            }
        }
        self.military_queue.retain(|s| observers.military_sites.contains_key(s));
    }

    /// Review the next production site in rotation. Returns `true` if a
    /// command (dismantle/enhance/start-stop) was emitted.
    pub fn tick_production(
        &mut self,
        host: &mut impl HostView,
        observers: &mut ObserverTables,
        current_tick: u64,
    ) -> bool {
        self.sync_production_mine_queues(observers);
        let Some(site) = self.production_queue.pop_front() else {
            return false;
        };
        self.production_queue.push_back(site);
        review_production_site(host, observers, site, current_tick)
    }

    /// Review the next mine in rotation.
    pub fn tick_mine(
        &mut self,
        host: &mut impl HostView,
        observers: &mut ObserverTables,
        current_tick: u64,
    ) -> bool {
        self.sync_production_mine_queues(observers);
        let Some(site) = self.mine_queue.pop_front() else {
            return false;
        };
        self.mine_queue.push_back(site);
        review_mine(host, observers, site, current_tick)
    }

    /// Review the next military site in rotation.
    pub fn tick_military(
        &mut self,
        host: &mut impl HostView,
        observers: &mut ObserverTables,
        current_tick: u64,
    ) -> bool {
        self.sync_production_mine_queues(observers);
        let Some(site) = self.military_queue.pop_front() else {
            return false;
        };
        self.military_queue.push_back(site);
        review_military_site(host, observers, site, current_tick)
    }
}

fn obs_is_mine(observers: &ObserverTables, building: rts_core::production::BuildingTypeId) -> bool {
    observers
        .buildings
        .get(&building)
        .is_some_and(|b| b.kind == crate::observers::BuildingKind::Mine)
}

fn can_dismantle_kind(observer: &BuildingObserver, current_tick: u64) -> bool {
    observer
        .last_dismantle_time
        .map_or(true, |t| current_tick.saturating_sub(t) >= DISMANTLE_COOLDOWN_MS)
}

fn primary_output(desc: &BuildingDescriptorView) -> Option<WareId> {
    desc.outputs.first().copied()
}

fn stocklevel_for(host: &impl HostView, site: EntityId, desc: &BuildingDescriptorView) -> u32 {
    let Some(economy) = host.site_economy(site) else {
        return 0;
    };
    primary_output(desc).map_or(0, |ware| host.stock_ware(economy, ware))
}

fn try_enhance(
    host: &mut impl HostView,
    observers: &mut ObserverTables,
    site: EntityId,
    building: rts_core::production::BuildingTypeId,
    desc: &BuildingDescriptorView,
) -> Option<Command> {
    let enhancement = desc.enhancement?;
    if !host.building_type_allowed(enhancement) {
        return None;
    }
    let observer = observers.buildings.get(&building)?;
    if observer.cnt_built <= observer.unoccupied + 1 {
        return None;
    }
    if !host.site_can_work(site) {
        return None;
    }
    let enhanced = observers.buildings.get(&enhancement)?;
    if enhanced.cnt_under_construction > 0 {
        return None;
    }
    let should_enhance = enhanced.cnt_built == 0 || enhanced.current_stats > observer.current_stats.saturating_add(20);
    if !should_enhance {
        return None;
    }
    Some(Command::Enhance {
        site,
        building: enhancement,
    })
}

fn dismantle_and_record(observers: &mut ObserverTables, building: rts_core::production::BuildingTypeId, current_tick: u64) {
    if let Some(obs) = observers.buildings.get_mut(&building) {
        obs.last_dismantle_time = Some(current_tick);
    }
}

fn review_production_site(
    host: &mut impl HostView,
    observers: &mut ObserverTables,
    site: EntityId,
    current_tick: u64,
) -> bool {
    let Some(site_obs) = observers.sites.get(&site).cloned() else {
        return false;
    };
    let building = site_obs.building;
    let Some(desc) = host.building_descriptor(building).cloned() else {
        return false;
    };
    let Some(observer) = observers.buildings.get(&building).cloned() else {
        return false;
    };

    if !host.site_can_work(site) {
        if let Some(obs) = observers.sites.get_mut(&site) {
            obs.unoccupied_till = Some(current_tick);
        }
    }

    let stats = host.site_statistics_percent(site).unwrap_or(0);
    if stats == 0 && !site_obs.stats_zero {
        if let Some(obs) = observers.sites.get_mut(&site) {
            obs.stats_zero = true;
        }
    } else if stats > 0 {
        if let Some(obs) = observers.sites.get_mut(&site) {
            obs.stats_zero = false;
        }
    }

    if let Some(cmd) = try_enhance(host, observers, site, building, &desc) {
        info!(?site, ?building, "site supervisor emitting enhance");
        host.push_command(cmd);
        return true;
    }

    if !can_dismantle_kind(&observer, current_tick) {
        return false;
    }

    let unoccupied_long_ago = site_obs
        .unoccupied_till
        .is_some_and(|t| current_tick.saturating_sub(t) >= SIX_MINUTES_MS);
    let built_long_ago = current_tick.saturating_sub(site_obs.built_time) >= TEN_MINUTES_MS;
    let stocklevel = stocklevel_for(host, site, &desc);
    let target = observer.cnt_target;

    let should_dismantle = if desc.need_trees && !desc.plants_trees {
        let trees_nearby = workarea_tree_count(host, site);
        observer.cnt_built > target && stats <= 20 && trees_nearby <= 5 && stocklevel > 50
    } else if desc.mines_water {
        (stats == 0 && unoccupied_long_ago)
            || (stocklevel > 250
                && observer
                    .last_dismantle_time
                    .map_or(true, |t| current_tick.saturating_sub(t) >= WELL_STOCK_DISMANTLE_GAP_MS))
    } else if desc.need_stones {
        workarea_stone_count(host, site) == 0 || (stats == 0 && unoccupied_long_ago)
    } else if let Some(_hint) = desc.production_hint {
        // Supporting sites (e.g. rangers): band by stocklevel, dismantle far over target.
        if stocklevel > SUPPORTING_SITE_STOP_STOCK {
            host.push_command(Command::StartStopBuilding(site));
            return true;
        } else if stocklevel < SUPPORTING_SITE_RESUME_STOCK && site_obs.stats_zero {
            host.push_command(Command::StartStopBuilding(site));
            return true;
        }
        stocklevel > SUPPORTING_SITE_DISMANTLE_STOCK && observer.cnt_built > target
    } else if desc.space_consumer && desc.inputs.is_empty() {
        (observer.cnt_built > target && stats < 30 && stocklevel > 100) || (stats <= 10 && observer.cnt_built > 1)
    } else if !desc.inputs.is_empty() {
        observer.cnt_built >= 3 && stats < 20 && observer.current_stats < 30 && unoccupied_long_ago
    } else {
        stats < 10 && built_long_ago
    };

    if should_dismantle {
        info!(?site, ?building, stats, "site supervisor emitting dismantle");
        host.push_command(Command::Dismantle(site));
        dismantle_and_record(observers, building, current_tick);
        return true;
    }

    false
}

fn workarea_tree_count(host: &impl HostView, site: EntityId) -> u32 {
    let Some(coords) = host.site_coords(site) else {
        return 0;
    };
    host.find_immovables(coords, WORKAREA_SCAN_RADIUS)
        .iter()
        .filter(|(_, k)| matches!(k, crate::host::ImmovableKind::Tree))
        .count() as u32
}

fn workarea_stone_count(host: &impl HostView, site: EntityId) -> u32 {
    let Some(coords) = host.site_coords(site) else {
        return 0;
    };
    host.find_immovables(coords, WORKAREA_SCAN_RADIUS)
        .iter()
        .filter(|(_, k)| matches!(k, crate::host::ImmovableKind::Stone))
        .count() as u32
}

fn review_mine(
    host: &mut impl HostView,
    observers: &mut ObserverTables,
    site: EntityId,
    current_tick: u64,
) -> bool {
    let Some(site_obs) = observers.sites.get(&site).cloned() else {
        return false;
    };
    let building = site_obs.building;
    let Some(desc) = host.building_descriptor(building).cloned() else {
        return false;
    };
    let Some(observer) = observers.buildings.get(&building).cloned() else {
        return false;
    };
    if !can_dismantle_kind(&observer, current_tick) {
        return false;
    }

    let workerless_too_long = !host.site_can_work(site)
        && current_tick.saturating_sub(site_obs.built_time) >= MINE_WORKERLESS_THRESHOLD_MS;
    if workerless_too_long {
        info!(?site, ?building, "site supervisor dismantling workerless mine");
        host.push_command(Command::Dismantle(site));
        dismantle_and_record(observers, building, current_tick);
        return true;
    }

    if site_obs.no_resources_count > MINE_DISMANTLE_COUNT {
        info!(?site, ?building, "site supervisor dismantling exhausted mine");
        host.push_command(Command::Dismantle(site));
        dismantle_and_record(observers, building, current_tick);
        return true;
    }

    if site_obs.no_resources_count >= MINE_UPGRADE_CONSIDERATION_COUNT {
        let stocklevel = stocklevel_for(host, site, &desc);
        if stocklevel < 150 {
            if let Some(cmd) = try_enhance(host, observers, site, building, &desc) {
                info!(?site, ?building, "site supervisor upgrading exhausted mine");
                host.push_command(cmd);
                return true;
            }
        }
    }

    false
}

fn review_military_site(
    host: &mut impl HostView,
    observers: &mut ObserverTables,
    site: EntityId,
    current_tick: u64,
) -> bool {
    let Some(ms_obs) = observers.military_sites.get(&site).cloned() else {
        return false;
    };
    let building = ms_obs.building;
    let Some(desc) = host.building_descriptor(building).cloned() else {
        return false;
    };
    let Some(coords) = host.site_coords(site) else {
        return false;
    };
    let vision = desc.vision_range + 4;
    let enemy_nearby = host
        .find_immovables(coords, vision)
        .iter()
        .any(|(_, k)| matches!(k, crate::host::ImmovableKind::Enemy { .. }));

    if let Some(obs) = observers.military_sites.get_mut(&site) {
        obs.enemies_nearby = enemy_nearby;
        obs.checks += 1;
    }

    if enemy_nearby {
        host.push_command(Command::SetSoldierPreference {
            site,
            preference: SoldierPreference::Heroes,
        });
        if let Some(current) = host.soldier_capacity(site) {
            if current < desc.max_soldiers {
                host.push_command(Command::ChangeSoldierCapacity {
                    site,
                    delta: (desc.max_soldiers - current) as i32,
                });
                return true;
            }
        }
        return false;
    }

    host.push_command(Command::SetSoldierPreference {
        site,
        preference: SoldierPreference::Rookies,
    });

    let economy_has_warehouse = host
        .site_economy(site)
        .is_some_and(|economy| host.economy_has_warehouse(economy));
    if economy_has_warehouse {
        if let Some(current) = host.soldier_capacity(site) {
            if current > 1 {
                info!(?site, "site supervisor decrementing idle garrison");
                host.push_command(Command::ChangeSoldierCapacity { site, delta: -1 });
                return true;
            }
        }
    }

    if should_demolish_military_site(host, coords, current_tick) {
        info!(?site, ?building, "site supervisor demolishing overbuilt military site");
        host.push_command(Command::Dismantle(site));
        dismantle_and_record(observers, building, current_tick);
        return true;
    }

    false
}

/// Score a peaceful military site for demolition with a buildable-field-style
/// scan around its own tile (§4.5): spare capacity, nearby friendly
/// presence, low loneliness, nearby stationed garrisons, capacity in excess
/// of nearby need, and little unowned land left to justify holding ground.
/// Demolishes when at least [`DEMOLITION_SIGNAL_COUNT`] of those six signals
/// are positive.
fn should_demolish_military_site(host: &impl HostView, coords: crate::hex::HexCoord, current_tick: u64) -> bool {
    let mut field = BuildableField::new(coords);
    update_buildable_field(host, &mut field, current_tick, MILITARY_RESCAN_MIN_RADIUS, true);

    let spare_capacity = field.military_capacity > field.military_presence;
    let presence = field.military_presence > 1;
    let low_loneliness = field.military_loneliness < DEMOLITION_LONELINESS_THRESHOLD;
    let stationed = field.military_stationed > 1;
    let excess_capacity_for_need = field.military_capacity > field.military_presence.saturating_mul(2);
    let little_unowned_land = field.unowned_land_nearby < DEMOLITION_LOW_UNOWNED_LAND;

    let signals = [
        spare_capacity,
        presence,
        low_loneliness,
        stationed,
        excess_capacity_for_need,
        little_unowned_land,
    ];
    signals.iter().filter(|&&s| s).count() as u32 >= DEMOLITION_SIGNAL_COUNT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BuildCap, FixtureHost};
    use crate::hex::HexCoord;
    use crate::observers::{MilitarySiteObserver, SiteObserver};
    use rts_core::production::BuildingTypeId;

    #[test]
    fn quarry_dismantled_immediately_when_no_granite_remains() {
        let coords = HexCoord::new(0, 0);
        let mut host = FixtureHost::new(1);
        host.caps.insert(coords, BuildCap::Small);

        let bt = BuildingTypeId(1);
        let site = 1u64;
        let desc = crate::host::BuildingDescriptorView {
            name: "quarry".into(),
            need_stones: true,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc.clone());
        host.site_coords.insert(site, coords);

        let mut observers = ObserverTables::new();
        let mut obs = crate::observers::BuildingObserver::new(bt, "quarry".into(), &desc);
        obs.cnt_built = 1;
        observers.buildings.insert(bt, obs);
        observers.sites.insert(site, SiteObserver::new(site, bt, 0));

        let mut supervisor = SiteSupervisor::new();
        let emitted = supervisor.tick_production(&mut host, &mut observers, 0);
        assert!(emitted);
        assert_eq!(host.commands[0], Command::Dismantle(site));
    }

    #[test]
    fn military_site_raises_capacity_when_enemy_visible() {
        let coords = HexCoord::new(0, 0);
        let mut host = FixtureHost::new(1);
        host.immovables.insert(HexCoord::new(1, 0), crate::host::ImmovableKind::Enemy { owner: 2 });

        let bt = BuildingTypeId(5);
        let site = 7u64;
        let desc = crate::host::BuildingDescriptorView {
            name: "barracks".into(),
            fighting_type: true,
            vision_range: 3,
            max_soldiers: 5,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc);
        host.site_coords.insert(site, coords);
        host.soldier_capacities.insert(site, 1);

        let mut observers = ObserverTables::new();
        observers.military_sites.insert(site, MilitarySiteObserver::new(site, bt));

        let mut supervisor = SiteSupervisor::new();
        let emitted = supervisor.tick_military(&mut host, &mut observers, 0);
        assert!(emitted);
        assert!(host
            .commands
            .iter()
            .any(|c| matches!(c, Command::ChangeSoldierCapacity { delta: 4, .. })));
        assert!(observers.military_sites[&site].enemies_nearby);
    }

    #[test]
    fn idle_military_site_decrements_capacity_when_economy_has_warehouse() {
        let coords = HexCoord::new(0, 0);
        let mut host = FixtureHost::new(1);
        let bt = BuildingTypeId(6);
        let site = 8u64;
        let desc = crate::host::BuildingDescriptorView {
            name: "barracks".into(),
            fighting_type: true,
            vision_range: 3,
            max_soldiers: 5,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc);
        host.site_coords.insert(site, coords);
        host.soldier_capacities.insert(site, 3);
        let economy = crate::host::EconomyId(1);
        host.site_economies.insert(site, economy);
        host.economy_warehouses.insert(economy, true);

        let mut observers = ObserverTables::new();
        observers.military_sites.insert(site, MilitarySiteObserver::new(site, bt));

        let mut supervisor = SiteSupervisor::new();
        let emitted = supervisor.tick_military(&mut host, &mut observers, 0);
        assert!(emitted);
        assert!(host
            .commands
            .iter()
            .any(|c| matches!(c, Command::ChangeSoldierCapacity { delta: -1, .. })));
    }

    #[test]
    fn crowded_peaceful_military_site_is_demolished() {
        let coords = HexCoord::new(0, 0);
        let neighbor_coords = HexCoord::new(1, 0);
        let mut host = FixtureHost::new(1);

        let bt = BuildingTypeId(9);
        let site = 10u64;
        let desc = crate::host::BuildingDescriptorView {
            name: "barracks".into(),
            fighting_type: true,
            vision_range: 3,
            max_soldiers: 5,
            ..Default::default()
        };
        host.descriptors.insert(bt, desc);
        host.site_coords.insert(site, coords);
        // Already at the capacity floor: the idle-garrison decrement has
        // nothing left to do, so the demolition scan gets to run.
        host.soldier_capacities.insert(site, 1);
        host.immovables
            .insert(coords, crate::host::ImmovableKind::Building { building: bt, site });
        host.site_stats.insert(site, 50);

        let neighbor_site = 11u64;
        host.immovables.insert(
            neighbor_coords,
            crate::host::ImmovableKind::Building { building: bt, site: neighbor_site },
        );
        host.site_stats.insert(neighbor_site, 50);

        let mut observers = ObserverTables::new();
        observers.military_sites.insert(site, MilitarySiteObserver::new(site, bt));

        let mut supervisor = SiteSupervisor::new();
        let emitted = supervisor.tick_military(&mut host, &mut observers, 0);
        assert!(emitted);
        assert_eq!(host.commands.last(), Some(&Command::Dismantle(site)));
    }
}
