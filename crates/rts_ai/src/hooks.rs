//! Event hooks: translate host notifications into observer/index updates
//! synchronously, so scheduler phases always see consistent state (§4.8, §5).

use tracing::{debug, warn};

use crate::field_index::FieldIndex;
use crate::host::{ImmovableKind, Notification};
use crate::observers::{MilitarySiteObserver, ObserverTables, SiteObserver};

/// Apply a single notification to the index and observer tables.
///
/// Runs synchronously on the notifying call: by the time this returns,
/// observer state is consistent, so any scheduler phase that runs
/// afterwards on the same tick sees up-to-date data (§5 ordering guarantee).
pub fn handle_notification(
    index: &mut FieldIndex,
    observers: &mut ObserverTables,
    current_tick: u64,
    notification: Notification,
) {
    match notification {
        Notification::FieldGained(coords) => {
            index.on_field_gained(coords);
        }
        Notification::FieldLost(coords) => {
            index.on_field_lost(coords);
        }
        Notification::ImmovableGained { kind, .. } => on_immovable_gained(observers, current_tick, kind),
        Notification::ImmovableLost { kind, .. } => on_immovable_lost(observers, kind),
        Notification::ProductionSiteOutOfResources(site) => {
            if let Some(obs) = observers.sites.get_mut(&site) {
                obs.no_resources_count += 1;
            } else {
                warn!(?site, "out-of-resources notification for unknown site");
            }
        }
    }
}

fn on_immovable_gained(observers: &mut ObserverTables, current_tick: u64, kind: ImmovableKind) {
    match kind {
        ImmovableKind::ConstructionSite { building, .. } => {
            if let Some(obs) = observers.buildings.get_mut(&building) {
                obs.cnt_under_construction += 1;
            } else {
                warn!(?building, "construction site gained for unregistered building type");
            }
        }
        ImmovableKind::Building { building, site } => {
            if let Some(obs) = observers.buildings.get_mut(&building) {
                obs.cnt_built += 1;
                obs.cnt_under_construction = obs.cnt_under_construction.saturating_sub(1);
                match obs.kind {
                    crate::observers::BuildingKind::MilitarySite => {
                        observers
                            .military_sites
                            .insert(site, MilitarySiteObserver::new(site, building));
                    }
                    _ => {
                        observers
                            .sites
                            .insert(site, SiteObserver::new(site, building, current_tick));
                    }
                }
            } else {
                warn!(?building, "building completed for unregistered building type");
            }
        }
        ImmovableKind::Flag(_) | ImmovableKind::Road(_) => {
            // Economy (re)assignment happens in the road optimizer's own
            // rotation pass; nothing to do on arrival beyond logging.
            debug!(?kind, "flag or road gained");
        }
        ImmovableKind::Tree | ImmovableKind::Stone | ImmovableKind::Enemy { .. } => {}
    }
}

fn on_immovable_lost(observers: &mut ObserverTables, kind: ImmovableKind) {
    match kind {
        ImmovableKind::ConstructionSite { building, .. } => {
            if let Some(obs) = observers.buildings.get_mut(&building) {
                obs.cnt_under_construction = obs.cnt_under_construction.saturating_sub(1);
            }
        }
        ImmovableKind::Building { building, site } => {
            if let Some(obs) = observers.buildings.get_mut(&building) {
                obs.cnt_built = obs.cnt_built.saturating_sub(1);
            }
            observers.sites.remove(&site);
            observers.military_sites.remove(&site);
        }
        ImmovableKind::Flag(_) | ImmovableKind::Road(_) | ImmovableKind::Tree | ImmovableKind::Stone | ImmovableKind::Enemy { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BuildCap;
    use crate::observers::BuildingObserver;
    use rts_core::production::BuildingTypeId;

    fn desc() -> crate::host::BuildingDescriptorView {
        crate::host::BuildingDescriptorView {
            name: "hut".into(),
            size: BuildCap::Small,
            ..Default::default()
        }
    }

    #[test]
    fn gain_then_lose_restores_counts_exactly() {
        let mut observers = ObserverTables::new();
        let bt = BuildingTypeId(7);
        observers
            .buildings
            .insert(bt, BuildingObserver::new(bt, "hut".into(), &desc()));

        let mut index = FieldIndex::new();
        let site = 1u64;

        handle_notification(
            &mut index,
            &mut observers,
            0,
            Notification::ImmovableGained {
                coords: crate::hex::HexCoord::new(0, 0),
                kind: ImmovableKind::Building { building: bt, site },
            },
        );
        assert_eq!(observers.buildings[&bt].cnt_built, 1);
        assert!(observers.sites.contains_key(&site));

        handle_notification(
            &mut index,
            &mut observers,
            1,
            Notification::ImmovableLost {
                coords: crate::hex::HexCoord::new(0, 0),
                kind: ImmovableKind::Building { building: bt, site },
            },
        );
        assert_eq!(observers.buildings[&bt].cnt_built, 0);
        assert!(!observers.sites.contains_key(&site));
    }

    #[test]
    fn out_of_resources_increments_counter() {
        let mut observers = ObserverTables::new();
        let bt = BuildingTypeId(3);
        let site = 9u64;
        observers.sites.insert(site, SiteObserver::new(site, bt, 0));
        let mut index = FieldIndex::new();

        handle_notification(
            &mut index,
            &mut observers,
            10,
            Notification::ProductionSiteOutOfResources(site),
        );

        assert_eq!(observers.sites[&site].no_resources_count, 1);
    }

    #[test]
    fn field_gained_then_lost_leaves_no_trace() {
        let mut observers = ObserverTables::new();
        let mut index = FieldIndex::new();
        let coords = crate::hex::HexCoord::new(1, 1);
        handle_notification(&mut index, &mut observers, 0, Notification::FieldGained(coords));
        assert_eq!(index.unusable_len(), 1);
        handle_notification(&mut index, &mut observers, 0, Notification::FieldLost(coords));
        assert_eq!(index.unusable_len(), 0);
    }
}
