//! Mine Planner (§4.4): the Construction Planner's counterpart for mineable
//! tiles, with mineral-matching and nearness penalties instead of the
//! feature-vector scoring used for buildable fields.

use tracing::info;

use rts_core::production::BuildingTypeId;

use crate::construction::BUILD_BLOCK_MS;
use crate::field_index::{FieldIndex, MineableField};
use crate::host::{Command, HostView};
use crate::observers::ObserverTables;

/// A mine of this resource type already nearby costs this much priority per
/// occurrence once at least one mine of the candidate kind already exists.
pub const SAME_KIND_NEARBY_PENALTY: u32 = 10;
/// Candidates below this priority are rejected outright.
pub const MIN_PRIORITY: i64 = 2;

struct MineCandidate {
    coords: crate::hex::HexCoord,
    building: BuildingTypeId,
    priority: i64,
}

/// Run one mine-construction attempt: scan all (mineable tile × candidate
/// mine type) pairs, pick the single maximum-priority candidate with
/// priority ≥ [`MIN_PRIORITY`], and emit its build command.
///
/// Returns `true` if a command was emitted (used by the scheduler to pick
/// the busy vs. idle cadence, §4.1/§4.4).
pub fn run_mine_construction_attempt(
    host: &mut impl HostView,
    index: &mut FieldIndex,
    observers: &mut ObserverTables,
    current_tick: u64,
) -> bool {
    let mine_types: Vec<BuildingTypeId> = observers
        .buildings
        .values()
        .filter(|b| b.kind == crate::observers::BuildingKind::Mine)
        .map(|b| b.building)
        .collect();

    let mut best: Option<MineCandidate> = None;

    for &building in &mine_types {
        let Some(desc) = host.building_descriptor(building).cloned() else {
            continue;
        };
        let Some(observer) = observers.buildings.get(&building) else {
            continue;
        };
        if !host.building_type_allowed(building) {
            continue;
        }
        if desc.prohibited_till > current_tick {
            continue;
        }
        if current_tick.saturating_sub(observer.construction_decision_time)
            < crate::construction::CONSTRUCTION_DECISION_COOLDOWN_MS
        {
            continue;
        }
        let Some(resource) = desc.mines_resource else {
            continue;
        };
        let penalty = if observer.cnt_built > 0 { SAME_KIND_NEARBY_PENALTY } else { 0 };

        for field in index.mineable_fields() {
            if index.is_blocked(field.coords, current_tick) {
                continue;
            }
            if !host.build_cap(field.coords).fits(desc.size) {
                continue;
            }
            let Some((tile_resource, amount)) = host.tile_resource(field.coords) else {
                continue;
            };
            if tile_resource != resource {
                continue;
            }
            let priority = priority_for(field, amount, penalty);
            if priority < MIN_PRIORITY {
                continue;
            }
            let is_better = match &best {
                Some(b) => priority > b.priority,
                None => true,
            };
            if is_better {
                best = Some(MineCandidate {
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
        "mine planner emitting build command"
    );
    host.push_command(Command::Build {
        coords: candidate.coords,
        building: candidate.building,
    });
    index.block_ring(candidate.coords, 0, current_tick + BUILD_BLOCK_MS);
    if let Some(observer) = observers.buildings.get_mut(&candidate.building) {
        observer.construction_decision_time = current_tick;
    }

    true
}

fn priority_for(field: &MineableField, amount: u32, penalty: u32) -> i64 {
    amount as i64 - field.mines_nearby as i64 * penalty as i64
}
