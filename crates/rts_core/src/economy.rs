//! Economy and resource management system.
//!
//! Implements the Feedstock-based economy where harvesters gather
//! resources from nodes and deposit them at depots.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::math::Vec2Fixed;

/// Feedstock - the primary resource gathered by harvesters.
///
/// Raw material that matter replicators use to construct units and buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feedstock(pub i32);

impl Feedstock {
    /// Create a new feedstock amount.
    #[must_use]
    pub const fn new(amount: i32) -> Self {
        Self(amount)
    }

    /// Zero feedstock.
    pub const ZERO: Self = Self(0);
}

impl std::ops::Add for Feedstock {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Feedstock {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Feedstock {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Feedstock {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A resource node that harvesters can gather from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Position in world space.
    pub position: Vec2Fixed,
    /// Remaining feedstock in this node.
    pub remaining: i32,
    /// Amount gathered per harvest action.
    pub gather_rate: i32,
}

impl ResourceNode {
    /// Create a new resource node.
    #[must_use]
    pub const fn new(position: Vec2Fixed, remaining: i32, gather_rate: i32) -> Self {
        Self {
            position,
            remaining,
            gather_rate,
        }
    }

    /// Check if this node is depleted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.remaining <= 0
    }

    /// Extract resources from this node.
    ///
    /// Returns the actual amount extracted (may be less than requested if node is nearly depleted).
    pub fn extract(&mut self, requested: i32) -> i32 {
        let extracted = requested.min(self.remaining);
        self.remaining -= extracted;
        extracted
    }
}

/// Player economy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerEconomy {
    /// Current feedstock stockpile.
    pub feedstock: i32,
    /// Maximum feedstock storage capacity.
    pub storage_capacity: i32,
    /// Calculated income rate from active harvesters (per tick estimation).
    pub income_rate: i32,
}

impl PlayerEconomy {
    /// Create a new player economy with initial values.
    #[must_use]
    pub const fn new(feedstock: i32, storage_capacity: i32) -> Self {
        Self {
            feedstock,
            storage_capacity,
            income_rate: 0,
        }
    }

    /// Check available storage space.
    #[must_use]
    pub const fn available_storage(&self) -> i32 {
        self.storage_capacity - self.feedstock
    }

    /// Deposit feedstock, respecting storage limits.
    ///
    /// Returns the actual amount deposited.
    pub fn deposit(&mut self, amount: i32) -> i32 {
        let space = self.available_storage();
        let deposited = amount.min(space);
        self.feedstock += deposited;
        deposited
    }

    /// Spend feedstock if available.
    ///
    /// Returns true if the transaction succeeded.
    pub fn spend(&mut self, amount: i32) -> bool {
        if self.feedstock >= amount {
            self.feedstock -= amount;
            true
        } else {
            false
        }
    }

    /// Check if player can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: i32) -> bool {
        self.feedstock >= cost
    }
}

/// State of a harvester unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarvesterState {
    /// Idle, waiting for orders or auto-assignment.
    Idle,
    /// Moving to a resource node.
    MovingToNode(EntityId),
    /// Actively gathering from a node.
    Gathering(EntityId),
    /// Returning to a depot to deposit resources.
    Returning(EntityId),
    /// Depositing resources at a depot.
    Depositing,
}

impl Default for HarvesterState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Harvester component for units that gather resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harvester {
    /// Maximum feedstock this harvester can carry.
    pub capacity: i32,
    /// Current load of feedstock being carried.
    pub current_load: i32,
    /// Amount gathered per harvest action.
    pub gather_rate: i32,
    /// Current state of the harvester.
    pub state: HarvesterState,
}

impl Harvester {
    /// Create a new harvester with the given capacity and gather rate.
    #[must_use]
    pub const fn new(capacity: i32, gather_rate: i32) -> Self {
        Self {
            capacity,
            current_load: 0,
            gather_rate,
            state: HarvesterState::Idle,
        }
    }

    /// Check if the harvester is full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_load >= self.capacity
    }

    /// Check if the harvester is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.current_load <= 0
    }

    /// Available cargo space.
    #[must_use]
    pub const fn available_capacity(&self) -> i32 {
        self.capacity - self.current_load
    }

    /// Load resources into the harvester.
    ///
    /// Returns actual amount loaded (may be less if capacity is reached).
    pub fn load(&mut self, amount: i32) -> i32 {
        let space = self.available_capacity();
        let loaded = amount.min(space);
        self.current_load += loaded;
        loaded
    }

    /// Unload all resources from the harvester.
    ///
    /// Returns the amount unloaded.
    pub fn unload(&mut self) -> i32 {
        let amount = self.current_load;
        self.current_load = 0;
        amount
    }
}

/// Marker component for depot buildings that accept resource deposits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Depot;

/// Events generated by the economy system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A harvester gathered resources from a node.
    ResourceGathered {
        /// The harvester entity.
        harvester: EntityId,
        /// The resource node entity.
        node: EntityId,
        /// Amount gathered.
        amount: i32,
    },
    /// A harvester deposited resources at a depot.
    ResourceDeposited {
        /// The harvester entity.
        harvester: EntityId,
        /// The depot entity.
        depot: EntityId,
        /// Amount deposited.
        amount: i32,
    },
    /// A resource node has been fully depleted.
    NodeDepleted {
        /// The depleted node entity.
        node: EntityId,
    },
}

/// Distance threshold for interaction (squared, to avoid sqrt).
/// Units within this distance can gather/deposit.
const INTERACTION_DISTANCE_SQ: i64 = 4; // 2 units squared

/// Process the economy system for one tick.
///
/// Handles harvester state machines, resource gathering, and deposits.
/// Returns events for anything significant that happened.
///
/// # Arguments
///
/// * `harvesters` - All harvester entities with their components and positions
/// * `nodes` - All resource node entities with their components and positions
/// * `depots` - All depot entities with their positions
/// * `player_economy` - The player's economy state to update
///
/// # Returns
///
/// A vector of economy events that occurred this tick.
pub fn economy_system(
    harvesters: &mut [(EntityId, &mut Harvester, &Vec2Fixed)],
    nodes: &mut [(EntityId, &mut ResourceNode, &Vec2Fixed)],
    depots: &[(EntityId, &Vec2Fixed)],
    player_economy: &mut PlayerEconomy,
) -> Vec<EconomyEvent> {
    let mut events = Vec::new();

    for (harvester_id, harvester, harvester_pos) in harvesters.iter_mut() {
        match harvester.state {
            HarvesterState::Idle => {
                // Auto-assign to nearest non-depleted node if empty
                if harvester.is_empty() {
                    if let Some(node_id) = find_nearest_node(**harvester_pos, nodes) {
                        harvester.state = HarvesterState::MovingToNode(node_id);
                    }
                } else {
                    // Has resources, find depot
                    if let Some(depot_id) = find_nearest_depot(**harvester_pos, depots) {
                        harvester.state = HarvesterState::Returning(depot_id);
                    }
                }
            }

            HarvesterState::MovingToNode(node_id) => {
                // Check if we've arrived at the node
                if let Some((_, node, node_pos)) = nodes.iter().find(|(id, _, _)| *id == node_id) {
                    if is_within_range(**harvester_pos, **node_pos) {
                        if node.is_depleted() {
                            // Node depleted, find another
                            harvester.state = HarvesterState::Idle;
                        } else {
                            harvester.state = HarvesterState::Gathering(node_id);
                        }
                    }
                    // Otherwise, keep moving (movement handled by movement system)
                } else {
                    // Node no longer exists
                    harvester.state = HarvesterState::Idle;
                }
            }

            HarvesterState::Gathering(node_id) => {
                // Try to gather from the node
                if let Some((_, node, _)) =
                    nodes.iter_mut().find(|(id, _, _)| *id == node_id)
                {
                    if node.is_depleted() {
                        events.push(EconomyEvent::NodeDepleted { node: node_id });
                        harvester.state = HarvesterState::Idle;
                    } else if harvester.is_full() {
                        // Full, need to return to depot
                        if let Some(depot_id) = find_nearest_depot(**harvester_pos, depots) {
                            harvester.state = HarvesterState::Returning(depot_id);
                        } else {
                            harvester.state = HarvesterState::Idle;
                        }
                    } else {
                        // Gather resources
                        let to_gather = harvester.gather_rate.min(harvester.available_capacity());
                        let gathered = node.extract(to_gather);
                        harvester.load(gathered);

                        if gathered > 0 {
                            events.push(EconomyEvent::ResourceGathered {
                                harvester: *harvester_id,
                                node: node_id,
                                amount: gathered,
                            });
                        }

                        // Check if node depleted after gathering
                        if node.is_depleted() {
                            events.push(EconomyEvent::NodeDepleted { node: node_id });
                        }

                        // Check if full after gathering
                        if harvester.is_full() {
                            if let Some(depot_id) = find_nearest_depot(**harvester_pos, depots) {
                                harvester.state = HarvesterState::Returning(depot_id);
                            } else {
                                harvester.state = HarvesterState::Idle;
                            }
                        }
                    }
                } else {
                    // Node no longer exists
                    harvester.state = HarvesterState::Idle;
                }
            }

            HarvesterState::Returning(depot_id) => {
                // Check if we've arrived at the depot
                if let Some((_, depot_pos)) = depots.iter().find(|(id, _)| *id == depot_id) {
                    if is_within_range(**harvester_pos, **depot_pos) {
                        harvester.state = HarvesterState::Depositing;
                    }
                    // Otherwise, keep moving
                } else {
                    // Depot no longer exists, find another
                    if let Some(new_depot_id) = find_nearest_depot(**harvester_pos, depots) {
                        harvester.state = HarvesterState::Returning(new_depot_id);
                    } else {
                        harvester.state = HarvesterState::Idle;
                    }
                }
            }

            HarvesterState::Depositing => {
                // Find the depot we're at
                if let Some((depot_id, _)) = depots
                    .iter()
                    .find(|(_, pos)| is_within_range(**harvester_pos, **pos))
                {
                    let load = harvester.unload();
                    let deposited = player_economy.deposit(load);

                    if deposited > 0 {
                        events.push(EconomyEvent::ResourceDeposited {
                            harvester: *harvester_id,
                            depot: *depot_id,
                            amount: deposited,
                        });
                    }

                    // If we couldn't deposit everything (full storage), the rest is lost
                    // This encourages building more storage

                    // Go back to gathering
                    if let Some(node_id) = find_nearest_node(**harvester_pos, nodes) {
                        harvester.state = HarvesterState::MovingToNode(node_id);
                    } else {
                        harvester.state = HarvesterState::Idle;
                    }
                } else {
                    // Not at a depot anymore, find one
                    if let Some(depot_id) = find_nearest_depot(**harvester_pos, depots) {
                        harvester.state = HarvesterState::Returning(depot_id);
                    } else {
                        harvester.state = HarvesterState::Idle;
                    }
                }
            }
        }
    }

    // Update income rate estimation (based on active harvesters)
    let active_harvesters: i32 = harvesters
        .iter()
        .filter(|(_, h, _)| matches!(h.state, HarvesterState::Gathering(_)))
        .map(|(_, h, _)| h.gather_rate)
        .sum();
    player_economy.income_rate = active_harvesters;

    events
}

/// Find the nearest non-depleted resource node.
fn find_nearest_node(
    pos: Vec2Fixed,
    nodes: &[(EntityId, &mut ResourceNode, &Vec2Fixed)],
) -> Option<EntityId> {
    nodes
        .iter()
        .filter(|(_, node, _)| !node.is_depleted())
        .min_by_key(|(_, _, node_pos)| {
            let dist = pos.distance_squared(**node_pos);
            dist.to_bits()
        })
        .map(|(id, _, _)| *id)
}

/// Find the nearest depot.
fn find_nearest_depot(pos: Vec2Fixed, depots: &[(EntityId, &Vec2Fixed)]) -> Option<EntityId> {
    depots
        .iter()
        .min_by_key(|(_, depot_pos)| {
            let dist = pos.distance_squared(**depot_pos);
            dist.to_bits()
        })
        .map(|(id, _)| *id)
}

/// Check if two positions are within interaction range.
fn is_within_range(a: Vec2Fixed, b: Vec2Fixed) -> bool {
    let dist_sq = a.distance_squared(b);
    dist_sq.to_bits() <= INTERACTION_DISTANCE_SQ * (1i64 << 32) // Account for Fixed scaling
}
