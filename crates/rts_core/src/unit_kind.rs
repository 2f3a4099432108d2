//! Unified unit identity system for data-driven unit types.
//!
//! This module provides a single source of truth for unit identity:
//! - [`UnitKindId`]: Numeric ID for fast, deterministic runtime use
//! - [`UnitRole`]: Bitflags for fast classification queries
//! - [`UnitKindRegistry`]: Maps between IDs and provides metadata
//!
//! # Design Goals
//!
//! - **One system**: Works for both simulation and any embedding front end
//! - **Data-driven**: No hardcoded unit types, everything from RON files
//! - **Fast**: Numeric IDs and bitflags, no string operations at runtime
//! - **Deterministic**: Numeric IDs are stable for networking/replay
//! - **Scalable**: Add new units by editing data files, no code changes

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;

/// Numeric identifier for a unit kind.
///
/// This is the primary identity used everywhere at runtime:
/// - Cheap: `Copy`, 2 bytes
/// - Deterministic: Same value across all clients (derived from sorted load order)
/// - Fast: Array indexing for lookups, no hashing needed
///
/// The ID is assigned when loading faction data and maps to a string ID
/// (like "field_engineer") through the [`UnitKindRegistry`].
///
/// # Example
///
/// ```
/// use rts_core::unit_kind::UnitKindId;
///
/// let id = UnitKindId::new(42);
/// assert_eq!(id.as_u16(), 42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct UnitKindId(u16);

impl UnitKindId {
    /// Sentinel value indicating no unit kind.
    pub const NONE: Self = Self(u16::MAX);

    /// Create a new unit kind ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Check if this is a valid ID (not NONE).
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u16::MAX
    }
}

/// Bitflags for fast unit classification queries.
///
/// Computed from RON `tags` array at load time, then cached per unit.
/// Enables O(1) queries like "is this a ground harvester?"
///
/// # Example
///
/// ```
/// use rts_core::unit_kind::UnitRole;
///
/// let role = UnitRole::GROUND.union(UnitRole::HARVESTER);
/// assert!(role.contains(UnitRole::HARVESTER));
/// assert!(role.intersects(UnitRole::GROUND));
/// assert!(!role.contains(UnitRole::AIR));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitRole(u32);

impl UnitRole {
    // ========================================
    // Movement categories
    // ========================================

    /// Unit moves on ground.
    pub const GROUND: Self = Self(1 << 0);
    /// Unit flies.
    pub const AIR: Self = Self(1 << 1);
    /// Unit moves on water.
    pub const NAVAL: Self = Self(1 << 2);

    // ========================================
    // Combat class
    // ========================================

    /// Infantry unit (typically cheap, numerous).
    pub const INFANTRY: Self = Self(1 << 3);
    /// Vehicle unit (wheeled/tracked).
    pub const VEHICLE: Self = Self(1 << 4);
    /// Mech/walker unit.
    pub const MECH: Self = Self(1 << 5);
    /// Long-range artillery.
    pub const ARTILLERY: Self = Self(1 << 6);

    // ========================================
    // Special roles
    // ========================================

    /// Harvests resources.
    pub const HARVESTER: Self = Self(1 << 7);
    /// Support unit (buffs, repairs, etc.).
    pub const SUPPORT: Self = Self(1 << 8);
    /// Fast reconnaissance unit.
    pub const SCOUT: Self = Self(1 << 9);
    /// Can transport other units.
    pub const TRANSPORT: Self = Self(1 << 10);
    /// Can heal other units.
    pub const HEALER: Self = Self(1 << 11);
    /// Can construct buildings.
    pub const BUILDER: Self = Self(1 << 12);

    // ========================================
    // Tier classification
    // ========================================

    /// Tier 1 (early game).
    pub const TIER_1: Self = Self(1 << 13);
    /// Tier 2 (mid game).
    pub const TIER_2: Self = Self(1 << 14);
    /// Tier 3 (late game).
    pub const TIER_3: Self = Self(1 << 15);

    // ========================================
    // Combat capability
    // ========================================

    /// Can attack (has combat stats).
    pub const COMBATANT: Self = Self(1 << 16);

    // ========================================
    // Methods
    // ========================================

    /// Empty role (no flags set).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two roles (union of flags).
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Get raw bits for serialization.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Create from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Build role flags from RON tags and unit metadata.
    ///
    /// Called once at load time for each unit definition.
    #[must_use]
    pub fn from_tags(tags: &[String], tier: u8, has_combat: bool) -> Self {
        let mut role = Self::empty();

        for tag in tags {
            let flag = match tag.as_str() {
                // Movement
                "ground" => Self::GROUND,
                "air" => Self::AIR,
                "naval" => Self::NAVAL,
                // Combat class
                "infantry" => Self::INFANTRY,
                "vehicle" => Self::VEHICLE,
                "mech" => Self::MECH,
                "artillery" => Self::ARTILLERY,
                // Special roles
                "harvester" => Self::HARVESTER,
                "support" => Self::SUPPORT,
                "scout" => Self::SCOUT,
                "transport" => Self::TRANSPORT,
                "healer" => Self::HEALER,
                "builder" | "repair" => Self::BUILDER,
                // Unknown tags are ignored (allows future expansion)
                _ => Self::empty(),
            };
            role = role.union(flag);
        }

        // Set tier flag
        role = role.union(match tier {
            1 => Self::TIER_1,
            2 => Self::TIER_2,
            3 => Self::TIER_3,
            _ => Self::empty(),
        });

        // Set combat capability
        if has_combat {
            role = role.union(Self::COMBATANT);
        }

        role
    }
}

// Implement BitOr for ergonomic flag combination
impl std::ops::BitOr for UnitRole {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for UnitRole {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Metadata about a unit kind, stored in the registry.
#[derive(Clone, Debug)]
pub struct UnitKindInfo {
    /// Numeric ID (index in registry).
    pub id: UnitKindId,
    /// String ID from RON data (e.g., "field_engineer").
    pub string_id: String,
    /// Faction this unit belongs to.
    pub faction: FactionId,
    /// Cached role flags for fast queries.
    pub role: UnitRole,
}

/// Central registry mapping between unit identities.
///
/// Built once at data load time, then used for lookups throughout
/// the game. Provides O(1) access by numeric ID.
///
/// # Thread Safety
///
/// The registry is immutable after construction, so it can be
/// safely shared across threads (wrapped in Arc if needed).
#[derive(Default, Debug)]
pub struct UnitKindRegistry {
    /// Lookup by numeric ID (O(1) array index).
    by_id: Vec<UnitKindInfo>,
    /// Lookup by (faction, string_id) → numeric ID.
    by_string: HashMap<(FactionId, String), UnitKindId>,
}

impl UnitKindRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit kind and return its assigned numeric ID.
    ///
    /// # Arguments
    ///
    /// * `faction` - The faction this unit belongs to
    /// * `string_id` - The string ID from RON data
    /// * `role` - Pre-computed role flags
    ///
    /// # Returns
    ///
    /// The assigned `UnitKindId` for this unit.
    pub fn register(&mut self, faction: FactionId, string_id: &str, role: UnitRole) -> UnitKindId {
        // Check for duplicate registration
        if let Some(&existing) = self.by_string.get(&(faction, string_id.to_string())) {
            return existing;
        }

        let id = UnitKindId::new(self.by_id.len() as u16);
        let info = UnitKindInfo {
            id,
            string_id: string_id.to_string(),
            faction,
            role,
        };

        self.by_id.push(info);
        self.by_string.insert((faction, string_id.to_string()), id);

        id
    }

    /// Get unit info by numeric ID. O(1) array lookup.
    #[inline]
    #[must_use]
    pub fn get(&self, id: UnitKindId) -> Option<&UnitKindInfo> {
        if !id.is_valid() {
            return None;
        }
        self.by_id.get(id.0 as usize)
    }

    /// Find a unit's numeric ID by faction and string ID.
    ///
    /// Used when spawning from data (UI selection, etc.).
    #[must_use]
    pub fn find(&self, faction: FactionId, string_id: &str) -> Option<UnitKindId> {
        self.by_string
            .get(&(faction, string_id.to_string()))
            .copied()
    }

    /// Get role flags for a unit kind. O(1).
    ///
    /// Returns `UnitRole::empty()` if the ID is invalid.
    #[inline]
    #[must_use]
    pub fn role(&self, id: UnitKindId) -> UnitRole {
        self.get(id).map_or(UnitRole::empty(), |info| info.role)
    }

    /// Get the string ID for a unit kind. O(1).
    #[must_use]
    pub fn string_id(&self, id: UnitKindId) -> Option<&str> {
        self.get(id).map(|info| info.string_id.as_str())
    }

    /// Get the faction for a unit kind. O(1).
    #[must_use]
    pub fn faction(&self, id: UnitKindId) -> Option<FactionId> {
        self.get(id).map(|info| info.faction)
    }

    /// Get all registered unit kinds.
    pub fn all(&self) -> impl Iterator<Item = &UnitKindInfo> {
        self.by_id.iter()
    }

    /// Get all unit kinds for a specific faction.
    pub fn by_faction(&self, faction: FactionId) -> impl Iterator<Item = &UnitKindInfo> {
        self.by_id
            .iter()
            .filter(move |info| info.faction == faction)
    }

    /// Get all unit kinds matching a role.
    pub fn by_role(&self, role: UnitRole) -> impl Iterator<Item = &UnitKindInfo> {
        self.by_id
            .iter()
            .filter(move |info| info.role.contains(role))
    }

    /// Total number of registered unit kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
