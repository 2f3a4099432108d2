//! Building placement and construction system.
//!
//! Handles placement validation, construction progress, and NavGrid integration
//! for buildings in the game world.
//!
//! All calculations use fixed-point math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Position};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::pathfinding::{CellType, NavGrid};
use crate::production::Building;

// ============================================================================
// Placement Grid
// ============================================================================

/// State of a cell in the placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementCell {
    /// Cell is empty and available for building.
    Empty,
    /// Cell is occupied by a building entity.
    Occupied(EntityId),
    /// Cell is blocked by terrain or resources.
    Blocked,
}

impl Default for PlacementCell {
    fn default() -> Self {
        Self::Empty
    }
}

/// Grid for tracking building placement.
///
/// Separate from NavGrid to allow independent tracking of building
/// footprints vs navigation obstacles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementGrid {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Cell data stored in row-major order.
    cells: Vec<PlacementCell>,
    /// Size of each cell in world units.
    #[serde(with = "fixed_serde")]
    cell_size: Fixed,
}

impl PlacementGrid {
    /// Create a new placement grid with all cells empty.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, or if `cell_size` is not positive.
    #[must_use]
    pub fn new(width: u32, height: u32, cell_size: Fixed) -> Self {
        assert!(width > 0, "PlacementGrid width must be positive");
        assert!(height > 0, "PlacementGrid height must be positive");
        assert!(
            cell_size > Fixed::ZERO,
            "PlacementGrid cell_size must be positive"
        );

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![PlacementCell::Empty; cell_count],
            cell_size,
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Cell size in world units.
    #[must_use]
    pub const fn cell_size(&self) -> Fixed {
        self.cell_size
    }

    /// Convert (x, y) coordinates to grid index.
    #[inline]
    fn coords_to_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Check if coordinates are within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Get cell state at coordinates.
    /// Returns `None` if out of bounds.
    #[must_use]
    pub fn get_cell(&self, x: u32, y: u32) -> Option<PlacementCell> {
        if self.in_bounds(x, y) {
            Some(self.cells[self.coords_to_index(x, y)])
        } else {
            None
        }
    }

    /// Set cell state at coordinates.
    /// Returns `false` if out of bounds.
    pub fn set_cell(&mut self, x: u32, y: u32, cell: PlacementCell) -> bool {
        if self.in_bounds(x, y) {
            let index = self.coords_to_index(x, y);
            self.cells[index] = cell;
            true
        } else {
            false
        }
    }

    /// Convert world position to grid coordinates.
    ///
    /// Returns `None` if the position is outside the grid bounds.
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec2Fixed) -> Option<(u32, u32)> {
        // Handle negative positions
        if pos.x < Fixed::ZERO || pos.y < Fixed::ZERO {
            return None;
        }

        let x = (pos.x / self.cell_size).to_num::<i64>();
        let y = (pos.y / self.cell_size).to_num::<i64>();

        // Check bounds
        if x >= 0 && x < self.width as i64 && y >= 0 && y < self.height as i64 {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }

    /// Convert grid coordinates to world position (corner of cell).
    #[must_use]
    pub fn grid_to_world(&self, x: u32, y: u32) -> Vec2Fixed {
        Vec2Fixed::new(
            Fixed::from_num(x) * self.cell_size,
            Fixed::from_num(y) * self.cell_size,
        )
    }

    /// Snap a world position to grid alignment.
    #[must_use]
    pub fn snap_to_grid(&self, pos: Vec2Fixed) -> Vec2Fixed {
        let x = (pos.x / self.cell_size).floor() * self.cell_size;
        let y = (pos.y / self.cell_size).floor() * self.cell_size;
        Vec2Fixed::new(x, y)
    }

    /// Check if a cell is available for placement.
    #[must_use]
    pub fn is_available(&self, x: u32, y: u32) -> bool {
        matches!(self.get_cell(x, y), Some(PlacementCell::Empty))
    }

    /// Mark cells as occupied by a building.
    ///
    /// Returns `false` if any cell is out of bounds.
    pub fn occupy_cells(
        &mut self,
        start_x: u32,
        start_y: u32,
        footprint: &BuildingFootprint,
        entity_id: EntityId,
    ) -> bool {
        // First verify all cells are in bounds
        for dy in 0..footprint.height {
            for dx in 0..footprint.width {
                if !self.in_bounds(start_x + dx, start_y + dy) {
                    return false;
                }
            }
        }

        // Mark all cells as occupied
        for dy in 0..footprint.height {
            for dx in 0..footprint.width {
                self.set_cell(
                    start_x + dx,
                    start_y + dy,
                    PlacementCell::Occupied(entity_id),
                );
            }
        }

        true
    }

    /// Clear cells occupied by a building.
    pub fn clear_cells(&mut self, start_x: u32, start_y: u32, footprint: &BuildingFootprint) {
        for dy in 0..footprint.height {
            for dx in 0..footprint.width {
                let x = start_x + dx;
                let y = start_y + dy;
                if self.in_bounds(x, y) {
                    self.set_cell(x, y, PlacementCell::Empty);
                }
            }
        }
    }
}

// ============================================================================
// Building Footprint
// ============================================================================

/// Defines the size of a building in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingFootprint {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl BuildingFootprint {
    /// Create a new building footprint.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Create a square footprint.
    #[must_use]
    pub const fn square(size: u32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }

    /// Get the total number of cells this footprint covers.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.width * self.height
    }
}

impl Default for BuildingFootprint {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

// ============================================================================
// Placement Validation
// ============================================================================

/// Minimum distance in cells from resource nodes.
pub const MIN_RESOURCE_DISTANCE: u32 = 2;

/// Result of placement validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementResult {
    /// Placement is valid.
    Valid,
    /// One or more cells are blocked.
    Blocked {
        /// List of blocked cell coordinates.
        cells: Vec<(u32, u32)>,
    },
    /// Building would be placed outside grid bounds.
    OutOfBounds,
    /// Building is too close to a resource node.
    TooCloseToResource,
}

impl PlacementResult {
    /// Check if placement is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, PlacementResult::Valid)
    }
}

/// Check if a building can be placed at the given position.
///
/// This function validates:
/// - All cells are within grid bounds
/// - All cells are empty (not blocked or occupied)
///
/// # Arguments
///
/// * `grid` - The placement grid to check against
/// * `position` - World position for the building (will be snapped to grid)
/// * `footprint` - Size of the building
///
/// # Returns
///
/// A `PlacementResult` indicating whether placement is valid or why it failed.
#[must_use]
pub fn can_place_building(
    grid: &PlacementGrid,
    position: Vec2Fixed,
    footprint: &BuildingFootprint,
) -> PlacementResult {
    // Convert world position to grid coordinates
    let Some((start_x, start_y)) = grid.world_to_grid(position) else {
        return PlacementResult::OutOfBounds;
    };

    // Check if entire footprint is in bounds
    if start_x + footprint.width > grid.width() || start_y + footprint.height > grid.height() {
        return PlacementResult::OutOfBounds;
    }

    // Check each cell in the footprint
    let mut blocked_cells = Vec::new();

    for dy in 0..footprint.height {
        for dx in 0..footprint.width {
            let x = start_x + dx;
            let y = start_y + dy;

            match grid.get_cell(x, y) {
                Some(PlacementCell::Empty) => {
                    // Cell is available
                }
                Some(PlacementCell::Occupied(_)) | Some(PlacementCell::Blocked) => {
                    blocked_cells.push((x, y));
                }
                None => {
                    return PlacementResult::OutOfBounds;
                }
            }
        }
    }

    if blocked_cells.is_empty() {
        PlacementResult::Valid
    } else {
        PlacementResult::Blocked {
            cells: blocked_cells,
        }
    }
}

/// Check if a building can be placed, also checking distance from resources.
///
/// This is a more thorough check that includes resource proximity validation.
#[must_use]
pub fn can_place_building_with_resource_check(
    grid: &PlacementGrid,
    position: Vec2Fixed,
    footprint: &BuildingFootprint,
    resource_positions: &[(u32, u32)],
) -> PlacementResult {
    // First do basic placement check
    let basic_result = can_place_building(grid, position, footprint);
    if !basic_result.is_valid() {
        return basic_result;
    }

    // Get grid coordinates
    let Some((start_x, start_y)) = grid.world_to_grid(position) else {
        return PlacementResult::OutOfBounds;
    };

    // Check distance from each resource
    for &(res_x, res_y) in resource_positions {
        for dy in 0..footprint.height {
            for dx in 0..footprint.width {
                let x = start_x + dx;
                let y = start_y + dy;

                // Calculate Chebyshev (chessboard) distance
                let dist_x = x.abs_diff(res_x);
                let dist_y = y.abs_diff(res_y);
                let distance = dist_x.max(dist_y);

                if distance < MIN_RESOURCE_DISTANCE {
                    return PlacementResult::TooCloseToResource;
                }
            }
        }
    }

    PlacementResult::Valid
}

// ============================================================================
// Construction System
// ============================================================================

/// Events generated by the construction system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionEvent {
    /// Construction has progressed.
    ConstructionProgress {
        /// The building entity.
        building: EntityId,
        /// Current progress in ticks.
        progress: u32,
        /// Total construction time in ticks.
        total: u32,
    },
    /// Construction has completed.
    ConstructionComplete {
        /// The building entity.
        building: EntityId,
    },
}

/// Advance construction for all buildings under construction.
///
/// # Arguments
///
/// * `buildings` - Tuples of (entity_id, building_component, position)
/// * `tick` - Current simulation tick
///
/// # Returns
///
/// A vector of construction events that occurred this tick.
pub fn construction_system(
    buildings: &mut [(EntityId, &mut Building, &Position)],
    _tick: u64,
) -> Vec<ConstructionEvent> {
    let mut events = Vec::new();

    for (entity_id, building, _position) in buildings.iter_mut() {
        // Skip already constructed buildings
        if building.is_constructed {
            continue;
        }

        // Advance construction
        let just_completed = building.tick_construction();

        if just_completed {
            events.push(ConstructionEvent::ConstructionComplete {
                building: *entity_id,
            });
        } else if !building.is_constructed {
            // Emit progress event
            events.push(ConstructionEvent::ConstructionProgress {
                building: *entity_id,
                progress: building.construction_progress,
                total: building.construction_total,
            });
        }
    }

    events
}

// ============================================================================
// Placement Preview (Ghost Building)
// ============================================================================

/// Data for rendering a building placement preview.
///
/// This is used by the UI to show where a building will be placed
/// and whether the placement is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Snapped world position for the building.
    pub position: Vec2Fixed,
    /// Building footprint.
    pub footprint: BuildingFootprint,
    /// Whether the current placement is valid.
    pub is_valid: bool,
    /// Cells that are blocked (if any).
    pub blocked_cells: Vec<(u32, u32)>,
}

impl PlacementPreview {
    /// Create a new placement preview.
    ///
    /// Automatically validates the placement and populates blocked cells.
    #[must_use]
    pub fn new(grid: &PlacementGrid, position: Vec2Fixed, footprint: BuildingFootprint) -> Self {
        let snapped_position = grid.snap_to_grid(position);
        let result = can_place_building(grid, snapped_position, &footprint);

        let (is_valid, blocked_cells) = match result {
            PlacementResult::Valid => (true, Vec::new()),
            PlacementResult::Blocked { cells } => (false, cells),
            PlacementResult::OutOfBounds | PlacementResult::TooCloseToResource => {
                (false, Vec::new())
            }
        };

        Self {
            position: snapped_position,
            footprint,
            is_valid,
            blocked_cells,
        }
    }

    /// Get all cells covered by this preview.
    #[must_use]
    pub fn get_footprint_cells(&self, grid: &PlacementGrid) -> Vec<(u32, u32)> {
        let mut cells = Vec::new();

        if let Some((start_x, start_y)) = grid.world_to_grid(self.position) {
            for dy in 0..self.footprint.height {
                for dx in 0..self.footprint.width {
                    cells.push((start_x + dx, start_y + dy));
                }
            }
        }

        cells
    }
}

// ============================================================================
// NavGrid Integration
// ============================================================================

/// Mark cells in the NavGrid as blocked when a building is placed.
///
/// Call this after successfully placing a building to update pathfinding.
pub fn mark_building_in_navgrid(
    nav_grid: &mut NavGrid,
    placement_grid: &PlacementGrid,
    position: Vec2Fixed,
    footprint: &BuildingFootprint,
) {
    if let Some((start_x, start_y)) = placement_grid.world_to_grid(position) {
        for dy in 0..footprint.height {
            for dx in 0..footprint.width {
                let x = start_x + dx;
                let y = start_y + dy;
                nav_grid.set_cell(x, y, CellType::Blocked);
            }
        }
    }
}

/// Clear cells in the NavGrid when a building is destroyed.
///
/// Call this when a building is removed to restore pathfinding.
pub fn clear_building_from_navgrid(
    nav_grid: &mut NavGrid,
    placement_grid: &PlacementGrid,
    position: Vec2Fixed,
    footprint: &BuildingFootprint,
) {
    if let Some((start_x, start_y)) = placement_grid.world_to_grid(position) {
        for dy in 0..footprint.height {
            for dx in 0..footprint.width {
                let x = start_x + dx;
                let y = start_y + dy;
                nav_grid.set_cell(x, y, CellType::Walkable);
            }
        }
    }
}

/// Place a building, updating both placement grid and nav grid.
///
/// This is a convenience function that handles:
/// 1. Validating placement
/// 2. Marking cells as occupied in PlacementGrid
/// 3. Blocking cells in NavGrid
///
/// # Returns
///
/// `true` if placement succeeded, `false` otherwise.
pub fn place_building(
    placement_grid: &mut PlacementGrid,
    nav_grid: &mut NavGrid,
    position: Vec2Fixed,
    footprint: &BuildingFootprint,
    entity_id: EntityId,
) -> bool {
    // Validate placement first
    if !can_place_building(placement_grid, position, footprint).is_valid() {
        return false;
    }

    let Some((start_x, start_y)) = placement_grid.world_to_grid(position) else {
        return false;
    };

    // Update placement grid
    if !placement_grid.occupy_cells(start_x, start_y, footprint, entity_id) {
        return false;
    }

    // Update nav grid
    mark_building_in_navgrid(nav_grid, placement_grid, position, footprint);

    true
}

/// Remove a building, updating both placement grid and nav grid.
///
/// This is a convenience function that handles:
/// 1. Clearing cells in PlacementGrid
/// 2. Unblocking cells in NavGrid
pub fn remove_building(
    placement_grid: &mut PlacementGrid,
    nav_grid: &mut NavGrid,
    position: Vec2Fixed,
    footprint: &BuildingFootprint,
) {
    if let Some((start_x, start_y)) = placement_grid.world_to_grid(position) {
        // Clear placement grid
        placement_grid.clear_cells(start_x, start_y, footprint);

        // Clear nav grid
        clear_building_from_navgrid(nav_grid, placement_grid, position, footprint);
    }
}

// ============================================================================
// Tests
// ============================================================================
