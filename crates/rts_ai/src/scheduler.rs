//! The cooperative scheduler (§4.1, §5).
//!
//! All time is game-time in milliseconds; nothing here ever consults a wall
//! clock. The scheduler only tracks *when* each sub-phase is next due —
//! deciding whether a phase actually has work, and doing that work, is
//! [`crate::engine::AiEngine::think`]'s job. This separation keeps the
//! due-time bookkeeping trivially testable on its own.

const BUILDABLE_SWEEP_SPACING_MS: u64 = 6_000;
const ROAD_IMPROVEMENT_SPACING_MS: u64 = 1_000;
const STATISTICS_REFRESH_SPACING_MS: u64 = 10_000;
const CONSTRUCTION_ATTEMPT_SPACING_MS: u64 = 2_000;
const PRODUCTION_SITE_CHECK_SPACING_MS: u64 = 4_000;
const MINE_CHECK_SPACING_MS: u64 = 7_000;
const MILITARY_SITE_CHECK_SPACING_MS: u64 = 5_000;
const HELPER_SITE_CHECK_SPACING_MS: u64 = 180_000;

/// Attack consideration cadence when the last round found a target and
/// attacked (§4.1: "40-120s depending on last outcome").
pub const ATTACK_SPACING_AFTER_ACTION_MS: u64 = 40_000;
/// Attack consideration cadence when the last round found nothing attackable.
pub const ATTACK_SPACING_IDLE_MS: u64 = 120_000;
/// Mine-construction cadence while mines are actively being built.
pub const MINE_CONSTRUCTION_SPACING_BUSY_MS: u64 = 2_000;
/// Mine-construction cadence while idle.
pub const MINE_CONSTRUCTION_SPACING_IDLE_MS: u64 = 22_000;

/// Due-time bookkeeping for every periodic sub-phase.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    buildable_sweep_due: u64,
    road_improvement_due: u64,
    statistics_refresh_due: u64,
    construction_attempt_due: u64,
    production_site_check_due: u64,
    mine_check_due: u64,
    military_site_check_due: u64,
    attack_consideration_due: u64,
    helper_site_check_due: u64,
    mine_construction_due: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        // Every phase is due immediately so the engine's first think() call
        // does useful work rather than waiting out the initial spacing.
        Self {
            buildable_sweep_due: 0,
            road_improvement_due: 0,
            statistics_refresh_due: 0,
            construction_attempt_due: 0,
            production_site_check_due: 0,
            mine_check_due: 0,
            military_site_check_due: 0,
            attack_consideration_due: 0,
            helper_site_check_due: 0,
            mine_construction_due: 0,
        }
    }
}

macro_rules! due_phase {
    ($is_due:ident, $mark:ident, $field:ident) => {
        /// Whether this phase is due at `current_tick`.
        #[must_use]
        pub fn $is_due(&self, current_tick: u64) -> bool {
            current_tick >= self.$field
        }
    };
}

impl Scheduler {
    /// Create a scheduler with every phase due immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    due_phase!(is_buildable_sweep_due, mark_buildable_swept, buildable_sweep_due);
    due_phase!(is_road_improvement_due, mark_road_improved, road_improvement_due);
    due_phase!(is_statistics_due, mark_statistics_refreshed, statistics_refresh_due);
    due_phase!(is_construction_due, mark_construction_attempted, construction_attempt_due);
    due_phase!(is_production_check_due, mark_production_checked, production_site_check_due);
    due_phase!(is_mine_check_due, mark_mine_checked, mine_check_due);
    due_phase!(is_military_check_due, mark_military_checked, military_site_check_due);
    due_phase!(is_attack_due, mark_attack_considered, attack_consideration_due);
    due_phase!(is_helper_site_due, mark_helper_site_checked, helper_site_check_due);
    due_phase!(is_mine_construction_due, mark_mine_construction_considered, mine_construction_due);

    /// Mark the buildable-field sweep done; re-fires after its spacing, but
    /// also whenever ownership changes before then — callers that detect a
    /// change should call [`Scheduler::force_buildable_sweep`] instead.
    pub fn mark_buildable_swept(&mut self, current_tick: u64) {
        self.buildable_sweep_due = current_tick + BUILDABLE_SWEEP_SPACING_MS;
    }

    /// Force the buildable sweep due immediately (ownership changed).
    pub fn force_buildable_sweep(&mut self) {
        self.buildable_sweep_due = 0;
    }

    /// Mark the road-improvement pass done.
    pub fn mark_road_improved(&mut self, current_tick: u64) {
        self.road_improvement_due = current_tick + ROAD_IMPROVEMENT_SPACING_MS;
    }

    /// Mark the statistics refresh done.
    pub fn mark_statistics_refreshed(&mut self, current_tick: u64) {
        self.statistics_refresh_due = current_tick + STATISTICS_REFRESH_SPACING_MS;
    }

    /// Mark a construction attempt done.
    pub fn mark_construction_attempted(&mut self, current_tick: u64) {
        self.construction_attempt_due = current_tick + CONSTRUCTION_ATTEMPT_SPACING_MS;
    }

    /// Mark a production-site check done.
    pub fn mark_production_checked(&mut self, current_tick: u64) {
        self.production_site_check_due = current_tick + PRODUCTION_SITE_CHECK_SPACING_MS;
    }

    /// Mark a mine check done.
    pub fn mark_mine_checked(&mut self, current_tick: u64) {
        self.mine_check_due = current_tick + MINE_CHECK_SPACING_MS;
    }

    /// Mark a military-site check done.
    pub fn mark_military_checked(&mut self, current_tick: u64) {
        self.military_site_check_due = current_tick + MILITARY_SITE_CHECK_SPACING_MS;
    }

    /// Mark an attack consideration done; `action_taken` selects the 40s vs
    /// 120s recurrence per §4.1/§4.7.
    pub fn mark_attack_considered(&mut self, current_tick: u64, action_taken: bool) {
        let spacing = if action_taken {
            ATTACK_SPACING_AFTER_ACTION_MS
        } else {
            ATTACK_SPACING_IDLE_MS
        };
        self.attack_consideration_due = current_tick + spacing;
    }

    /// Mark a helper-site check done.
    pub fn mark_helper_site_checked(&mut self, current_tick: u64) {
        self.helper_site_check_due = current_tick + HELPER_SITE_CHECK_SPACING_MS;
    }

    /// Mark a mine-construction consideration done; `mine_built` selects the
    /// busy (2s) vs idle (22s) cadence per §4.4.
    pub fn mark_mine_construction_considered(&mut self, current_tick: u64, mine_built: bool) {
        let spacing = if mine_built {
            MINE_CONSTRUCTION_SPACING_BUSY_MS
        } else {
            MINE_CONSTRUCTION_SPACING_IDLE_MS
        };
        self.mine_construction_due = current_tick + spacing;
    }
}
