//! Data-driven tunable constants (§4 ambient stack).
//!
//! Grouped into one RON-loadable struct in the idiom of
//! `rts_core::data::building_data::BuildingData`'s `ron::from_str`-based
//! loading. The [`Default`] impl supplies exactly the numbers given in the
//! design spec, so behavior is unchanged unless a host opts into a custom
//! personality.

use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};

/// Attack-aggressiveness posture (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggressiveness {
    /// Attack when strength ratio exceeds 80.
    Aggressive,
    /// Attack when strength ratio exceeds 100.
    Normal,
    /// Attack when strength ratio exceeds 120.
    Defensive,
}

impl Aggressiveness {
    /// The strength-ratio threshold (percent) above which an opponent is
    /// attackable under this posture. The comparison is strictly `>`
    /// (§8 boundary behavior: equal ratio is not attackable).
    #[must_use]
    pub const fn attack_threshold(self) -> u32 {
        match self {
            Aggressiveness::Aggressive => 80,
            Aggressiveness::Normal => 100,
            Aggressiveness::Defensive => 120,
        }
    }
}

/// Tunable engine-wide constants.
///
/// # Example RON
///
/// ```ron
/// (
///     aggressiveness: Normal,
///     lumberjack_target_base: 3,
///     ranger_target_base: 2,
///     warehouse_spacing: 35,
///     training_site_first_after: 20,
///     training_site_interval: 50,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnginePersonality {
    /// Attack Planner posture.
    pub aggressiveness: Aggressiveness,
    /// Base lumberjack target before the `(mines+productionsites)/15` bonus.
    pub lumberjack_target_base: u32,
    /// Base ranger (tree planter) target before the same bonus.
    pub ranger_target_base: u32,
    /// One warehouse per this many production+mine sites.
    pub warehouse_spacing: u32,
    /// First training site forced after this many production sites.
    pub training_site_first_after: u32,
    /// Subsequent training sites spaced this many production sites apart.
    pub training_site_interval: u32,
}

impl Default for EnginePersonality {
    fn default() -> Self {
        Self {
            aggressiveness: Aggressiveness::Normal,
            lumberjack_target_base: 3,
            ranger_target_base: 2,
            warehouse_spacing: 35,
            training_site_first_after: 20,
            training_site_interval: 50,
        }
    }
}

impl EnginePersonality {
    /// Parse a personality from a RON document.
    pub fn from_ron_str(ron_str: &str) -> Result<Self> {
        ron::from_str(ron_str).map_err(|e| AiError::ConfigParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let p = EnginePersonality::default();
        assert_eq!(p.aggressiveness.attack_threshold(), 100);
        assert_eq!(p.lumberjack_target_base, 3);
        assert_eq!(p.warehouse_spacing, 35);
    }

    #[test]
    fn attack_thresholds_match_postures() {
        assert_eq!(Aggressiveness::Aggressive.attack_threshold(), 80);
        assert_eq!(Aggressiveness::Normal.attack_threshold(), 100);
        assert_eq!(Aggressiveness::Defensive.attack_threshold(), 120);
    }

    #[test]
    fn parses_from_ron() {
        let ron_str = "(aggressiveness: Aggressive, lumberjack_target_base: 4, ranger_target_base: 2, warehouse_spacing: 30, training_site_first_after: 15, training_site_interval: 40)";
        let p = EnginePersonality::from_ron_str(ron_str).unwrap();
        assert_eq!(p.aggressiveness, Aggressiveness::Aggressive);
        assert_eq!(p.lumberjack_target_base, 4);
    }

    #[test]
    fn rejects_malformed_ron() {
        let result = EnginePersonality::from_ron_str("not valid ron {{{");
        assert!(result.is_err());
    }
}
