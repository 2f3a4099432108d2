//! Attack Planner (§4.7): compare military strength against each opponent
//! and, when favorable, probe a sample of our own military sites for a
//! worthwhile target.

use tracing::info;

use crate::host::{AttackTarget, Command, HostView};
use crate::personality::EnginePersonality;

/// Nearby-defender penalty: subtracted once per (defender × reinforcement)
/// pair, so a well-backed target becomes unattractive quickly.
pub const DEFEND_READY_PENALTY_WEIGHT: u32 = 1;
/// Minimum post-penalty chance (`found_attackers − present_defenders −
/// penalty`) required to attack at all.
pub const MIN_ATTACK_CHANCE: i64 = 2;
/// Warehouses (assumed undefended) get this multiplicative priority push.
pub const WAREHOUSE_PRIORITY_MULTIPLIER: i64 = 2;

/// A splitmix-style counter seeded from game-time, never wall-clock (§5, §9):
/// the same deterministic-integer-folding idiom as
/// `rts_core::pathfinding`'s `coords_to_tie_breaker`, extended into a tiny
/// stateful stepper so repeated draws from one `think()` call diverge.
#[derive(Debug, Clone, Copy)]
struct TickRng {
    state: u64,
}

impl TickRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E3779B97F4A7C15),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5DEECE66D).wrapping_add(11);
        self.state
    }

    /// A value in `0..bound`, or `0` if `bound` is zero.
    fn next_below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        (self.next() % bound as u64) as usize
    }
}

struct ScoredTarget {
    target: AttackTarget,
    chance: i64,
}

/// Run one attack consideration. Returns `true` if an attack command was
/// emitted — the scheduler uses this to pick the 40s vs 120s cadence
/// (§4.1/§4.7).
pub fn run_attack_consideration(host: &mut impl HostView, personality: &EnginePersonality, current_tick: u64) -> bool {
    let own_strength = host.military_strength(host.player_id()).map_or(0, |s| s.0);

    let threshold = personality.aggressiveness.attack_threshold();
    let attackable_opponents: Vec<u32> = host
        .opponents()
        .into_iter()
        .filter(|&opponent| {
            let Some(their_strength) = host.military_strength(opponent) else {
                return false;
            };
            if their_strength.0 == 0 {
                return true;
            }
            let ratio = own_strength as u64 * 100 / their_strength.0 as u64;
            ratio > threshold as u64
        })
        .collect();

    if attackable_opponents.is_empty() {
        return false;
    }

    let own_sites = host.own_military_sites();
    if own_sites.is_empty() {
        return false;
    }
    let sample_size = (own_sites.len() / 6 + 1).min(own_sites.len());

    let mut rng = TickRng::new(current_tick);
    let mut remaining = own_sites;
    let mut sampled = Vec::with_capacity(sample_size);
    for _ in 0..sample_size {
        let idx = rng.next_below(remaining.len());
        sampled.push(remaining.swap_remove(idx));
    }

    let mut best: Option<ScoredTarget> = None;
    for site in sampled {
        for target in host.attackable_targets(site) {
            if !attackable_opponents.contains(&target.owner) {
                continue;
            }
            let found_attackers = host.find_attack_soldiers(target.flag) as i64;
            let penalty = target.present_defenders as i64
                * target.defend_ready_nearby as i64
                * DEFEND_READY_PENALTY_WEIGHT as i64;
            let mut chance = found_attackers - target.present_defenders as i64 - penalty;
            if target.is_warehouse {
                chance *= WAREHOUSE_PRIORITY_MULTIPLIER;
            }
            if chance < MIN_ATTACK_CHANCE {
                continue;
            }
            let is_better = match &best {
                Some(b) => chance > b.chance,
                None => true,
            };
            if is_better {
                best = Some(ScoredTarget { target, chance });
            }
        }
    }

    let Some(best) = best else {
        return false;
    };

    let attackers = host.find_attack_soldiers(best.target.flag);
    info!(
        flag_id = ?best.target.flag,
        owner = best.target.owner,
        attackers,
        chance = best.chance,
        "attack planner emitting enemy flag action"
    );
    host.push_command(Command::EnemyFlagAction {
        target_flag: best.target.flag,
        attackers_player: host.player_id(),
        count: attackers,
    });

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FixtureHost, FlagId, MilitaryStrength};
    use crate::personality::{Aggressiveness, EnginePersonality};

    fn personality_with(aggressiveness: Aggressiveness) -> EnginePersonality {
        EnginePersonality {
            aggressiveness,
            ..EnginePersonality::default()
        }
    }

    #[test]
    fn no_opponents_means_no_attack() {
        let mut host = FixtureHost::new(1);
        host.military_site_ids.push(1);
        let personality = EnginePersonality::default();
        assert!(!run_attack_consideration(&mut host, &personality, 0));
    }

    #[test]
    fn equal_ratio_is_not_attackable() {
        let mut host = FixtureHost::new(1);
        host.strengths.insert(1, MilitaryStrength(100));
        host.strengths.insert(2, MilitaryStrength(100));
        host.military_site_ids.push(1);
        let personality = personality_with(Aggressiveness::Normal);
        assert!(!run_attack_consideration(&mut host, &personality, 0));
    }

    #[test]
    fn zero_strength_opponent_is_always_attackable() {
        let mut host = FixtureHost::new(1);
        host.strengths.insert(1, MilitaryStrength(50));
        host.strengths.insert(2, MilitaryStrength(0));
        host.military_site_ids.push(10);
        host.attack_targets.insert(
            10,
            vec![AttackTarget {
                flag: FlagId(99),
                owner: 2,
                is_warehouse: false,
                present_defenders: 1,
                defend_ready_nearby: 0,
            }],
        );
        host.attack_soldiers.insert(FlagId(99), 5);

        let personality = EnginePersonality::default();
        let emitted = run_attack_consideration(&mut host, &personality, 0);
        assert!(emitted);
        assert_eq!(
            host.commands[0],
            Command::EnemyFlagAction {
                target_flag: FlagId(99),
                attackers_player: 1,
                count: 5,
            }
        );
    }

    #[test]
    fn warehouse_gets_priority_push_over_stronger_chance() {
        let mut host = FixtureHost::new(1);
        host.strengths.insert(1, MilitaryStrength(1000));
        host.strengths.insert(2, MilitaryStrength(1));
        host.military_site_ids.push(10);
        host.attack_targets.insert(
            10,
            vec![
                AttackTarget {
                    flag: FlagId(1),
                    owner: 2,
                    is_warehouse: false,
                    present_defenders: 0,
                    defend_ready_nearby: 0,
                },
                AttackTarget {
                    flag: FlagId(2),
                    owner: 2,
                    is_warehouse: true,
                    present_defenders: 0,
                    defend_ready_nearby: 0,
                },
            ],
        );
        host.attack_soldiers.insert(FlagId(1), 3);
        host.attack_soldiers.insert(FlagId(2), 3);

        let personality = EnginePersonality::default();
        let emitted = run_attack_consideration(&mut host, &personality, 0);
        assert!(emitted);
        assert_eq!(
            host.commands[0],
            Command::EnemyFlagAction {
                target_flag: FlagId(2),
                attackers_player: 1,
                count: 3,
            }
        );
    }

    #[test]
    fn below_min_chance_is_rejected() {
        let mut host = FixtureHost::new(1);
        host.strengths.insert(1, MilitaryStrength(1000));
        host.strengths.insert(2, MilitaryStrength(1));
        host.military_site_ids.push(10);
        host.attack_targets.insert(
            10,
            vec![AttackTarget {
                flag: FlagId(1),
                owner: 2,
                is_warehouse: false,
                present_defenders: 5,
                defend_ready_nearby: 5,
            }],
        );
        host.attack_soldiers.insert(FlagId(1), 6);

        let personality = EnginePersonality::default();
        assert!(!run_attack_consideration(&mut host, &personality, 0));
    }

    #[test]
    fn rng_is_deterministic_for_same_seed() {
        let mut a = TickRng::new(42);
        let mut b = TickRng::new(42);
        for _ in 0..20 {
            assert_eq!(a.next(), b.next());
        }
    }
}
