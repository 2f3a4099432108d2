//! End-to-end scenarios driving [`AiEngine`] purely through its public API
//! and [`FixtureHost`], one per representative decision the engine has to
//! make across a game (§8).

use rts_ai::engine::AiEngine;
use rts_ai::hex::HexCoord;
use rts_ai::host::{
    AttackTarget, BuildCap, BuildingDescriptorView, Command, EconomyId, FixtureHost, FlagId,
    FlagView, ImmovableKind, MilitaryStrength, Notification, RoadId, RoadView, WareId,
};
use rts_ai::personality::EnginePersonality;
use rts_core::production::BuildingTypeId;

fn flag(id: u64, coords: HexCoord, economy: EconomyId, wares: u32) -> FlagView {
    FlagView {
        id: FlagId(id),
        coords,
        economy,
        wares,
    }
}

#[test]
fn first_lumberjack_is_forced_on_the_first_tick() {
    let coords = HexCoord::new(0, 0);
    let mut host = FixtureHost::new(1);
    host.owners.insert(coords, 1);
    host.caps.insert(coords, BuildCap::Small);

    let bt = BuildingTypeId(1);
    host.descriptors.insert(
        bt,
        BuildingDescriptorView {
            name: "lumberjack".into(),
            size: BuildCap::Small,
            need_trees: true,
            ..Default::default()
        },
    );

    let mut engine = AiEngine::new(EnginePersonality::default());
    engine.notify(0, Notification::FieldGained(coords));
    engine.register_building_types(&host);

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
fn overbuilt_tree_producer_is_not_replicated() {
    let coords = HexCoord::new(0, 0);
    let mut host = FixtureHost::new(1);
    host.owners.insert(coords, 1);
    host.caps.insert(coords, BuildCap::Small);
    // Two trees within scan radius so the third-and-later lumberjack scoring
    // branch is reached (cnt_built >= 2) instead of the always-forced first
    // two.
    host.immovables.insert(HexCoord::new(1, 0), ImmovableKind::Tree);
    host.immovables.insert(HexCoord::new(0, 1), ImmovableKind::Tree);

    let bt = BuildingTypeId(1);
    host.descriptors.insert(
        bt,
        BuildingDescriptorView {
            name: "lumberjack".into(),
            size: BuildCap::Small,
            need_trees: true,
            ..Default::default()
        },
    );

    let mut engine = AiEngine::new(EnginePersonality::default());
    engine.notify(0, Notification::FieldGained(coords));
    engine.register_building_types(&host);

    // Two already-built lumberjacks: the planner has no reason to want a
    // third this badly once the tribe's too-few-mines regime kicks in.
    engine.notify(
        0,
        Notification::ImmovableGained {
            coords,
            kind: ImmovableKind::Building { building: bt, site: 101 },
        },
    );
    engine.notify(
        0,
        Notification::ImmovableGained {
            coords,
            kind: ImmovableKind::Building { building: bt, site: 102 },
        },
    );

    let emitted = engine.think(&mut host, 0);
    assert!(!emitted);
}

#[test]
fn overstocked_well_is_dismantled() {
    let coords = HexCoord::new(0, 0);
    let mut host = FixtureHost::new(1);

    let bt = BuildingTypeId(4);
    let ware = WareId(0);
    host.descriptors.insert(
        bt,
        BuildingDescriptorView {
            name: "well".into(),
            size: BuildCap::Small,
            mines_water: true,
            outputs: vec![ware],
            ..Default::default()
        },
    );

    let mut engine = AiEngine::new(EnginePersonality::default());
    engine.register_building_types(&host);

    let site = 55u64;
    let economy = EconomyId(1);
    host.site_economies.insert(site, economy);
    host.economy_stock.insert((economy, ware), 300);

    engine.notify(
        0,
        Notification::ImmovableGained {
            coords,
            kind: ImmovableKind::Building { building: bt, site },
        },
    );

    let emitted = engine.think(&mut host, 0);
    assert!(emitted);
    assert_eq!(host.commands[0], Command::Dismantle(site));
}

#[test]
fn overlong_road_is_split_at_a_flaggable_tile() {
    let mut host = FixtureHost::new(1);
    let mut engine = AiEngine::new(EnginePersonality::default());

    // Enough owned, buildable territory that the split/bulldoze check
    // doesn't bail out early for lack of free spots.
    for i in 0..25 {
        let c = HexCoord::new(i, 1);
        host.owners.insert(c, 1);
        host.caps.insert(c, BuildCap::Small);
        engine.notify(0, Notification::FieldGained(c));
    }

    let path = vec![
        HexCoord::new(0, 0),
        HexCoord::new(1, 0),
        HexCoord::new(2, 0),
        HexCoord::new(3, 0),
        HexCoord::new(4, 0),
    ];
    host.roads.push(RoadView {
        id: RoadId(9),
        from: FlagId(1),
        to: FlagId(2),
        path,
    });
    host.flaggable.insert(HexCoord::new(2, 0));

    let emitted = engine.think(&mut host, 0);
    assert!(emitted);
    assert_eq!(host.commands[0], Command::BuildFlag(HexCoord::new(2, 0)));
}

#[test]
fn favorable_strength_ratio_triggers_an_attack() {
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

    let mut engine = AiEngine::new(EnginePersonality::default());
    let emitted = engine.think(&mut host, 0);
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
fn stranded_economy_is_eventually_bulldozed() {
    let coords = HexCoord::new(0, 0);
    let mut host = FixtureHost::new(1);
    let economy = EconomyId(1);
    host.flags.push(flag(1, coords, economy, 0));
    host.roads.push(RoadView {
        id: RoadId(5),
        from: FlagId(1),
        to: FlagId(2),
        path: vec![coords, HexCoord::new(1, 0)],
    });
    // No warehouse in this economy: every shortcut attempt counts as a
    // failed connection, eventually crossing the give-up threshold.

    let mut engine = AiEngine::new(EnginePersonality::default());

    let mut bulldozed = false;
    for i in 0..8u64 {
        let tick = i * 1_000;
        if engine.think(&mut host, tick) {
            bulldozed = true;
            break;
        }
    }

    assert!(bulldozed);
    assert!(host.commands.iter().any(|c| matches!(c, Command::Bulldoze(1))));
}
