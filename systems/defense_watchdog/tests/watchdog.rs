use armada_core::{
    AssignmentTable, Circle, Command, CommandSet, DefenseTuning, DockingStatus, PlanetId,
    PlanetSnapshot, PlayerId, PlayerSnapshot, Role, RoleKind, ShipId, ShipSnapshot, Snapshot,
    Tuning,
};
use armada_system_defense_watchdog::Watchdog;
use armada_world::World;

const ME: PlayerId = PlayerId::new(0);
const FOE: PlayerId = PlayerId::new(1);

fn ship(id: u32, x: f64, y: f64, docked_planet: Option<u32>) -> ShipSnapshot {
    ShipSnapshot {
        id: ShipId::new(id),
        position: Circle::new(x, y, 0.5),
        health: 255,
        velocity: [0.0, 0.0],
        docking: if docked_planet.is_some() {
            DockingStatus::Docked
        } else {
            DockingStatus::Undocked
        },
        docked_planet: docked_planet.map(PlanetId::new),
    }
}

fn planet(id: u32, x: f64, y: f64, owner: Option<PlayerId>, docked: &[u32]) -> PlanetSnapshot {
    PlanetSnapshot {
        id: PlanetId::new(id),
        position: Circle::new(x, y, 5.0),
        health: 1_000,
        owner,
        docking_spots: 4,
        docked_ships: docked.iter().copied().map(ShipId::new).collect(),
        current_production: 0,
        remaining_resources: 1_000,
    }
}

fn world(
    mine: Vec<ShipSnapshot>,
    foes: Vec<ShipSnapshot>,
    planets: Vec<PlanetSnapshot>,
    table: &AssignmentTable,
) -> World {
    World::new(
        Snapshot {
            turn: 30,
            me: ME,
            width: 240.0,
            height: 160.0,
            players: vec![
                PlayerSnapshot { id: ME, ships: mine },
                PlayerSnapshot { id: FOE, ships: foes },
            ],
            planets,
        },
        table,
    )
}

#[test]
fn undefended_planet_undocks_exactly_one_defender() {
    let mut table = AssignmentTable::new();
    let world = world(
        vec![ship(4, 50.0, 56.0, Some(0)), ship(7, 50.0, 44.0, Some(0))],
        vec![ship(90, 80.0, 50.0, None)],
        vec![planet(0, 50.0, 50.0, Some(ME), &[7, 4])],
        &table,
    );
    let mut commands = CommandSet::new();

    let pulled = Watchdog::new(&Tuning::default()).handle(&world, &mut table, &mut commands);

    assert_eq!(pulled, vec![ShipId::new(4)]);
    assert_eq!(commands.len(), 1);
    assert_eq!(
        commands.get(ShipId::new(4)),
        Some(&Command::Undock { ship: ShipId::new(4) })
    );
    assert_eq!(
        table.role(ShipId::new(4)),
        Some(&Role::Defend {
            anchor: Some(Circle::point(50.0, 50.0)),
        })
    );
    assert_eq!(table.get(ShipId::new(4)).map(|entry| entry.since_turn()), Some(30));
}

#[test]
fn pulls_up_to_the_number_of_approaching_foes() {
    let mut table = AssignmentTable::new();
    let world = world(
        vec![
            ship(3, 50.0, 56.0, Some(0)),
            ship(5, 50.0, 44.0, Some(0)),
            ship(6, 56.0, 50.0, Some(0)),
            ship(8, 44.0, 50.0, Some(0)),
        ],
        vec![ship(90, 80.0, 50.0, None), ship(91, 50.0, 85.0, None)],
        vec![planet(0, 50.0, 50.0, Some(ME), &[3, 5, 6, 8])],
        &table,
    );
    let mut commands = CommandSet::new();

    let pulled = Watchdog::new(&Tuning::default()).handle(&world, &mut table, &mut commands);

    assert_eq!(pulled, vec![ShipId::new(3), ShipId::new(5)]);
    assert_eq!(table.count(RoleKind::Defend), 2);
}

#[test]
fn enough_live_defense_leaves_docked_ships_alone() {
    let mut table = AssignmentTable::new();
    for id in 10..13 {
        table.commit(ShipId::new(id), Role::fight(), 0);
    }
    let world = world(
        vec![ship(4, 50.0, 56.0, Some(0))],
        vec![ship(90, 80.0, 50.0, None)],
        vec![planet(0, 50.0, 50.0, Some(ME), &[4])],
        &table,
    );
    let mut commands = CommandSet::new();

    let pulled = Watchdog::new(&Tuning::default()).handle(&world, &mut table, &mut commands);

    assert!(pulled.is_empty());
    assert!(commands.is_empty());
}

#[test]
fn kamikazes_and_bombers_do_not_count_as_live_defense() {
    let mut table = AssignmentTable::new();
    table.commit(ShipId::new(10), Role::Kamikaze { planet: None }, 0);
    table.commit(ShipId::new(11), Role::Bomb { planet: None, foe: None }, 0);
    table.commit(ShipId::new(12), Role::Nothing, 0);
    let world = world(
        vec![ship(4, 50.0, 56.0, Some(0))],
        vec![ship(90, 80.0, 50.0, None)],
        vec![planet(0, 50.0, 50.0, Some(ME), &[4])],
        &table,
    );
    let mut commands = CommandSet::new();

    let pulled = Watchdog::new(&Tuning::default()).handle(&world, &mut table, &mut commands);

    assert_eq!(pulled, vec![ShipId::new(4)]);
}

#[test]
fn distant_foes_and_foreign_planets_are_ignored() {
    let mut table = AssignmentTable::new();
    let world = world(
        vec![ship(4, 50.0, 56.0, Some(0)), ship(5, 150.0, 56.0, Some(1))],
        vec![ship(90, 50.0, 95.0, None), ship(91, 150.0, 60.0, Some(1))],
        vec![
            planet(0, 50.0, 50.0, Some(ME), &[4]),
            planet(1, 150.0, 50.0, Some(FOE), &[5, 91]),
        ],
        &table,
    );
    let mut commands = CommandSet::new();

    let pulled = Watchdog::new(&Tuning::default()).handle(&world, &mut table, &mut commands);

    assert!(pulled.is_empty());
    assert!(table.is_empty());
}

#[test]
fn threat_radius_is_configurable() {
    let tuning = Tuning {
        defense: DefenseTuning {
            threat_radius: 50.0,
            ..DefenseTuning::default()
        },
        ..Tuning::default()
    };
    let mut table = AssignmentTable::new();
    let world = world(
        vec![ship(4, 50.0, 56.0, Some(0))],
        vec![ship(90, 50.0, 95.0, None)],
        vec![planet(0, 50.0, 50.0, Some(ME), &[4])],
        &table,
    );
    let mut commands = CommandSet::new();

    let pulled = Watchdog::new(&tuning).handle(&world, &mut table, &mut commands);

    assert_eq!(pulled, vec![ShipId::new(4)]);
}

#[test]
fn assigned_docked_ships_are_not_pulled() {
    let mut table = AssignmentTable::new();
    table.commit(ShipId::new(4), Role::Kamikaze { planet: None }, 0);
    let world = world(
        vec![ship(4, 50.0, 56.0, Some(0)), ship(6, 50.0, 44.0, Some(0))],
        vec![ship(90, 80.0, 50.0, None)],
        vec![planet(0, 50.0, 50.0, Some(ME), &[4, 6])],
        &table,
    );
    let mut commands = CommandSet::new();

    let pulled = Watchdog::new(&Tuning::default()).handle(&world, &mut table, &mut commands);

    assert_eq!(pulled, vec![ShipId::new(6)]);
}
