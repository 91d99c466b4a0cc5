#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Armada fleet commander.
//!
//! This crate defines the surface that connects the engine adapter, the
//! per-turn world view, and the pure systems. Adapters hand a fully linked
//! [`Snapshot`] to the commander each turn; systems read it through the world
//! crate, mutate only the [`AssignmentTable`] and turn-scoped state, and
//! respond with a [`CommandSet`] keyed by ship.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub mod assignment;
pub mod geometry;
pub mod tuning;

pub use assignment::{Assignment, AssignmentTable, LockedFoe, Role, RoleKind};
pub use geometry::Circle;
pub use tuning::{
    AllocationTuning, BehaviorTuning, DefenseTuning, NavigationTuning, PhysicsTuning,
    SettleVariant, TurnTuning, Tuning,
};

/// Unique identifier assigned to a ship for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(u32);

impl ShipId {
    /// Creates a new ship identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier assigned to a planet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(u32);

impl PlanetId {
    /// Creates a new planet identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier assigned to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Docking lifecycle of a ship.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockingStatus {
    /// Free-flying.
    #[default]
    Undocked,
    /// Docking sequence in progress.
    Docking,
    /// Docked and producing.
    Docked,
    /// Undocking sequence in progress.
    Undocking,
}

impl DockingStatus {
    /// Reports whether the ship is attached to a planet or in the process of attaching.
    #[must_use]
    pub const fn is_anchored(self) -> bool {
        matches!(self, Self::Docked | Self::Docking)
    }
}

/// Immutable state of one ship as delivered by the engine adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipSnapshot {
    /// Unique identifier of the ship.
    pub id: ShipId,
    /// Position and radius of the ship.
    pub position: Circle,
    /// Remaining health.
    pub health: u32,
    /// Velocity carried over from the previous turn.
    #[serde(default)]
    pub velocity: [f64; 2],
    /// Docking lifecycle state.
    #[serde(default)]
    pub docking: DockingStatus,
    /// Planet the ship is docked to, when not undocked.
    #[serde(default)]
    pub docked_planet: Option<PlanetId>,
}

/// Immutable state of one player and its fleet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Unique identifier of the player.
    pub id: PlayerId,
    /// Ships owned by the player.
    pub ships: Vec<ShipSnapshot>,
}

/// Immutable state of one planet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetSnapshot {
    /// Unique identifier of the planet.
    pub id: PlanetId,
    /// Position and radius of the planet.
    pub position: Circle,
    /// Remaining health.
    pub health: u32,
    /// Owning player, if any.
    #[serde(default)]
    pub owner: Option<PlayerId>,
    /// Maximum number of ships that may dock simultaneously.
    pub docking_spots: u32,
    /// Ships currently docked or docking.
    #[serde(default)]
    pub docked_ships: Vec<ShipId>,
    /// Production accumulated toward the next spawned ship.
    #[serde(default)]
    pub current_production: u32,
    /// Production capacity left on the planet.
    #[serde(default)]
    pub remaining_resources: u32,
}

/// Fully linked world state handed to the commander once per turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Zero-based turn number.
    pub turn: u32,
    /// Player controlled by this process.
    pub me: PlayerId,
    /// Width of the field.
    pub width: f64,
    /// Height of the field.
    pub height: f64,
    /// Every player and its ships.
    pub players: Vec<PlayerSnapshot>,
    /// Every planet.
    pub planets: Vec<PlanetSnapshot>,
}

/// Single order issued to a ship for the current turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Accelerate the ship.
    Thrust {
        /// Ship receiving the order.
        ship: ShipId,
        /// Integer magnitude between zero and the maximum speed.
        speed: u32,
        /// Integer heading in degrees, `0..360`.
        angle: u32,
    },
    /// Begin docking at a planet.
    Dock {
        /// Ship receiving the order.
        ship: ShipId,
        /// Planet to dock at.
        planet: PlanetId,
    },
    /// Begin undocking from the current planet.
    Undock {
        /// Ship receiving the order.
        ship: ShipId,
    },
}

impl Command {
    /// Ship the command is addressed to.
    #[must_use]
    pub const fn ship(&self) -> ShipId {
        match self {
            Self::Thrust { ship, .. } | Self::Dock { ship, .. } | Self::Undock { ship } => *ship,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thrust { ship, speed, angle } => write!(f, "t {ship} {speed} {angle}"),
            Self::Dock { ship, planet } => write!(f, "d {ship} {planet}"),
            Self::Undock { ship } => write!(f, "u {ship}"),
        }
    }
}

/// Commands issued during one turn, at most one per ship.
///
/// Issuing a second command for the same ship replaces the first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandSet {
    commands: BTreeMap<ShipId, Command>,
}

impl CommandSet {
    /// Creates an empty command set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `command`, replacing any earlier command for the same ship.
    pub fn issue(&mut self, command: Command) {
        let _ = self.commands.insert(command.ship(), command);
    }

    /// Command recorded for `ship`, if any.
    #[must_use]
    pub fn get(&self, ship: ShipId) -> Option<&Command> {
        self.commands.get(&ship)
    }

    /// Iterator over the commands in ascending ship order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Number of commands recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Reports whether no command was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Renders the set in the engine's single-line textual form.
    #[must_use]
    pub fn render(&self) -> String {
        self.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_render_in_engine_format() {
        let thrust = Command::Thrust {
            ship: ShipId::new(4),
            speed: 7,
            angle: 315,
        };
        let dock = Command::Dock {
            ship: ShipId::new(5),
            planet: PlanetId::new(2),
        };
        let undock = Command::Undock {
            ship: ShipId::new(6),
        };

        assert_eq!(thrust.to_string(), "t 4 7 315");
        assert_eq!(dock.to_string(), "d 5 2");
        assert_eq!(undock.to_string(), "u 6");
    }

    #[test]
    fn last_command_for_a_ship_wins() {
        let mut commands = CommandSet::new();
        commands.issue(Command::Undock {
            ship: ShipId::new(8),
        });
        commands.issue(Command::Thrust {
            ship: ShipId::new(2),
            speed: 3,
            angle: 10,
        });
        commands.issue(Command::Dock {
            ship: ShipId::new(8),
            planet: PlanetId::new(1),
        });

        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands.get(ShipId::new(8)),
            Some(&Command::Dock {
                ship: ShipId::new(8),
                planet: PlanetId::new(1),
            })
        );
        assert_eq!(commands.render(), "t 2 3 10 d 8 1");
    }

    #[test]
    fn snapshot_parses_with_optional_fields_omitted() {
        let json = r#"{
            "turn": 3,
            "me": 0,
            "width": 240.0,
            "height": 160.0,
            "players": [
                {"id": 0, "ships": [
                    {"id": 1, "position": {"x": 10.0, "y": 12.0, "radius": 0.5}, "health": 255}
                ]}
            ],
            "planets": [
                {"id": 0, "position": {"x": 50.0, "y": 50.0, "radius": 6.0}, "health": 1000,
                 "docking_spots": 3}
            ]
        }"#;

        let snapshot: Snapshot = serde_json::from_str(json).expect("snapshot parses");

        let ship = &snapshot.players[0].ships[0];
        assert_eq!(ship.docking, DockingStatus::Undocked);
        assert_eq!(ship.docked_planet, None);
        assert!(snapshot.planets[0].docked_ships.is_empty());
        assert_eq!(snapshot.planets[0].owner, None);
    }
}
