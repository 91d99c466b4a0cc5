//! Injectable constants consumed by every system.
//!
//! `Tuning::default()` reproduces the constants the fleet was tuned with.
//! Every section deserialises with `#[serde(default)]`, so a configuration
//! file only needs to list the knobs it overrides.

use serde::{Deserialize, Serialize};

use crate::geometry::{distance, Circle};

/// Aggregated tuning knobs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Engine constants shared with the game rules.
    pub physics: PhysicsTuning,
    /// Pathfinder search parameters.
    pub navigation: NavigationTuning,
    /// Role allocation caps and positional rules.
    pub allocation: AllocationTuning,
    /// Per-role behaviour parameters.
    pub behavior: BehaviorTuning,
    /// Planet-defense watchdog parameters.
    pub defense: DefenseTuning,
    /// Per-turn budget and seeding.
    pub turn: TurnTuning,
}

/// Constants mirrored from the game engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsTuning {
    /// Largest thrust magnitude the engine accepts.
    pub max_speed: u32,
    /// Radius of every ship.
    pub ship_radius: f64,
    /// Extra distance beyond a planet's surface within which docking succeeds.
    pub dock_radius: f64,
}

impl PhysicsTuning {
    /// Maximum speed as a float for geometry.
    #[must_use]
    pub fn max_speed_f64(&self) -> f64 {
        f64::from(self.max_speed)
    }

    /// Reports whether a ship at `ship` is close enough to dock at `planet`.
    #[must_use]
    pub fn within_dock_range(&self, ship: Circle, planet: Circle) -> bool {
        distance(ship, planet) <= planet.radius() + self.dock_radius + self.ship_radius
    }
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            max_speed: 7,
            ship_radius: 0.5,
            dock_radius: 4.0,
        }
    }
}

/// Pathfinder search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationTuning {
    /// Number of angular corrections tried on each side of the direct bearing.
    pub max_corrections: u32,
    /// Angle in degrees between successive corrections.
    pub angular_step: f64,
    /// Safety distance added on top of the mover's radius in collision checks.
    pub clearance: f64,
    /// Fraction of `min(speed, distance)` used for the intermediate waypoint hop.
    pub intermediate_ratio: f64,
    /// Extra corrections granted to the intermediate waypoint search.
    pub intermediate_extra_corrections: u32,
    /// Distance kept from a target's boundary when approaching it.
    pub approach_distance: f64,
}

impl Default for NavigationTuning {
    fn default() -> Self {
        Self {
            max_corrections: 90,
            angular_step: 1.0,
            clearance: 0.1,
            intermediate_ratio: 0.5,
            intermediate_extra_corrections: 30,
            approach_distance: 3.0,
        }
    }
}

/// Which settle behaviour the allocator commits new settlers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleVariant {
    /// Fly straight to the planet and dock.
    Pure,
    /// Engage foes met within the defense radius before docking.
    Vigilant,
}

/// Role allocation caps and positional rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocationTuning {
    /// Ship id forced into the bomb role in two-player games.
    pub first_bomber_two_players: u32,
    /// Ship id forced into the bomb role in games with more players.
    pub first_bomber_multiplayer: u32,
    /// Ids divisible by this value (above the first bomber) become defenders.
    pub defender_modulus: u32,
    /// Maximum number of concurrent defenders.
    pub defender_cap: usize,
    /// Maximum number of surplus defenders converted to fighters per turn.
    pub max_defender_reallocations: usize,
    /// Maximum number of concurrent runners.
    pub runner_cap: usize,
    /// Settle behaviour committed to new settlers.
    pub settle_variant: SettleVariant,
    /// Undocked ships beyond this count are turned into kamikazes.
    pub fleet_cap: usize,
}

impl Default for AllocationTuning {
    fn default() -> Self {
        Self {
            first_bomber_two_players: 2,
            first_bomber_multiplayer: 4,
            defender_modulus: 3,
            defender_cap: 6,
            max_defender_reallocations: 4,
            runner_cap: 1,
            settle_variant: SettleVariant::Vigilant,
            fleet_cap: 40,
        }
    }
}

/// Per-role behaviour parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorTuning {
    /// Radius guarded by defenders and scanned by vigilant settlers.
    pub defense_radius: f64,
    /// Per-turn probability that a bomber gives up and becomes a fighter.
    pub bomb_escalation_chance: f64,
    /// Undocked foes closer than this are valid bomb locks.
    pub bomb_lock_range: f64,
    /// Per-turn probability that a vigilant settler drops to pure settling
    /// in games with more than two players.
    pub pure_settle_switch_chance: f64,
    /// Foes closer than this make a runner turn and fight.
    pub runner_detection_range: f64,
    /// Maximum role changes executed for one ship within a turn.
    pub max_escalations: u32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            defense_radius: 35.0,
            bomb_escalation_chance: 0.10,
            bomb_lock_range: 10.0,
            pure_settle_switch_chance: 0.0,
            runner_detection_range: 20.0,
            max_escalations: 4,
        }
    }
}

/// Planet-defense watchdog parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefenseTuning {
    /// Distance beyond a planet's surface within which foes count as a threat.
    pub threat_radius: f64,
    /// Live-defense assignments below which docked ships are pulled out.
    pub min_live_defense: usize,
}

impl Default for DefenseTuning {
    fn default() -> Self {
        Self {
            threat_radius: 35.0,
            min_live_defense: 3,
        }
    }
}

/// Per-turn processing budget and seeding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TurnTuning {
    /// Soft wall-clock budget for per-ship processing, in milliseconds.
    pub budget_ms: u64,
    /// Number of ships processed between budget checks.
    pub budget_check_interval: usize,
    /// Seed from which every turn's random source is derived.
    pub seed: u64,
}

impl Default for TurnTuning {
    fn default() -> Self {
        Self {
            budget_ms: 1_700,
            budget_check_interval: 10,
            seed: 0,
        }
    }
}
