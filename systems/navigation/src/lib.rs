#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision-avoidance pathfinder turning "move toward a target" into a
//! single thrust command.
//!
//! The search sweeps angular corrections around the direct bearing, falls
//! back to a shorter hop toward an intermediate waypoint, and finally
//! degrades to the unverified direct command. Every verified command is
//! recorded as a ghost so ships planned later in the turn avoid it.

use armada_core::{
    geometry::{bearing, closest_approach, distance, heading, normalize_degrees},
    Circle, Command, NavigationTuning, PhysicsTuning, Tuning,
};
use armada_world::{ObstacleFilter, Ship, World};
use glam::DVec2;
use tracing::debug;

/// Per-call switches for [`Navigator::navigate`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NavigateOptions {
    /// Skip ships when testing for collisions.
    pub ignore_ships: bool,
    /// Skip planets when testing for collisions.
    pub ignore_planets: bool,
    /// Skip motions committed earlier in the turn.
    pub ignore_ghosts: bool,
    /// Overrides the configured number of corrections per side.
    pub max_corrections: Option<u32>,
    /// Overrides the configured angular step in degrees.
    pub angular_step: Option<f64>,
    /// Fly straight at the target, ignoring every obstacle.
    pub assassin: bool,
}

impl NavigateOptions {
    /// Options for a straight, obstacle-blind dive at the target.
    #[must_use]
    pub fn assassin() -> Self {
        Self {
            assassin: true,
            ..Self::default()
        }
    }
}

/// How the pathfinder settled on its command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// The direct bearing was clear.
    Direct,
    /// A bearing offset from the direct one was clear.
    Corrected {
        /// Signed offset in degrees from the direct bearing.
        offset: f64,
    },
    /// A shorter hop toward an intermediate waypoint was clear.
    Intermediate,
    /// Nothing cleared; the unverified direct command was returned.
    BestEffort,
    /// Obstacles were ignored on request.
    Assassin,
}

/// Outcome of one pathfinder call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Maneuver {
    /// Thrust command to issue.
    pub command: Command,
    /// Whether the command was verified clear and recorded as a ghost.
    pub ghost_recorded: bool,
    /// How the command was found.
    pub resolution: Resolution,
}

/// Pathfinder configured with the engine constants and search parameters.
#[derive(Clone, Debug)]
pub struct Navigator {
    physics: PhysicsTuning,
    tuning: NavigationTuning,
}

impl Navigator {
    /// Creates a navigator from the shared tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            physics: tuning.physics.clone(),
            tuning: tuning.navigation.clone(),
        }
    }

    /// Distance kept from a target's boundary when approaching it.
    #[must_use]
    pub fn approach_distance(&self) -> f64 {
        self.tuning.approach_distance
    }

    /// Maximum thrust accepted by the engine.
    #[must_use]
    pub fn max_speed(&self) -> f64 {
        self.physics.max_speed_f64()
    }

    /// Plans a thrust for `mover` toward `target` at up to `desired_speed`.
    ///
    /// Never fails: when no clear bearing exists the direct command is
    /// returned unverified and no ghost is recorded.
    pub fn navigate(
        &self,
        world: &mut World,
        mover: &Ship,
        target: Circle,
        desired_speed: f64,
        options: NavigateOptions,
    ) -> Maneuver {
        let direct = bearing(mover.position, target);
        let requested = self.clamp_speed(desired_speed);

        if options.assassin {
            let (speed, angle) = quantise(requested, direct);
            return Maneuver {
                command: thrust(mover, speed, angle),
                ghost_recorded: false,
                resolution: Resolution::Assassin,
            };
        }

        let speed = requested.min(distance(mover.position, target));
        let corrections = options.max_corrections.unwrap_or(self.tuning.max_corrections);
        let step = options.angular_step.unwrap_or(self.tuning.angular_step);

        if let Some((candidate, offset)) =
            self.sweep(world, mover, speed, direct, corrections, step, options)
        {
            let resolution = if offset == 0.0 {
                Resolution::Direct
            } else {
                Resolution::Corrected { offset }
            };
            return self.commit(world, mover, candidate, resolution);
        }

        let hop = self.tuning.intermediate_ratio * speed;
        let extended = corrections.saturating_add(self.tuning.intermediate_extra_corrections);
        if let Some((candidate, offset)) =
            self.sweep(world, mover, hop, direct, extended, step, options)
        {
            debug!(
                ship = mover.id.get(),
                offset,
                hop,
                "cleared through intermediate waypoint"
            );
            return self.commit(world, mover, candidate, Resolution::Intermediate);
        }

        let (speed, angle) = quantise(speed, direct);
        debug!(
            ship = mover.id.get(),
            speed, angle, "no clear bearing found, issuing unverified thrust"
        );
        Maneuver {
            command: thrust(mover, speed, angle),
            ghost_recorded: false,
            resolution: Resolution::BestEffort,
        }
    }

    fn clamp_speed(&self, desired: f64) -> f64 {
        if desired.is_nan() {
            return 0.0;
        }
        desired.clamp(0.0, self.max_speed())
    }

    fn sweep(
        &self,
        world: &World,
        mover: &Ship,
        speed: f64,
        direct: f64,
        corrections: u32,
        step: f64,
        options: NavigateOptions,
    ) -> Option<((u32, u32), f64)> {
        for k in 0..=corrections {
            let magnitude = f64::from(k) * step;
            let sides = if k == 0 { 1 } else { 2 };
            for offset in [magnitude, -magnitude].into_iter().take(sides) {
                let candidate = quantise(speed, direct + offset);
                if self.is_clear(world, mover, candidate, options) {
                    return Some((candidate, offset));
                }
            }
        }
        None
    }

    fn is_clear(
        &self,
        world: &World,
        mover: &Ship,
        (speed, angle): (u32, u32),
        options: NavigateOptions,
    ) -> bool {
        let start = mover.position.center();
        let motion = motion_of(speed, angle);
        let fudge = mover.position.radius() + self.tuning.clearance;
        let filter = ObstacleFilter {
            ships: !options.ignore_ships,
            planets: !options.ignore_planets,
        };

        if (filter.ships || filter.planets)
            && !world
                .obstacles_between(mover, start + motion, fudge, filter)
                .is_empty()
        {
            return false;
        }

        options.ignore_ghosts
            || world
                .ghosts()
                .iter()
                .filter(|ghost| ghost.ship() != mover.id)
                .all(|ghost| {
                    let origin = ghost.origin();
                    closest_approach(start, motion, origin.center(), ghost.motion())
                        > origin.radius() + fudge
                })
    }

    fn commit(
        &self,
        world: &mut World,
        mover: &Ship,
        (speed, angle): (u32, u32),
        resolution: Resolution,
    ) -> Maneuver {
        world.record_ghost(mover.id, mover.position, motion_of(speed, angle));
        Maneuver {
            command: thrust(mover, speed, angle),
            ghost_recorded: true,
            resolution,
        }
    }
}

/// Integer speed and heading the engine will actually execute.
fn quantise(speed: f64, angle: f64) -> (u32, u32) {
    // speed is already clamped into [0, max_speed]
    let speed = speed.floor() as u32;
    let angle = (normalize_degrees(angle).round() as u32) % 360;
    (speed, angle)
}

fn motion_of(speed: u32, angle: u32) -> DVec2 {
    heading(f64::from(angle)) * f64::from(speed)
}

fn thrust(mover: &Ship, speed: u32, angle: u32) -> Command {
    Command::Thrust {
        ship: mover.id,
        speed,
        angle,
    }
}
