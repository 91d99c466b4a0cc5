#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-ship role state machine.
//!
//! [`Behavior::step`] runs the role a ship is committed to and returns at most
//! one command. A role may escalate into another role, which then runs in the
//! same turn; the number of hops is bounded so a misconfigured chain surfaces
//! as a [`BehaviorError`] instead of spinning.
//!
//! Every change of role that abandons a settle commitment releases the dock
//! reservation it held, except after a successful dock where the slot stays
//! consumed by the docking ship.

use armada_core::{
    geometry::{closest_point_to, distance},
    AssignmentTable, BehaviorTuning, Circle, Command, DockingStatus, LockedFoe, PhysicsTuning,
    PlanetId, Role, RoleKind, ShipId, Tuning,
};
use armada_system_allocation::{AllocationOutcome, Allocator};
use armada_system_navigation::{NavigateOptions, Navigator};
use armada_world::{query, Ship, World};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

/// Failures raised while stepping a single ship.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BehaviorError {
    /// The ship is not ours in the current snapshot.
    #[error("ship {ship} is not in play")]
    MissingShip {
        /// Ship that was stepped.
        ship: ShipId,
    },
    /// The ship changed role more often than allowed within one turn.
    #[error("ship {ship} exceeded {limit} role changes in one turn, last role {last:?}")]
    EscalationLimit {
        /// Ship that was stepped.
        ship: ShipId,
        /// Configured maximum.
        limit: u32,
        /// Role the ship was about to run.
        last: RoleKind,
    },
}

/// What a role decided for the current turn.
#[derive(Debug)]
enum Transition {
    /// Keep the role and issue the command, if any.
    Keep(Option<Command>),
    /// Drop the assignment and its reservation.
    Clear,
    /// Drop the assignment after a dock order; the slot stays consumed.
    Docked(Command),
    /// Switch to another role and run it immediately.
    Escalate(Role),
    /// Drop the role and ask the allocator for one, skipping the runner rule.
    Reallocate,
}

/// Role state machine driving one ship per call.
#[derive(Clone, Debug)]
pub struct Behavior {
    navigator: Navigator,
    allocator: Allocator,
    physics: PhysicsTuning,
    tuning: BehaviorTuning,
    runner_cap: usize,
}

impl Behavior {
    /// Creates the state machine from the shared tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            navigator: Navigator::new(tuning),
            allocator: Allocator::new(tuning),
            physics: tuning.physics.clone(),
            tuning: tuning.behavior.clone(),
            runner_cap: tuning.allocation.runner_cap,
        }
    }

    /// Runs the role held by `ship` and returns the command it issues.
    ///
    /// Ships without an assignment issue nothing.
    pub fn step<R>(
        &self,
        ship: ShipId,
        world: &mut World,
        table: &mut AssignmentTable,
        rng: &mut R,
    ) -> Result<Option<Command>, BehaviorError>
    where
        R: Rng + ?Sized,
    {
        let mut hops = 0_u32;
        loop {
            let Some(assignment) = table.get(ship).copied() else {
                return Ok(None);
            };
            let role = *assignment.role();
            let transition = self.run(ship, role, world, table, rng)?;
            trace!(ship = ship.get(), role = ?role.kind(), ?transition, "stepped role");

            match transition {
                Transition::Keep(command) => return Ok(command),
                Transition::Docked(command) => {
                    let _ = table.clear(ship);
                    return Ok(Some(command));
                }
                Transition::Clear => {
                    let _ = world.release_dock(ship);
                    let _ = table.clear(ship);
                    return Ok(None);
                }
                Transition::Escalate(next) => {
                    hops += 1;
                    if hops > self.tuning.max_escalations {
                        return Err(BehaviorError::EscalationLimit {
                            ship,
                            limit: self.tuning.max_escalations,
                            last: next.kind(),
                        });
                    }
                    if role.reserved_planet().is_some() && next.reserved_planet() != role.reserved_planet() {
                        let _ = world.release_dock(ship);
                    }
                    debug!(
                        ship = ship.get(),
                        from = ?role.kind(),
                        to = ?next.kind(),
                        "escalating role"
                    );
                    table.commit(ship, next, world.turn());
                }
                Transition::Reallocate => {
                    hops += 1;
                    if hops > self.tuning.max_escalations {
                        return Err(BehaviorError::EscalationLimit {
                            ship,
                            limit: self.tuning.max_escalations,
                            last: role.kind(),
                        });
                    }
                    let _ = world.release_dock(ship);
                    let _ = table.clear(ship);
                    if let AllocationOutcome::Assigned(next) =
                        self.allocator.assign_without_runner(ship, world, table)
                    {
                        debug!(ship = ship.get(), to = ?next.kind(), "reallocated surplus runner");
                    }
                }
            }
        }
    }

    fn run<R>(
        &self,
        id: ShipId,
        role: Role,
        world: &mut World,
        table: &mut AssignmentTable,
        rng: &mut R,
    ) -> Result<Transition, BehaviorError>
    where
        R: Rng + ?Sized,
    {
        let ship = world
            .ship(id)
            .filter(|found| found.owner == world.me())
            .cloned()
            .ok_or(BehaviorError::MissingShip { ship: id })?;

        let transition = match role {
            Role::Settle { planet } => self.settle(&ship, planet, world),
            Role::VigilantSettle { planet } => self.vigilant_settle(&ship, planet, world, rng),
            Role::Bomb { planet, foe } => self.bomb(&ship, planet, foe, world, table, rng),
            Role::Fight { foe } => self.fight(&ship, foe, world, table),
            Role::Defend { anchor } => self.defend(&ship, anchor, world, table),
            Role::Runner => self.runner(&ship, world, table),
            Role::Kamikaze { planet } => self.kamikaze(&ship, planet, world, table),
            Role::Nothing => Transition::Clear,
        };
        Ok(transition)
    }

    fn settle(&self, ship: &Ship, planet: PlanetId, world: &mut World) -> Transition {
        if ship.docking != DockingStatus::Undocked {
            return Transition::Clear;
        }
        let me = world.me();
        let Some(target) = world.planet(planet).cloned() else {
            return Transition::Escalate(Role::fight());
        };
        if target.is_foe_of(me) {
            return Transition::Escalate(Role::Bomb {
                planet: Some(planet),
                foe: None,
            });
        }
        if target.is_owned_by(me) && target.is_full() {
            return Transition::Escalate(Role::fight());
        }
        if self.physics.within_dock_range(ship.position, target.position) {
            return Transition::Docked(Command::Dock {
                ship: ship.id,
                planet,
            });
        }

        let approach = closest_point_to(ship.position, target.position, self.navigator.approach_distance());
        Transition::Keep(Some(self.pursue(world, ship, approach)))
    }

    fn vigilant_settle<R>(&self, ship: &Ship, planet: PlanetId, world: &mut World, rng: &mut R) -> Transition
    where
        R: Rng + ?Sized,
    {
        if world.player_count() > 2 && roll(rng, self.tuning.pure_settle_switch_chance) {
            return Transition::Escalate(Role::Settle { planet });
        }
        if ship.is_undocked() {
            let threat = query::foes_within(world, ship.position, self.tuning.defense_radius)
                .first()
                .map(|(_, foe)| foe.position);
            if let Some(foe) = threat {
                let approach = closest_point_to(ship.position, foe, self.navigator.approach_distance());
                return Transition::Keep(Some(self.pursue(world, ship, approach)));
            }
        }
        self.settle(ship, planet, world)
    }

    fn bomb<R>(
        &self,
        ship: &Ship,
        planet: Option<PlanetId>,
        locked: Option<LockedFoe>,
        world: &mut World,
        table: &mut AssignmentTable,
        rng: &mut R,
    ) -> Transition
    where
        R: Rng + ?Sized,
    {
        if roll(rng, self.tuning.bomb_escalation_chance) {
            return Transition::Escalate(Role::fight());
        }

        let target = match locked.filter(|foe| world.foe_exists(foe.owner, foe.ship)) {
            Some(foe) => world.ship(foe.ship).map(|found| found.position),
            None => {
                let Some(foe) = self.pick_bomb_target(ship, planet, world) else {
                    return Transition::Escalate(Role::fight());
                };
                lock(table, ship.id, Role::Bomb {
                    planet,
                    foe: Some(foe),
                });
                world.ship(foe.ship).map(|found| found.position)
            }
        };
        let Some(target) = target else {
            return Transition::Escalate(Role::fight());
        };

        let maneuver = self.navigator.navigate(
            world,
            ship,
            target,
            self.navigator.max_speed(),
            NavigateOptions::assassin(),
        );
        Transition::Keep(Some(maneuver.command))
    }

    fn pick_bomb_target(&self, ship: &Ship, planet: Option<PlanetId>, world: &World) -> Option<LockedFoe> {
        let me = world.me();
        let foes = world.nearest_ships(ship.position, |candidate| candidate.owner != me);
        let on_target = planet.and_then(|planet| {
            foes.iter()
                .find(|(_, foe)| !foe.is_undocked() && foe.docked_planet == Some(planet))
        });
        let eligible = || {
            foes.iter()
                .find(|(gap, foe)| !foe.is_undocked() || *gap < self.tuning.bomb_lock_range)
        };
        on_target
            .or_else(eligible)
            .or_else(|| foes.first())
            .map(|(_, foe)| LockedFoe {
                ship: foe.id,
                owner: foe.owner,
            })
    }

    fn fight(
        &self,
        ship: &Ship,
        locked: Option<LockedFoe>,
        world: &mut World,
        table: &mut AssignmentTable,
    ) -> Transition {
        if let Some(transition) = leave_planet(ship) {
            return transition;
        }

        let target = match locked.filter(|foe| world.foe_exists(foe.owner, foe.ship)) {
            Some(foe) => world.ship(foe.ship).map(|found| found.position),
            None => {
                let Some((_, foe)) = query::nearest_foe(world, ship.position) else {
                    return Transition::Clear;
                };
                let (foe, position) = (
                    LockedFoe {
                        ship: foe.id,
                        owner: foe.owner,
                    },
                    foe.position,
                );
                lock(table, ship.id, Role::Fight { foe: Some(foe) });
                Some(position)
            }
        };
        let Some(target) = target else {
            return Transition::Clear;
        };

        let approach = closest_point_to(ship.position, target, self.navigator.approach_distance());
        Transition::Keep(Some(self.pursue(world, ship, approach)))
    }

    fn defend(
        &self,
        ship: &Ship,
        anchor: Option<Circle>,
        world: &mut World,
        table: &mut AssignmentTable,
    ) -> Transition {
        let anchor = match anchor {
            Some(anchor) => anchor,
            None => {
                let anchor = ship.position.with_radius(0.0);
                lock(table, ship.id, Role::Defend {
                    anchor: Some(anchor),
                });
                anchor
            }
        };

        if let Some(transition) = leave_planet(ship) {
            return transition;
        }

        if distance(ship.position, anchor) > self.tuning.defense_radius {
            return Transition::Keep(Some(self.pursue(world, ship, anchor)));
        }

        let me = world.me();
        let threat = world
            .nearest_ships(ship.position, |candidate| {
                candidate.owner != me && distance(anchor, candidate.position) <= self.tuning.defense_radius
            })
            .first()
            .map(|(_, foe)| foe.position);
        match threat {
            Some(foe) => {
                let approach = closest_point_to(ship.position, foe, self.navigator.approach_distance());
                Transition::Keep(Some(self.pursue(world, ship, approach)))
            }
            None => Transition::Escalate(Role::fight()),
        }
    }

    fn runner(&self, ship: &Ship, world: &mut World, table: &AssignmentTable) -> Transition {
        if !query::foes_within(world, ship.position, self.tuning.runner_detection_range).is_empty() {
            return Transition::Escalate(Role::fight());
        }
        let other_runners = table.count(RoleKind::Runner).saturating_sub(1);
        if other_runners >= self.runner_cap {
            return Transition::Reallocate;
        }
        let Some(centroid) = query::foe_centroid(world) else {
            return Transition::Escalate(Role::fight());
        };
        let corner = query::farthest_corner(world, centroid);
        Transition::Keep(Some(self.pursue(world, ship, corner)))
    }

    fn kamikaze(
        &self,
        ship: &Ship,
        planet: Option<PlanetId>,
        world: &mut World,
        table: &mut AssignmentTable,
    ) -> Transition {
        let me = world.me();
        let still_hostile = planet
            .and_then(|planet| world.planet(planet))
            .filter(|found| found.is_foe_of(me))
            .map(|found| found.position);
        let target = match still_hostile {
            Some(position) => position,
            None => {
                let Some((id, position)) = query::foe_planets(world, ship.position)
                    .first()
                    .map(|(_, found)| (found.id, found.position))
                else {
                    return Transition::Escalate(Role::fight());
                };
                lock(table, ship.id, Role::Kamikaze { planet: Some(id) });
                position
            }
        };

        let maneuver = self.navigator.navigate(
            world,
            ship,
            target,
            self.navigator.max_speed(),
            NavigateOptions::assassin(),
        );
        Transition::Keep(Some(maneuver.command))
    }

    fn pursue(&self, world: &mut World, ship: &Ship, target: Circle) -> Command {
        self.navigator
            .navigate(
                world,
                ship,
                target,
                self.navigator.max_speed(),
                NavigateOptions::default(),
            )
            .command
    }
}

/// Undocks an anchored ship, or waits out an undocking one.
fn leave_planet(ship: &Ship) -> Option<Transition> {
    if ship.docking.is_anchored() {
        return Some(Transition::Keep(Some(Command::Undock { ship: ship.id })));
    }
    (ship.docking == DockingStatus::Undocking).then_some(Transition::Keep(None))
}

/// Rewrites the payload of the role `ship` holds without changing its age.
fn lock(table: &mut AssignmentTable, ship: ShipId, role: Role) {
    if let Some(entry) = table.get_mut(ship) {
        *entry.role_mut() = role;
    }
}

fn roll<R>(rng: &mut R, chance: f64) -> bool
where
    R: Rng + ?Sized,
{
    chance > 0.0 && rng.gen::<f64>() < chance
}
