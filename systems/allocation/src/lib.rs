#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Role allocator committing unassigned ships to a behaviour.
//!
//! The allocator owns the reserve side of the docking ledger: a settle
//! commitment is only written after [`World::reserve_dock`] succeeded, so the
//! outstanding reservations on a planet never exceed its free capacity.

use armada_core::{
    AllocationTuning, AssignmentTable, Circle, Role, RoleKind, SettleVariant, ShipId, Tuning,
};
use armada_world::{query, World};
use tracing::{debug, info};

/// Result of an allocation request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AllocationOutcome {
    /// The ship already holds an active assignment and was left untouched.
    AlreadyAssigned,
    /// The ship is not one of ours in the current snapshot.
    UnknownShip,
    /// The ship was committed to the contained role.
    Assigned(Role),
}

/// Role allocator configured with positional rules and caps.
#[derive(Clone, Debug)]
pub struct Allocator {
    tuning: AllocationTuning,
}

impl Allocator {
    /// Creates an allocator from the shared tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tuning: tuning.allocation.clone(),
        }
    }

    /// Commits `ship` to the first role its situation qualifies for.
    pub fn assign(
        &self,
        ship: ShipId,
        world: &mut World,
        table: &mut AssignmentTable,
    ) -> AllocationOutcome {
        self.allocate(ship, world, table, true)
    }

    /// Same as [`Allocator::assign`] without considering the runner role.
    pub fn assign_without_runner(
        &self,
        ship: ShipId,
        world: &mut World,
        table: &mut AssignmentTable,
    ) -> AllocationOutcome {
        self.allocate(ship, world, table, false)
    }

    fn allocate(
        &self,
        ship: ShipId,
        world: &mut World,
        table: &mut AssignmentTable,
        allow_runner: bool,
    ) -> AllocationOutcome {
        if table.is_active(ship) {
            return AllocationOutcome::AlreadyAssigned;
        }
        let Some(position) = world
            .ship(ship)
            .filter(|found| found.owner == world.me())
            .map(|found| found.position)
        else {
            return AllocationOutcome::UnknownShip;
        };

        let role = self
            .positional_role(ship, world, table)
            .or_else(|| self.settle_role(ship, position, world))
            .or_else(|| {
                (allow_runner && self.runner_available(world, table)).then_some(Role::Runner)
            })
            .or_else(|| {
                query::foe_planets(world, position)
                    .first()
                    .map(|(_, planet)| Role::Bomb {
                        planet: Some(planet.id),
                        foe: None,
                    })
            })
            .unwrap_or_else(Role::fight);

        table.commit(ship, role, world.turn());
        debug!(ship = ship.get(), role = ?role.kind(), "allocated role");
        AllocationOutcome::Assigned(role)
    }

    fn first_bomber(&self, world: &World) -> u32 {
        if world.player_count() == 2 {
            self.tuning.first_bomber_two_players
        } else {
            self.tuning.first_bomber_multiplayer
        }
    }

    fn positional_role(&self, ship: ShipId, world: &World, table: &AssignmentTable) -> Option<Role> {
        let first_bomber = self.first_bomber(world);
        let id = ship.get();
        if id == first_bomber {
            return Some(Role::Bomb {
                planet: None,
                foe: None,
            });
        }
        let periodic = self.tuning.defender_modulus != 0 && id % self.tuning.defender_modulus == 0;
        if id > first_bomber && periodic {
            if table.count(RoleKind::Defend) < self.tuning.defender_cap {
                return Some(Role::Defend { anchor: None });
            }
            debug!(ship = id, "defender cap reached, reallocating to fight");
            return Some(Role::fight());
        }
        None
    }

    fn settle_role(
        &self,
        ship: ShipId,
        position: Circle,
        world: &mut World,
    ) -> Option<Role> {
        let me = world.me();
        let candidates: Vec<_> = world
            .nearest_planets(position, |planet| planet.owner.is_none() || planet.is_owned_by(me))
            .into_iter()
            .map(|(_, planet)| planet.id)
            .collect();

        for planet in candidates {
            if world.free_slots(planet) == 0 {
                continue;
            }
            match world.reserve_dock(ship, planet) {
                Ok(remaining) => {
                    debug!(ship = ship.get(), planet = planet.get(), remaining, "reserved dock");
                    return Some(match self.tuning.settle_variant {
                        SettleVariant::Pure => Role::Settle { planet },
                        SettleVariant::Vigilant => Role::VigilantSettle { planet },
                    });
                }
                Err(error) => {
                    debug!(ship = ship.get(), planet = planet.get(), %error, "reservation refused");
                }
            }
        }
        None
    }

    fn runner_available(&self, world: &World, table: &AssignmentTable) -> bool {
        world.player_count() > 2 && table.count(RoleKind::Runner) < self.tuning.runner_cap
    }

    /// Converts the newest defenders beyond the cap into fighters, at most
    /// `max_defender_reallocations` per call. Returns the converted ships.
    pub fn rebalance_defenders(&self, table: &mut AssignmentTable, turn: u32) -> Vec<ShipId> {
        let defenders = table.count(RoleKind::Defend);
        let surplus = defenders
            .saturating_sub(self.tuning.defender_cap)
            .min(self.tuning.max_defender_reallocations);
        if surplus == 0 {
            return Vec::new();
        }

        let mut newest: Vec<(u32, ShipId)> = table
            .iter()
            .filter(|(_, entry)| entry.role().kind() == RoleKind::Defend)
            .map(|(ship, entry)| (entry.since_turn(), ship))
            .collect();
        newest.sort_by(|a, b| b.cmp(a));

        let converted: Vec<ShipId> = newest.into_iter().take(surplus).map(|(_, ship)| ship).collect();
        for ship in &converted {
            table.commit(*ship, Role::fight(), turn);
        }
        info!(count = converted.len(), defenders, "reallocated surplus defenders to fight");
        converted
    }

    /// Turns ships beyond the fleet cap into kamikazes. Every ship we own
    /// counts toward the cap, but only undocked ships are designated, highest
    /// ids first, releasing any dock they had reserved. Returns the new
    /// kamikazes.
    pub fn designate_kamikazes(&self, world: &mut World, table: &mut AssignmentTable) -> Vec<ShipId> {
        let is_kamikaze =
            |ship: ShipId| table.role(ship).is_some_and(|role| role.kind() == RoleKind::Kamikaze);
        let fleet = world.my_ships().count();
        let excess = fleet.saturating_sub(self.tuning.fleet_cap);
        let existing = world.my_ships().filter(|ship| is_kamikaze(ship.id)).count();
        let wanted = excess.saturating_sub(existing);
        if wanted == 0 {
            return Vec::new();
        }

        let designated: Vec<ShipId> = world
            .my_ships()
            .filter(|ship| ship.is_undocked())
            .map(|ship| ship.id)
            .filter(|ship| !is_kamikaze(*ship))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .take(wanted)
            .collect();
        let turn = world.turn();
        for ship in &designated {
            let _ = world.release_dock(*ship);
            table.commit(*ship, Role::Kamikaze { planet: None }, turn);
        }
        info!(count = designated.len(), excess, "designated kamikazes beyond fleet cap");
        designated
    }
}
