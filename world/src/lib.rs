#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-turn world view for the Armada fleet commander.
//!
//! A [`World`] is built once per turn from the engine [`Snapshot`]. Everything
//! it exposes is read-only except two turn-scoped registers: the ghost
//! register filled by the pathfinder, and the docking reservation ledger
//! consulted by the allocator and the settle roles.

use std::collections::BTreeMap;

use armada_core::{
    geometry::{distance, intersects_segment},
    AssignmentTable, Circle, DockingStatus, PlanetId, PlayerId, ShipId, Snapshot,
};
use glam::DVec2;
use tracing::{debug, error, warn};

mod reservations;

pub use reservations::ReservationError;
use reservations::ReservationLedger;

/// Ship as seen during the current turn.
#[derive(Clone, Debug, PartialEq)]
pub struct Ship {
    /// Unique identifier of the ship.
    pub id: ShipId,
    /// Player owning the ship.
    pub owner: PlayerId,
    /// Position and radius.
    pub position: Circle,
    /// Remaining health.
    pub health: u32,
    /// Velocity carried over from the previous turn.
    pub velocity: DVec2,
    /// Docking lifecycle state.
    pub docking: DockingStatus,
    /// Planet the ship is attached to, if any.
    pub docked_planet: Option<PlanetId>,
}

impl Ship {
    /// Reports whether the ship flies freely.
    #[must_use]
    pub fn is_undocked(&self) -> bool {
        self.docking == DockingStatus::Undocked
    }
}

/// Planet as seen during the current turn.
#[derive(Clone, Debug, PartialEq)]
pub struct Planet {
    /// Unique identifier of the planet.
    pub id: PlanetId,
    /// Position and radius.
    pub position: Circle,
    /// Remaining health.
    pub health: u32,
    /// Owning player, if any.
    pub owner: Option<PlayerId>,
    /// Number of ships that may dock simultaneously.
    pub docking_spots: u32,
    /// Ships docked or docking.
    pub docked_ships: Vec<ShipId>,
    /// Production accumulated toward the next ship.
    pub current_production: u32,
    /// Production capacity left.
    pub remaining_resources: u32,
}

impl Planet {
    /// Number of ships docked or docking.
    #[must_use]
    pub fn docked_count(&self) -> u32 {
        u32::try_from(self.docked_ships.len()).unwrap_or(u32::MAX)
    }

    /// Reports whether every docking slot is physically occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.docked_count() >= self.docking_spots
    }

    /// Reports whether the planet is owned by `player`.
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Reports whether the planet is owned by anyone other than `player`.
    #[must_use]
    pub fn is_foe_of(&self, player: PlayerId) -> bool {
        self.owner.is_some_and(|owner| owner != player)
    }
}

/// Reference to either kind of entity on the field.
///
/// Ships order before planets so mixed distance ties resolve deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    /// A ship.
    Ship(ShipId),
    /// A planet.
    Planet(PlanetId),
}

/// Entity intervening on a straight segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    /// Entity in the way.
    pub entity: Entity,
    /// Position and radius of the entity.
    pub circle: Circle,
}

/// Obstacle families considered by [`World::obstacles_between`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstacleFilter {
    /// Include ships.
    pub ships: bool,
    /// Include planets.
    pub planets: bool,
}

/// Motion committed by a ship this turn, treated as a moving obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ghost {
    ship: ShipId,
    origin: Circle,
    motion: DVec2,
}

impl Ghost {
    /// Ship that committed the motion.
    #[must_use]
    pub const fn ship(&self) -> ShipId {
        self.ship
    }

    /// Position of the ship at the start of the turn.
    #[must_use]
    pub const fn origin(&self) -> Circle {
        self.origin
    }

    /// Displacement the ship will travel this turn.
    #[must_use]
    pub const fn motion(&self) -> DVec2 {
        self.motion
    }
}

/// Read-mostly view of the field for a single turn.
#[derive(Debug)]
pub struct World {
    turn: u32,
    me: PlayerId,
    width: f64,
    height: f64,
    players: Vec<PlayerId>,
    ships: BTreeMap<ShipId, Ship>,
    planets: BTreeMap<PlanetId, Planet>,
    ghosts: Vec<Ghost>,
    ledger: ReservationLedger,
    stale_settlers: Vec<ShipId>,
}

impl World {
    /// Links `snapshot` into a queryable view and seeds the reservation ledger
    /// from the settle assignments still held in `assignments`.
    #[must_use]
    pub fn new(snapshot: Snapshot, assignments: &AssignmentTable) -> Self {
        let Snapshot {
            turn,
            me,
            width,
            height,
            players,
            planets,
        } = snapshot;

        let mut ships = BTreeMap::new();
        let mut player_ids = Vec::with_capacity(players.len());
        for player in players {
            player_ids.push(player.id);
            for ship in player.ships {
                let linked = Ship {
                    id: ship.id,
                    owner: player.id,
                    position: ship.position,
                    health: ship.health,
                    velocity: DVec2::from_array(ship.velocity),
                    docking: ship.docking,
                    docked_planet: ship.docked_planet,
                };
                if let Some(previous) = ships.insert(ship.id, linked) {
                    warn!(
                        ship = ship.id.get(),
                        owner = previous.owner.get(),
                        "duplicate ship id in snapshot, keeping the later entry"
                    );
                }
            }
        }
        player_ids.sort();
        player_ids.dedup();

        let planets = planets
            .into_iter()
            .map(|planet| {
                (
                    planet.id,
                    Planet {
                        id: planet.id,
                        position: planet.position,
                        health: planet.health,
                        owner: planet.owner,
                        docking_spots: planet.docking_spots,
                        docked_ships: planet.docked_ships,
                        current_production: planet.current_production,
                        remaining_resources: planet.remaining_resources,
                    },
                )
            })
            .collect();

        let mut world = Self {
            turn,
            me,
            width,
            height,
            players: player_ids,
            ships,
            planets,
            ghosts: Vec::new(),
            ledger: ReservationLedger::default(),
            stale_settlers: Vec::new(),
        };
        world.seed_reservations(assignments);
        world
    }

    fn seed_reservations(&mut self, assignments: &AssignmentTable) {
        for (ship, planet) in assignments.settle_reservations() {
            let owned = self.ships.get(&ship).is_some_and(|found| found.owner == self.me);
            if !owned {
                debug!(
                    ship = ship.get(),
                    planet = planet.get(),
                    "skipping reservation held by a ship not in play"
                );
                continue;
            }
            if let Err(error) = self.reserve_dock(ship, planet) {
                warn!(
                    ship = ship.get(),
                    planet = planet.get(),
                    %error,
                    "dropping stale settle reservation"
                );
                self.stale_settlers.push(ship);
            }
        }
    }

    /// Our ships whose settle commitment could not be re-reserved when the
    /// ledger was seeded. Their roles hold no dock and should be cleared.
    #[must_use]
    pub fn stale_settlers(&self) -> &[ShipId] {
        &self.stale_settlers
    }

    /// Turn number of the snapshot.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Player controlled by this process.
    #[must_use]
    pub const fn me(&self) -> PlayerId {
        self.me
    }

    /// Width of the field.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Height of the field.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Number of players taking part.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Ship with the given id, if still alive.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    /// Planet with the given id, if still present.
    #[must_use]
    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(&id)
    }

    /// Every ship in id order.
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    /// Every planet in id order.
    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.values()
    }

    /// Ships owned by `player`, in id order.
    pub fn ships_of(&self, player: PlayerId) -> impl Iterator<Item = &Ship> {
        self.ships.values().filter(move |ship| ship.owner == player)
    }

    /// Ships owned by this process, in id order.
    pub fn my_ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships_of(self.me)
    }

    /// Ships owned by every other player, in id order.
    pub fn foe_ships(&self) -> impl Iterator<Item = &Ship> {
        let me = self.me;
        self.ships.values().filter(move |ship| ship.owner != me)
    }

    /// Reports whether `ship` still exists and belongs to `owner`.
    #[must_use]
    pub fn foe_exists(&self, owner: PlayerId, ship: ShipId) -> bool {
        self.ships.get(&ship).is_some_and(|found| found.owner == owner)
    }

    /// Ships accepted by `keep`, ordered by ascending distance from `from`.
    ///
    /// Equal distances are ordered by ship id.
    pub fn nearest_ships<F>(&self, from: Circle, mut keep: F) -> Vec<(f64, &Ship)>
    where
        F: FnMut(&Ship) -> bool,
    {
        let mut found: Vec<(f64, &Ship)> = self
            .ships
            .values()
            .filter(|ship| keep(ship))
            .map(|ship| (distance(from, ship.position), ship))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
        found
    }

    /// Planets accepted by `keep`, ordered by ascending distance from `from`.
    ///
    /// Equal distances are ordered by planet id.
    pub fn nearest_planets<F>(&self, from: Circle, mut keep: F) -> Vec<(f64, &Planet)>
    where
        F: FnMut(&Planet) -> bool,
    {
        let mut found: Vec<(f64, &Planet)> = self
            .planets
            .values()
            .filter(|planet| keep(planet))
            .map(|planet| (distance(from, planet.position), planet))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
        found
    }

    /// Every ship and planet ordered by ascending distance from `from`.
    #[must_use]
    pub fn nearby_entities(&self, from: Circle) -> Vec<(f64, Entity)> {
        let ships = self
            .ships
            .values()
            .map(|ship| (distance(from, ship.position), Entity::Ship(ship.id)));
        let planets = self
            .planets
            .values()
            .map(|planet| (distance(from, planet.position), Entity::Planet(planet.id)));
        let mut found: Vec<(f64, Entity)> = ships.chain(planets).collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found
    }

    /// Entities other than `mover` that the segment from the mover's centre to
    /// `end` passes within `fudge` of.
    #[must_use]
    pub fn obstacles_between(
        &self,
        mover: &Ship,
        end: DVec2,
        fudge: f64,
        filter: ObstacleFilter,
    ) -> Vec<Obstacle> {
        let start = mover.position.center();
        let mut found = Vec::new();
        if filter.ships {
            found.extend(
                self.ships
                    .values()
                    .filter(|ship| ship.id != mover.id)
                    .filter(|ship| intersects_segment(start, end, ship.position, fudge))
                    .map(|ship| Obstacle {
                        entity: Entity::Ship(ship.id),
                        circle: ship.position,
                    }),
            );
        }
        if filter.planets {
            found.extend(
                self.planets
                    .values()
                    .filter(|planet| intersects_segment(start, end, planet.position, fudge))
                    .map(|planet| Obstacle {
                        entity: Entity::Planet(planet.id),
                        circle: planet.position,
                    }),
            );
        }
        found
    }

    /// Records the motion `ship` committed to this turn.
    pub fn record_ghost(&mut self, ship: ShipId, origin: Circle, motion: DVec2) {
        self.ghosts.push(Ghost {
            ship,
            origin,
            motion,
        });
    }

    /// Motions committed so far this turn, in recording order.
    #[must_use]
    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    /// Docking slots on `planet` that are neither occupied nor reserved.
    ///
    /// Unknown planets report zero.
    #[must_use]
    pub fn free_slots(&self, planet: PlanetId) -> u32 {
        let Some(found) = self.planets.get(&planet) else {
            return 0;
        };
        let capacity = found.docking_spots.saturating_sub(found.docked_count());
        let reserved = self.ledger.count_on(planet);
        debug_assert!(
            reserved <= capacity,
            "planet {planet} holds {reserved} reservations for {capacity} free slots"
        );
        if reserved > capacity {
            error!(
                planet = planet.get(),
                reserved, capacity, "reservations exceed free docking capacity"
            );
            return 0;
        }
        capacity - reserved
    }

    /// Planet on which `ship` holds a reservation, if any.
    #[must_use]
    pub fn reservation(&self, ship: ShipId) -> Option<PlanetId> {
        self.ledger.held_by(ship)
    }

    /// Reserves a docking slot on `planet` for `ship`, returning the slots left.
    ///
    /// A reservation already held by the ship is moved to `planet`.
    pub fn reserve_dock(&mut self, ship: ShipId, planet: PlanetId) -> Result<u32, ReservationError> {
        if !self.planets.contains_key(&planet) {
            return Err(ReservationError::UnknownPlanet { planet });
        }
        if self.ledger.held_by(ship) == Some(planet) {
            return Ok(self.free_slots(planet));
        }
        if self.free_slots(planet) == 0 {
            return Err(ReservationError::NoFreeSlot { planet });
        }
        if let Some(previous) = self.ledger.hold(ship, planet) {
            debug!(
                ship = ship.get(),
                from = previous.get(),
                to = planet.get(),
                "moved settle reservation"
            );
        }
        Ok(self.free_slots(planet))
    }

    /// Releases the reservation held by `ship`, returning the planet it was on.
    pub fn release_dock(&mut self, ship: ShipId) -> Option<PlanetId> {
        let released = self.ledger.release(ship);
        if let Some(planet) = released {
            debug!(ship = ship.get(), planet = planet.get(), "released settle reservation");
        }
        released
    }
}

/// Derived read-only queries over a [`World`].
pub mod query {
    use armada_core::{geometry::distance, Circle};
    use glam::DVec2;

    use super::{Planet, Ship, World};

    /// Foe ships within `radius` of `from`, nearest first.
    #[must_use]
    pub fn foes_within<'a>(world: &'a World, from: Circle, radius: f64) -> Vec<(f64, &'a Ship)> {
        let me = world.me();
        world
            .nearest_ships(from, |ship| ship.owner != me)
            .into_iter()
            .take_while(|(gap, _)| *gap <= radius)
            .collect()
    }

    /// Nearest foe ship to `from`, if any foe remains.
    #[must_use]
    pub fn nearest_foe<'a>(world: &'a World, from: Circle) -> Option<(f64, &'a Ship)> {
        let me = world.me();
        world
            .nearest_ships(from, |ship| ship.owner != me)
            .into_iter()
            .next()
    }

    /// Planets owned by other players, nearest first.
    #[must_use]
    pub fn foe_planets<'a>(world: &'a World, from: Circle) -> Vec<(f64, &'a Planet)> {
        let me = world.me();
        world.nearest_planets(from, |planet| planet.is_foe_of(me))
    }

    /// Mean position of every foe ship, if any foe remains.
    #[must_use]
    pub fn foe_centroid(world: &World) -> Option<DVec2> {
        let (sum, count) = world
            .foe_ships()
            .fold((DVec2::ZERO, 0_u32), |(sum, count), ship| {
                (sum + ship.position.center(), count + 1)
            });
        (count > 0).then(|| sum / f64::from(count))
    }

    /// Corners of the field, clockwise from the origin.
    #[must_use]
    pub fn corners(world: &World) -> [Circle; 4] {
        [
            Circle::point(0.0, 0.0),
            Circle::point(world.width(), 0.0),
            Circle::point(world.width(), world.height()),
            Circle::point(0.0, world.height()),
        ]
    }

    /// Corner of the field farthest from `point`; ties keep the earlier corner.
    #[must_use]
    pub fn farthest_corner(world: &World, point: DVec2) -> Circle {
        let reference = Circle::from_center(point, 0.0);
        let mut best = Circle::point(0.0, 0.0);
        let mut best_gap = f64::NEG_INFINITY;
        for corner in corners(world) {
            let gap = distance(reference, corner);
            if gap > best_gap {
                best = corner;
                best_gap = gap;
            }
        }
        best
    }

    /// Number of undocked ships owned by this process.
    #[must_use]
    pub fn undocked_count(world: &World) -> usize {
        world.my_ships().filter(|ship| ship.is_undocked()).count()
    }
}
