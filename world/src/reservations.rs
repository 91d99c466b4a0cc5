use std::collections::BTreeMap;

use armada_core::{PlanetId, ShipId};
use thiserror::Error;

/// Reasons a docking reservation may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ReservationError {
    /// The planet is not part of the current snapshot.
    #[error("planet {planet} does not exist")]
    UnknownPlanet {
        /// Planet the reservation targeted.
        planet: PlanetId,
    },
    /// Every docking slot on the planet is occupied or already reserved.
    #[error("planet {planet} has no free docking slot")]
    NoFreeSlot {
        /// Planet the reservation targeted.
        planet: PlanetId,
    },
}

/// Outstanding settle reservations, at most one per ship.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReservationLedger {
    holds: BTreeMap<ShipId, PlanetId>,
}

impl ReservationLedger {
    pub(crate) fn held_by(&self, ship: ShipId) -> Option<PlanetId> {
        self.holds.get(&ship).copied()
    }

    pub(crate) fn count_on(&self, planet: PlanetId) -> u32 {
        let held = self.holds.values().filter(|held| **held == planet).count();
        u32::try_from(held).unwrap_or(u32::MAX)
    }

    pub(crate) fn hold(&mut self, ship: ShipId, planet: PlanetId) -> Option<PlanetId> {
        self.holds.insert(ship, planet)
    }

    pub(crate) fn release(&mut self, ship: ShipId) -> Option<PlanetId> {
        self.holds.remove(&ship)
    }
}
