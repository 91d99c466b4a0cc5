//! Persistent role commitments that survive across turns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{geometry::Circle, PlanetId, PlayerId, ShipId};

/// Enemy ship locked as a target, addressed by owner and id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockedFoe {
    /// Identifier of the enemy ship.
    pub ship: ShipId,
    /// Player that owns the enemy ship.
    pub owner: PlayerId,
}

/// Behaviour a ship is committed to, together with its role-specific payload.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Role {
    /// Fly to a planet and dock, holding a reservation on one of its slots.
    Settle {
        /// Planet whose docking slot is reserved.
        planet: PlanetId,
    },
    /// Settle variant that engages foes met on the way.
    VigilantSettle {
        /// Planet whose docking slot is reserved.
        planet: PlanetId,
    },
    /// Dive at enemy ships, preferring docked ones, ignoring obstacles.
    Bomb {
        /// Foe-owned planet the bomber was sent against, if any.
        planet: Option<PlanetId>,
        /// Enemy ship currently locked.
        foe: Option<LockedFoe>,
    },
    /// Chase and engage the nearest enemy ship.
    Fight {
        /// Enemy ship currently locked.
        foe: Option<LockedFoe>,
    },
    /// Guard an anchor position against foes in range.
    Defend {
        /// Position to guard, captured on first entry when absent.
        anchor: Option<Circle>,
    },
    /// Evasive scout kept away from the enemy fleet.
    Runner,
    /// Ram a foe-owned planet at full speed.
    Kamikaze {
        /// Planet being rammed.
        planet: Option<PlanetId>,
    },
    /// Terminal no-op state.
    Nothing,
}

impl Role {
    /// Fight role with no locked target.
    #[must_use]
    pub const fn fight() -> Self {
        Self::Fight { foe: None }
    }

    /// Discriminant of the role, stripped of payload.
    #[must_use]
    pub const fn kind(&self) -> RoleKind {
        match self {
            Self::Settle { .. } => RoleKind::Settle,
            Self::VigilantSettle { .. } => RoleKind::VigilantSettle,
            Self::Bomb { .. } => RoleKind::Bomb,
            Self::Fight { .. } => RoleKind::Fight,
            Self::Defend { .. } => RoleKind::Defend,
            Self::Runner => RoleKind::Runner,
            Self::Kamikaze { .. } => RoleKind::Kamikaze,
            Self::Nothing => RoleKind::Nothing,
        }
    }

    /// Planet on which this role holds a docking reservation.
    #[must_use]
    pub const fn reserved_planet(&self) -> Option<PlanetId> {
        match self {
            Self::Settle { planet } | Self::VigilantSettle { planet } => Some(*planet),
            _ => None,
        }
    }
}

/// Payload-free role discriminant used for counting and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleKind {
    /// See [`Role::Settle`].
    Settle,
    /// See [`Role::VigilantSettle`].
    VigilantSettle,
    /// See [`Role::Bomb`].
    Bomb,
    /// See [`Role::Fight`].
    Fight,
    /// See [`Role::Defend`].
    Defend,
    /// See [`Role::Runner`].
    Runner,
    /// See [`Role::Kamikaze`].
    Kamikaze,
    /// See [`Role::Nothing`].
    Nothing,
}

impl RoleKind {
    /// Reports whether the role counts toward live planet defense.
    #[must_use]
    pub const fn is_live_defense(self) -> bool {
        matches!(
            self,
            Self::Defend | Self::Fight | Self::Settle | Self::VigilantSettle | Self::Runner
        )
    }
}

/// Role commitment for one ship.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    role: Role,
    since_turn: u32,
}

impl Assignment {
    /// Creates an assignment committed on `turn`.
    #[must_use]
    pub const fn new(role: Role, turn: u32) -> Self {
        Self {
            role,
            since_turn: turn,
        }
    }

    /// Role the ship is committed to.
    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Mutable access to the role payload, used to lock targets in place.
    pub fn role_mut(&mut self) -> &mut Role {
        &mut self.role
    }

    /// Turn on which the current role was committed.
    #[must_use]
    pub const fn since_turn(&self) -> u32 {
        self.since_turn
    }
}

/// Table of assignments keyed by ship id, persisted across turns.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentTable {
    entries: BTreeMap<ShipId, Assignment>,
}

impl AssignmentTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assignment held by `ship`, if any.
    #[must_use]
    pub fn get(&self, ship: ShipId) -> Option<&Assignment> {
        self.entries.get(&ship)
    }

    /// Mutable assignment held by `ship`, if any.
    pub fn get_mut(&mut self, ship: ShipId) -> Option<&mut Assignment> {
        self.entries.get_mut(&ship)
    }

    /// Role held by `ship`, if any.
    #[must_use]
    pub fn role(&self, ship: ShipId) -> Option<&Role> {
        self.entries.get(&ship).map(Assignment::role)
    }

    /// Reports whether `ship` holds an assignment other than [`Role::Nothing`].
    #[must_use]
    pub fn is_active(&self, ship: ShipId) -> bool {
        self.role(ship)
            .is_some_and(|role| role.kind() != RoleKind::Nothing)
    }

    /// Commits `ship` to `role`, replacing any previous assignment.
    pub fn commit(&mut self, ship: ShipId, role: Role, turn: u32) {
        let _ = self.entries.insert(ship, Assignment::new(role, turn));
    }

    /// Removes the assignment held by `ship`, returning it.
    pub fn clear(&mut self, ship: ShipId) -> Option<Assignment> {
        self.entries.remove(&ship)
    }

    /// Removes every assignment whose ship fails `keep`, returning the removed entries.
    pub fn prune<F>(&mut self, mut keep: F) -> Vec<(ShipId, Assignment)>
    where
        F: FnMut(ShipId) -> bool,
    {
        let doomed: Vec<ShipId> = self
            .entries
            .keys()
            .copied()
            .filter(|ship| !keep(*ship))
            .collect();
        doomed
            .into_iter()
            .filter_map(|ship| self.entries.remove(&ship).map(|entry| (ship, entry)))
            .collect()
    }

    /// Number of assignments holding a role of `kind`.
    #[must_use]
    pub fn count(&self, kind: RoleKind) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.role().kind() == kind)
            .count()
    }

    /// Number of assignments whose role satisfies `predicate`.
    #[must_use]
    pub fn count_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(RoleKind) -> bool,
    {
        self.entries
            .values()
            .filter(|entry| predicate(entry.role().kind()))
            .count()
    }

    /// Iterator over `(ship, assignment)` pairs in ascending ship order.
    pub fn iter(&self) -> impl Iterator<Item = (ShipId, &Assignment)> {
        self.entries.iter().map(|(ship, entry)| (*ship, entry))
    }

    /// Iterator over outstanding settle reservations as `(ship, planet)` pairs.
    pub fn settle_reservations(&self) -> impl Iterator<Item = (ShipId, PlanetId)> + '_ {
        self.entries
            .iter()
            .filter_map(|(ship, entry)| entry.role().reserved_planet().map(|planet| (*ship, planet)))
    }

    /// Number of assignments held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
