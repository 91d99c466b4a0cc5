#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pulls docked ships off owned planets when the fleet leaves them exposed.

use armada_core::{
    AssignmentTable, Command, CommandSet, DefenseTuning, DockingStatus, Role, RoleKind, ShipId,
    Tuning,
};
use armada_world::{query, World};
use tracing::{debug, info};

/// Planet-defense watchdog run once per turn after every ship has stepped.
#[derive(Clone, Debug)]
pub struct Watchdog {
    tuning: DefenseTuning,
}

impl Watchdog {
    /// Creates the watchdog from the shared tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tuning: tuning.defense.clone(),
        }
    }

    /// Checks every owned planet in id order and undocks defenders where foes
    /// approach while live defense is short.
    ///
    /// Each pulled ship is committed to [`Role::Defend`] anchored at its
    /// planet's centre and issued an undock order. Returns the pulled ships.
    pub fn handle(
        &self,
        world: &World,
        table: &mut AssignmentTable,
        commands: &mut CommandSet,
    ) -> Vec<ShipId> {
        let me = world.me();
        let mut pulled = Vec::new();

        for planet in world.planets().filter(|planet| planet.is_owned_by(me)) {
            let live = table.count_where(RoleKind::is_live_defense);
            if live >= self.tuning.min_live_defense {
                break;
            }
            let approaching = query::foes_within(
                world,
                planet.position,
                planet.position.radius() + self.tuning.threat_radius,
            )
            .len();
            if approaching == 0 {
                continue;
            }

            let wanted = approaching.min(self.tuning.min_live_defense - live);
            let anchor = planet.position.with_radius(0.0);
            let mut docked = planet.docked_ships.clone();
            docked.sort_unstable();
            let candidates: Vec<ShipId> = docked
                .into_iter()
                .filter(|ship| {
                    world.ship(*ship).is_some_and(|found| {
                        found.owner == me && found.docking == DockingStatus::Docked
                    })
                })
                .filter(|ship| !table.is_active(*ship))
                .take(wanted)
                .collect();
            if candidates.is_empty() {
                debug!(planet = planet.id.get(), approaching, "no docked ship free to defend");
                continue;
            }

            for ship in candidates {
                table.commit(ship, Role::Defend { anchor: Some(anchor) }, world.turn());
                commands.issue(Command::Undock { ship });
                pulled.push(ship);
            }
            info!(
                planet = planet.id.get(),
                approaching,
                live,
                pulled = pulled.len(),
                "undocked ships to defend planet"
            );
        }
        pulled
    }
}
