#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn orchestration for the fleet.
//!
//! The [`Commander`] owns the only state that outlives a turn, the
//! [`AssignmentTable`]. Each call to [`Commander::play_turn`] links a fresh
//! [`World`] from the snapshot, walks our ships in ascending id order under a
//! soft wall-clock budget, and collects one command per ship.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    time::{Duration, Instant},
};

use armada_core::{AssignmentTable, CommandSet, ShipId, Snapshot, TurnTuning, Tuning};
use armada_system_allocation::{AllocationOutcome, Allocator};
use armada_system_behavior::Behavior;
use armada_system_defense_watchdog::Watchdog;
use armada_world::{query, Ship, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, info_span, warn};

/// Counters describing how a turn went.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnStats {
    /// Turn number taken from the snapshot.
    pub turn: u32,
    /// Assignments dropped because their ship vanished.
    pub pruned: usize,
    /// Surplus defenders turned into fighters.
    pub rebalanced: usize,
    /// Ships newly designated as kamikazes.
    pub kamikazes: usize,
    /// Ships given a role by the allocator.
    pub assigned: usize,
    /// Ships whose role was stepped.
    pub processed: usize,
    /// Ships whose step failed or panicked.
    pub faults: usize,
    /// Docked ships pulled out by the defense watchdog.
    pub pulled_defenders: usize,
    /// Undocked ships we own at the start of the turn.
    pub undocked: usize,
    /// Whether the wall-clock budget cut the ship loop short.
    pub budget_exceeded: bool,
}

/// Outcome of one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnReport {
    /// Commands to send, one per ship at most.
    pub commands: CommandSet,
    /// Bookkeeping for logs and tests.
    pub stats: TurnStats,
}

/// Per-game driver that plays one turn per snapshot.
#[derive(Debug)]
pub struct Commander {
    turn: TurnTuning,
    allocator: Allocator,
    behavior: Behavior,
    watchdog: Watchdog,
    assignments: AssignmentTable,
}

impl Commander {
    /// Creates a commander with an empty assignment table.
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self {
            allocator: Allocator::new(&tuning),
            behavior: Behavior::new(&tuning),
            watchdog: Watchdog::new(&tuning),
            turn: tuning.turn,
            assignments: AssignmentTable::new(),
        }
    }

    /// Assignments carried into the next turn.
    #[must_use]
    pub fn assignments(&self) -> &AssignmentTable {
        &self.assignments
    }

    /// Plays one turn and returns the commands to send.
    pub fn play_turn(&mut self, snapshot: Snapshot) -> TurnReport {
        let started = Instant::now();
        let budget = Duration::from_millis(self.turn.budget_ms);
        let interval = self.turn.budget_check_interval.max(1);
        let _span = info_span!("turn", turn = snapshot.turn).entered();

        let mut stats = TurnStats {
            turn: snapshot.turn,
            ..TurnStats::default()
        };
        let mut commands = CommandSet::new();
        let mut rng = turn_rng(self.turn.seed, snapshot.turn);

        let living = living_ships(&snapshot);
        let pruned = self
            .assignments
            .prune(|ship| living.binary_search(&ship).is_ok());
        for (ship, assignment) in &pruned {
            if let Some(planet) = assignment.role().reserved_planet() {
                debug!(ship = ship.get(), planet = planet.get(), "released reservation of lost ship");
            }
        }
        stats.pruned = pruned.len();

        let mut world = World::new(snapshot, &self.assignments);
        for ship in world.stale_settlers() {
            if self.assignments.clear(*ship).is_some() {
                debug!(ship = ship.get(), "cleared settle role left without a dock");
            }
        }
        stats.undocked = query::undocked_count(&world);
        stats.rebalanced = self
            .allocator
            .rebalance_defenders(&mut self.assignments, world.turn())
            .len();
        stats.kamikazes = self
            .allocator
            .designate_kamikazes(&mut world, &mut self.assignments)
            .len();

        let mine: Vec<ShipId> = world.my_ships().map(|ship| ship.id).collect();
        for (index, ship) in mine.into_iter().enumerate() {
            if index > 0 && index % interval == 0 && started.elapsed() >= budget {
                warn!(
                    processed = stats.processed,
                    elapsed_ms = started.elapsed().as_millis(),
                    "turn budget exceeded, leaving remaining ships idle"
                );
                stats.budget_exceeded = true;
                break;
            }

            let undocked = world.ship(ship).is_some_and(Ship::is_undocked);
            if undocked && !self.assignments.is_active(ship) {
                if let AllocationOutcome::Assigned(_) =
                    self.allocator.assign(ship, &mut world, &mut self.assignments)
                {
                    stats.assigned += 1;
                }
            }

            let behavior = &self.behavior;
            let assignments = &mut self.assignments;
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                behavior.step(ship, &mut world, assignments, &mut rng)
            }));
            stats.processed += 1;
            match outcome {
                Ok(Ok(Some(command))) => commands.issue(command),
                Ok(Ok(None)) => {}
                Ok(Err(fault)) => {
                    stats.faults += 1;
                    warn!(ship = ship.get(), %fault, "ship step failed");
                }
                Err(_) => {
                    stats.faults += 1;
                    error!(ship = ship.get(), "ship step panicked");
                }
            }
        }

        if !stats.budget_exceeded {
            stats.pulled_defenders = self
                .watchdog
                .handle(&world, &mut self.assignments, &mut commands)
                .len();
        }

        info!(
            commands = commands.len(),
            assigned = stats.assigned,
            faults = stats.faults,
            elapsed_ms = started.elapsed().as_millis(),
            "turn complete"
        );
        TurnReport { commands, stats }
    }
}

/// Ids of every ship present in `snapshot`, sorted.
fn living_ships(snapshot: &Snapshot) -> Vec<ShipId> {
    let mut ids: Vec<ShipId> = snapshot
        .players
        .iter()
        .flat_map(|player| player.ships.iter().map(|ship| ship.id))
        .collect();
    ids.sort_unstable();
    ids
}

/// Random source for `turn`, independent of the draws earlier turns made.
fn turn_rng(seed: u64, turn: u32) -> ChaCha8Rng {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(turn.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 32];
    bytes.copy_from_slice(&digest);
    ChaCha8Rng::from_seed(bytes)
}
