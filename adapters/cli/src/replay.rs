//! Replays recorded snapshots through the commander.
//!
//! A replay file holds one JSON snapshot per line. Each snapshot is played as
//! a turn and the rendered command line is written to the output, one line per
//! turn, matching what the engine would receive.

use std::io::{self, BufRead, Write};

use armada_core::Snapshot;
use armada_system_commander::Commander;
use thiserror::Error;
use tracing::debug;

/// Totals gathered over a replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ReplaySummary {
    /// Turns played.
    pub(crate) turns: usize,
    /// Commands written across every turn.
    pub(crate) commands: usize,
    /// Ship steps that failed or panicked.
    pub(crate) faults: usize,
}

/// Errors raised while replaying a recording.
#[derive(Debug, Error)]
pub(crate) enum ReplayError {
    /// The input could not be read.
    #[error("could not read line {line}")]
    Read {
        /// One-based line number.
        line: usize,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// A line did not hold a valid snapshot.
    #[error("line {line} is not a valid snapshot")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },
    /// Commands could not be written.
    #[error("could not write commands for line {line}")]
    Write {
        /// One-based line number.
        line: usize,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

/// Plays every snapshot in `input` and writes one command line per turn.
///
/// Blank lines are skipped. The first malformed line aborts the replay.
pub(crate) fn replay<R, W>(
    input: R,
    commander: &mut Commander,
    output: &mut W,
) -> Result<ReplaySummary, ReplayError>
where
    R: BufRead,
    W: Write,
{
    let mut summary = ReplaySummary::default();
    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|source| ReplayError::Read {
            line: line_number,
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let snapshot: Snapshot = serde_json::from_str(&line).map_err(|source| ReplayError::Parse {
            line: line_number,
            source,
        })?;
        let report = commander.play_turn(snapshot);
        debug!(line = line_number, stats = ?report.stats, "played recorded turn");

        writeln!(output, "{}", report.commands.render()).map_err(|source| ReplayError::Write {
            line: line_number,
            source,
        })?;
        summary.turns += 1;
        summary.commands += report.commands.len();
        summary.faults += report.stats.faults;
    }
    output.flush().map_err(|source| ReplayError::Write {
        line: summary.turns,
        source,
    })?;
    Ok(summary)
}
