//! Mutable state for one simulation run, with snapshot-based undo/redo
//!
//! Every recorded interaction takes a snapshot of the restorable
//! portion of the state into a bounded [`SnapshotLog`], enabling
//! time-travel without replaying evaluations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserResponse;
use super::snapshot::SnapshotLog;

/// Lifecycle status of a simulation run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Failed,
    Paused,
}

/// One evaluated interaction in the run history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    pub interaction_id: String,
    pub response: UserResponse,
    pub points: f64,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
}

/// The restorable portion of a simulation state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationSnapshot {
    pub status: SimulationStatus,
    pub current_interaction_id: Option<String>,
    pub history: Vec<InteractionRecord>,
    pub score: f64,
}

/// Mutable record of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Simulation being run (weak reference by id)
    pub simulation_id: String,
    /// Lifecycle status
    pub status: SimulationStatus,
    /// Current position; `None` before start and after completion
    pub current_interaction_id: Option<String>,
    /// Evaluated interactions, in order
    pub history: Vec<InteractionRecord>,
    /// Cumulative score
    pub score: f64,
    /// Bounded undo/redo log; runtime-only
    #[serde(skip, default)]
    snapshots: SnapshotLog<SimulationSnapshot>,
}

impl SimulationState {
    /// Fresh state for one run of `simulation_id`
    pub fn new(simulation_id: impl Into<String>) -> Self {
        let mut state = Self {
            simulation_id: simulation_id.into(),
            status: SimulationStatus::NotStarted,
            current_interaction_id: None,
            history: Vec::new(),
            score: 0.0,
            snapshots: SnapshotLog::new(),
        };
        // Baseline snapshot so the first undo returns to the start.
        state.snapshots.record(state.snapshot());
        state
    }

    fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            status: self.status,
            current_interaction_id: self.current_interaction_id.clone(),
            history: self.history.clone(),
            score: self.score,
        }
    }

    fn restore(&mut self, snapshot: SimulationSnapshot) {
        self.status = snapshot.status;
        self.current_interaction_id = snapshot.current_interaction_id;
        self.history = snapshot.history;
        self.score = snapshot.score;
    }

    /// Enter the running status at the first interaction and snapshot,
    /// so undo can return to the top of the scenario
    pub fn begin(&mut self, first_interaction_id: impl Into<String>) {
        self.status = SimulationStatus::InProgress;
        self.current_interaction_id = Some(first_interaction_id.into());
        self.snapshots.record(self.snapshot());
    }

    /// Append an evaluated interaction, add its points to the
    /// cumulative score, move to `next`, and take a snapshot
    pub fn record_interaction(&mut self, record: InteractionRecord, next: Option<String>) {
        self.score += record.points;
        self.history.push(record);
        self.current_interaction_id = next;
        self.snapshots.record(self.snapshot());
    }

    /// Change lifecycle status without touching history or score
    pub fn set_status(&mut self, status: SimulationStatus) {
        self.status = status;
    }

    /// Swap in the previous snapshot; false when at the oldest
    pub fn undo(&mut self) -> bool {
        match self.snapshots.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    /// Swap in the next snapshot; false when at the newest
    pub fn redo(&mut self) -> bool {
        match self.snapshots.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.snapshots.can_redo()
    }

    /// Number of snapshots currently retained
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}
