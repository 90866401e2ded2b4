//! Scenario engine
//!
//! A UI-agnostic, in-memory core for scripted training activities:
//! - Dialog trees: branching interrogation scripts walked node by node,
//!   scoring each choice against fixed communication-quality metrics
//! - Generic simulations: quizzes, form exercises, and drag-drop
//!   categorization evaluated per interaction kind, with pause/resume
//!   and bounded undo/redo
//! - A synchronous event bus decoupling both engines from their
//!   presentation-layer observers
//!
//! Content arrives as authored graphs (static JSON-like data); the
//! engines validate all id references eagerly and report failures as
//! typed errors, so a broken edge is rejected at load time instead of
//! stalling a trainee mid-scenario.

pub mod engine;
pub mod error;
pub mod events;
pub mod simulation;
pub mod state;
pub mod tree;
pub mod value_objects;

// Re-export main types
pub use engine::{
    DialogEngine, DialogEngineConfig, EngineStatus, PendingAdvance, SelectionOutcome,
};

pub use error::{EngineError, EngineResult, GraphDefect};

pub use events::{
    BusEvent, DialogEvent, DialogEventKind, EventBus, RestoreDirection, SimulationEvent,
    SimulationEventKind, SubscriptionId,
};

pub use simulation::{
    Evaluation, Interaction, InteractionKind, InteractionOption, Outcome, Scenario, Simulation,
    SimulationKind, UserResponse,
    engine::{AnalyticsSink, ProgressSink, SimulationEngine},
    snapshot::SnapshotLog,
    state::{InteractionRecord, SimulationState, SimulationStatus},
};

pub use state::{DialogState, HistoryEntry};

pub use tree::{DialogNode, DialogTree};

pub use value_objects::{
    DialogOption, EmotionalState, Message, MessageKind, Metric, MetricDeltas, MetricTotals,
    Participant, ParticipantCategory,
};
