//! Generic simulation engine for quiz, form, and drag-drop activities
//!
//! Same shape as the dialog engine, over the interaction model instead
//! of the conversation graph. Adds pause/resume, full reset, and
//! snapshot-based undo/redo. Persistence and analytics are external
//! collaborators behind sink traits; their failures are best-effort
//! telemetry, logged and never surfaced.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::state::{InteractionRecord, SimulationState, SimulationStatus};
use super::{Evaluation, Interaction, Simulation, UserResponse};
use crate::error::{EngineError, EngineResult};
use crate::events::{EventBus, RestoreDirection, SimulationEvent, SimulationEventKind, SubscriptionId};

/// Best-effort progress persistence (key-value store, REST endpoint)
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn save(&self, state: &SimulationState) -> anyhow::Result<()>;
}

/// Best-effort analytics delivery
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn track(&self, event: &SimulationEvent) -> anyhow::Result<()>;
}

/// Runs one [`Simulation`], evaluating responses and emitting events
pub struct SimulationEngine {
    simulation: Simulation,
    state: SimulationState,
    bus: EventBus<SimulationEvent>,
    progress_sink: Option<Arc<dyn ProgressSink>>,
    analytics_sink: Option<Arc<dyn AnalyticsSink>>,
}

impl SimulationEngine {
    /// Build an engine over `simulation`, rejecting malformed scenarios
    pub fn new(simulation: Simulation) -> EngineResult<Self> {
        simulation
            .scenario
            .validate()
            .map_err(|defects| EngineError::MalformedGraph { defects })?;

        let state = SimulationState::new(simulation.id.clone());
        Ok(Self {
            simulation,
            state,
            bus: EventBus::new(),
            progress_sink: None,
            analytics_sink: None,
        })
    }

    /// Inject a progress sink
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    /// Inject an analytics sink
    pub fn with_analytics_sink(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics_sink = Some(sink);
        self
    }

    fn transition_error(&self, to: &str) -> EngineError {
        EngineError::InvalidTransition {
            from: format!("{:?}", self.state.status).to_lowercase(),
            to: to.to_string(),
        }
    }

    /// Begin the scenario at its first interaction
    pub fn start(&mut self) -> EngineResult<()> {
        if self.state.status != SimulationStatus::NotStarted {
            return Err(self.transition_error("in_progress"));
        }
        let first = self.simulation.scenario.first_interaction_id.clone();
        self.state.begin(first.clone());

        info!(simulation_id = %self.simulation.id, "simulation started");
        self.bus.emit(&SimulationEvent::Started {
            simulation_id: self.simulation.id.clone(),
        });
        self.bus.emit(&SimulationEvent::InteractionPresented {
            interaction_id: first,
        });
        Ok(())
    }

    /// Suspend without touching history or score
    pub fn pause(&mut self) -> EngineResult<()> {
        if self.state.status != SimulationStatus::InProgress {
            return Err(self.transition_error("paused"));
        }
        self.state.set_status(SimulationStatus::Paused);
        self.bus.emit(&SimulationEvent::Paused);
        Ok(())
    }

    /// Resume a paused run
    pub fn resume(&mut self) -> EngineResult<()> {
        if self.state.status != SimulationStatus::Paused {
            return Err(self.transition_error("in_progress"));
        }
        self.state.set_status(SimulationStatus::InProgress);
        self.bus.emit(&SimulationEvent::Resumed);
        Ok(())
    }

    /// Discard all state for a full restart (not undo)
    pub fn reset(&mut self) {
        self.state = SimulationState::new(self.simulation.id.clone());
        self.bus.emit(&SimulationEvent::Reset);
    }

    /// Evaluate the trainee's response to the current interaction
    pub fn handle_user_input(&mut self, response: &UserResponse) -> EngineResult<Evaluation> {
        match self.state.status {
            SimulationStatus::InProgress => {}
            SimulationStatus::Completed | SimulationStatus::Failed => {
                return Err(EngineError::AlreadyComplete);
            }
            SimulationStatus::Paused => return Err(self.transition_error("in_progress")),
            SimulationStatus::NotStarted => return Err(EngineError::NotStarted),
        }

        let interaction_id = self
            .state
            .current_interaction_id
            .clone()
            .ok_or(EngineError::NotStarted)?;
        let interaction = self
            .simulation
            .scenario
            .interaction(&interaction_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownInteraction {
                scenario_id: self.simulation.scenario.id.clone(),
                interaction_id: interaction_id.clone(),
            })?;

        let evaluation = match interaction.evaluate_response(response) {
            Ok(evaluation) => evaluation,
            Err(err) => {
                self.bus.emit(&SimulationEvent::Error {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        self.complete_interaction(&interaction, response.clone(), &evaluation);
        Ok(evaluation)
    }

    /// Record an evaluated interaction and advance or complete
    fn complete_interaction(
        &mut self,
        interaction: &Interaction,
        response: UserResponse,
        evaluation: &Evaluation,
    ) {
        debug!(
            interaction_id = %interaction.id,
            points = evaluation.points,
            is_correct = evaluation.is_correct,
            "interaction completed"
        );

        let next = evaluation.next_interaction_id.clone();
        self.state.record_interaction(
            InteractionRecord {
                interaction_id: interaction.id.clone(),
                response,
                points: evaluation.points,
                is_correct: evaluation.is_correct,
                timestamp: Utc::now(),
            },
            next.clone(),
        );

        self.bus.emit(&SimulationEvent::InteractionCompleted {
            interaction_id: interaction.id.clone(),
            points: evaluation.points,
            is_correct: evaluation.is_correct,
        });

        match next {
            Some(next_id) => {
                self.bus.emit(&SimulationEvent::InteractionPresented {
                    interaction_id: next_id,
                });
            }
            None => self.complete(evaluation.is_correct),
        }
    }

    /// Finish the run, selecting the outcome band for the final score
    fn complete(&mut self, last_correct: bool) {
        let outcome = self.simulation.scenario.outcome_for(self.state.score);
        // Without authored outcome bands, the last evaluation decides.
        let passed = outcome.map_or(last_correct, |o| o.passing);
        let outcome_id = outcome.map(|o| o.id.clone());

        self.state.set_status(if passed {
            SimulationStatus::Completed
        } else {
            SimulationStatus::Failed
        });
        self.state.current_interaction_id = None;

        info!(
            simulation_id = %self.simulation.id,
            score = self.state.score,
            passed,
            "simulation complete"
        );
        self.bus.emit(&SimulationEvent::Completed {
            simulation_id: self.simulation.id.clone(),
            score: self.state.score,
            outcome_id,
            passed,
        });
    }

    /// Swap in the previous snapshot
    pub fn undo(&mut self) -> bool {
        let restored = self.state.undo();
        if restored {
            self.bus.emit(&SimulationEvent::HistoryRestored {
                direction: RestoreDirection::Undo,
            });
        }
        restored
    }

    /// Swap in the next snapshot
    pub fn redo(&mut self) -> bool {
        let restored = self.state.redo();
        if restored {
            self.bus.emit(&SimulationEvent::HistoryRestored {
                direction: RestoreDirection::Redo,
            });
        }
        restored
    }

    /// Fire-and-forget progress save; failures are logged, not surfaced
    pub async fn save_progress(&self) {
        if let Some(sink) = &self.progress_sink {
            if let Err(err) = sink.save(&self.state).await {
                warn!(simulation_id = %self.simulation.id, error = %err, "progress save failed");
            }
        }
    }

    /// Fire-and-forget analytics delivery; failures are logged, not surfaced
    pub async fn track_analytics(&self, event: &SimulationEvent) {
        if let Some(sink) = &self.analytics_sink {
            if let Err(err) = sink.track(event).await {
                warn!(simulation_id = %self.simulation.id, error = %err, "analytics delivery failed");
            }
        }
    }

    /// Tear down: drop all listeners
    pub fn destroy(&mut self) {
        self.bus.clear();
    }

    // -- observer wiring ---------------------------------------------------

    /// Register a persistent listener on the engine's bus
    pub fn subscribe(
        &mut self,
        kind: SimulationEventKind,
        callback: impl FnMut(&SimulationEvent) -> anyhow::Result<()> + Send + 'static,
    ) -> SubscriptionId {
        self.bus.on(kind, callback)
    }

    /// Register a one-shot listener
    pub fn subscribe_once(
        &mut self,
        kind: SimulationEventKind,
        callback: impl FnMut(&SimulationEvent) -> anyhow::Result<()> + Send + 'static,
    ) -> SubscriptionId {
        self.bus.once(kind, callback)
    }

    /// Remove a listener registered via subscribe
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    // -- accessors ---------------------------------------------------------

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn status(&self) -> SimulationStatus {
        self.state.status
    }

    pub fn score(&self) -> f64 {
        self.state.score
    }

    pub fn current_interaction(&self) -> Option<&Interaction> {
        self.state
            .current_interaction_id
            .as_deref()
            .and_then(|id| self.simulation.scenario.interaction(id))
    }
}
