//! Dialog engine: walks a [`DialogTree`] according to trainee choices
//!
//! The engine owns one tree, one [`DialogState`], and one event bus.
//! It validates the graph eagerly at construction, applies per-choice
//! communication metrics, and emits lifecycle events consumed by the
//! presentation layer. All operations are synchronous except the
//! narrator auto-advance delay, which is modelled as a tracked,
//! cancellable pending step rather than an unmanaged timer.

use std::time::Duration;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::events::{DialogEvent, DialogEventKind, EventBus, SubscriptionId};
use crate::state::DialogState;
use crate::tree::{DialogNode, DialogTree};
use crate::value_objects::MetricTotals;

/// Engine lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStatus {
    /// Constructed, listeners not yet wired
    Created,
    /// Ready to start
    Initialized,
    /// Traversal in progress
    Running,
    /// Terminal; callers discard and rebuild to replay
    Complete,
}

/// Configuration for a dialog engine instance
#[derive(Debug, Clone)]
pub struct DialogEngineConfig {
    /// Start traversal immediately on initialize
    pub auto_start: bool,
    /// Apply option metric deltas to the running totals
    pub track_metrics: bool,
    /// Delay before an option-less narrator beat advances
    pub auto_advance_delay: Duration,
}

impl Default for DialogEngineConfig {
    fn default() -> Self {
        Self {
            auto_start: false,
            track_metrics: true,
            auto_advance_delay: Duration::from_millis(2000),
        }
    }
}

/// A scheduled narrator advance, tracked so it can be cancelled
///
/// The generation counter guards against stale timers: cancellation,
/// node re-entry, and completion all bump it, so a delayed task that
/// captured an older generation becomes a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdvance {
    /// Node the advance leaves from
    pub from: String,
    /// Node the advance lands on
    pub to: String,
    generation: u64,
}

/// What a completed option selection resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// Authored feedback for the chosen option
    pub feedback: Option<String>,
    /// Where traversal moved, or `None` when the dialog completed
    pub next_node_id: Option<String>,
    /// Whether the chosen option was the recommended one
    pub is_correct: bool,
}

/// Walks a dialog tree, accumulating metrics and emitting events
#[derive(Debug)]
pub struct DialogEngine {
    tree: DialogTree,
    state: DialogState,
    bus: EventBus<DialogEvent>,
    config: DialogEngineConfig,
    status: EngineStatus,
    pending: Option<PendingAdvance>,
    advance_generation: u64,
}

impl DialogEngine {
    /// Build an engine over `tree`, rejecting malformed graphs eagerly
    pub fn new(tree: DialogTree, config: DialogEngineConfig) -> EngineResult<Self> {
        tree.validate()
            .map_err(|defects| EngineError::MalformedGraph { defects })?;

        let state = DialogState::new(tree.id.clone());
        Ok(Self {
            tree,
            state,
            bus: EventBus::new(),
            config,
            status: EngineStatus::Created,
            pending: None,
            advance_generation: 0,
        })
    }

    /// Build an engine with default configuration
    pub fn with_defaults(tree: DialogTree) -> EngineResult<Self> {
        Self::new(tree, DialogEngineConfig::default())
    }

    /// Wire the engine; idempotent
    ///
    /// Emits [`DialogEvent::Initialized`] once. Honors
    /// `config.auto_start`.
    pub fn initialize(&mut self) -> EngineResult<()> {
        if self.status != EngineStatus::Created {
            return Ok(());
        }
        self.status = EngineStatus::Initialized;
        self.bus.emit(&DialogEvent::Initialized);

        if self.config.auto_start {
            self.start()?;
        }
        Ok(())
    }

    /// Begin traversal at the root node
    pub fn start(&mut self) -> EngineResult<()> {
        if self.status == EngineStatus::Created {
            self.initialize()?;
            // auto_start may have driven the whole start path already
            if self.status == EngineStatus::Running || self.status == EngineStatus::Complete {
                return Ok(());
            }
        }
        match self.status {
            EngineStatus::Initialized => {}
            EngineStatus::Running => {
                return Err(EngineError::InvalidTransition {
                    from: "running".into(),
                    to: "running".into(),
                });
            }
            EngineStatus::Complete => return Err(EngineError::AlreadyComplete),
            EngineStatus::Created => unreachable!("initialized above"),
        }

        self.status = EngineStatus::Running;
        let root_id = self.tree.root_node_id.clone();

        info!(tree_id = %self.tree.id, "dialog started");
        self.bus.emit(&DialogEvent::Started {
            tree_id: self.tree.id.clone(),
        });
        self.process_node(&root_id)
    }

    /// Per-node entry hook, invoked whenever the current node changes
    fn process_node(&mut self, node_id: &str) -> EngineResult<()> {
        let node = self
            .tree
            .node(node_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownNode {
                tree_id: self.tree.id.clone(),
                node_id: node_id.to_string(),
            })?;

        // Re-entering a node invalidates any advance scheduled earlier.
        self.cancel_auto_advance();
        self.state.current_node_id = Some(node.id.clone());

        debug!(node_id = %node.id, "entering node");
        self.bus.emit(&DialogEvent::NodeEntered {
            node: node.clone(),
            state: self.state.clone(),
        });

        if node.is_end {
            self.complete();
            return Ok(());
        }

        if let (Some(emotion), Some(participant_id)) = (node.emotion_change, &node.participant_id) {
            if let Some(participant) = self.tree.participants.get_mut(participant_id) {
                participant.emotional_state = emotion;
                self.state.record_emotion(participant_id.clone(), emotion);
                self.bus.emit(&DialogEvent::EmotionChanged {
                    participant_id: participant_id.clone(),
                    state: emotion,
                });
            }
        }

        if node.options.is_empty() {
            if let Some(next) = &node.next_node_id {
                self.advance_generation += 1;
                self.pending = Some(PendingAdvance {
                    from: node.id.clone(),
                    to: next.clone(),
                    generation: self.advance_generation,
                });
                self.bus.emit(&DialogEvent::AutoAdvanceScheduled {
                    from: node.id.clone(),
                    to: next.clone(),
                    delay_ms: self.config.auto_advance_delay.as_millis() as u64,
                });
            }
        }
        Ok(())
    }

    /// Apply the trainee's choice at the current node
    ///
    /// Completion is terminal: once complete, this returns
    /// [`EngineError::AlreadyComplete`] without touching history,
    /// score, or position.
    pub fn select_option(&mut self, option_id: &str) -> EngineResult<SelectionOutcome> {
        match self.status {
            EngineStatus::Complete => return Err(EngineError::AlreadyComplete),
            EngineStatus::Running => {}
            _ => return Err(EngineError::NotStarted),
        }

        let current_id = self
            .state
            .current_node_id
            .clone()
            .ok_or(EngineError::NotStarted)?;
        let node = self
            .tree
            .node(&current_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownNode {
                tree_id: self.tree.id.clone(),
                node_id: current_id.clone(),
            })?;
        let option = node
            .option(option_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownOption {
                node_id: node.id.clone(),
                option_id: option_id.to_string(),
            })?;

        self.bus.emit(&DialogEvent::OptionSelected {
            node_id: node.id.clone(),
            option_id: option.id.clone(),
        });

        let deltas = self
            .config
            .track_metrics
            .then(|| option.communication_deltas());
        self.state
            .record_step(node.id.clone(), Some(option.id.clone()), deltas);

        let next_node_id = option
            .next_node_id
            .clone()
            .or_else(|| node.next_node_id.clone());

        self.bus.emit(&DialogEvent::OptionResolved {
            node_id: node.id.clone(),
            option_id: option.id.clone(),
            feedback: option.feedback.clone(),
            next_node_id: next_node_id.clone(),
            is_correct: option.is_correct,
        });

        match &next_node_id {
            Some(next) => self.process_node(next)?,
            None => self.complete(),
        }

        Ok(SelectionOutcome {
            feedback: option.feedback,
            next_node_id,
            is_correct: option.is_correct,
        })
    }

    /// Mark the traversal complete; emits [`DialogEvent::Completed`]
    /// exactly once per engine lifetime
    fn complete(&mut self) {
        if self.status == EngineStatus::Complete {
            return;
        }
        self.cancel_auto_advance();
        self.status = EngineStatus::Complete;
        self.state.is_complete = true;

        info!(tree_id = %self.tree.id, score = self.state.score, "dialog complete");
        self.bus.emit(&DialogEvent::Completed {
            tree_id: self.tree.id.clone(),
            state: self.state.clone(),
        });
    }

    /// Drop any scheduled narrator advance
    pub fn cancel_auto_advance(&mut self) {
        if self.pending.take().is_some() {
            self.advance_generation += 1;
        }
    }

    /// Apply the pending advance immediately
    ///
    /// Records a history step with no option id. Returns `false` when
    /// nothing was pending.
    pub fn advance_now(&mut self) -> EngineResult<bool> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        self.state.record_step(pending.from, None, None);
        self.process_node(&pending.to)?;
        Ok(true)
    }

    /// Wait out the configured delay, then apply the pending advance
    ///
    /// This is the engine's one suspension point. Dropping the returned
    /// future cancels the wait; a generation check makes a stale timer
    /// a no-op even if the pending advance was replaced meanwhile.
    pub async fn drive_auto_advance(&mut self) -> EngineResult<bool> {
        let Some(pending) = &self.pending else {
            return Ok(false);
        };
        let generation = pending.generation;

        tokio::time::sleep(self.config.auto_advance_delay).await;

        match &self.pending {
            Some(p) if p.generation == generation => self.advance_now(),
            _ => Ok(false),
        }
    }

    /// Drive auto-advances through narrator chains until the dialog
    /// awaits a choice or completes
    pub async fn run_until_choice(&mut self) -> EngineResult<()> {
        while self.drive_auto_advance().await? {}
        Ok(())
    }

    /// Tear down: cancel pending work and drop all listeners
    pub fn destroy(&mut self) {
        self.cancel_auto_advance();
        self.bus.clear();
    }

    // -- observer wiring ---------------------------------------------------

    /// Register a persistent listener on the engine's bus
    pub fn subscribe(
        &mut self,
        kind: DialogEventKind,
        callback: impl FnMut(&DialogEvent) -> anyhow::Result<()> + Send + 'static,
    ) -> SubscriptionId {
        self.bus.on(kind, callback)
    }

    /// Register a one-shot listener
    pub fn subscribe_once(
        &mut self,
        kind: DialogEventKind,
        callback: impl FnMut(&DialogEvent) -> anyhow::Result<()> + Send + 'static,
    ) -> SubscriptionId {
        self.bus.once(kind, callback)
    }

    /// Remove a listener registered via subscribe
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    // -- accessors ---------------------------------------------------------

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn tree(&self) -> &DialogTree {
        &self.tree
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn current_node(&self) -> Option<&DialogNode> {
        self.state
            .current_node_id
            .as_deref()
            .and_then(|id| self.tree.node(id))
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete
    }

    /// Shallow copy of the running metric totals
    pub fn metrics(&self) -> MetricTotals {
        self.state.metrics.clone()
    }

    pub fn score(&self) -> f64 {
        self.state.score
    }

    /// The tracked narrator advance, if one is scheduled
    pub fn pending_advance(&self) -> Option<&PendingAdvance> {
        self.pending.as_ref()
    }
}
