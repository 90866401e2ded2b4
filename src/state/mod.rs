//! Mutable traversal state for one dialog run
//!
//! One state per traversal; created fresh on start, mutated in place by
//! the engine on every completed step. The state references its tree by
//! id only, so multiple states can replay the same tree without
//! interference. UI code reads the state through engine accessors and
//! never mutates it directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value_objects::{EmotionalState, MetricDeltas, MetricTotals};

/// One completed traversal step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    /// Node the step was taken from
    pub node_id: String,
    /// Option chosen, or `None` for auto-advanced narrator beats
    pub option_id: Option<String>,
    /// When the step completed
    pub timestamp: DateTime<Utc>,
}

/// Mutable record of a dialog traversal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogState {
    /// Tree being traversed (weak reference by id)
    pub tree_id: String,
    /// Current position; `None` before start
    pub current_node_id: Option<String>,
    /// Append-only log of completed steps
    pub history: Vec<HistoryEntry>,
    /// Last-applied emotional state per participant
    pub emotional_overrides: HashMap<String, EmotionalState>,
    /// Running communication-metric totals
    pub metrics: MetricTotals,
    /// Derived score: mean of the metric totals, recomputed on update
    pub score: f64,
    /// Terminal flag
    pub is_complete: bool,
}

impl DialogState {
    /// Fresh state for one traversal of `tree_id`
    pub fn new(tree_id: impl Into<String>) -> Self {
        Self {
            tree_id: tree_id.into(),
            current_node_id: None,
            history: Vec::new(),
            emotional_overrides: HashMap::new(),
            metrics: MetricTotals::new(),
            score: 0.0,
            is_complete: false,
        }
    }

    /// Append a completed step and fold its metric deltas into the totals
    ///
    /// The score is always recomputed from the totals, never
    /// incremented independently.
    pub fn record_step(
        &mut self,
        node_id: impl Into<String>,
        option_id: Option<String>,
        deltas: Option<&MetricDeltas>,
    ) {
        self.history.push(HistoryEntry {
            node_id: node_id.into(),
            option_id,
            timestamp: Utc::now(),
        });
        if let Some(deltas) = deltas {
            self.metrics.apply(deltas);
        }
        self.score = self.metrics.mean();
    }

    /// Record the last-applied emotional state for a participant
    pub fn record_emotion(&mut self, participant_id: impl Into<String>, state: EmotionalState) {
        self.emotional_overrides.insert(participant_id.into(), state);
    }

    /// Number of completed steps
    pub fn step_count(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Metric;

    #[test]
    fn score_is_recomputed_from_totals_on_every_step() {
        let mut state = DialogState::new("t");

        let deltas = MetricDeltas::from([(Metric::Empathy, 5), (Metric::Clarity, 5)]);
        state.record_step("intro", Some("a".into()), Some(&deltas));
        assert_eq!(state.score, 2.0);

        let deltas = MetricDeltas::from([(Metric::Empathy, 5)]);
        state.record_step("details", Some("b".into()), Some(&deltas));
        assert_eq!(state.metrics.get(Metric::Empathy), 10);
        assert_eq!(state.score, 3.0);
    }

    #[test]
    fn steps_without_deltas_still_append_history() {
        let mut state = DialogState::new("t");
        state.record_step("narration", None, None);

        assert_eq!(state.step_count(), 1);
        assert_eq!(state.history[0].option_id, None);
        assert_eq!(state.score, 0.0);
    }
}
