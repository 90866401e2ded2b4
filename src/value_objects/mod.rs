//! Value objects for the scenario engine
//!
//! These types describe the authored content of a training activity:
//! who speaks, what they say, the choices offered to the trainee, and
//! the communication metrics each choice carries. Authored entities use
//! human-readable string ids (the content authoring contract); only
//! runtime-generated artifacts such as messages carry a [`Uuid`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Category of a dialog participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantCategory {
    /// System or narrator lines
    System,
    /// The trainee
    User,
    /// A scripted character (suspect, witness, colleague)
    Character,
}

/// Emotional state tag applied to a participant
///
/// Changes as a side effect of node traversal; starts at `Neutral`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    #[default]
    Neutral,
    Calm,
    Friendly,
    Cooperative,
    Anxious,
    Nervous,
    Defensive,
    Hostile,
    Distressed,
    Relieved,
}

/// A participant in a dialog or scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    /// Authored identifier, unique within one tree
    pub id: String,
    /// Display name
    pub name: String,
    /// Category of participant
    pub category: ParticipantCategory,
    /// Avatar reference (asset key or URL)
    pub avatar: Option<String>,
    /// Free-text description shown in briefing screens
    pub description: String,
    /// Current emotional state; mutated during traversal
    pub emotional_state: EmotionalState,
    /// Additional metadata
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Participant {
    /// Create a participant with a neutral emotional state
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ParticipantCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            avatar: None,
            description: String::new(),
            emotional_state: EmotionalState::default(),
            metadata: HashMap::new(),
        }
    }

    /// Set the avatar reference
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Kind of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text line
    Text,
    /// Audio-only line
    Audio,
    /// Text with an accompanying audio clip
    TextWithAudio,
    /// System notification
    System,
    /// A line that presents options to the trainee
    Options,
}

/// A single message attached to a node
///
/// Immutable once attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique identifier for this message
    pub id: Uuid,
    /// Kind of content
    pub kind: MessageKind,
    /// Textual content (empty for audio-only lines)
    pub content: String,
    /// Audio reference (asset key or URL)
    pub audio: Option<String>,
    /// Owning participant id, if any
    pub participant_id: Option<String>,
    /// Category of the owning participant
    pub category: ParticipantCategory,
    /// When the message was authored or produced
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a plain text message
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: MessageKind::Text,
            content: content.into(),
            audio: None,
            participant_id: None,
            category: ParticipantCategory::System,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::System,
            ..Self::text(content)
        }
    }

    /// Attach the owning participant
    pub fn from_participant(
        mut self,
        participant_id: impl Into<String>,
        category: ParticipantCategory,
    ) -> Self {
        self.participant_id = Some(participant_id.into());
        self.category = category;
        self
    }

    /// Attach an audio reference
    pub fn with_audio(mut self, audio: impl Into<String>) -> Self {
        self.audio = Some(audio.into());
        self.kind = match self.kind {
            MessageKind::Text => MessageKind::TextWithAudio,
            other => other,
        };
        self
    }
}

/// Communication-quality metric tracked during a dialog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Empathy,
    Clarity,
    Professionalism,
    Accuracy,
    Patience,
}

impl Metric {
    /// The fixed metric set, in scoring order
    pub const ALL: [Metric; 5] = [
        Metric::Empathy,
        Metric::Clarity,
        Metric::Professionalism,
        Metric::Accuracy,
        Metric::Patience,
    ];
}

/// Signed per-metric deltas carried by one choice
pub type MetricDeltas = HashMap<Metric, i32>;

/// Running per-metric totals accumulated across a traversal
///
/// All five metrics are always present. The derived score is the plain
/// mean of the five totals: unnormalized, unbounded in both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricTotals {
    totals: HashMap<Metric, i64>,
}

impl MetricTotals {
    /// All metrics at zero
    pub fn new() -> Self {
        Self {
            totals: Metric::ALL.iter().map(|m| (*m, 0)).collect(),
        }
    }

    /// Add each delta to its running total
    pub fn apply(&mut self, deltas: &MetricDeltas) {
        for (metric, delta) in deltas {
            *self.totals.entry(*metric).or_insert(0) += i64::from(*delta);
        }
    }

    /// Running total for one metric
    pub fn get(&self, metric: Metric) -> i64 {
        self.totals.get(&metric).copied().unwrap_or(0)
    }

    /// Mean of the five metric totals
    pub fn mean(&self) -> f64 {
        let sum: i64 = Metric::ALL.iter().map(|m| self.get(*m)).sum();
        sum as f64 / Metric::ALL.len() as f64
    }
}

impl Default for MetricTotals {
    fn default() -> Self {
        Self::new()
    }
}

/// A choice the trainee can make at a dialog node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogOption {
    /// Authored identifier, unique within its node
    pub id: String,
    /// Text shown to the trainee
    pub text: String,
    /// Target node id; `None` falls through to the node's default next
    pub next_node_id: Option<String>,
    /// Per-metric deltas applied when this option is chosen
    pub metrics: MetricDeltas,
    /// Feedback shown after choosing this option
    pub feedback: Option<String>,
    /// Whether this is the recommended choice
    pub is_correct: bool,
    /// Additional metadata (authored point values for non-dialog use)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DialogOption {
    /// Create an option with no metric deltas
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            next_node_id: None,
            metrics: MetricDeltas::new(),
            feedback: None,
            is_correct: false,
            metadata: HashMap::new(),
        }
    }

    /// Set the target node
    pub fn leads_to(mut self, node_id: impl Into<String>) -> Self {
        self.next_node_id = Some(node_id.into());
        self
    }

    /// Add one metric delta
    pub fn with_metric(mut self, metric: Metric, delta: i32) -> Self {
        self.metrics.insert(metric, delta);
        self
    }

    /// Set the feedback text
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    /// Mark this option as the recommended choice
    pub fn correct(mut self) -> Self {
        self.is_correct = true;
        self
    }

    /// The communication-quality deltas this choice carries
    pub fn communication_deltas(&self) -> &MetricDeltas {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_totals_mean_is_over_all_five_metrics() {
        let mut totals = MetricTotals::new();
        totals.apply(&HashMap::from([(Metric::Empathy, 10)]));
        // 10 / 5, not 10 / 1
        assert_eq!(totals.mean(), 2.0);
    }

    #[test]
    fn metric_totals_can_go_negative() {
        let mut totals = MetricTotals::new();
        totals.apply(&HashMap::from([
            (Metric::Patience, -4),
            (Metric::Clarity, -6),
        ]));
        assert_eq!(totals.get(Metric::Patience), -4);
        assert_eq!(totals.mean(), -2.0);
    }

    #[test]
    fn option_builder_sets_deltas_and_target() {
        let option = DialogOption::new("a", "Ask calmly")
            .leads_to("details")
            .with_metric(Metric::Empathy, 5)
            .with_feedback("Good approach")
            .correct();

        assert_eq!(option.next_node_id.as_deref(), Some("details"));
        assert_eq!(option.communication_deltas()[&Metric::Empathy], 5);
        assert!(option.is_correct);
    }

    #[test]
    fn text_message_upgrades_kind_when_audio_attached() {
        let message = Message::text("hello").with_audio("clip-01");
        assert_eq!(message.kind, MessageKind::TextWithAudio);
        assert_eq!(message.audio.as_deref(), Some("clip-01"));
    }
}
