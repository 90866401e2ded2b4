//! Generic graph-of-interactions model for non-dialog activities
//!
//! Structurally analogous to the dialog tree, but response evaluation
//! is per interaction kind: each [`InteractionKind`] variant carries
//! its own evaluation logic, so there is no default-case fallthrough
//! on a type string.

pub mod engine;
pub mod snapshot;
pub mod state;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult, GraphDefect};
use crate::value_objects::Message;

/// A trainee response, tagged by shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UserResponse {
    /// An option id picked from a multiple-choice interaction
    Choice(String),
    /// Free text entered into a form field
    Text(String),
    /// Item ids in the order the trainee arranged them
    Ordering(Vec<String>),
}

impl UserResponse {
    /// Shape name used in mismatch errors
    pub fn shape(&self) -> &'static str {
        match self {
            UserResponse::Choice(_) => "choice",
            UserResponse::Text(_) => "text",
            UserResponse::Ordering(_) => "ordering",
        }
    }
}

/// One selectable option in a multiple-choice interaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionOption {
    /// Authored identifier, unique within its interaction
    pub id: String,
    /// Text shown to the trainee
    pub text: String,
    /// Whether this option is the correct answer
    pub is_correct: bool,
    /// Points awarded when this option is chosen
    pub points: f64,
    /// Branch target overriding the interaction's own next id
    pub next_interaction_id: Option<String>,
    /// Authored metadata (original per-choice point values)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl InteractionOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_correct: false,
            points: 0.0,
            next_interaction_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Mark correct and set the points it awards
    pub fn correct(mut self, points: f64) -> Self {
        self.is_correct = true;
        self.points = points;
        self
    }

    /// Set the branch target for this option
    pub fn branches_to(mut self, interaction_id: impl Into<String>) -> Self {
        self.next_interaction_id = Some(interaction_id.into());
        self
    }
}

/// The kind of an interaction, carrying its own evaluation inputs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum InteractionKind {
    /// Pick one option; exact match by option id
    MultipleChoice { options: Vec<InteractionOption> },
    /// Enter text; exact equality after trimming
    TextInput {
        expected: String,
        case_sensitive: bool,
    },
    /// Arrange items; partial credit by positional comparison
    DragDrop { expected_order: Vec<String> },
}

impl InteractionKind {
    /// Shape name used in mismatch errors
    pub fn shape(&self) -> &'static str {
        match self {
            InteractionKind::MultipleChoice { .. } => "choice",
            InteractionKind::TextInput { .. } => "text",
            InteractionKind::DragDrop { .. } => "ordering",
        }
    }
}

/// Result of evaluating one response; pure data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    /// Points awarded for this response
    pub points: f64,
    /// Whether the response was fully correct
    pub is_correct: bool,
    /// Feedback text to show
    pub feedback: Option<String>,
    /// Where the scenario advances, `None` meaning "use scenario flow"
    pub next_interaction_id: Option<String>,
}

/// One step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Authored identifier, unique within the scenario
    pub id: String,
    /// Prompt shown to the trainee
    pub prompt: Message,
    /// Kind and its evaluation inputs
    pub kind: InteractionKind,
    /// Full-credit point value
    pub points: f64,
    /// Feedback for a correct response
    pub feedback_correct: Option<String>,
    /// Feedback for an incorrect response
    pub feedback_incorrect: Option<String>,
    /// Next step in the scenario; `None` ends it
    pub next_interaction_id: Option<String>,
}

impl Interaction {
    pub fn new(id: impl Into<String>, prompt: Message, kind: InteractionKind, points: f64) -> Self {
        Self {
            id: id.into(),
            prompt,
            kind,
            points,
            feedback_correct: None,
            feedback_incorrect: None,
            next_interaction_id: None,
        }
    }

    /// Set both feedback variants
    pub fn with_feedback(
        mut self,
        correct: impl Into<String>,
        incorrect: impl Into<String>,
    ) -> Self {
        self.feedback_correct = Some(correct.into());
        self.feedback_incorrect = Some(incorrect.into());
        self
    }

    /// Set the next step
    pub fn followed_by(mut self, interaction_id: impl Into<String>) -> Self {
        self.next_interaction_id = Some(interaction_id.into());
        self
    }

    /// Evaluate a response against this interaction
    ///
    /// Pure: no state is read or written. A response whose shape does
    /// not match the interaction kind is a typed error, not a silent
    /// zero-point fallthrough.
    pub fn evaluate_response(&self, response: &UserResponse) -> EngineResult<Evaluation> {
        let (points, is_correct, branch) = match (&self.kind, response) {
            (InteractionKind::MultipleChoice { options }, UserResponse::Choice(choice_id)) => {
                match options.iter().find(|o| &o.id == choice_id) {
                    Some(option) => (
                        option.points,
                        option.is_correct,
                        option.next_interaction_id.clone(),
                    ),
                    // An id not in the option list is simply wrong.
                    None => (0.0, false, None),
                }
            }
            (
                InteractionKind::TextInput {
                    expected,
                    case_sensitive,
                },
                UserResponse::Text(text),
            ) => {
                let matches = if *case_sensitive {
                    text.trim() == expected.trim()
                } else {
                    text.trim().eq_ignore_ascii_case(expected.trim())
                };
                (if matches { self.points } else { 0.0 }, matches, None)
            }
            (InteractionKind::DragDrop { expected_order }, UserResponse::Ordering(placed)) => {
                let total = expected_order.len();
                let correct_count = expected_order
                    .iter()
                    .zip(placed.iter())
                    .filter(|(expected, got)| expected == got)
                    .count();
                let ratio = if total == 0 {
                    0.0
                } else {
                    correct_count as f64 / total as f64
                };
                (self.points * ratio, correct_count == total && total > 0, None)
            }
            (kind, response) => {
                return Err(EngineError::ResponseKindMismatch {
                    interaction_id: self.id.clone(),
                    expected: kind.shape(),
                    got: response.shape(),
                });
            }
        };

        let feedback = if is_correct {
            self.feedback_correct.clone()
        } else {
            self.feedback_incorrect.clone()
        };

        Ok(Evaluation {
            points,
            is_correct,
            feedback,
            next_interaction_id: branch.or_else(|| self.next_interaction_id.clone()),
        })
    }
}

/// A final outcome band, selected by cumulative score at completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub id: String,
    pub title: String,
    pub feedback: String,
    /// Lowest cumulative score that selects this outcome
    pub min_score: f64,
    /// Whether landing in this band counts as passing
    pub passing: bool,
}

/// An authored scenario: interactions plus outcome bands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Interactions keyed by id
    pub interactions: HashMap<String, Interaction>,
    /// Where the scenario begins
    pub first_interaction_id: String,
    /// Outcome bands; the highest applicable `min_score` wins
    pub outcomes: Vec<Outcome>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Scenario {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        first_interaction_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            interactions: HashMap::new(),
            first_interaction_id: first_interaction_id.into(),
            outcomes: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Add an interaction; setup-time only
    pub fn add_interaction(&mut self, interaction: Interaction) -> &mut Self {
        self.interactions.insert(interaction.id.clone(), interaction);
        self
    }

    /// Add an outcome band
    pub fn add_outcome(&mut self, outcome: Outcome) -> &mut Self {
        self.outcomes.push(outcome);
        self
    }

    /// Look up an interaction by id
    pub fn interaction(&self, id: &str) -> Option<&Interaction> {
        self.interactions.get(id)
    }

    /// The outcome band a final score lands in
    pub fn outcome_for(&self, score: f64) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .filter(|o| score >= o.min_score)
            .max_by(|a, b| a.min_score.total_cmp(&b.min_score))
    }

    /// Validate id references in one pass, mirroring the dialog graph
    pub fn validate(&self) -> Result<(), Vec<GraphDefect>> {
        let mut defects = Vec::new();

        if !self.interactions.contains_key(&self.first_interaction_id) {
            defects.push(GraphDefect::MissingFirstInteraction {
                interaction_id: self.first_interaction_id.clone(),
            });
        }

        for interaction in self.interactions.values() {
            let mut check = |target: &Option<String>| {
                if let Some(target) = target {
                    if !self.interactions.contains_key(target) {
                        defects.push(GraphDefect::DanglingInteraction {
                            interaction_id: interaction.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
            };
            check(&interaction.next_interaction_id);
            if let InteractionKind::MultipleChoice { options } = &interaction.kind {
                for option in options {
                    check(&option.next_interaction_id);
                }
            }
        }

        if defects.is_empty() {
            Ok(())
        } else {
            Err(defects)
        }
    }
}

/// Broad activity category of a simulation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SimulationKind {
    Quiz,
    Form,
    DragDrop,
    Dialog,
    Exploration,
}

/// A runnable activity: a scenario plus its presentation category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Simulation {
    pub id: String,
    pub kind: SimulationKind,
    pub scenario: Scenario,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Simulation {
    pub fn new(id: impl Into<String>, kind: SimulationKind, scenario: Scenario) -> Self {
        Self {
            id: id.into(),
            kind,
            scenario,
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice_interaction() -> Interaction {
        Interaction::new(
            "q1",
            Message::text("Which log proves access?"),
            InteractionKind::MultipleChoice {
                options: vec![
                    InteractionOption::new("a", "Auth log").correct(10.0),
                    InteractionOption::new("b", "Chat log"),
                ],
            },
            10.0,
        )
        .with_feedback("Right.", "Wrong.")
    }

    #[test]
    fn multiple_choice_matches_by_option_id() {
        let interaction = choice_interaction();

        let correct = interaction
            .evaluate_response(&UserResponse::Choice("a".into()))
            .unwrap();
        assert!(correct.is_correct);
        assert_eq!(correct.points, 10.0);
        assert_eq!(correct.feedback.as_deref(), Some("Right."));

        let wrong = interaction
            .evaluate_response(&UserResponse::Choice("b".into()))
            .unwrap();
        assert!(!wrong.is_correct);
        assert_eq!(wrong.points, 0.0);
    }

    #[test]
    fn unknown_choice_id_scores_zero_without_error() {
        let interaction = choice_interaction();
        let evaluation = interaction
            .evaluate_response(&UserResponse::Choice("zzz".into()))
            .unwrap();
        assert!(!evaluation.is_correct);
        assert_eq!(evaluation.points, 0.0);
    }

    #[test]
    fn text_input_is_case_insensitive_by_default() {
        let interaction = Interaction::new(
            "q2",
            Message::text("Name the statute"),
            InteractionKind::TextInput {
                expected: "Computer Fraud".into(),
                case_sensitive: false,
            },
            5.0,
        );

        let evaluation = interaction
            .evaluate_response(&UserResponse::Text("  computer fraud ".into()))
            .unwrap();
        assert!(evaluation.is_correct);
        assert_eq!(evaluation.points, 5.0);
    }

    #[test]
    fn drag_drop_awards_proportional_partial_credit() {
        let interaction = Interaction::new(
            "q3",
            Message::text("Order the chain of custody"),
            InteractionKind::DragDrop {
                expected_order: vec!["seize".into(), "image".into(), "hash".into(), "store".into()],
            },
            8.0,
        );

        // Two of four positions correct.
        let evaluation = interaction
            .evaluate_response(&UserResponse::Ordering(vec![
                "seize".into(),
                "hash".into(),
                "image".into(),
                "store".into(),
            ]))
            .unwrap();
        assert!(!evaluation.is_correct);
        assert_eq!(evaluation.points, 4.0);
    }

    #[test]
    fn mismatched_response_shape_is_a_typed_error() {
        let interaction = choice_interaction();
        let err = interaction
            .evaluate_response(&UserResponse::Text("hello".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ResponseKindMismatch {
                expected: "choice",
                got: "text",
                ..
            }
        ));
    }

    #[test]
    fn outcome_band_selection_picks_highest_applicable() {
        let mut scenario = Scenario::new("s", "Bands", "q1");
        scenario.add_outcome(Outcome {
            id: "fail".into(),
            title: "Needs work".into(),
            feedback: String::new(),
            min_score: 0.0,
            passing: false,
        });
        scenario.add_outcome(Outcome {
            id: "pass".into(),
            title: "Solid".into(),
            feedback: String::new(),
            min_score: 10.0,
            passing: true,
        });

        assert_eq!(scenario.outcome_for(4.0).unwrap().id, "fail");
        assert_eq!(scenario.outcome_for(10.0).unwrap().id, "pass");
        assert!(scenario.outcome_for(-1.0).is_none());
    }

    #[test]
    fn scenario_validation_catches_dangling_branches() {
        let mut scenario = Scenario::new("s", "Bad", "q1");
        scenario.add_interaction(choice_interaction().followed_by("missing"));

        let defects = scenario.validate().unwrap_err();
        assert!(defects.contains(&GraphDefect::DanglingInteraction {
            interaction_id: "q1".into(),
            target: "missing".into(),
        }));
    }
}
