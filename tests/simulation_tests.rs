//! Tests for the generic simulation engine

use scenario_engine::{
    AnalyticsSink, EngineError, Interaction, InteractionKind, InteractionOption, Message, Outcome,
    ProgressSink, Scenario, Simulation, SimulationEngine, SimulationEvent, SimulationEventKind,
    SimulationKind, SimulationState, SimulationStatus, UserResponse,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Two-question evidence-handling quiz with pass/fail outcome bands.
fn evidence_quiz() -> Simulation {
    let mut scenario = Scenario::new("quiz-01", "Evidence Handling", "q1");

    scenario.add_interaction(
        Interaction::new(
            "q1",
            Message::text("Which artifact establishes the access timeline?"),
            InteractionKind::MultipleChoice {
                options: vec![
                    InteractionOption::new("auth", "Authentication log").correct(10.0),
                    InteractionOption::new("wall", "Wallpaper settings"),
                ],
            },
            10.0,
        )
        .with_feedback("Correct.", "The auth log carries the timestamps.")
        .followed_by("q2"),
    );

    scenario.add_interaction(Interaction::new(
        "q2",
        Message::text("Order the chain-of-custody steps"),
        InteractionKind::DragDrop {
            expected_order: vec!["seize".into(), "image".into(), "store".into()],
        },
        9.0,
    ));

    scenario.add_outcome(Outcome {
        id: "fail".into(),
        title: "Retake the module".into(),
        feedback: "Review evidence-handling procedure.".into(),
        min_score: 0.0,
        passing: false,
    });
    scenario.add_outcome(Outcome {
        id: "pass".into(),
        title: "Qualified".into(),
        feedback: "Procedure followed.".into(),
        min_score: 15.0,
        passing: true,
    });

    Simulation::new("sim-quiz", SimulationKind::Quiz, scenario)
}

fn started_engine() -> SimulationEngine {
    let mut engine = SimulationEngine::new(evidence_quiz()).unwrap();
    engine.start().unwrap();
    engine
}

#[test]
fn full_run_accumulates_score_and_passes() {
    let mut engine = started_engine();

    let eval = engine
        .handle_user_input(&UserResponse::Choice("auth".into()))
        .unwrap();
    assert!(eval.is_correct);
    assert_eq!(engine.score(), 10.0);
    assert_eq!(engine.current_interaction().unwrap().id, "q2");

    engine
        .handle_user_input(&UserResponse::Ordering(vec![
            "seize".into(),
            "image".into(),
            "store".into(),
        ]))
        .unwrap();

    assert_eq!(engine.score(), 19.0);
    assert_eq!(engine.status(), SimulationStatus::Completed);
    assert_eq!(engine.state().history.len(), 2);
}

#[test]
fn low_score_lands_in_the_failing_outcome_band() {
    let mut engine = started_engine();
    engine
        .handle_user_input(&UserResponse::Choice("wall".into()))
        .unwrap();
    engine
        .handle_user_input(&UserResponse::Ordering(vec![
            "image".into(),
            "seize".into(),
            "store".into(),
        ]))
        .unwrap();

    // 0 + 3 points: below the 15-point passing band.
    assert_eq!(engine.score(), 3.0);
    assert_eq!(engine.status(), SimulationStatus::Failed);
}

#[test]
fn completed_event_carries_the_selected_outcome() {
    let seen = Arc::new(Mutex::new(None));

    let mut engine = SimulationEngine::new(evidence_quiz()).unwrap();
    let seen_clone = Arc::clone(&seen);
    engine.subscribe(SimulationEventKind::Completed, move |event| {
        if let SimulationEvent::Completed {
            outcome_id, passed, ..
        } = event
        {
            *seen_clone.lock().unwrap() = Some((outcome_id.clone(), *passed));
        }
        Ok(())
    });

    engine.start().unwrap();
    engine
        .handle_user_input(&UserResponse::Choice("auth".into()))
        .unwrap();
    engine
        .handle_user_input(&UserResponse::Ordering(vec![
            "seize".into(),
            "image".into(),
            "store".into(),
        ]))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), Some((Some("pass".to_string()), true)));
}

#[test]
fn pause_and_resume_leave_history_and_score_untouched() {
    let mut engine = started_engine();
    engine
        .handle_user_input(&UserResponse::Choice("auth".into()))
        .unwrap();

    engine.pause().unwrap();
    assert_eq!(engine.status(), SimulationStatus::Paused);

    let err = engine
        .handle_user_input(&UserResponse::Ordering(vec![]))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));

    engine.resume().unwrap();
    assert_eq!(engine.status(), SimulationStatus::InProgress);
    assert_eq!(engine.score(), 10.0);
    assert_eq!(engine.state().history.len(), 1);
}

#[test]
fn pause_requires_a_running_simulation() {
    let mut engine = SimulationEngine::new(evidence_quiz()).unwrap();
    assert!(matches!(
        engine.pause().unwrap_err(),
        EngineError::InvalidTransition { .. }
    ));
}

#[test]
fn reset_discards_everything_for_a_full_restart() {
    let mut engine = started_engine();
    engine
        .handle_user_input(&UserResponse::Choice("auth".into()))
        .unwrap();

    engine.reset();
    assert_eq!(engine.status(), SimulationStatus::NotStarted);
    assert_eq!(engine.score(), 0.0);
    assert!(engine.state().history.is_empty());

    // A reset run can start again from the top.
    engine.start().unwrap();
    assert_eq!(engine.current_interaction().unwrap().id, "q1");
}

#[test]
fn mismatched_response_emits_error_event_and_typed_error() {
    let errors = Arc::new(Mutex::new(Vec::new()));

    let mut engine = SimulationEngine::new(evidence_quiz()).unwrap();
    let errors_clone = Arc::clone(&errors);
    engine.subscribe(SimulationEventKind::Error, move |event| {
        if let SimulationEvent::Error { message } = event {
            errors_clone.lock().unwrap().push(message.clone());
        }
        Ok(())
    });

    engine.start().unwrap();
    let err = engine
        .handle_user_input(&UserResponse::Text("not a choice".into()))
        .unwrap_err();

    assert!(matches!(err, EngineError::ResponseKindMismatch { .. }));
    assert_eq!(errors.lock().unwrap().len(), 1);
    // The bad input was not recorded.
    assert!(engine.state().history.is_empty());
}

#[test]
fn input_after_completion_is_rejected() {
    let mut engine = started_engine();
    engine
        .handle_user_input(&UserResponse::Choice("auth".into()))
        .unwrap();
    engine
        .handle_user_input(&UserResponse::Ordering(vec![
            "seize".into(),
            "image".into(),
            "store".into(),
        ]))
        .unwrap();

    assert!(matches!(
        engine
            .handle_user_input(&UserResponse::Choice("auth".into()))
            .unwrap_err(),
        EngineError::AlreadyComplete
    ));
}

#[test]
fn undo_and_redo_swap_snapshots_through_the_engine() {
    let mut engine = started_engine();
    engine
        .handle_user_input(&UserResponse::Choice("auth".into()))
        .unwrap();
    assert_eq!(engine.score(), 10.0);

    assert!(engine.undo());
    assert_eq!(engine.score(), 0.0);
    assert!(engine.state().history.is_empty());
    assert_eq!(engine.current_interaction().unwrap().id, "q1");

    assert!(engine.redo());
    assert_eq!(engine.score(), 10.0);
    assert_eq!(engine.state().history.len(), 1);

    assert!(!engine.redo());
}

#[test]
fn option_level_branch_overrides_scenario_flow() {
    let mut scenario = Scenario::new("branch", "Branching", "q1");
    scenario.add_interaction(
        Interaction::new(
            "q1",
            Message::text("Escalate or investigate?"),
            InteractionKind::MultipleChoice {
                options: vec![
                    InteractionOption::new("esc", "Escalate")
                        .correct(5.0)
                        .branches_to("debrief"),
                    InteractionOption::new("inv", "Investigate alone"),
                ],
            },
            5.0,
        )
        .followed_by("reprimand"),
    );
    scenario.add_interaction(Interaction::new(
        "debrief",
        Message::text("Good call."),
        InteractionKind::TextInput {
            expected: "done".into(),
            case_sensitive: false,
        },
        1.0,
    ));
    scenario.add_interaction(Interaction::new(
        "reprimand",
        Message::text("That was risky."),
        InteractionKind::TextInput {
            expected: "done".into(),
            case_sensitive: false,
        },
        1.0,
    ));

    let mut engine =
        SimulationEngine::new(Simulation::new("sim-b", SimulationKind::Form, scenario)).unwrap();
    engine.start().unwrap();
    engine
        .handle_user_input(&UserResponse::Choice("esc".into()))
        .unwrap();

    assert_eq!(engine.current_interaction().unwrap().id, "debrief");
}

// -- sink collaborators ----------------------------------------------------

struct RecordingSink {
    saves: AtomicUsize,
    tracked: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            saves: AtomicUsize::new(0),
            tracked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn save(&self, _state: &SimulationState) -> anyhow::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl AnalyticsSink for RecordingSink {
    async fn track(&self, event: &SimulationEvent) -> anyhow::Result<()> {
        self.tracked
            .lock()
            .unwrap()
            .push(format!("{event:?}"));
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl ProgressSink for FailingSink {
    async fn save(&self, _state: &SimulationState) -> anyhow::Result<()> {
        anyhow::bail!("storage unreachable")
    }
}

#[tokio::test]
async fn save_progress_delegates_to_the_injected_sink() {
    let sink = Arc::new(RecordingSink::new());
    let mut engine = SimulationEngine::new(evidence_quiz())
        .unwrap()
        .with_progress_sink(Arc::clone(&sink) as Arc<dyn ProgressSink>)
        .with_analytics_sink(Arc::clone(&sink) as Arc<dyn AnalyticsSink>);

    engine.start().unwrap();
    engine.save_progress().await;
    engine
        .track_analytics(&SimulationEvent::Started {
            simulation_id: "sim-quiz".into(),
        })
        .await;

    assert_eq!(sink.saves.load(Ordering::SeqCst), 1);
    assert_eq!(sink.tracked.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn sink_failure_is_swallowed_not_surfaced() {
    let mut engine = SimulationEngine::new(evidence_quiz())
        .unwrap()
        .with_progress_sink(Arc::new(FailingSink));

    engine.start().unwrap();
    // Best-effort telemetry: the call itself never fails.
    engine.save_progress().await;
    assert_eq!(engine.status(), SimulationStatus::InProgress);
}
