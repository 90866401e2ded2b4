//! Quiz Scenario Example
//!
//! This example demonstrates how to:
//! - Author a generic scenario mixing interaction kinds
//! - Run it through the simulation engine with pause/resume
//! - Undo a wrong answer and take the question again
//! - Deliver progress to an injected persistence sink

use async_trait::async_trait;
use scenario_engine::{
    Interaction, InteractionKind, InteractionOption, Message, Outcome, ProgressSink, Scenario,
    Simulation, SimulationEngine, SimulationKind, SimulationState, UserResponse,
};
use std::sync::Arc;

struct StdoutSink;

#[async_trait]
impl ProgressSink for StdoutSink {
    async fn save(&self, state: &SimulationState) -> anyhow::Result<()> {
        println!(
            "   [sink] saved progress: score {:.1}, {} answers",
            state.score,
            state.history.len()
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Scenario Engine: Legal-Procedure Quiz ===\n");

    // Step 1: author the scenario
    println!("1. Authoring the scenario...");
    let mut scenario = Scenario::new("procedure-quiz", "Search Warrant Basics", "q1");

    scenario.add_interaction(
        Interaction::new(
            "q1",
            Message::text("Which document authorizes seizing the workstation?"),
            InteractionKind::MultipleChoice {
                options: vec![
                    InteractionOption::new("warrant", "A search warrant").correct(10.0),
                    InteractionOption::new("memo", "An internal memo"),
                ],
            },
            10.0,
        )
        .with_feedback("Correct.", "A memo has no legal force here.")
        .followed_by("q2"),
    );

    scenario.add_interaction(Interaction::new(
        "q2",
        Message::text("Order the on-site steps"),
        InteractionKind::DragDrop {
            expected_order: vec![
                "photograph".into(),
                "disconnect".into(),
                "label".into(),
                "transport".into(),
            ],
        },
        8.0,
    ));

    scenario.add_outcome(Outcome {
        id: "pass".into(),
        title: "Procedure qualified".into(),
        feedback: "Ready for the field module.".into(),
        min_score: 14.0,
        passing: true,
    });
    scenario.add_outcome(Outcome {
        id: "fail".into(),
        title: "Needs review".into(),
        feedback: "Revisit the warrant chapter.".into(),
        min_score: 0.0,
        passing: false,
    });

    let simulation = Simulation::new("sim-procedure", SimulationKind::Quiz, scenario);

    // Step 2: run it
    println!("2. Running the quiz...");
    let mut engine = SimulationEngine::new(simulation)?.with_progress_sink(Arc::new(StdoutSink));
    engine.start()?;

    // A wrong first answer...
    let eval = engine.handle_user_input(&UserResponse::Choice("memo".into()))?;
    println!(
        "   q1 (wrong on purpose): {} ({} pts)",
        eval.feedback.as_deref().unwrap_or(""),
        eval.points
    );

    // ...undone and retaken.
    println!("3. Undoing and retaking q1...");
    engine.undo();
    let eval = engine.handle_user_input(&UserResponse::Choice("warrant".into()))?;
    println!("   q1 (retake): {} ({} pts)", eval.feedback.as_deref().unwrap_or(""), eval.points);

    // A pause in the middle changes nothing.
    engine.pause()?;
    engine.resume()?;

    let eval = engine.handle_user_input(&UserResponse::Ordering(vec![
        "photograph".into(),
        "disconnect".into(),
        "label".into(),
        "transport".into(),
    ]))?;
    println!("   q2: full order correct ({} pts)", eval.points);

    engine.save_progress().await;

    // Step 3: results
    println!("\n4. Results");
    println!("   status: {:?}", engine.status());
    println!("   score:  {:.1}", engine.score());

    Ok(())
}
