//! Basic Interrogation Example
//!
//! This example demonstrates how to:
//! - Author a small dialog tree with a scripted suspect
//! - Subscribe to engine lifecycle events
//! - Walk the tree through trainee option selections
//! - Read the communication metrics and final score

use scenario_engine::{
    DialogEngine, DialogEngineConfig, DialogEvent, DialogEventKind, DialogNode, DialogOption,
    DialogTree, EmotionalState, Message, Metric, Participant, ParticipantCategory,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Scenario Engine: Interrogation Example ===\n");

    // Step 1: author the tree
    println!("1. Authoring the dialog tree...");
    let mut tree = DialogTree::new("interview-demo", "Phishing Suspect Interview", "briefing")
        .with_description("Interview the employee whose account sent the phishing mail.");

    tree.add_participant(
        Participant::new("marta", "Marta K.", ParticipantCategory::Character)
            .with_description("Accounts-payable clerk, account holder"),
    );

    tree.add_node(
        DialogNode::new(
            "briefing",
            Message::system("Marta's account sent 214 phishing mails overnight."),
        )
        .advances_to("opening"),
    );

    tree.add_node(
        DialogNode::new(
            "opening",
            Message::text("I already told IT everything. Why am I here?")
                .from_participant("marta", ParticipantCategory::Character),
        )
        .spoken_by("marta")
        .with_option(
            DialogOption::new("calm", "You're not in trouble. Help me with the timeline.")
                .leads_to("timeline")
                .with_metric(Metric::Empathy, 5)
                .with_metric(Metric::Professionalism, 3)
                .with_feedback("De-escalation keeps a witness cooperative.")
                .correct(),
        )
        .with_option(
            DialogOption::new("accuse", "Your account, your problem. Explain it.")
                .leads_to("shutdown")
                .with_metric(Metric::Empathy, -5)
                .with_metric(Metric::Patience, -3),
        ),
    );

    tree.add_node(
        DialogNode::new(
            "shutdown",
            Message::text("Then I want a union rep before I say anything else.")
                .from_participant("marta", ParticipantCategory::Character),
        )
        .spoken_by("marta")
        .with_emotion_change(EmotionalState::Defensive)
        .with_option(
            DialogOption::new("recover", "That's your right. Let me rephrase: when did you last log in?")
                .leads_to("timeline")
                .with_metric(Metric::Professionalism, 4),
        ),
    );

    tree.add_node(
        DialogNode::new(
            "timeline",
            Message::text("I logged off at six. I swear the mails weren't me.")
                .from_participant("marta", ParticipantCategory::Character),
        )
        .spoken_by("marta")
        .with_emotion_change(EmotionalState::Cooperative)
        .end(),
    );

    // Step 2: build the engine and wire observers
    println!("2. Starting the engine...");
    let config = DialogEngineConfig {
        auto_advance_delay: Duration::from_millis(200),
        ..DialogEngineConfig::default()
    };
    let mut engine = DialogEngine::new(tree, config)?;

    engine.subscribe(DialogEventKind::NodeEntered, |event| {
        if let DialogEvent::NodeEntered { node, .. } = event {
            println!("   [node] {}: {}", node.id, node.message.content);
        }
        Ok(())
    });
    engine.subscribe(DialogEventKind::OptionResolved, |event| {
        if let DialogEvent::OptionResolved {
            option_id,
            feedback,
            ..
        } = event
        {
            println!(
                "   [choice] {option_id} -> {}",
                feedback.as_deref().unwrap_or("(no feedback)")
            );
        }
        Ok(())
    });

    engine.start()?;

    // Step 3: the briefing is a narrator beat and advances on a timer
    println!("3. Waiting out the narrator beat...");
    engine.run_until_choice().await?;

    // Step 4: make the calm opening move
    println!("4. Selecting the calm opening...");
    engine.select_option("calm")?;

    // Step 5: results
    println!("\n5. Results");
    println!("   complete: {}", engine.is_complete());
    println!("   steps:    {}", engine.state().step_count());
    println!(
        "   empathy:  {:+}",
        engine.metrics().get(Metric::Empathy)
    );
    println!("   score:    {:.1}", engine.score());

    Ok(())
}
