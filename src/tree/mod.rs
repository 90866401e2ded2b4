//! Dialog tree: a directed graph of conversation nodes
//!
//! A tree exclusively owns its nodes and participants. It is built by
//! setup code via [`DialogTree::add_node`] / [`DialogTree::add_participant`]
//! before traversal begins and is not structurally mutated afterwards
//! (the engine only touches participant emotional state).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GraphDefect;
use crate::value_objects::{DialogOption, EmotionalState, Message, Participant};

/// A single conversation node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogNode {
    /// Authored identifier, unique within the tree
    pub id: String,
    /// The line spoken at this node
    pub message: Message,
    /// Choices offered to the trainee; insertion order is display order
    pub options: Vec<DialogOption>,
    /// Owning participant; `None` for narrator/system lines
    pub participant_id: Option<String>,
    /// Emotional state applied to the owning participant on entry
    pub emotion_change: Option<EmotionalState>,
    /// Default next node, used to auto-advance option-less narrator beats
    pub next_node_id: Option<String>,
    /// Terminal node of the graph
    pub is_end: bool,
}

impl DialogNode {
    /// Create a node with no options
    pub fn new(id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            message,
            options: Vec::new(),
            participant_id: None,
            emotion_change: None,
            next_node_id: None,
            is_end: false,
        }
    }

    /// Assign the speaking participant
    pub fn spoken_by(mut self, participant_id: impl Into<String>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }

    /// Append an option
    pub fn with_option(mut self, option: DialogOption) -> Self {
        self.options.push(option);
        self
    }

    /// Apply an emotional-state change to the speaking participant
    pub fn with_emotion_change(mut self, state: EmotionalState) -> Self {
        self.emotion_change = Some(state);
        self
    }

    /// Set the default next node for auto-advancing beats
    pub fn advances_to(mut self, node_id: impl Into<String>) -> Self {
        self.next_node_id = Some(node_id.into());
        self
    }

    /// Mark this node as terminal
    pub fn end(mut self) -> Self {
        self.is_end = true;
        self
    }

    /// Look up an option by id
    pub fn option(&self, option_id: &str) -> Option<&DialogOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// A complete authored conversation graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogTree {
    /// Authored identifier
    pub id: String,
    /// Title shown in activity menus
    pub title: String,
    /// Briefing text
    pub description: String,
    /// Nodes keyed by id
    pub nodes: HashMap<String, DialogNode>,
    /// Participants keyed by id
    pub participants: HashMap<String, Participant>,
    /// Where traversal begins
    pub root_node_id: String,
    /// Additional metadata
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DialogTree {
    /// Create an empty tree rooted at `root_node_id`
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        root_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            nodes: HashMap::new(),
            participants: HashMap::new(),
            root_node_id: root_node_id.into(),
            metadata: HashMap::new(),
        }
    }

    /// Set the briefing text
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a node; setup-time only
    pub fn add_node(&mut self, node: DialogNode) -> &mut Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    /// Add a participant; setup-time only
    pub fn add_participant(&mut self, participant: Participant) -> &mut Self {
        self.participants.insert(participant.id.clone(), participant);
        self
    }

    /// Look up a node by id
    pub fn node(&self, node_id: &str) -> Option<&DialogNode> {
        self.nodes.get(node_id)
    }

    /// Look up a participant by id
    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.get(participant_id)
    }

    /// The root node, if the root id resolves
    pub fn root(&self) -> Option<&DialogNode> {
        self.nodes.get(&self.root_node_id)
    }

    /// Validate the graph in one pass over nodes and options
    ///
    /// Dangling references and dead ends are authoring defects; they
    /// are rejected here, eagerly, so traversal can never discover a
    /// broken edge mid-conversation.
    pub fn validate(&self) -> Result<(), Vec<GraphDefect>> {
        let mut defects = Vec::new();

        if !self.nodes.contains_key(&self.root_node_id) {
            defects.push(GraphDefect::MissingRoot {
                root_id: self.root_node_id.clone(),
            });
        }

        for node in self.nodes.values() {
            if node.is_end && !node.options.is_empty() {
                defects.push(GraphDefect::EndNodeWithOptions {
                    node_id: node.id.clone(),
                    option_count: node.options.len(),
                });
            }

            if let Some(next) = &node.next_node_id {
                if !self.nodes.contains_key(next) {
                    defects.push(GraphDefect::DanglingDefaultNext {
                        node_id: node.id.clone(),
                        target: next.clone(),
                    });
                }
            }

            if node.options.is_empty() && node.next_node_id.is_none() && !node.is_end {
                defects.push(GraphDefect::DeadEnd {
                    node_id: node.id.clone(),
                });
            }

            for option in &node.options {
                match &option.next_node_id {
                    Some(target) => {
                        if !self.nodes.contains_key(target) {
                            defects.push(GraphDefect::DanglingOptionTarget {
                                node_id: node.id.clone(),
                                option_id: option.id.clone(),
                                target: target.clone(),
                            });
                        }
                    }
                    None => {
                        // Fall-through must land somewhere: the node's
                        // default next, or the end of the graph.
                        if node.next_node_id.is_none() && !node.is_end {
                            defects.push(GraphDefect::UnresolvableFallThrough {
                                node_id: node.id.clone(),
                                option_id: option.id.clone(),
                            });
                        }
                    }
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
