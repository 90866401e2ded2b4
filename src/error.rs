//! Typed errors for the scenario engine
//!
//! Every failure the engines can report is a variant here. The source
//! material for many training scenarios arrives as hand-authored JSON,
//! so graph defects get their own enum and are collected in one pass at
//! load time instead of surfacing one at a time mid-traversal.

use thiserror::Error;

/// A structural defect found while validating an authored graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphDefect {
    /// The designated root id resolves to no node
    #[error("root node '{root_id}' does not exist")]
    MissingRoot { root_id: String },

    /// An option points at a node id that is not in the tree
    #[error("option '{option_id}' on node '{node_id}' targets missing node '{target}'")]
    DanglingOptionTarget {
        node_id: String,
        option_id: String,
        target: String,
    },

    /// A node's default-next id is not in the tree
    #[error("node '{node_id}' default-next targets missing node '{target}'")]
    DanglingDefaultNext { node_id: String, target: String },

    /// No options, no default next, not an end node: traversal would stall
    #[error("node '{node_id}' is a dead end (no options, no default next, not an end node)")]
    DeadEnd { node_id: String },

    /// An option with no target on a node with no default next cannot resolve
    #[error("option '{option_id}' on node '{node_id}' has no target and the node has no default next")]
    UnresolvableFallThrough { node_id: String, option_id: String },

    /// End nodes must not carry outgoing options
    #[error("end node '{node_id}' carries {option_count} outgoing option(s)")]
    EndNodeWithOptions {
        node_id: String,
        option_count: usize,
    },

    /// A scenario interaction's next id is not in the scenario
    #[error("interaction '{interaction_id}' advances to missing interaction '{target}'")]
    DanglingInteraction {
        interaction_id: String,
        target: String,
    },

    /// The scenario's first interaction id resolves to nothing
    #[error("first interaction '{interaction_id}' does not exist")]
    MissingFirstInteraction { interaction_id: String },
}

/// Errors reported by the dialog and simulation engines
#[derive(Debug, Error)]
pub enum EngineError {
    /// The authored graph failed eager validation
    #[error("malformed content graph: {}", format_defects(.defects))]
    MalformedGraph { defects: Vec<GraphDefect> },

    /// Operation requires a different lifecycle status
    #[error("invalid transition: cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Traversal has not been started yet
    #[error("engine has not been started")]
    NotStarted,

    /// Traversal already reached a terminal state
    #[error("traversal is already complete")]
    AlreadyComplete,

    /// A node id did not resolve within the active tree
    #[error("node '{node_id}' not found in tree '{tree_id}'")]
    UnknownNode { tree_id: String, node_id: String },

    /// An option id is not present on the current node
    #[error("option '{option_id}' not found on node '{node_id}'")]
    UnknownOption { node_id: String, option_id: String },

    /// An interaction id did not resolve within the active scenario
    #[error("interaction '{interaction_id}' not found in scenario '{scenario_id}'")]
    UnknownInteraction {
        scenario_id: String,
        interaction_id: String,
    },

    /// The response shape does not match the interaction kind
    #[error("response kind {got} does not match {expected} interaction '{interaction_id}'")]
    ResponseKindMismatch {
        interaction_id: String,
        expected: &'static str,
        got: &'static str,
    },
}

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;

fn format_defects(defects: &[GraphDefect]) -> String {
    defects
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
