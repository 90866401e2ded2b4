//! Engine lifecycle events and the in-process event bus
//!
//! The bus decouples the engines from their UI observers: one producer,
//! a handful of consumers, all on the same thread of execution.
//! Dispatch is synchronous and in registration order. Listener failures
//! are isolated per listener and logged, never propagated to the
//! emitter or to other listeners.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::warn;

use crate::state::DialogState;
use crate::tree::DialogNode;
use crate::value_objects::EmotionalState;

/// An event type that can be published on an [`EventBus`]
///
/// `Kind` is the subscription discriminant: a fieldless enum paired
/// with the event enum, so listeners register against a typed tag
/// rather than a string name.
pub trait BusEvent {
    type Kind: Copy + Eq + Hash + std::fmt::Debug;

    /// The discriminant used to route this event to listeners
    fn kind(&self) -> Self::Kind;
}

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E) -> anyhow::Result<()> + Send>;

struct ListenerEntry<E> {
    id: SubscriptionId,
    once: bool,
    callback: Callback<E>,
}

/// Synchronous publish/subscribe bus scoped to one engine instance
pub struct EventBus<E: BusEvent> {
    listeners: HashMap<E::Kind, Vec<ListenerEntry<E>>>,
    next_id: u64,
}

impl<E: BusEvent> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_kinds", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    fn register(&mut self, kind: E::Kind, once: bool, callback: Callback<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push(ListenerEntry {
            id,
            once,
            callback,
        });
        id
    }

    /// Register a persistent listener; remove it later via [`EventBus::off`]
    pub fn on(
        &mut self,
        kind: E::Kind,
        callback: impl FnMut(&E) -> anyhow::Result<()> + Send + 'static,
    ) -> SubscriptionId {
        self.register(kind, false, Box::new(callback))
    }

    /// Register a listener that is removed after its first invocation
    pub fn once(
        &mut self,
        kind: E::Kind,
        callback: impl FnMut(&E) -> anyhow::Result<()> + Send + 'static,
    ) -> SubscriptionId {
        self.register(kind, true, Box::new(callback))
    }

    /// Remove a specific listener; returns false if it was not found
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        for entries in self.listeners.values_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    /// Invoke all listeners for the event's kind, in registration order
    ///
    /// A listener returning `Err` is logged and skipped; emission
    /// continues with the remaining listeners. Once-listeners are
    /// invoked and removed in the same pass. `emit` holds `&mut self`,
    /// so listeners cannot mutate the bus mid-pass.
    pub fn emit(&mut self, event: &E) {
        let kind = event.kind();
        let Some(entries) = self.listeners.get_mut(&kind) else {
            return;
        };

        for entry in entries.iter_mut() {
            if let Err(err) = (entry.callback)(event) {
                warn!(kind = ?kind, error = %err, "event listener failed");
            }
        }
        entries.retain(|e| !e.once);
    }

    /// Remove all listeners of all kinds; used on engine teardown
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of listeners currently registered for a kind
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle events emitted by the dialog engine
#[derive(Debug, Clone, Serialize)]
pub enum DialogEvent {
    /// Engine wiring is in place
    Initialized,
    /// Traversal began at the root node
    Started { tree_id: String },
    /// The current node changed
    NodeEntered {
        node: DialogNode,
        state: DialogState,
    },
    /// A node directive changed a participant's emotional state
    EmotionChanged {
        participant_id: String,
        state: EmotionalState,
    },
    /// A narrator beat scheduled a delayed advance
    AutoAdvanceScheduled {
        from: String,
        to: String,
        delay_ms: u64,
    },
    /// The trainee picked an option (intent, before mutation)
    OptionSelected { node_id: String, option_id: String },
    /// The selection was applied and resolved
    OptionResolved {
        node_id: String,
        option_id: String,
        feedback: Option<String>,
        next_node_id: Option<String>,
        is_correct: bool,
    },
    /// Traversal reached an end node
    Completed { tree_id: String, state: DialogState },
}

/// Subscription discriminants for [`DialogEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogEventKind {
    Initialized,
    Started,
    NodeEntered,
    EmotionChanged,
    AutoAdvanceScheduled,
    OptionSelected,
    OptionResolved,
    Completed,
}

impl BusEvent for DialogEvent {
    type Kind = DialogEventKind;

    fn kind(&self) -> DialogEventKind {
        match self {
            DialogEvent::Initialized => DialogEventKind::Initialized,
            DialogEvent::Started { .. } => DialogEventKind::Started,
            DialogEvent::NodeEntered { .. } => DialogEventKind::NodeEntered,
            DialogEvent::EmotionChanged { .. } => DialogEventKind::EmotionChanged,
            DialogEvent::AutoAdvanceScheduled { .. } => DialogEventKind::AutoAdvanceScheduled,
            DialogEvent::OptionSelected { .. } => DialogEventKind::OptionSelected,
            DialogEvent::OptionResolved { .. } => DialogEventKind::OptionResolved,
            DialogEvent::Completed { .. } => DialogEventKind::Completed,
        }
    }
}

/// Lifecycle events emitted by the generic simulation engine
#[derive(Debug, Clone, Serialize)]
pub enum SimulationEvent {
    Started {
        simulation_id: String,
    },
    /// The current interaction changed
    InteractionPresented {
        interaction_id: String,
    },
    /// A response was evaluated and recorded
    InteractionCompleted {
        interaction_id: String,
        points: f64,
        is_correct: bool,
    },
    Paused,
    Resumed,
    /// State was discarded for a full restart
    Reset,
    /// Undo or redo swapped in a snapshot
    HistoryRestored {
        direction: RestoreDirection,
    },
    /// A user input could not be evaluated
    Error {
        message: String,
    },
    Completed {
        simulation_id: String,
        score: f64,
        outcome_id: Option<String>,
        passed: bool,
    },
}

/// Direction of a history restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreDirection {
    Undo,
    Redo,
}

/// Subscription discriminants for [`SimulationEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationEventKind {
    Started,
    InteractionPresented,
    InteractionCompleted,
    Paused,
    Resumed,
    Reset,
    HistoryRestored,
    Error,
    Completed,
}

impl BusEvent for SimulationEvent {
    type Kind = SimulationEventKind;

    fn kind(&self) -> SimulationEventKind {
        match self {
            SimulationEvent::Started { .. } => SimulationEventKind::Started,
            SimulationEvent::InteractionPresented { .. } => SimulationEventKind::InteractionPresented,
            SimulationEvent::InteractionCompleted { .. } => SimulationEventKind::InteractionCompleted,
            SimulationEvent::Paused => SimulationEventKind::Paused,
            SimulationEvent::Resumed => SimulationEventKind::Resumed,
            SimulationEvent::Reset => SimulationEventKind::Reset,
            SimulationEvent::HistoryRestored { .. } => SimulationEventKind::HistoryRestored,
            SimulationEvent::Error { .. } => SimulationEventKind::Error,
            SimulationEvent::Completed { .. } => SimulationEventKind::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn listeners_fire_in_registration_order() {
        let mut bus: EventBus<SimulationEvent> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.on(SimulationEventKind::Paused, move |_| {
                seen.lock().unwrap().push(label);
                Ok(())
            });
        }

        bus.emit(&SimulationEvent::Paused);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn once_listener_fires_exactly_once_with_payload() {
        let mut bus: EventBus<SimulationEvent> = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        bus.once(SimulationEventKind::Started, move |event| {
            if let SimulationEvent::Started { simulation_id } = event {
                seen_clone.lock().unwrap().push(simulation_id.clone());
            }
            Ok(())
        });

        let event = SimulationEvent::Started {
            simulation_id: "sim-1".into(),
        };
        bus.emit(&event);
        bus.emit(&event);

        assert_eq!(*seen.lock().unwrap(), vec!["sim-1"]);
        assert_eq!(bus.listener_count(SimulationEventKind::Started), 0);
    }

    #[test]
    fn off_removes_exactly_that_listener() {
        let mut bus: EventBus<SimulationEvent> = EventBus::new();
        let count = Arc::new(Mutex::new(0u32));

        let count_a = Arc::clone(&count);
        let sub_a = bus.on(SimulationEventKind::Resumed, move |_| {
            *count_a.lock().unwrap() += 1;
            Ok(())
        });
        let count_b = Arc::clone(&count);
        bus.on(SimulationEventKind::Resumed, move |_| {
            *count_b.lock().unwrap() += 10;
            Ok(())
        });

        assert!(bus.off(sub_a));
        assert!(!bus.off(sub_a));

        bus.emit(&SimulationEvent::Resumed);
        bus.emit(&SimulationEvent::Resumed);
        assert_eq!(*count.lock().unwrap(), 20);
    }

    #[test]
    fn failing_listener_does_not_stop_emission() {
        let mut bus: EventBus<SimulationEvent> = EventBus::new();
        let reached = Arc::new(Mutex::new(false));

        bus.on(SimulationEventKind::Reset, |_| {
            anyhow::bail!("listener blew up")
        });
        let reached_clone = Arc::clone(&reached);
        bus.on(SimulationEventKind::Reset, move |_| {
            *reached_clone.lock().unwrap() = true;
            Ok(())
        });

        bus.emit(&SimulationEvent::Reset);
        assert!(*reached.lock().unwrap());
    }

    #[test]
    fn clear_drops_all_listeners() {
        let mut bus: EventBus<SimulationEvent> = EventBus::new();
        bus.on(SimulationEventKind::Paused, |_| Ok(()));
        bus.once(SimulationEventKind::Resumed, |_| Ok(()));

        bus.clear();
        assert_eq!(bus.listener_count(SimulationEventKind::Paused), 0);
        assert_eq!(bus.listener_count(SimulationEventKind::Resumed), 0);
    }
}
