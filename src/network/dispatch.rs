//! Message Dispatch
//!
//! Inbound messages are fanned out to every subscribed listener after the
//! session has applied them, so UI, logging and tests can observe traffic
//! without replacing each other's handlers.

use tracing::trace;

use crate::network::protocol::NetMessage;

/// Observer of inbound messages.
pub trait MessageListener: Send {
    /// Called once per inbound message, in arrival order.
    fn on_message(&mut self, msg: &NetMessage);
}

impl<F> MessageListener for F
where
    F: FnMut(&NetMessage) + Send,
{
    fn on_message(&mut self, msg: &NetMessage) {
        self(msg)
    }
}

/// Ordered set of listeners.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<Box<dyn MessageListener>>,
}

impl Dispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Listeners are called in subscription order.
    pub fn subscribe(&mut self, listener: Box<dyn MessageListener>) {
        self.listeners.push(listener);
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// No listeners subscribed.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver a message to every listener.
    pub fn dispatch(&mut self, msg: &NetMessage) {
        trace!(kind = msg.kind(), listeners = self.listeners.len(), "dispatch");
        for listener in &mut self.listeners {
            listener.on_message(msg);
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
