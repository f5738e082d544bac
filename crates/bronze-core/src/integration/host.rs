//! The host side of an adapter.
//!
//! Adapters never talk to a framework directly. Everything they produce is
//! pushed into a [`Host`]:
//!
//! - lifecycle signals (`online` / `offline`) per bot
//! - raw platform events under namespaced names (e.g. `discord/typing-start`)
//! - normalized [`Session`] records, inbound and outbound
//!
//! [`HostBus`] is the stock implementation: it fans everything out over a
//! broadcast channel.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::foundation::session::Session;

/// Receiver of everything adapters produce.
pub trait Host: Send + Sync {
    /// A bot became usable.
    fn online(&self, bot_id: &str);

    /// A bot stopped being usable.
    fn offline(&self, bot_id: &str);

    /// A raw platform event.
    fn emit(&self, name: &str, payload: &Value);

    /// A normalized inbound session.
    fn dispatch(&self, session: Session);

    /// A message sent by a bot.
    fn sent(&self, session: &Session);
}

/// A shared host trait object.
pub type BoxedHost = Arc<dyn Host>;

/// An event broadcast by [`HostBus`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A bot came online.
    Online {
        /// Bot id.
        bot_id: String,
    },
    /// A bot went offline.
    Offline {
        /// Bot id.
        bot_id: String,
    },
    /// A raw platform event.
    Event {
        /// Namespaced event name.
        name: String,
        /// Platform payload.
        payload: Value,
    },
    /// An inbound session.
    Session(Session),
    /// An outbound session.
    Sent(Session),
}

/// Broadcast-based [`Host`].
#[derive(Debug, Clone)]
pub struct HostBus {
    tx: broadcast::Sender<HostEvent>,
}

impl Default for HostBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl HostBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: HostEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}

impl Host for HostBus {
    fn online(&self, bot_id: &str) {
        info!(bot_id = %bot_id, "Bot online");
        self.publish(HostEvent::Online {
            bot_id: bot_id.to_string(),
        });
    }

    fn offline(&self, bot_id: &str) {
        info!(bot_id = %bot_id, "Bot offline");
        self.publish(HostEvent::Offline {
            bot_id: bot_id.to_string(),
        });
    }

    fn emit(&self, name: &str, payload: &Value) {
        trace!(event = %name, "Platform event");
        self.publish(HostEvent::Event {
            name: name.to_string(),
            payload: payload.clone(),
        });
    }

    fn dispatch(&self, session: Session) {
        debug!(
            event = %session.event_name(),
            message_id = %session.message_id,
            channel_id = %session.channel_id,
            "Session dispatched"
        );
        self.publish(HostEvent::Session(session));
    }

    fn sent(&self, session: &Session) {
        debug!(
            message_id = %session.message_id,
            channel_id = %session.channel_id,
            "Message sent"
        );
        self.publish(HostEvent::Sent(session.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::session::SessionKind;

    #[tokio::test]
    async fn test_bus_fans_out_in_order() {
        let bus = HostBus::new(8);
        let mut rx = bus.subscribe();

        bus.online("1");
        bus.emit("discord/typing-start", &serde_json::json!({"x": 1}));
        bus.dispatch(Session::new("discord", "1", SessionKind::MessageCreated, "m", "c"));
        bus.offline("1");

        assert_eq!(
            rx.recv().await.unwrap(),
            HostEvent::Online {
                bot_id: "1".into()
            }
        );
        assert!(matches!(rx.recv().await.unwrap(), HostEvent::Event { name, .. } if name == "discord/typing-start"));
        assert!(matches!(rx.recv().await.unwrap(), HostEvent::Session(s) if s.message_id == "m"));
        assert!(matches!(rx.recv().await.unwrap(), HostEvent::Offline { .. }));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = HostBus::default();
        bus.online("1");
    }
}
