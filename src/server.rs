use crate::config::Config;
use crate::event::{EventBus, NoListeners};
use crate::network::Message;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

/// State shared by every connection. Built once in `main`, then passed around in an `Arc`.
pub struct ServerContext {
    pub config: Config,
    events: Box<dyn EventBus>,
    online: AtomicUsize,
    next_entity_id: AtomicI32,
    broadcasts: (Sender<Box<dyn Message>>, Receiver<Box<dyn Message>>),
}
impl ServerContext {
    pub fn new(config: Config, events: impl EventBus + 'static) -> Self {
        Self {
            config,
            events: Box::new(events),
            online: AtomicUsize::new(0),
            next_entity_id: AtomicI32::new(1),
            broadcasts: unbounded(),
        }
    }
    pub fn events(&self) -> &dyn EventBus {
        &*self.events
    }

    pub fn online(&self) -> usize {
        self.online.load(Ordering::Relaxed)
    }
    pub(crate) fn joined(&self) {
        self.online.fetch_add(1, Ordering::Relaxed);
    }
    pub(crate) fn left(&self) {
        self.online.fetch_sub(1, Ordering::Relaxed);
    }
    pub fn next_entity_id(&self) -> i32 {
        self.next_entity_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Queues a Play message for every playing connection. Sent on the next network tick.
    pub fn broadcast(&self, msg: impl Message) {
        self.broadcast_dyn(Box::new(msg))
    }
    pub fn broadcast_dyn(&self, msg: Box<dyn Message>) {
        // the receiver lives as long as self
        let _ = self.broadcasts.0.send(msg);
    }
    pub fn pending_broadcasts(&self) -> impl Iterator<Item = Box<dyn Message>> + '_ {
        self.broadcasts.1.try_iter()
    }
}
impl Default for ServerContext {
    fn default() -> Self {
        Self::new(Config::default(), NoListeners)
    }
}
impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("config", &self.config)
            .field("online", &self.online())
            .field("queued_broadcasts", &self.broadcasts.1.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_are_unique() {
        let server = ServerContext::default();
        let a = server.next_entity_id();
        let b = server.next_entity_id();
        assert_ne!(a, b);
    }

    #[test]
    fn broadcasts_drain_in_order() {
        let server = ServerContext::default();
        server.broadcast(crate::network::vanilla::play::ChatMessage::text("one"));
        server.broadcast(crate::network::vanilla::play::ChatMessage::text("two"));
        let drained: Vec<_> = server.pending_broadcasts().collect();
        assert_eq!(drained.len(), 2);
        assert!(server.pending_broadcasts().next().is_none());
    }
}
