//! Synchronous, cancellable events posted by the protocol handlers.
use std::any::Any;
use std::fmt::Debug;
use std::sync::RwLock;

pub trait Event: Any + Debug + Send {
    fn is_cancelled(&self) -> bool {
        false
    }
    fn set_cancelled(&mut self, cancelled: bool) {
        let _ = cancelled;
    }
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Where game logic outside the protocol hears about, and may veto, what players do.
pub trait EventBus: Send + Sync {
    fn post(&self, event: &mut dyn Event);
}

/// Accepts everything.
#[derive(Debug, Default)]
pub struct NoListeners;
impl EventBus for NoListeners {
    fn post(&self, _: &mut dyn Event) {}
}

type Listener = Box<dyn Fn(&mut dyn Event) + Send + Sync>;

/// Listeners registered by event type, called in subscription order.
#[derive(Default)]
pub struct Listeners {
    listeners: RwLock<Vec<Listener>>,
}
impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn subscribe<E: Event>(&self, listener: impl Fn(&mut E) + Send + Sync + 'static) {
        let listener: Listener = Box::new(move |event: &mut dyn Event| {
            if let Some(event) = event.as_any_mut().downcast_mut::<E>() {
                listener(event)
            }
        });
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }
}
impl EventBus for Listeners {
    fn post(&self, event: &mut dyn Event) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners,
            Err(poisoned) => poisoned.into_inner(),
        };
        for listener in listeners.iter() {
            listener(event);
        }
    }
}
impl Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.listeners.read().map_or(0, |l| l.len());
        f.debug_struct("Listeners").field("count", &count).finish()
    }
}

#[macro_export]
macro_rules! impl_event {
    ($t:ty) => {
        impl $crate::event::Event for $t {
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
    ($t:ty, cancellable) => {
        impl $crate::event::Event for $t {
            fn is_cancelled(&self) -> bool {
                self.cancelled
            }
            fn set_cancelled(&mut self, cancelled: bool) {
                self.cancelled = cancelled;
            }
            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

/// A player finished logging in.
#[derive(Debug, Clone)]
pub struct PlayerJoinEvent {
    pub name: String,
    pub uuid: uuid::Uuid,
    pub entity_id: i32,
}
impl_event!(PlayerJoinEvent);

#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub sender: String,
    pub message: String,
    pub cancelled: bool,
}
impl_event!(ChatEvent, cancellable);
