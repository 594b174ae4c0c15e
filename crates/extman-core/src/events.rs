//! Activation notifications.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::descriptor::ExtensionDescriptor;

/// Something observable happened to an extension.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionEvent {
    /// The extension's entry point ran successfully.
    Registered(ExtensionDescriptor),
}

impl ExtensionEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Registered(_) => "extension-registered",
        }
    }

    pub fn descriptor(&self) -> &ExtensionDescriptor {
        match self {
            Self::Registered(descriptor) => descriptor,
        }
    }
}

impl fmt::Display for ExtensionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.descriptor().name())
    }
}

type Listener = Box<dyn Fn(&ExtensionEvent) + Send + Sync>;

/// Fan-out point for [`ExtensionEvent`]s.
///
/// Listeners registered with [`on_extension_registered`](Self::on_extension_registered)
/// run synchronously inside [`emit`](Self::emit). Channel subscribers receive
/// a clone of every event emitted after they subscribed.
///
/// Subscriber channels are unbounded: activation runs a whole batch without
/// yielding, so no event may be dropped while the receiver waits.
pub struct ExtensionEvents {
    listeners: Vec<Listener>,
    subscribers: Mutex<Vec<UnboundedSender<ExtensionEvent>>>,
}

impl ExtensionEvents {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Call `listener` with the descriptor of every newly registered extension.
    pub fn on_extension_registered<F>(&mut self, listener: F)
    where
        F: Fn(&ExtensionDescriptor) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(move |event| match event {
            ExtensionEvent::Registered(descriptor) => listener(descriptor),
        }));
    }

    pub fn subscribe(&self) -> UnboundedReceiver<ExtensionEvent> {
        let (tx, rx) = unbounded_channel();
        self.lock_subscribers().push(tx);
        rx
    }

    /// Number of open subscriber channels.
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    /// Deliver `event` to every listener, then to every open subscriber.
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn emit(&self, event: ExtensionEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
        self.lock_subscribers()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<UnboundedSender<ExtensionEvent>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ExtensionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExtensionEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionEvents")
            .field("listeners", &self.listeners.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
