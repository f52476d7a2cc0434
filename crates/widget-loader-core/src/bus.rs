//! Page-wide host event channel.
//!
//! Every listener on the page sees every event, including messages from
//! senders that have nothing to do with widgets. Listeners filter for
//! themselves.

use futures::{StreamExt, stream::BoxStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};

use crate::{ElementId, WindowId};

/// Buffered events per listener before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 1024;

/// A cross-window message as the page receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// Raw message payload.
    pub data: String,
    /// Origin of the sending window.
    pub origin: String,
    /// Sending window, when the sender is a window at all.
    pub source: Option<WindowId>,
}

impl MessageEvent {
    /// Create a message event.
    #[must_use]
    pub fn new(data: impl Into<String>, origin: impl Into<String>, source: Option<WindowId>) -> Self {
        Self {
            data: data.into(),
            origin: origin.into(),
            source,
        }
    }
}

/// Events delivered to page-level listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The page finished loading.
    PageLoaded,
    /// A cross-window message arrived.
    Message(MessageEvent),
    /// A frame element finished navigating.
    FrameLoaded { frame: ElementId },
}

/// Broadcast channel for host events.
///
/// Cloning yields another handle to the same channel. Each listener buffers
/// up to 1024 events. A listener that falls further behind loses the oldest
/// ones; a lost widget `load` message leaves that frame unloaded until the
/// widget announces itself again.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<HostEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Deliver an event to every current listener. Returns how many listeners
    /// received it.
    pub fn dispatch(&self, event: HostEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Deliver a cross-window message.
    pub fn post_message(
        &self,
        source: Option<WindowId>,
        origin: impl Into<String>,
        data: impl Into<String>,
    ) -> usize {
        self.dispatch(HostEvent::Message(MessageEvent::new(data, origin, source)))
    }

    /// Get a receiver for events dispatched from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.sender.subscribe()
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Stream of events dispatched from now on.
    ///
    /// The subscription is taken before this returns. Events dropped because
    /// the listener fell behind are logged and skipped.
    #[must_use]
    pub fn stream(&self) -> BoxStream<'static, HostEvent> {
        BroadcastStream::new(self.subscribe())
            .filter_map(|res| async move {
                match res {
                    Ok(event) => Some(event),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "host event listener lagged");
                        None
                    }
                }
            })
            .boxed()
    }

    /// Run `handler` for every event on a background task.
    ///
    /// Aborting the returned handle detaches the listener.
    pub fn spawn_listener<F>(&self, mut handler: F) -> tokio::task::JoinHandle<()>
    where
        F: FnMut(HostEvent) + Send + 'static,
    {
        let stream = self.stream();
        tokio::spawn(async move {
            tokio::pin!(stream);

            while let Some(event) = stream.next().await {
                handler(event);
            }
        })
    }
}
