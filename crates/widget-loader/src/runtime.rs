//! A widget loader attached to the page's event bus.

use std::sync::Arc;

use futures::StreamExt;
use tokio::{sync::Mutex, task::JoinHandle};
use widget_loader_core::{EventBus, FrameId, HostDocument, MessagePoster};
use widget_loader_protocol::WidgetMessage;

use crate::{
    loader::{LoaderError, LoaderState, WidgetLoader},
    registry::FrameRecord,
};

impl<D, P> WidgetLoader<D, P>
where
    D: HostDocument + 'static,
    P: MessagePoster + 'static,
{
    /// Start listening to page events.
    ///
    /// The subscription is in place when this returns. Events are handled
    /// one at a time, each to completion, on a single background task.
    #[must_use]
    pub fn attach(self, bus: &EventBus) -> LoaderHandle<D, P> {
        let events = bus.stream();
        let loader = Arc::new(Mutex::new(self));
        let shared = Arc::clone(&loader);

        let listener = tokio::spawn(async move {
            tokio::pin!(events);

            while let Some(event) = events.next().await {
                shared.lock().await.handle_event(&event);
            }
        });

        LoaderHandle {
            loader,
            listener: Some(listener),
        }
    }
}

/// Handle to an attached widget loader.
///
/// Dropping the handle detaches the listener; [`LoaderHandle::dispose`] also
/// releases the tracked frames.
pub struct LoaderHandle<D, P>
where
    D: HostDocument,
    P: MessagePoster,
{
    loader: Arc<Mutex<WidgetLoader<D, P>>>,
    listener: Option<JoinHandle<()>>,
}

impl<D, P> LoaderHandle<D, P>
where
    D: HostDocument,
    P: MessagePoster,
{
    /// Run a `load()` pass.
    ///
    /// # Errors
    /// See [`WidgetLoader::load`].
    pub async fn load(&self) -> Result<usize, LoaderError> {
        self.loader.lock().await.load()
    }

    /// Send a message to one frame.
    ///
    /// # Errors
    /// See [`WidgetLoader::send_to_frame`].
    pub async fn send_to_frame(&self, id: FrameId, message: &WidgetMessage) -> Result<(), LoaderError> {
        self.loader.lock().await.send_to_frame(id, message)
    }

    /// Send a message to every frame.
    ///
    /// # Errors
    /// Returns error if the loader is disposed.
    pub async fn broadcast(&self, message: &WidgetMessage) -> Result<usize, LoaderError> {
        self.loader.lock().await.broadcast(message)
    }

    /// Tell every widget to log out.
    ///
    /// # Errors
    /// Returns error if the loader is disposed.
    pub async fn logout(&self) -> Result<usize, LoaderError> {
        self.loader.lock().await.logout()
    }

    /// Ping every widget.
    ///
    /// # Errors
    /// Returns error if the loader is disposed.
    pub async fn ping(&self) -> Result<usize, LoaderError> {
        self.loader.lock().await.ping()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> LoaderState {
        self.loader.lock().await.state()
    }

    /// Snapshot of the tracked frames.
    pub async fn frames(&self) -> Vec<FrameRecord> {
        self.loader.lock().await.registry().iter().cloned().collect()
    }

    /// Whether the listener task is still attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }

    /// Detach from the bus and release every frame.
    pub async fn dispose(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            let _ = listener.await;
        }
        self.loader.lock().await.dispose();
    }
}

impl<D, P> Drop for LoaderHandle<D, P>
where
    D: HostDocument,
    P: MessagePoster,
{
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
