//! Widget loader: discovery, frame creation and the message protocol.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, trace, warn};
use widget_loader_core::{
    DomError, ElementId, FrameId, HostDocument, HostEvent, LoaderOptions, MessageEvent,
    MessagePoster, OriginPolicy, WidgetOptions,
};
use widget_loader_protocol::{MessageKind, TargetOrigin, WidgetMessage, decode, encode};

use crate::{
    discovery::{PlaceholderDescriptor, find_containers},
    factory::{LoadWatch, create_frame},
    registry::{FrameRecord, FrameRegistry},
};

/// Widget loader error.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Document error: {0}")]
    Dom(#[from] DomError),
    #[error("Invalid data-options for {url}: {source}")]
    InvalidOptions {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("data-options for {url} is not a JSON object")]
    OptionsNotObject { url: String },
    #[error("Refusing to post to {url}: no exact origin")]
    InsecureOrigin { url: String },
    #[error("Frame not found: {0}")]
    FrameNotFound(FrameId),
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Widget loader has been disposed")]
    Disposed,
}

/// Loader lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Constructed, nothing discovered yet.
    Idle,
    /// A `load()` pass is running.
    Discovering,
    /// The last `load()` pass finished.
    Loaded,
    /// Listeners detached and frames released.
    Disposed,
}

/// Embeds widget frames into a host document and speaks the widget protocol.
pub struct WidgetLoader<D, P>
where
    D: HostDocument,
    P: MessagePoster,
{
    options: LoaderOptions,
    document: Arc<D>,
    poster: Arc<P>,
    registry: FrameRegistry,
    load_watch: LoadWatch,
    state: LoaderState,
}

impl<D, P> WidgetLoader<D, P>
where
    D: HostDocument,
    P: MessagePoster,
{
    /// Create a new loader.
    #[must_use]
    pub fn new(options: LoaderOptions, document: Arc<D>, poster: Arc<P>) -> Self {
        Self {
            options,
            document,
            poster,
            registry: FrameRegistry::new(),
            load_watch: LoadWatch::new(),
            state: LoaderState::Idle,
        }
    }

    /// Loader options.
    #[must_use]
    pub const fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LoaderState {
        self.state
    }

    /// Frames created by the last `load()` pass.
    #[must_use]
    pub const fn registry(&self) -> &FrameRegistry {
        &self.registry
    }

    /// The host document.
    #[must_use]
    pub const fn document(&self) -> &Arc<D> {
        &self.document
    }

    /// Discover placeholders and embed a frame into each.
    ///
    /// Frames from a previous pass are no longer tracked afterwards. Options
    /// of every placeholder are validated before the page is touched, so a
    /// bad `data-options` leaves the page and the previous frames as they
    /// were. Returns the number of frames created.
    ///
    /// # Errors
    /// Returns error if the loader is disposed, a placeholder carries invalid
    /// options, or the document rejects a mutation.
    pub fn load(&mut self) -> Result<usize, LoaderError> {
        if self.state == LoaderState::Disposed {
            return Err(LoaderError::Disposed);
        }

        let previous = self.state;
        self.state = LoaderState::Discovering;

        let prepared = match self.prepare() {
            Ok(prepared) => prepared,
            Err(e) => {
                self.state = previous;
                return Err(e);
            }
        };

        self.registry.clear();
        self.load_watch.clear();
        let built = prepared
            .into_iter()
            .try_for_each(|(descriptor, options)| self.embed(&descriptor, options));
        self.state = LoaderState::Loaded;
        built?;

        info!(
            frames = self.registry.len(),
            class_name = %self.options.class_name,
            "Widget frames loaded"
        );
        Ok(self.registry.len())
    }

    fn prepare(&self) -> Result<Vec<(PlaceholderDescriptor, WidgetOptions)>, LoaderError> {
        find_containers(self.document.as_ref(), &self.options.class_name)?
            .into_iter()
            .map(|descriptor| {
                let options = parse_options(&descriptor)?;
                Ok((descriptor, options))
            })
            .collect()
    }

    fn embed(
        &mut self,
        descriptor: &PlaceholderDescriptor,
        options: WidgetOptions,
    ) -> Result<(), LoaderError> {
        let (frame, id) = create_frame(self.document.as_ref(), descriptor, &mut self.load_watch)?;
        debug!(frame_id = %id, url = %descriptor.url, "Created widget frame");

        self.registry.register(FrameRecord::new(
            id,
            frame,
            descriptor.element,
            descriptor.url.clone(),
            options,
        ));
        Ok(())
    }

    /// React to a host event.
    ///
    /// Errors are logged; events reaching a disposed loader are ignored.
    pub fn handle_event(&mut self, event: &HostEvent) {
        match event {
            _ if self.state == LoaderState::Disposed => {}
            HostEvent::PageLoaded => {
                if self.options.autoload {
                    if let Err(e) = self.load() {
                        error!("Autoload failed: {e}");
                    }
                }
            }
            HostEvent::Message(message) => {
                self.handle_message(message);
            }
            HostEvent::FrameLoaded { frame } => self.handle_frame_loaded(*frame),
        }
    }

    /// Handle a cross-window message. Returns `true` if it changed or
    /// answered a tracked frame.
    pub fn handle_message(&mut self, event: &MessageEvent) -> bool {
        if self.state == LoaderState::Disposed {
            return false;
        }

        let Some(envelope) = decode(&event.data) else {
            trace!(origin = %event.origin, "Ignoring foreign message");
            return false;
        };

        match envelope.kind {
            MessageKind::Load => self.handle_widget_load(event),
            kind => {
                debug!(kind = kind.as_str(), "Ignoring unhandled widget message");
                false
            }
        }
    }

    fn handle_widget_load(&mut self, event: &MessageEvent) -> bool {
        let strict = self.options.origin_policy == OriginPolicy::Strict;
        let Some(record) = event
            .source
            .and_then(|window| self.registry.lookup_by_sender(window))
        else {
            debug!(origin = %event.origin, "Load from an untracked window");
            return false;
        };

        if strict {
            let expected = TargetOrigin::for_url(&record.url);
            if expected.is_wildcard() || expected.as_str() != event.origin {
                warn!(
                    frame_id = %record.id,
                    origin = %event.origin,
                    expected = %expected,
                    "Rejecting load from unexpected origin"
                );
                return false;
            }
        }

        if record.mark_loaded() {
            info!(frame_id = %record.id, url = %record.url, "Widget loaded");
        }

        let id = record.id;
        let configure = WidgetMessage::Configure {
            options: record.options.clone(),
        };
        if let Err(e) = self.send_to_frame(id, &configure) {
            warn!(frame_id = %id, "Failed to configure widget: {e}");
        }
        true
    }

    fn handle_frame_loaded(&mut self, frame: ElementId) {
        let loaded_class = self.options.loaded_class();
        match self
            .load_watch
            .notify(self.document.as_ref(), frame, &loaded_class)
        {
            Ok(Some(container)) => debug!(%frame, %container, "Widget container ready"),
            Ok(None) => {}
            Err(e) => warn!(%frame, "Failed to mark widget container ready: {e}"),
        }
    }

    /// Send a message to one tracked frame.
    ///
    /// # Errors
    /// Returns error if the loader is disposed, the frame is unknown, the
    /// origin is refused by a strict policy, or delivery fails.
    pub fn send_to_frame(&self, id: FrameId, message: &WidgetMessage) -> Result<(), LoaderError> {
        if self.state == LoaderState::Disposed {
            return Err(LoaderError::Disposed);
        }

        let record = self.registry.get(id).ok_or(LoaderError::FrameNotFound(id))?;
        self.post(record, message)
    }

    fn post(&self, record: &FrameRecord, message: &WidgetMessage) -> Result<(), LoaderError> {
        let origin = TargetOrigin::for_url(&record.url);
        if origin.is_wildcard() {
            if self.options.origin_policy == OriginPolicy::Strict {
                return Err(LoaderError::InsecureOrigin {
                    url: record.url.clone(),
                });
            }
            warn!(frame_id = %record.id, url = %record.url, "Widget URL has no exact origin; posting to *");
        }

        let data = encode(message)?;
        self.poster
            .post_message(record.frame.content_window, &data, origin.as_str())?;

        debug!(
            frame_id = %record.id,
            kind = message.kind().as_str(),
            %origin,
            "Posted widget message"
        );
        Ok(())
    }

    /// Send a message to every tracked frame in registration order.
    ///
    /// Frames that cannot be reached are logged and skipped. Returns the
    /// number of frames the message was delivered to.
    ///
    /// # Errors
    /// Returns error if the loader is disposed.
    pub fn broadcast(&self, message: &WidgetMessage) -> Result<usize, LoaderError> {
        if self.state == LoaderState::Disposed {
            return Err(LoaderError::Disposed);
        }

        let mut delivered = 0;
        for record in &self.registry {
            match self.post(record, message) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(frame_id = %record.id, "Broadcast skipped frame: {e}"),
            }
        }
        Ok(delivered)
    }

    /// Tell every widget to log out.
    ///
    /// # Errors
    /// Returns error if the loader is disposed.
    pub fn logout(&self) -> Result<usize, LoaderError> {
        self.broadcast(&WidgetMessage::Logout)
    }

    /// Ping every widget.
    ///
    /// # Errors
    /// Returns error if the loader is disposed.
    pub fn ping(&self) -> Result<usize, LoaderError> {
        self.broadcast(&WidgetMessage::Ping)
    }

    /// Release every frame and stop reacting to events.
    ///
    /// Frame elements stay in the page; the host owns the page.
    pub fn dispose(&mut self) {
        if self.state == LoaderState::Disposed {
            return;
        }

        info!(frames = self.registry.len(), "Disposing widget loader");
        self.registry.clear();
        self.load_watch.clear();
        self.state = LoaderState::Disposed;
    }
}

fn parse_options(descriptor: &PlaceholderDescriptor) -> Result<WidgetOptions, LoaderError> {
    let Some(raw) = descriptor.options.as_deref() else {
        return Ok(WidgetOptions::new());
    };

    match serde_json::from_str(raw) {
        Ok(Value::Object(options)) => Ok(options),
        Ok(_) => Err(LoaderError::OptionsNotObject {
            url: descriptor.url.clone(),
        }),
        Err(source) => Err(LoaderError::InvalidOptions {
            url: descriptor.url.clone(),
            source,
        }),
    }
}
