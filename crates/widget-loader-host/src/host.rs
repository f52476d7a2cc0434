//! Host component: mounts a placeholder and drives a loader for it.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use widget_loader::{LoaderError, LoaderHandle, discovery::URL_ATTR};
use widget_loader_core::{
    DomError, ElementId, EventBus, HostDocument, HostEvent, LoaderOptions, MessagePoster,
    UrlSourceError, WidgetUrlSource,
};
use widget_loader_protocol::decode;

use crate::{
    bootstrap::{LoaderConstructor, ScriptBootstrap},
    wait::WaitError,
};

/// Host error.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Loader script unavailable: {0}")]
    Bootstrap(#[from] WaitError),
    #[error("Widget URL unavailable: {0}")]
    UrlSource(#[from] UrlSourceError),
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
    #[error("Document error: {0}")]
    Dom(#[from] DomError),
    #[error("Widget host is not mounted")]
    NotMounted,
}

/// Log every widget protocol message seen on the bus.
///
/// Foreign traffic is skipped. Abort the handle to stop observing.
pub fn observe_protocol(bus: &EventBus) -> JoinHandle<()> {
    bus.spawn_listener(|event| {
        if let HostEvent::Message(message) = event {
            if let Some(envelope) = decode(&message.data) {
                debug!(
                    kind = envelope.kind.as_str(),
                    origin = %message.origin,
                    "Widget protocol message"
                );
            }
        }
    })
}

/// Embeds one widget into a root element of the page.
///
/// The widget URL comes from `U`; the loader constructor comes from a
/// [`ScriptBootstrap`]. Both are requested concurrently.
pub struct WidgetHost<D, P, U>
where
    D: HostDocument + 'static,
    P: MessagePoster + 'static,
    U: WidgetUrlSource,
{
    document: Arc<D>,
    bus: EventBus,
    root: ElementId,
    bootstrap: ScriptBootstrap<LoaderConstructor<D, P>>,
    url_source: U,
    options: LoaderOptions,
    placeholder: Option<ElementId>,
    widget_url: Option<String>,
    loader: Option<LoaderHandle<D, P>>,
    observer: Option<JoinHandle<()>>,
}

impl<D, P, U> WidgetHost<D, P, U>
where
    D: HostDocument + 'static,
    P: MessagePoster + 'static,
    U: WidgetUrlSource,
{
    /// Create a host rendering under `root`.
    ///
    /// The page may have finished loading long before the widget, so the
    /// loader is built with `autoload` off and loaded explicitly.
    #[must_use]
    pub fn new(
        document: Arc<D>,
        bus: EventBus,
        root: ElementId,
        bootstrap: ScriptBootstrap<LoaderConstructor<D, P>>,
        url_source: U,
    ) -> Self {
        Self {
            document,
            bus,
            root,
            bootstrap,
            url_source,
            options: LoaderOptions::default().with_autoload(false),
            placeholder: None,
            widget_url: None,
            loader: None,
            observer: None,
        }
    }

    /// The mounted placeholder.
    #[must_use]
    pub const fn placeholder(&self) -> Option<ElementId> {
        self.placeholder
    }

    /// The widget URL, once fetched.
    #[must_use]
    pub fn widget_url(&self) -> Option<&str> {
        self.widget_url.as_deref()
    }

    /// The attached loader, once loaded.
    #[must_use]
    pub const fn loader(&self) -> Option<&LoaderHandle<D, P>> {
        self.loader.as_ref()
    }

    /// Render the placeholder and start observing protocol traffic.
    ///
    /// # Errors
    /// Returns error if the placeholder cannot be added to the page.
    pub fn mount(&mut self) -> Result<ElementId, HostError> {
        if let Some(placeholder) = self.placeholder {
            return Ok(placeholder);
        }

        let placeholder = self.document.create_element("div")?;
        for (name, value) in [
            ("class", self.options.class_name.as_str()),
            (URL_ATTR, ""),
            ("data-width", "100%"),
            ("data-height", "100%"),
        ] {
            self.document.set_attribute(placeholder, name, value)?;
        }
        self.document.set_text(placeholder, "Loading...")?;
        self.document.append_child(self.root, placeholder)?;

        self.observer = Some(observe_protocol(&self.bus));
        self.placeholder = Some(placeholder);
        Ok(placeholder)
    }

    /// Fetch the loader and the widget URL, then embed the widget.
    ///
    /// Failures are logged and returned; nothing is retried. Returns the
    /// number of frames the loader created.
    ///
    /// # Errors
    /// Returns error if the host is not mounted, the loader script never
    /// becomes available, the URL request fails, or loading fails.
    pub async fn load(&mut self) -> Result<usize, HostError> {
        let result = self.try_load().await;
        if let Err(e) = &result {
            error!("Widget failed to load: {e}");
        }
        result
    }

    async fn try_load(&mut self) -> Result<usize, HostError> {
        let placeholder = self.placeholder.ok_or(HostError::NotMounted)?;

        let (constructor, widget_url) = tokio::try_join!(self.bootstrap.resolve(), async {
            self.url_source.widget_url().await.map_err(HostError::from)
        })?;

        self.document
            .set_attribute(placeholder, URL_ATTR, &widget_url.url)?;
        self.widget_url = Some(widget_url.url);

        if let Some(mut previous) = self.loader.take() {
            previous.dispose().await;
        }
        let loader = self
            .loader
            .insert(constructor.construct(self.options.clone()).attach(&self.bus));
        let frames = loader.load().await?;

        info!(frames, url = self.widget_url.as_deref().unwrap_or_default(), "Widget embedded");
        Ok(frames)
    }

    /// Stop observing, dispose the loader and take the placeholder off the
    /// page. A later [`WidgetHost::mount`] starts from a clean root.
    pub async fn unmount(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.abort();
            let _ = observer.await;
        }
        if let Some(mut loader) = self.loader.take() {
            loader.dispose().await;
        }
        if let Some(placeholder) = self.placeholder.take() {
            if let Err(e) = self.document.remove(placeholder) {
                warn!("Failed to remove widget placeholder: {e}");
            }
        }
        self.widget_url = None;
    }
}
