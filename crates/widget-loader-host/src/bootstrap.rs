//! Obtaining the loader constructor.
//!
//! The constructor is injected instead of living in a page global. When the
//! host does not have it yet, the loader script is injected once and the
//! slot is polled until the script fills it.

use std::sync::{Arc, RwLock};

use tracing::debug;
use widget_loader::WidgetLoader;
use widget_loader_core::{DomError, ElementId, HostDocument, LoaderOptions, MessagePoster};

use crate::{
    host::HostError,
    wait::{WaitOptions, wait_for},
};

/// Default location of the loader script.
pub const DEFAULT_SCRIPT_SRC: &str = "https://widgets.moneydesktop.com/assets/md-widget-v4.js";

/// A shared, late-initialized value.
#[derive(Debug)]
pub struct GlobalSlot<T> {
    value: Arc<RwLock<Option<T>>>,
}

impl<T> Clone for GlobalSlot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Default for GlobalSlot<T> {
    fn default() -> Self {
        Self {
            value: Arc::new(RwLock::new(None)),
        }
    }
}

impl<T: Clone> GlobalSlot<T> {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filled slot.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        let slot = Self::new();
        slot.set(value);
        slot
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.value.read().ok().and_then(|v| v.clone())
    }

    /// Fill or replace the value.
    pub fn set(&self, value: T) {
        if let Ok(mut slot) = self.value.write() {
            *slot = Some(value);
        }
    }

    /// Whether a value is present.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value.read().is_ok_and(|v| v.is_some())
    }
}

/// Adds a script to the page.
pub trait ScriptInjector: Send + Sync {
    /// Start loading the script at `src`.
    fn inject(&self, src: &str) -> Result<(), DomError>;
}

impl<F> ScriptInjector for F
where
    F: Fn(&str) -> Result<(), DomError> + Send + Sync,
{
    fn inject(&self, src: &str) -> Result<(), DomError> {
        self(src)
    }
}

/// Appends a `<script>` element under a parent element.
pub struct ScriptElementInjector<D> {
    document: Arc<D>,
    parent: ElementId,
}

impl<D: HostDocument> ScriptElementInjector<D> {
    /// Inject scripts under `parent`.
    #[must_use]
    pub const fn new(document: Arc<D>, parent: ElementId) -> Self {
        Self { document, parent }
    }
}

impl<D: HostDocument> ScriptInjector for ScriptElementInjector<D> {
    fn inject(&self, src: &str) -> Result<(), DomError> {
        let script = self.document.create_element("script")?;
        self.document.set_attribute(script, "type", "text/javascript")?;
        self.document.set_attribute(script, "src", src)?;
        self.document.append_child(self.parent, script)
    }
}

/// Resolves a value from a [`GlobalSlot`], injecting its script if needed.
pub struct ScriptBootstrap<T> {
    slot: GlobalSlot<T>,
    injector: Arc<dyn ScriptInjector>,
    src: String,
    wait: WaitOptions,
}

impl<T: Clone> ScriptBootstrap<T> {
    /// Bootstrap from `slot` using `injector` and the default script.
    #[must_use]
    pub fn new(slot: GlobalSlot<T>, injector: Arc<dyn ScriptInjector>) -> Self {
        Self {
            slot,
            injector,
            src: DEFAULT_SCRIPT_SRC.to_string(),
            wait: WaitOptions::default(),
        }
    }

    /// Use a different script source.
    #[must_use]
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    /// Use different polling bounds.
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// The slot being resolved.
    #[must_use]
    pub const fn slot(&self) -> &GlobalSlot<T> {
        &self.slot
    }

    /// Return the slot's value, injecting the script and waiting if empty.
    ///
    /// # Errors
    /// Returns error if the script cannot be injected or the slot stays
    /// empty past the timeout.
    pub async fn resolve(&self) -> Result<T, HostError> {
        if let Some(value) = self.slot.get() {
            return Ok(value);
        }

        debug!(src = %self.src, "Injecting widget loader script");
        self.injector.inject(&self.src)?;

        let slot = self.slot.clone();
        Ok(wait_for(move || slot.get(), self.wait).await?)
    }
}

/// Builds widget loaders for one page.
pub struct LoaderConstructor<D, P> {
    document: Arc<D>,
    poster: Arc<P>,
}

impl<D, P> Clone for LoaderConstructor<D, P> {
    fn clone(&self) -> Self {
        Self {
            document: Arc::clone(&self.document),
            poster: Arc::clone(&self.poster),
        }
    }
}

impl<D, P> LoaderConstructor<D, P>
where
    D: HostDocument,
    P: MessagePoster,
{
    /// Constructor bound to a page and its message delivery.
    #[must_use]
    pub const fn new(document: Arc<D>, poster: Arc<P>) -> Self {
        Self { document, poster }
    }

    /// Construct a loader.
    #[must_use]
    pub fn construct(&self, options: LoaderOptions) -> WidgetLoader<D, P> {
        WidgetLoader::new(options, Arc::clone(&self.document), Arc::clone(&self.poster))
    }
}
