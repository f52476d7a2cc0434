//! Frame construction and navigation-load wiring.

use std::collections::HashMap;

use widget_loader_core::{DomError, ElementId, FrameHandle, FrameId, HostDocument};

use crate::discovery::PlaceholderDescriptor;

/// Width used when the placeholder does not ask for one.
pub const DEFAULT_WIDTH: &str = "100%";
/// Height used when the placeholder does not ask for one.
pub const DEFAULT_HEIGHT: &str = "600";
/// Frame attribute carrying the assigned frame id.
pub const FRAME_ID_ATTR: &str = "data-widget-id";
/// Container attribute set once its frame has navigated.
pub const LOADED_ATTR: &str = "data-loaded";

/// Build a frame for `descriptor` and swap it into the placeholder.
///
/// The placeholder's previous contents are dropped. The frame is added to
/// `watch` so its first navigation-load marks the container ready.
///
/// # Errors
/// Returns error if the document rejects any mutation.
pub fn create_frame<D>(
    document: &D,
    descriptor: &PlaceholderDescriptor,
    watch: &mut LoadWatch,
) -> Result<(FrameHandle, FrameId), DomError>
where
    D: HostDocument + ?Sized,
{
    let id = FrameId::next();
    let frame = document.create_frame()?;
    let width = descriptor.width.as_deref().unwrap_or(DEFAULT_WIDTH);
    let height = descriptor.height.as_deref().unwrap_or(DEFAULT_HEIGHT);

    for (name, value) in [
        ("width", width),
        ("height", height),
        ("border", "0"),
        ("frame", "0"),
        ("frameborder", "0"),
        ("allowtransparency", "true"),
        ("src", descriptor.url.as_str()),
        ("marginheight", "0"),
        ("marginwidth", "0"),
    ] {
        document.set_attribute(frame.element, name, value)?;
    }
    document.set_attribute(frame.element, FRAME_ID_ATTR, &id.to_string())?;

    document.replace_children(descriptor.element, frame.element)?;
    watch.watch(frame.element, descriptor.element);

    Ok((frame, id))
}

/// Frames waiting for their first navigation-load, keyed by frame element.
#[derive(Debug, Default)]
pub struct LoadWatch {
    pending: HashMap<ElementId, ElementId>,
}

impl LoadWatch {
    /// Create an empty watch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `container` ready when `frame` first loads.
    pub fn watch(&mut self, frame: ElementId, container: ElementId) {
        self.pending.insert(frame, container);
    }

    /// Handle a navigation-load of `frame`.
    ///
    /// Returns the container that was marked, or `None` if the frame is not
    /// watched (unknown, or already notified).
    ///
    /// # Errors
    /// Returns error if the container cannot be updated.
    pub fn notify<D>(
        &mut self,
        document: &D,
        frame: ElementId,
        loaded_class: &str,
    ) -> Result<Option<ElementId>, DomError>
    where
        D: HostDocument + ?Sized,
    {
        let Some(container) = self.pending.remove(&frame) else {
            return Ok(None);
        };

        document.add_class(container, loaded_class)?;
        document.set_attribute(container, LOADED_ATTR, "true")?;
        Ok(Some(container))
    }

    /// Number of frames still waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no frame is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every pending frame.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
