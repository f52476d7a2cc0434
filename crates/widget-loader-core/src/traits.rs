//! Core traits for the host document and cross-window delivery.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Element identifier inside a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a frame's content window.
///
/// Inbound messages only carry this handle, so comparing it against the
/// windows of previously created frames is the only way to find the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub Uuid);

impl WindowId {
    /// Create a fresh window identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(0);

/// Frame identifier.
///
/// Allocated from a process-wide counter, so an id is never handed out twice
/// while the process lives. Ids are not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

impl FrameId {
    /// Allocate the next id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "md-frame-{}", self.0)
    }
}

/// A created frame: its element in the document and its content window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle {
    /// The frame element.
    pub element: ElementId,
    /// The frame's content window, used as sender/recipient identity.
    pub content_window: WindowId,
}

/// Document error.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("Element not found: {0}")]
    NotFound(ElementId),
    #[error("Window is closed: {0}")]
    WindowClosed(WindowId),
    #[error("Document error: {0}")]
    Internal(String),
}

/// Trait for host documents the loader can scan and mutate.
///
/// Methods take `&self`; implementations own their interior mutability.
pub trait HostDocument: Send + Sync {
    /// Elements whose class list contains `class_name`, in document order.
    fn elements_with_class(&self, class_name: &str) -> Result<Vec<ElementId>, DomError>;

    /// Read an attribute.
    fn attribute(&self, element: ElementId, name: &str) -> Result<Option<String>, DomError>;

    /// Set an attribute, replacing any previous value.
    fn set_attribute(&self, element: ElementId, name: &str, value: &str)
    -> Result<(), DomError>;

    /// Append a class token unless already present.
    fn add_class(&self, element: ElementId, class_name: &str) -> Result<(), DomError>;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Result<ElementId, DomError>;

    /// Create a detached frame element with its own content window.
    fn create_frame(&self) -> Result<FrameHandle, DomError>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), DomError>;

    /// Drop all children and text of `parent`, then append `child`.
    ///
    /// The dropped children are discarded along with their subtrees.
    fn replace_children(&self, parent: ElementId, child: ElementId) -> Result<(), DomError>;

    /// Replace the text content of an element.
    fn set_text(&self, element: ElementId, text: &str) -> Result<(), DomError>;

    /// Detach `element` from its parent and discard it with its subtree.
    fn remove(&self, element: ElementId) -> Result<(), DomError>;
}

/// Trait for delivering a string message to a frame's content window.
pub trait MessagePoster: Send + Sync {
    /// Post `data` to `target`. Delivery is restricted to `target_origin`
    /// unless it is `"*"`.
    fn post_message(&self, target: WindowId, data: &str, target_origin: &str)
    -> Result<(), DomError>;
}

/// Response of a widget URL request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetUrl {
    /// Address the widget frame should navigate to.
    pub url: String,
}

/// Widget URL source error.
#[derive(Debug, Error)]
pub enum UrlSourceError {
    #[error("Widget URL service unavailable")]
    Unavailable,
    #[error("Widget URL request failed: {0}")]
    RequestFailed(String),
}

/// Trait for backends that hand out the current user's widget URL.
#[async_trait]
pub trait WidgetUrlSource: Send + Sync {
    /// Fetch the widget URL.
    async fn widget_url(&self) -> Result<WidgetUrl, UrlSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_ids_are_unique_and_increasing() {
        let ids: Vec<FrameId> = (0..64).map(|_| FrameId::next()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_frame_id_display() {
        let id = FrameId::next();
        assert_eq!(id.to_string(), format!("md-frame-{}", id.value()));
    }

    #[test]
    fn test_window_ids_differ() {
        assert_ne!(WindowId::new(), WindowId::new());
    }
}
