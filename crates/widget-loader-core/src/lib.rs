//! Core abstractions for embedding third-party widget frames.
//!
//! This crate provides the fundamental building blocks:
//! - `HostDocument` / `MessagePoster` - The page and `postMessage` seams
//! - `EventBus` - The page-wide event channel shared with unrelated senders
//! - `LoaderOptions` - Loader configuration merged over defaults
//! - `WidgetUrlSource` - Data source contract for widget addresses

pub mod bus;
pub mod options;
pub mod traits;

pub use bus::{EventBus, HostEvent, MessageEvent};
pub use options::{LoaderOptions, OriginPolicy, WidgetOptions};
pub use traits::{
    DomError, ElementId, FrameHandle, FrameId, HostDocument, MessagePoster, UrlSourceError,
    WidgetUrl, WidgetUrlSource, WindowId,
};
