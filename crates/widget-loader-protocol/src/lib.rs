//! Wire protocol between the host page and widget frames.
//!
//! Provides:
//! - Envelope codec (JSON on a string, filtered by a marker field)
//! - Target origin computation for outbound delivery

pub mod origin;
pub mod protocol;

pub use origin::TargetOrigin;
pub use protocol::{Envelope, MARKER_FIELD, MessageKind, WidgetMessage, decode, encode};
