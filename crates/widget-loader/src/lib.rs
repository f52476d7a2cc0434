//! Placeholder discovery, frame tracking and widget loader orchestration.
//!
//! Provides:
//! - `find_containers` - Scan the page for widget placeholders
//! - `create_frame` / `LoadWatch` - Build frames and mark containers ready
//! - `FrameRegistry` - Per-loader frame state, correlated by sender window
//! - `WidgetLoader` / `LoaderHandle` - Orchestrate loading and the message protocol
//! - In-memory document and outbox (feature: memory)

pub mod discovery;
pub mod dom;
pub mod factory;
pub mod loader;
pub mod registry;
pub mod runtime;

pub use discovery::{PlaceholderDescriptor, find_containers};
pub use factory::{LoadWatch, create_frame};
pub use loader::{LoaderError, LoaderState, WidgetLoader};
pub use registry::{FrameRecord, FrameRegistry};
pub use runtime::LoaderHandle;
