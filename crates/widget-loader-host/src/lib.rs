//! Host-side glue for embedding widgets.
//!
//! Provides:
//! - `wait_for` - Poll a predicate until it yields, bounded by a timeout
//! - `ScriptBootstrap` - Obtain the loader constructor, injecting its script if needed
//! - `StaticUrlSource` - Fixed widget URL source (and the mock API)
//! - `WidgetHost` - Mount a placeholder and drive a loader for it

pub mod bootstrap;
pub mod host;
pub mod source;
pub mod wait;

pub use bootstrap::{GlobalSlot, LoaderConstructor, ScriptBootstrap, ScriptElementInjector, ScriptInjector};
pub use host::{HostError, WidgetHost, observe_protocol};
pub use source::StaticUrlSource;
pub use wait::{WaitError, WaitOptions, wait_for};
