//! Host document and message delivery implementations.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{MemoryDocument, MemoryOutbox, PostedMessage};
