//! Markup Reader Module
//!
//! - SliceReader: zero-copy pull reader over a byte slice
//! - Events: markup event types for pull parsing

pub mod events;
pub mod slice;

pub use events::MarkupEvent;
pub use slice::SliceReader;
