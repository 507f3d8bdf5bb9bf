//! Host document - the live tree the runtime mutates.
//!
//! - Document: node arena (elements, text, attributes, classes, shadow roots)
//! - Events: bubbling, observation-only event dispatch

pub mod document;
pub mod events;

pub use document::Document;
pub use events::{DomEvent, dispatch_event};
