//! Virtual-DOM surface: produced node trees and the reconciliation
//! contract the orchestrator renders through.

pub mod bridge;
pub mod vnode;

pub use bridge::{RenderBridge, ReplaceRenderer};
pub use vnode::{VNode, h};
