//! # flint-runtime
//!
//! Custom-element runtime core for the Flint web-component compiler.
//!
//! The runtime drives DOM-resident component hosts through their
//! load/update lifecycle: property/attribute reflection, coalesced
//! asynchronous update scheduling, shadow-DOM encapsulation, style
//! attachment and lifecycle-hook sequencing - with exactly-once
//! semantics under concurrent mutation requests.
//!
//! ## Architecture
//!
//! ```text
//! mutation (prop set / attribute / connect)
//!   -> Scheduler queue       (coalesced per host)
//!   -> Runtime::flush tick   (microtask-equivalent drain)
//!   -> Update orchestrator   (will hooks -> render bridge -> did hooks)
//!   -> Finalize cascade      (ancestor bookkeeping -> hydrated -> ready)
//! ```
//!
//! Everything is single-threaded and cooperative: update passes are
//! futures on a local pool, suspending only while will-hooks settle.
//! One host's pass never interleaves with itself; independent hosts
//! interleave freely.
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, HostElement, PropValue, flags)
//! - [`dom`] - Host document arena and bubbling event dispatch
//! - [`component`] - Component trait, hook results, runtime metadata
//! - [`props`] - Attribute/property coercion and reflection serialization
//! - [`vdom`] - Produced node trees and the render-bridge contract
//! - [`runtime`] - Registry, scheduler, styles, update orchestrator
//!
//! ## Example
//!
//! ```
//! use flint_runtime::{Component, ComponentRuntimeMeta, Runtime, VNode};
//!
//! struct Hello;
//! impl Component for Hello {
//!     fn render(&mut self) -> Result<Option<VNode>, flint_runtime::RuntimeError> {
//!         Ok(Some(VNode::text("hello")))
//!     }
//! }
//!
//! let rt = Runtime::new();
//! rt.define(ComponentRuntimeMeta::new("hello-world"), || Hello)?;
//! let host = rt.create_element("hello-world")?;
//! rt.append_child(rt.root(), host.node_id());
//! rt.flush();
//! assert_eq!(rt.document().text_content(host.node_id()), "hello");
//! # Ok::<(), flint_runtime::RuntimeError>(())
//! ```

pub mod component;
pub mod dom;
pub mod error;
pub mod props;
pub mod runtime;
pub mod types;
pub mod vdom;

// Re-export the working surface.
pub use component::{Component, ComponentRuntimeMeta, HookFuture, HookResult, PropDef, dash_case};
pub use dom::{Document, DomEvent};
pub use error::RuntimeError;
pub use props::{parse_property_value, serialize_property_value};
pub use runtime::{HostRef, Runtime, RuntimeOptions};
pub use types::{ComponentFlags, HostElement, NodeId, PropFlags, PropType, PropValue};
pub use vdom::{RenderBridge, ReplaceRenderer, VNode, h};
