//! Render bridge - the reconciliation contract.
//!
//! The update orchestrator treats reconciliation as a black box: it hands
//! the bridge the host, the component metadata and the produced node
//! tree, and the bridge mutates the live subtree under the host however
//! it likes. Errors bubble back to the orchestrator, which logs and
//! continues - a broken render never stalls the lifecycle.
//!
//! [`ReplaceRenderer`] is the reference implementation: it tears down the
//! previous output and rebuilds from the tree. No diffing - correct and
//! observable, which is what the lifecycle machinery needs; embedders
//! with real reconcilers install their own bridge via
//! [`Runtime::set_render_bridge`](crate::runtime::Runtime::set_render_bridge).

use crate::component::ComponentRuntimeMeta;
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::types::HostElement;
use crate::vdom::VNode;

/// Reconciliation engine contract.
pub trait RenderBridge {
    /// Reconcile the host's rendered subtree against `tree`.
    ///
    /// `None` means the component rendered nothing this pass; the bridge
    /// leaves the existing subtree alone. Called with the host's render
    /// window active; property writes made from inside will not
    /// re-enqueue an update.
    fn render_vdom(
        &self,
        runtime: &Runtime,
        host: HostElement,
        meta: &ComponentRuntimeMeta,
        tree: Option<VNode>,
    ) -> Result<(), RuntimeError>;
}

/// Tear-down-and-rebuild bridge.
///
/// Rendered elements whose tag names a defined component become child
/// hosts: they register their own `HostRef`, join this host's
/// actively-loading set and schedule their own first load once attached.
pub struct ReplaceRenderer;

impl RenderBridge for ReplaceRenderer {
    fn render_vdom(
        &self,
        runtime: &Runtime,
        host: HostElement,
        _meta: &ComponentRuntimeMeta,
        tree: Option<VNode>,
    ) -> Result<(), RuntimeError> {
        runtime.mount_rendered_tree(host, tree)
    }
}
