//! Runtime context - registry, scheduler, styles and the host document,
//! scoped to one explicit object.
//!
//! # Architecture
//!
//! ```text
//! mutation (prop set / attribute change / connect)
//!     -> request_update        (coalesced per host)
//!     -> flush tick            (microtask-equivalent drain)
//!     -> update orchestrator   (lifecycle phases, render bridge, styles)
//!     -> finalize cascade      (ancestor bookkeeping, hydration, ready)
//! ```
//!
//! Nothing here is process-global: every piece of mutable state hangs off
//! a [`Runtime`], so tests can run any number of independent runtimes in
//! one process. A `Runtime` is a cheap `Rc` handle; clone it freely into
//! callbacks.

mod registry;
mod scheduler;
mod styles;
mod update;

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;

use crate::component::{Component, ComponentRuntimeMeta};
use crate::dom::Document;
use crate::dom::events::DomEvent;
use crate::error::RuntimeError;
use crate::props::{parse_property_value, serialize_property_value};
use crate::types::{HostElement, NodeId, PropFlags, PropValue};
use crate::vdom::{RenderBridge, ReplaceRenderer, VNode};

pub use registry::HostRef;
use registry::HostRegistry;
use scheduler::Scheduler;
use styles::StyleRegistry;
use update::run_update;

// =============================================================================
// Options
// =============================================================================

/// Runtime configuration. Fixed at construction.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Platform capability gate for shadow-root attachment.
    pub supports_shadow_dom: bool,
    /// Emit observable lifecycle events (`<prefix>_componentWillLoad`, ...).
    pub lifecycle_events: bool,
    /// Prefix for lifecycle event names.
    pub event_prefix: String,
    /// Class applied to a host when it reaches the hydrated state.
    pub hydrated_class: String,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        RuntimeOptions {
            supports_shadow_dom: true,
            lifecycle_events: true,
            event_prefix: "flint".to_string(),
            hydrated_class: "hydrated".to_string(),
        }
    }
}

// =============================================================================
// Runtime
// =============================================================================

struct ComponentDefinition {
    meta: Rc<ComponentRuntimeMeta>,
    factory: Box<dyn Fn() -> Rc<RefCell<dyn Component>>>,
}

struct RuntimeInner {
    document: RefCell<Document>,
    registry: RefCell<HostRegistry>,
    scheduler: Scheduler,
    styles: RefCell<StyleRegistry>,
    definitions: RefCell<HashMap<String, ComponentDefinition>>,
    bridge: RefCell<Rc<dyn RenderBridge>>,
    options: RuntimeOptions,
}

/// Handle to one runtime context. Cloning shares the context.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Runtime {
            inner: Rc::new(RuntimeInner {
                document: RefCell::new(Document::new()),
                registry: RefCell::new(HostRegistry::new()),
                scheduler: Scheduler::new(),
                styles: RefCell::new(StyleRegistry::new()),
                definitions: RefCell::new(HashMap::new()),
                bridge: RefCell::new(Rc::new(ReplaceRenderer)),
                options,
            }),
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.inner.options
    }

    /// Swap the reconciliation engine. The default is [`ReplaceRenderer`].
    pub fn set_render_bridge(&self, bridge: Rc<dyn RenderBridge>) {
        *self.inner.bridge.borrow_mut() = bridge;
    }

    // =========================================================================
    // Component Definitions
    // =========================================================================

    /// Register a component type: its metadata plus an instance factory.
    pub fn define<C>(
        &self,
        meta: ComponentRuntimeMeta,
        factory: impl Fn() -> C + 'static,
    ) -> Result<(), RuntimeError>
    where
        C: Component + 'static,
    {
        let mut definitions = self.inner.definitions.borrow_mut();
        if definitions.contains_key(&meta.tag) {
            return Err(RuntimeError::DuplicateTag(meta.tag.clone()));
        }
        definitions.insert(
            meta.tag.clone(),
            ComponentDefinition {
                meta: Rc::new(meta),
                factory: Box::new(move || Rc::new(RefCell::new(factory()))),
            },
        );
        Ok(())
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.inner.definitions.borrow().contains_key(tag)
    }

    // =========================================================================
    // Element Creation / Tree Building
    // =========================================================================

    /// Create a host element for a defined component tag.
    ///
    /// The host's ref and instance are wired immediately; declared
    /// property defaults are applied (and reflected). The first load is
    /// scheduled when the host connects to the document.
    pub fn create_element(&self, tag: &str) -> Result<HostElement, RuntimeError> {
        let (meta, instance) = {
            let definitions = self.inner.definitions.borrow();
            let definition = definitions
                .get(tag)
                .ok_or_else(|| RuntimeError::UnknownTag(tag.to_string()))?;
            (Rc::clone(&definition.meta), (definition.factory)())
        };

        let node = self.inner.document.borrow_mut().create_element(tag);
        let host = HostElement(node);
        self.inner
            .registry
            .borrow_mut()
            .create(host, Rc::clone(&meta), Some(instance));

        // Property defaults apply (and reflect) before anything renders.
        for def in &meta.props {
            if let Some(default) = &def.default {
                self.apply_prop(host, &def.name, default.clone(), true, false);
            }
        }
        log::trace!("created host <{tag}> {host:?}");
        Ok(host)
    }

    /// Create a plain (non-component) element.
    pub fn create_node(&self, tag: &str) -> NodeId {
        self.inner.document.borrow_mut().create_element(tag)
    }

    pub fn create_text_node(&self, text: &str) -> NodeId {
        self.inner.document.borrow_mut().create_text(text)
    }

    /// The document root node.
    pub fn root(&self) -> NodeId {
        self.inner.document.borrow().root()
    }

    /// Append `child` under `parent`. Host elements inside the attached
    /// subtree whose position is now document-connected run their connect
    /// path (ancestor discovery plus first-load scheduling).
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.inner.document.borrow_mut().append_child(parent, child);
        if self.inner.document.borrow().is_connected(child) {
            self.connect_subtree(child);
        }
    }

    /// Disconnect and free a node and its subtree. Hosts inside release
    /// their refs (deferred when an update pass is in flight).
    pub fn remove_node(&self, node: NodeId) {
        let subtree = self.inner.document.borrow().collect_subtree(node);
        for id in &subtree {
            if let Some(host) = self.host_for(*id) {
                self.disconnected_callback(host);
            }
        }
        self.inner.document.borrow_mut().remove_subtree(node);
    }

    /// The host handle for a node, when the node is a registered host.
    pub fn host_for(&self, node: NodeId) -> Option<HostElement> {
        let host = HostElement(node);
        self.inner.registry.borrow().contains(host).then_some(host)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Set an attribute. On a host element, an attribute bound to a
    /// declared property routes through the coercion path and schedules
    /// an update (the attribute-changed callback).
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.inner.document.borrow_mut().set_attribute(node, name, value);
        if let Some(host) = self.host_for(node) {
            self.attribute_changed(host, name, Some(value));
        }
    }

    /// Remove an attribute; a bound property observes `Undefined`.
    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        self.inner.document.borrow_mut().remove_attribute(node, name);
        if let Some(host) = self.host_for(node) {
            self.attribute_changed(host, name, None);
        }
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .document
            .borrow()
            .get_attribute(node, name)
            .map(str::to_string)
    }

    // =========================================================================
    // Properties (the write interceptor)
    // =========================================================================

    /// Write a declared property: coerce, compare, store, reflect when
    /// declared, then request an update - unless the write happened
    /// inside the host's render window, which must not self-trigger.
    pub fn set_property(&self, host: HostElement, name: &str, value: impl Into<PropValue>) {
        self.apply_prop(host, name, value.into(), true, true);
    }

    /// Current value of a declared property (`Undefined` if never set).
    pub fn get_property(&self, host: HostElement, name: &str) -> PropValue {
        self.host_ref(host)
            .map(|r| r.borrow().prop_value(name))
            .unwrap_or(PropValue::Undefined)
    }

    fn attribute_changed(&self, host: HostElement, attribute: &str, raw: Option<&str>) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        let meta = Rc::clone(&host_ref.borrow().meta);
        let Some(def) = meta.prop_by_attribute(attribute) else {
            return;
        };
        let value = parse_property_value(raw, def.prop_type);
        // The attribute is already the source here: store without
        // reflecting the value straight back.
        self.apply_prop(host, &def.name, value, false, true);
    }

    fn apply_prop(&self, host: HostElement, name: &str, value: PropValue, reflect: bool, request: bool) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        let meta = Rc::clone(&host_ref.borrow().meta);
        let Some(def) = meta.prop_by_name(name) else {
            log::warn!("ignoring write to undeclared prop `{name}` on <{}>", meta.tag);
            return;
        };

        let (changed, instance, connected) = {
            let mut state = host_ref.borrow_mut();
            let changed = state.prop_values.get(name) != Some(&value);
            if changed {
                state.prop_values.insert(name.to_string(), value.clone());
            }
            (changed, state.instance.clone(), state.connected)
        };
        if !changed {
            return;
        }

        if let Some(instance) = instance {
            // Skipped when the instance itself is mid-hook and holds the
            // borrow: the writer already knows its own state.
            if let Ok(mut component) = instance.try_borrow_mut() {
                component.prop_changed(name, &value);
            }
        }

        if reflect && def.flags.contains(PropFlags::REFLECT) {
            let mut doc = self.inner.document.borrow_mut();
            match serialize_property_value(&value) {
                Some(serialized) => doc.set_attribute(host.node_id(), &def.attribute, &serialized),
                None => doc.remove_attribute(host.node_id(), &def.attribute),
            }
        }

        if request && connected {
            self.request_update(host);
        }
    }

    /// Parse every declared attribute present on the host into its
    /// property slot. Runs on connect, before the first load.
    fn initialize_props(&self, host: HostElement) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        let meta = Rc::clone(&host_ref.borrow().meta);
        for def in &meta.props {
            let raw = self.get_attribute(host.node_id(), &def.attribute);
            if let Some(raw) = raw {
                let value = parse_property_value(Some(&raw), def.prop_type);
                self.apply_prop(host, &def.name, value, false, false);
            }
        }
    }

    // =========================================================================
    // Ready Signal
    // =========================================================================

    /// Register a one-shot callback fulfilled with the host after its
    /// first load. Registered after the load, it fires immediately.
    pub fn component_on_ready(&self, host: HostElement, callback: impl FnOnce(HostElement) + 'static) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        let already_loaded = host_ref.borrow().has_loaded;
        if already_loaded {
            callback(host);
        } else {
            host_ref.borrow_mut().on_ready = Some(Box::new(callback));
        }
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Request an update pass for a host.
    ///
    /// Coalesces: requests landing while one is already queued collapse
    /// into it. Requests from inside the host's own render window are
    /// dropped - a render must not schedule itself.
    pub fn request_update(&self, host: HostElement) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        let mut state = host_ref.borrow_mut();
        if state.is_active_render {
            log::trace!("update request during render window for {host:?}: dropped");
            return;
        }
        if state.is_queued_for_update {
            log::trace!("update request for {host:?}: already queued");
            return;
        }
        state.is_queued_for_update = true;
        drop(state);
        self.inner.scheduler.enqueue(host);
        log::trace!("update queued for {host:?}");
    }

    /// The microtask-equivalent tick: drain the queue, run update passes
    /// (interleaving at hook await points), repeat until no new requests
    /// remain, then collect deferred destroys.
    ///
    /// A pass stalled on an external future stays parked in the pool and
    /// resumes on a later flush; it never blocks other hosts.
    pub fn flush(&self) {
        loop {
            let batch = self.inner.scheduler.take_queued();
            for host in batch {
                self.dispatch(host);
            }
            self.inner.scheduler.run_until_stalled();
            if self.inner.scheduler.queue_is_empty() {
                break;
            }
        }
        self.inner.registry.borrow_mut().collect_all();
    }

    fn dispatch(&self, host: HostElement) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        let mut state = host_ref.borrow_mut();
        if state.marked_for_removal {
            state.is_queued_for_update = false;
            return;
        }
        if state.update_in_flight {
            // Serialize: the running pass re-enqueues on completion.
            state.queued_while_in_flight = true;
            return;
        }
        state.update_in_flight = true;
        let is_initial_load = !state.has_rendered;
        drop(state);

        let runtime = self.clone();
        self.inner
            .scheduler
            .spawn(run_update(runtime, host, is_initial_load));
    }

    pub(crate) fn enqueue_for_dispatch(&self, host: HostElement) {
        self.inner.scheduler.enqueue(host);
    }

    pub(crate) fn spawn_background(&self, future: impl Future<Output = ()> + 'static) {
        self.inner.scheduler.spawn(future);
    }

    // =========================================================================
    // Connect / Disconnect
    // =========================================================================

    fn connect_subtree(&self, node: NodeId) {
        // collect_subtree yields parents before their descendants, so
        // ancestors register before children look them up.
        let subtree = self.inner.document.borrow().collect_subtree(node);
        for id in subtree {
            if let Some(host) = self.host_for(id) {
                let already_connected = self
                    .host_ref(host)
                    .is_some_and(|r| r.borrow().connected);
                if !already_connected {
                    self.connected_callback(host);
                }
            }
        }
    }

    fn connected_callback(&self, host: HostElement) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        host_ref.borrow_mut().connected = true;
        self.initialize_props(host);

        if let Some(ancestor) = self.find_ancestor_host(host) {
            host_ref.borrow_mut().ancestor_host_element = Some(ancestor);
            if let Some(ancestor_ref) = self.host_ref(ancestor) {
                let mut state = ancestor_ref.borrow_mut();
                state
                    .actively_loading_children
                    .get_or_insert_with(HashSet::new)
                    .insert(host);
                if !state.has_rendered {
                    // Parent renders first: park this child's first load
                    // on the parent's render-complete list.
                    let runtime = self.clone();
                    state
                        .render_callbacks
                        .get_or_insert_with(Vec::new)
                        .push(Box::new(move || runtime.request_update(host)));
                    log::trace!("first load of {host:?} deferred until {ancestor:?} renders");
                    return;
                }
            }
        }
        self.request_update(host);
    }

    fn disconnected_callback(&self, host: HostElement) {
        let Some(host_ref) = self.host_ref(host) else {
            return;
        };
        // Leave the ancestor's loading set; if this was the last loading
        // child, the ancestor finalizes now instead of waiting forever.
        let ancestor = host_ref.borrow_mut().ancestor_host_element.take();
        if let Some(ancestor) = ancestor {
            if let Some(ancestor_ref) = self.host_ref(ancestor) {
                let became_empty = {
                    let mut state = ancestor_ref.borrow_mut();
                    match state.actively_loading_children.as_mut() {
                        Some(children) => {
                            children.remove(&host);
                            children.is_empty()
                        }
                        None => false,
                    }
                };
                if became_empty {
                    let initial = !ancestor_ref.borrow().has_loaded;
                    update::finalize(self, ancestor, initial);
                }
            }
        }
        host_ref.borrow_mut().connected = false;
        self.inner.styles.borrow_mut().release(host.node_id());
        self.inner.registry.borrow_mut().destroy(host);
        log::trace!("disconnected {host:?}");
    }

    /// Closest ancestor element (crossing shadow boundaries) that is a
    /// registered host.
    fn find_ancestor_host(&self, host: HostElement) -> Option<HostElement> {
        let registry = self.inner.registry.borrow();
        let doc = self.inner.document.borrow();
        let mut current = doc.parent(host.node_id());
        while let Some(node) = current {
            let candidate = HostElement(node);
            if registry.contains(candidate) {
                return Some(candidate);
            }
            current = doc.parent(node);
        }
        None
    }

    // =========================================================================
    // Rendering Support
    // =========================================================================

    pub(crate) fn bridge(&self) -> Rc<dyn RenderBridge> {
        Rc::clone(&self.inner.bridge.borrow())
    }

    /// Replace the host's rendered output with `tree` (the default
    /// bridge's strategy). Defined tags inside the tree become child
    /// hosts and connect once attached.
    ///
    /// `None` (the component renders nothing) leaves the host's existing
    /// content untouched, so manually composed children survive a parent
    /// that has no render output of its own.
    pub(crate) fn mount_rendered_tree(
        &self,
        host: HostElement,
        tree: Option<VNode>,
    ) -> Result<(), RuntimeError> {
        let Some(tree) = tree else {
            return Ok(());
        };
        self.clear_render_target(host);

        let built = self.build_vnode(&tree)?;
        let host_node = host.node_id();
        let has_shadow = self.inner.document.borrow().has_shadow_root(host_node);
        {
            let mut doc = self.inner.document.borrow_mut();
            if has_shadow {
                doc.append_shadow_child(host_node, built);
            } else {
                doc.append_child(host_node, built);
            }
        }
        if self.inner.document.borrow().is_connected(built) {
            self.connect_subtree(built);
        }
        Ok(())
    }

    fn clear_render_target(&self, host: HostElement) {
        let targets = self
            .inner
            .document
            .borrow()
            .render_target_children(host.node_id());
        for target in targets {
            self.remove_node(target);
        }
    }

    fn build_vnode(&self, vnode: &VNode) -> Result<NodeId, RuntimeError> {
        if let Some(text) = &vnode.text {
            return Ok(self.inner.document.borrow_mut().create_text(text));
        }
        let tag = vnode.tag.as_deref().unwrap_or("div");
        let node = if self.is_defined(tag) {
            self.create_element(tag)?.node_id()
        } else {
            self.inner.document.borrow_mut().create_element(tag)
        };
        for (name, value) in &vnode.attrs {
            self.set_attribute(node, name, value);
        }
        for child in &vnode.children {
            let built = self.build_vnode(child)?;
            self.inner.document.borrow_mut().append_child(node, built);
        }
        Ok(node)
    }

    // =========================================================================
    // Styles
    // =========================================================================

    pub(crate) fn attach_styles(&self, host: HostElement, meta: &ComponentRuntimeMeta) {
        self.inner
            .styles
            .borrow_mut()
            .attach(host.node_id(), &meta.tag, meta.style.as_deref());
    }

    pub fn styles_attached(&self, host: HostElement) -> bool {
        self.inner.styles.borrow().is_attached(host.node_id())
    }

    pub fn registered_css(&self, tag: &str) -> Option<String> {
        self.inner
            .styles
            .borrow()
            .registered_css(tag)
            .map(str::to_string)
    }

    // =========================================================================
    // Registry / Document Access
    // =========================================================================

    /// The host's registry entry, for flag inspection.
    pub fn host_ref(&self, host: HostElement) -> Option<Rc<RefCell<HostRef>>> {
        self.inner.registry.borrow().get(host)
    }

    pub(crate) fn collect_if_marked(&self, host: HostElement) {
        self.inner.registry.borrow_mut().collect(host);
    }

    /// Live host refs (diagnostic).
    pub fn host_count(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    pub(crate) fn document_cell(&self) -> &RefCell<Document> {
        &self.inner.document
    }

    /// Listen for events (lifecycle or otherwise) at a node.
    pub fn add_event_listener(&self, node: NodeId, name: &str, callback: impl Fn(&DomEvent) + 'static) {
        self.inner
            .document
            .borrow_mut()
            .add_event_listener(node, name, callback);
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
