//! Host reference registry - the side-table from host element identity
//! to mutable scheduling/lifecycle state.
//!
//! Exactly one [`HostRef`] exists per live host element; lookups are
//! O(1). The table lives inside a [`Runtime`](crate::runtime::Runtime)
//! context object rather than process-wide state, so independent
//! runtimes coexist in one test process.
//!
//! Destroy policy: releasing a ref while its update pass is in flight
//! marks it for removal instead; the scheduler collects it after the
//! pass settles. A disconnecting host is also removed from its
//! ancestor's actively-loading set first, so a vanished child can never
//! wedge its parent's load.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::component::{Component, ComponentRuntimeMeta};
use crate::types::{HostElement, PropValue};

// =============================================================================
// Host Ref
// =============================================================================

/// One-shot callback fulfilled with the host after first load.
pub type ReadyCallback = Box<dyn FnOnce(HostElement)>;

/// Callback queued on a parent for children waiting on its first render.
pub type RenderCallback = Box<dyn FnOnce()>;

/// Mutable scheduling/lifecycle state of one host element.
pub struct HostRef {
    /// True between "update requested" and "update dispatched".
    pub is_queued_for_update: bool,
    /// True only during the synchronous render-bridge call. Property
    /// writes inside this window must not re-enqueue an update.
    pub is_active_render: bool,
    /// True after the first render pass; never reset.
    pub has_rendered: bool,
    /// True after the first load fully finished (ready resolved).
    pub(crate) has_loaded: bool,
    /// True while attached under the document root.
    pub(crate) connected: bool,
    /// Parent host waiting for this element's first load; cleared once
    /// consumed.
    pub ancestor_host_element: Option<HostElement>,
    /// Fulfills an external "component is ready" callback; at most once.
    pub(crate) on_ready: Option<ReadyCallback>,
    /// Children of this host still in their first load. Emptied as each
    /// child finishes; cleared entirely once the host hydrates.
    pub actively_loading_children: Option<HashSet<HostElement>>,
    /// Callbacks from children waiting for this host's first render.
    pub(crate) render_callbacks: Option<Vec<RenderCallback>>,

    pub(crate) instance: Option<Rc<RefCell<dyn Component>>>,
    pub(crate) meta: Rc<ComponentRuntimeMeta>,
    pub(crate) prop_values: HashMap<String, PropValue>,

    /// True from dispatch until the pass settles; serializes passes per
    /// host and defers destruction.
    pub(crate) update_in_flight: bool,
    /// An update was requested while a pass was in flight; re-enqueued
    /// when the pass settles.
    pub(crate) queued_while_in_flight: bool,
    /// Destroyed mid-pass; collected once the pass settles.
    pub(crate) marked_for_removal: bool,
}

impl HostRef {
    fn new(meta: Rc<ComponentRuntimeMeta>, instance: Option<Rc<RefCell<dyn Component>>>) -> Self {
        HostRef {
            is_queued_for_update: false,
            is_active_render: false,
            has_rendered: false,
            has_loaded: false,
            connected: false,
            ancestor_host_element: None,
            on_ready: None,
            actively_loading_children: None,
            render_callbacks: None,
            instance,
            meta,
            prop_values: HashMap::new(),
            update_in_flight: false,
            queued_while_in_flight: false,
            marked_for_removal: false,
        }
    }

    /// Current value of a declared property (`Undefined` if never set).
    pub fn prop_value(&self, name: &str) -> PropValue {
        self.prop_values.get(name).cloned().unwrap_or(PropValue::Undefined)
    }
}

// =============================================================================
// Registry
// =============================================================================

pub(crate) struct HostRegistry {
    refs: HashMap<HostElement, Rc<RefCell<HostRef>>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        HostRegistry { refs: HashMap::new() }
    }

    /// Create the ref for a host. Returns the existing one if the host
    /// was already registered.
    pub fn create(
        &mut self,
        host: HostElement,
        meta: Rc<ComponentRuntimeMeta>,
        instance: Option<Rc<RefCell<dyn Component>>>,
    ) -> Rc<RefCell<HostRef>> {
        Rc::clone(
            self.refs
                .entry(host)
                .or_insert_with(|| Rc::new(RefCell::new(HostRef::new(meta, instance)))),
        )
    }

    pub fn get(&self, host: HostElement) -> Option<Rc<RefCell<HostRef>>> {
        self.refs.get(&host).map(Rc::clone)
    }

    pub fn contains(&self, host: HostElement) -> bool {
        self.refs.contains_key(&host)
    }

    /// Release a host's ref, or mark it for deferred collection when its
    /// update pass is still in flight. Returns true when removed now.
    pub fn destroy(&mut self, host: HostElement) -> bool {
        let Some(host_ref) = self.refs.get(&host) else {
            return false;
        };
        if host_ref.borrow().update_in_flight {
            host_ref.borrow_mut().marked_for_removal = true;
            log::trace!("destroy deferred for {host:?}: update in flight");
            return false;
        }
        self.refs.remove(&host);
        true
    }

    /// Collect a marked entry once its pass has settled.
    pub fn collect(&mut self, host: HostElement) {
        let marked = self
            .refs
            .get(&host)
            .is_some_and(|r| r.borrow().marked_for_removal && !r.borrow().update_in_flight);
        if marked {
            self.refs.remove(&host);
        }
    }

    /// Collect every marked, settled entry.
    pub fn collect_all(&mut self) {
        self.refs
            .retain(|_, r| !(r.borrow().marked_for_removal && !r.borrow().update_in_flight));
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }
}
