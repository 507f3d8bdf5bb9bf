//! Lifecycle sequencing through full update passes: hook order, event
//! emission, error isolation, shadow/style one-time steps, ready
//! resolution and the parent/child load cascade.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;

use flint_runtime::{
    Component, ComponentRuntimeMeta, HookResult, Runtime, RuntimeError, RuntimeOptions, VNode, h,
};

type Log = Rc<RefCell<Vec<&'static str>>>;

/// Records every hook invocation in order.
struct LogCmp {
    log: Log,
}

impl Component for LogCmp {
    fn component_will_load(&mut self) -> HookResult {
        self.log.borrow_mut().push("willLoad");
        HookResult::ok()
    }
    fn component_will_update(&mut self) -> HookResult {
        self.log.borrow_mut().push("willUpdate");
        HookResult::ok()
    }
    fn component_will_render(&mut self) -> HookResult {
        self.log.borrow_mut().push("willRender");
        HookResult::ok()
    }
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        self.log.borrow_mut().push("render");
        Ok(Some(VNode::text("x")))
    }
    fn component_did_load(&mut self) -> HookResult {
        self.log.borrow_mut().push("didLoad");
        HookResult::ok()
    }
    fn component_did_update(&mut self) -> HookResult {
        self.log.borrow_mut().push("didUpdate");
        HookResult::ok()
    }
    fn component_did_render(&mut self) -> HookResult {
        self.log.borrow_mut().push("didRender");
        HookResult::ok()
    }
}

fn define_log_cmp(rt: &Runtime, tag: &str, log: &Log) {
    let log = Rc::clone(log);
    rt.define(ComponentRuntimeMeta::new(tag), move || LogCmp {
        log: Rc::clone(&log),
    })
    .unwrap();
}

#[test]
fn test_hook_order_initial_load_and_update() {
    let rt = Runtime::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    define_log_cmp(&rt, "cmp-a", &log);

    let host = rt.create_element("cmp-a").unwrap();
    rt.append_child(rt.root(), host.node_id());
    rt.flush();
    assert_eq!(
        *log.borrow(),
        vec!["willLoad", "willRender", "render", "didLoad", "didRender"]
    );

    log.borrow_mut().clear();
    rt.request_update(host);
    rt.flush();
    assert_eq!(
        *log.borrow(),
        vec!["willUpdate", "willRender", "render", "didUpdate", "didRender"]
    );
}

#[test]
fn test_lifecycle_events_bubble_to_root() {
    let rt = Runtime::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    define_log_cmp(&rt, "cmp-a", &log);

    let events: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    for phase in [
        "flint_componentWillLoad",
        "flint_componentWillUpdate",
        "flint_componentWillRender",
        "flint_componentDidLoad",
        "flint_componentDidUpdate",
        "flint_componentDidRender",
    ] {
        let events = Rc::clone(&events);
        rt.add_event_listener(rt.root(), phase, move |event| {
            events.borrow_mut().push(event.name.clone());
        });
    }

    let host = rt.create_element("cmp-a").unwrap();
    rt.append_child(rt.root(), host.node_id());
    rt.flush();
    assert_eq!(
        *events.borrow(),
        vec![
            "flint_componentWillLoad",
            "flint_componentWillRender",
            "flint_componentDidLoad",
            "flint_componentDidRender",
        ]
    );

    events.borrow_mut().clear();
    rt.request_update(host);
    rt.flush();
    assert_eq!(
        *events.borrow(),
        vec![
            "flint_componentWillUpdate",
            "flint_componentWillRender",
            "flint_componentDidUpdate",
            "flint_componentDidRender",
        ]
    );
}

#[test]
fn test_lifecycle_events_can_be_disabled() {
    let rt = Runtime::with_options(RuntimeOptions {
        lifecycle_events: false,
        ..RuntimeOptions::default()
    });
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    define_log_cmp(&rt, "cmp-a", &log);

    let seen = Rc::new(Cell::new(0));
    {
        let seen = Rc::clone(&seen);
        rt.add_event_listener(rt.root(), "flint_componentDidLoad", move |_| {
            seen.set(seen.get() + 1);
        });
    }

    let host = rt.create_element("cmp-a").unwrap();
    rt.append_child(rt.root(), host.node_id());
    rt.flush();

    // Hooks still ran; the observable events did not fire.
    assert!(log.borrow().contains(&"didLoad"));
    assert_eq!(seen.get(), 0);
}

// =============================================================================
// Error Isolation
// =============================================================================

/// Fails in componentWillLoad; everything after must still happen.
struct FailsWillLoad {
    log: Log,
}

impl Component for FailsWillLoad {
    fn component_will_load(&mut self) -> HookResult {
        self.log.borrow_mut().push("willLoad");
        HookResult::err(RuntimeError::component("boom"))
    }
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        self.log.borrow_mut().push("render");
        Ok(Some(VNode::text("still here")))
    }
    fn component_did_load(&mut self) -> HookResult {
        self.log.borrow_mut().push("didLoad");
        HookResult::ok()
    }
}

#[test]
fn test_will_load_error_does_not_abort_the_pass() {
    let rt = Runtime::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    {
        let log = Rc::clone(&log);
        rt.define(ComponentRuntimeMeta::new("cmp-a"), move || FailsWillLoad {
            log: Rc::clone(&log),
        })
        .unwrap();
    }

    let host = rt.create_element("cmp-a").unwrap();
    let ready = Rc::new(Cell::new(false));
    {
        let ready = Rc::clone(&ready);
        rt.component_on_ready(host, move |_| ready.set(true));
    }
    rt.append_child(rt.root(), host.node_id());
    rt.flush();

    // The failed phase was skipped for this pass, nothing else was.
    assert_eq!(*log.borrow(), vec!["willLoad", "render", "didLoad"]);
    assert_eq!(rt.document().text_content(host.node_id()), "still here");
    assert!(rt.document().has_class(host.node_id(), "hydrated"));
    assert!(ready.get());
}

/// Render hook fails every pass.
struct FailsRender;

impl Component for FailsRender {
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        Err(RuntimeError::component("render exploded"))
    }
}

#[test]
fn test_render_error_leaves_flags_consistent() {
    let rt = Runtime::new();
    rt.define(ComponentRuntimeMeta::new("cmp-a"), || FailsRender).unwrap();

    let host = rt.create_element("cmp-a").unwrap();
    rt.append_child(rt.root(), host.node_id());
    rt.flush();

    let host_ref = rt.host_ref(host).unwrap();
    // Active-render reset is guaranteed even when render throws, and the
    // pass still reached the structural phases.
    assert!(!host_ref.borrow().is_active_render);
    assert!(host_ref.borrow().has_rendered);
    assert!(rt.document().has_class(host.node_id(), "hydrated"));

    // hasRendered stays true across later failing passes.
    rt.request_update(host);
    rt.flush();
    assert!(host_ref.borrow().has_rendered);
    assert!(!host_ref.borrow().is_active_render);
}

// =============================================================================
// Asynchronous Hooks
// =============================================================================

/// Suspends in componentWillLoad until released through a oneshot.
struct SlowWillLoad {
    gate: Option<oneshot::Receiver<()>>,
    renders: Rc<Cell<usize>>,
}

impl Component for SlowWillLoad {
    fn component_will_load(&mut self) -> HookResult {
        match self.gate.take() {
            Some(gate) => HookResult::pending(async move {
                let _ = gate.await;
                Ok(())
            }),
            None => HookResult::ok(),
        }
    }
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        self.renders.set(self.renders.get() + 1);
        Ok(Some(VNode::text("done")))
    }
}

#[test]
fn test_render_waits_for_async_will_load() {
    let rt = Runtime::new();
    let renders = Rc::new(Cell::new(0));
    let (tx, rx) = oneshot::channel();
    let gate = Rc::new(RefCell::new(Some(rx)));
    {
        let renders = Rc::clone(&renders);
        let gate = Rc::clone(&gate);
        rt.define(ComponentRuntimeMeta::new("cmp-a"), move || SlowWillLoad {
            gate: gate.borrow_mut().take(),
            renders: Rc::clone(&renders),
        })
        .unwrap();
    }

    let host = rt.create_element("cmp-a").unwrap();
    rt.append_child(rt.root(), host.node_id());

    // The pass suspends inside the will-hook: no render yet, and the
    // flush tick returns instead of blocking.
    rt.flush();
    assert_eq!(renders.get(), 0);
    assert!(!rt.host_ref(host).unwrap().borrow().has_rendered);

    // Release the hook; the parked pass resumes on the next tick.
    tx.send(()).unwrap();
    rt.flush();
    assert_eq!(renders.get(), 1);
    assert!(rt.host_ref(host).unwrap().borrow().has_rendered);
    assert!(rt.document().has_class(host.node_id(), "hydrated"));
}

// =============================================================================
// Shadow DOM and Styles
// =============================================================================

struct ShadowCmp;

impl Component for ShadowCmp {
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        Ok(Some(h("span").child(VNode::text("inside"))))
    }
}

fn shadow_meta() -> ComponentRuntimeMeta {
    ComponentRuntimeMeta::new("cmp-shadow")
        .shadow()
        .style(":host { display: block }")
}

#[test]
fn test_shadow_root_attached_once_on_first_load() {
    let rt = Runtime::new();
    rt.define(shadow_meta(), || ShadowCmp).unwrap();

    let host = rt.create_element("cmp-shadow").unwrap();
    rt.append_child(rt.root(), host.node_id());
    rt.flush();

    let node = host.node_id();
    assert!(rt.document().has_shadow_root(node));
    assert_eq!(rt.document().shadow_html(node), "<span>inside</span>");
    // Shadow content stays out of the light serialization.
    assert_eq!(
        rt.document().outer_html(node),
        "<cmp-shadow class=\"hydrated\"></cmp-shadow>"
    );

    // Styles attached on first load, once.
    assert!(rt.styles_attached(host));
    assert_eq!(
        rt.registered_css("cmp-shadow").as_deref(),
        Some(":host { display: block }")
    );

    // A later update re-renders into the same shadow root.
    rt.request_update(host);
    rt.flush();
    assert_eq!(rt.document().shadow_html(node), "<span>inside</span>");
}

#[test]
fn test_shadow_skipped_when_platform_lacks_support() {
    let rt = Runtime::with_options(RuntimeOptions {
        supports_shadow_dom: false,
        ..RuntimeOptions::default()
    });
    rt.define(shadow_meta(), || ShadowCmp).unwrap();

    let host = rt.create_element("cmp-shadow").unwrap();
    rt.append_child(rt.root(), host.node_id());
    rt.flush();

    assert!(!rt.document().has_shadow_root(host.node_id()));
    // Output lands in the light tree instead.
    assert_eq!(rt.document().text_content(host.node_id()), "inside");
}

// =============================================================================
// Ready Signal
// =============================================================================

#[test]
fn test_on_ready_after_load_fires_immediately() {
    let rt = Runtime::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    define_log_cmp(&rt, "cmp-a", &log);

    let host = rt.create_element("cmp-a").unwrap();
    rt.append_child(rt.root(), host.node_id());
    rt.flush();

    let fired = Rc::new(Cell::new(false));
    {
        let fired = Rc::clone(&fired);
        rt.component_on_ready(host, move |ready_host| {
            assert_eq!(ready_host, host);
            fired.set(true);
        });
    }
    assert!(fired.get());
}

// =============================================================================
// Parent / Child Load Cascade
// =============================================================================

/// Parent that renders a defined child component tag.
struct RendersChild {
    child_tag: &'static str,
}

impl Component for RendersChild {
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        Ok(Some(h(self.child_tag)))
    }
}

struct Leaf;

impl Component for Leaf {
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        Ok(Some(VNode::text("leaf")))
    }
}

#[test]
fn test_rendered_child_component_loads_and_parent_hydrates() {
    let rt = Runtime::new();
    rt.define(ComponentRuntimeMeta::new("cmp-parent"), || RendersChild {
        child_tag: "cmp-leaf",
    })
    .unwrap();
    rt.define(ComponentRuntimeMeta::new("cmp-leaf"), || Leaf).unwrap();

    // didLoad events record which host finished, in order.
    let loads: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let loads = Rc::clone(&loads);
        let rt_listener = rt.clone();
        rt.add_event_listener(rt.root(), "flint_componentDidLoad", move |event| {
            let tag = rt_listener.document().tag(event.target).unwrap().to_string();
            loads.borrow_mut().push(tag);
        });
    }

    let parent = rt.create_element("cmp-parent").unwrap();
    rt.append_child(rt.root(), parent.node_id());
    rt.flush();

    // The child host was instantiated by the render pass and finished
    // its own load within the same tick.
    let child_node = rt.document().children(parent.node_id())[0];
    let child = rt.host_for(child_node).expect("rendered child is a host");
    assert_eq!(rt.document().text_content(child_node), "leaf");

    // Parent pass ran first; both ended hydrated.
    assert_eq!(*loads.borrow(), vec!["cmp-parent", "cmp-leaf"]);
    assert!(rt.document().has_class(parent.node_id(), "hydrated"));
    assert!(rt.document().has_class(child.node_id(), "hydrated"));

    // The parent's loading set is consumed and cleared.
    let parent_ref = rt.host_ref(parent).unwrap();
    assert!(parent_ref.borrow().ancestor_host_element.is_none());
}

/// Renders nothing: manually attached children stay put.
struct NoRender;

impl Component for NoRender {}

#[test]
fn test_manually_nested_child_defers_until_parent_renders() {
    let rt = Runtime::new();
    rt.define(ComponentRuntimeMeta::new("cmp-parent"), || NoRender).unwrap();
    rt.define(ComponentRuntimeMeta::new("cmp-leaf"), || Leaf).unwrap();

    let loads: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let loads = Rc::clone(&loads);
        let rt_listener = rt.clone();
        rt.add_event_listener(rt.root(), "flint_componentDidLoad", move |event| {
            let tag = rt_listener.document().tag(event.target).unwrap().to_string();
            loads.borrow_mut().push(tag);
        });
    }

    let parent = rt.create_element("cmp-parent").unwrap();
    let child = rt.create_element("cmp-leaf").unwrap();
    // Child nested under the parent before anything is connected.
    rt.append_child(parent.node_id(), child.node_id());
    rt.append_child(rt.root(), parent.node_id());
    rt.flush();

    // The child's first load waited for the parent's first render, then
    // both finished in the same tick.
    assert_eq!(*loads.borrow(), vec!["cmp-parent", "cmp-leaf"]);
    assert_eq!(rt.document().text_content(child.node_id()), "leaf");
    assert!(rt.document().has_class(parent.node_id(), "hydrated"));
    assert!(rt.document().has_class(child.node_id(), "hydrated"));
}

/// Parent whose two children finish at different times: the parent's
/// hydration must wait for the last one.
struct RendersTwoChildren;

impl Component for RendersTwoChildren {
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        Ok(Some(h("div").child(h("cmp-fast")).child(h("cmp-slow"))))
    }
}

#[test]
fn test_parent_hydrates_only_after_last_child_loads() {
    let rt = Runtime::new();
    rt.define(ComponentRuntimeMeta::new("cmp-parent"), || RendersTwoChildren)
        .unwrap();
    rt.define(ComponentRuntimeMeta::new("cmp-fast"), || Leaf).unwrap();

    let renders = Rc::new(Cell::new(0));
    let (tx, rx) = oneshot::channel();
    let gate = Rc::new(RefCell::new(Some(rx)));
    {
        let renders = Rc::clone(&renders);
        let gate = Rc::clone(&gate);
        rt.define(ComponentRuntimeMeta::new("cmp-slow"), move || SlowWillLoad {
            gate: gate.borrow_mut().take(),
            renders: Rc::clone(&renders),
        })
        .unwrap();
    }

    let parent = rt.create_element("cmp-parent").unwrap();
    rt.append_child(rt.root(), parent.node_id());
    rt.flush();

    // Fast child is done; slow child is parked in its will-hook, so the
    // parent still counts one actively-loading child.
    let parent_ref = rt.host_ref(parent).unwrap();
    assert!(!rt.document().has_class(parent.node_id(), "hydrated"));
    assert_eq!(
        parent_ref
            .borrow()
            .actively_loading_children
            .as_ref()
            .map(|children| children.len()),
        Some(1)
    );

    // Last child finishing flips the parent over, exactly once.
    tx.send(()).unwrap();
    rt.flush();
    assert!(rt.document().has_class(parent.node_id(), "hydrated"));
    assert!(parent_ref.borrow().actively_loading_children.is_none());
    assert_eq!(renders.get(), 1);
}
