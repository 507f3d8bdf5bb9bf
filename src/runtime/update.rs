//! Update orchestrator - drives one full lifecycle pass for a host.
//!
//! A pass walks a fixed phase sequence: will-hooks (awaited), one-time
//! shadow-root attachment, the render window, one-time style attachment,
//! render-complete callbacks, did-hooks, then the finalize cascade
//! (ancestor bookkeeping, hydration, ready resolution).
//!
//! Every phase is best-effort: hook and render errors are logged through
//! the diagnostic sink and the sequence keeps going, so structural
//! guarantees (active-render reset, ancestor bookkeeping, hydration,
//! ready resolution) hold even under total render failure. The
//! active-render flag is reset by a drop guard - the one place that
//! needs guaranteed cleanup on every exit path.

use std::cell::RefCell;
use std::rc::Rc;

use crate::component::{Component, HookResult};
use crate::dom::events::dispatch_event;
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::runtime::registry::HostRef;
use crate::types::{ComponentFlags, HostElement};

// Lifecycle phase names; emitted events carry the runtime's prefix,
// e.g. `flint_componentWillLoad`.
pub(crate) const WILL_LOAD: &str = "componentWillLoad";
pub(crate) const WILL_UPDATE: &str = "componentWillUpdate";
pub(crate) const WILL_RENDER: &str = "componentWillRender";
pub(crate) const DID_LOAD: &str = "componentDidLoad";
pub(crate) const DID_UPDATE: &str = "componentDidUpdate";
pub(crate) const DID_RENDER: &str = "componentDidRender";

// =============================================================================
// Lifecycle Events
// =============================================================================

/// Fire the observable lifecycle event for a phase. Bubbling, purely
/// observational; disabled wholesale via `RuntimeOptions::lifecycle_events`.
pub(crate) fn emit_lifecycle_event(runtime: &Runtime, host: HostElement, phase: &str) {
    if !runtime.options().lifecycle_events {
        return;
    }
    let name = format!("{}_{phase}", runtime.options().event_prefix);
    dispatch_event(runtime.document_cell(), host.node_id(), &name);
}

// =============================================================================
// Error Isolation
// =============================================================================

/// Route a phase failure to the diagnostic sink. Component-signalled
/// errors get wrapped with the hook name and host tag first.
fn log_phase_error(hook: &'static str, tag: &str, error: RuntimeError) {
    let error = match error {
        RuntimeError::Component(message) => RuntimeError::Hook {
            hook,
            tag: tag.to_string(),
            message,
        },
        other => other,
    };
    log::error!("{error}");
}

/// Invoke an awaited (will-) hook and isolate its error.
async fn settle_will_hook(
    instance: &Rc<RefCell<dyn Component>>,
    hook: &'static str,
    tag: &str,
    invoke: impl FnOnce(&mut dyn Component) -> HookResult,
) {
    // The instance borrow is released before awaiting: an async hook's
    // future owns its own captures.
    let outcome = invoke(&mut *instance.borrow_mut());
    if let Err(error) = outcome.settle().await {
        log_phase_error(hook, tag, error);
    }
}

/// Invoke a did-hook: called, not awaited. A pending future keeps
/// running in the background; its error is still routed to the sink.
fn dispatch_did_hook(
    runtime: &Runtime,
    instance: &Rc<RefCell<dyn Component>>,
    hook: &'static str,
    tag: &str,
    invoke: impl FnOnce(&mut dyn Component) -> HookResult,
) {
    match invoke(&mut *instance.borrow_mut()) {
        HookResult::Done(Ok(())) => {}
        HookResult::Done(Err(error)) => log_phase_error(hook, tag, error),
        HookResult::Pending(future) => {
            let tag = tag.to_string();
            runtime.spawn_background(async move {
                if let Err(error) = future.await {
                    log_phase_error(hook, &tag, error);
                }
            });
        }
    }
}

// =============================================================================
// Active-Render Guard
// =============================================================================

/// Brackets the render-bridge call: the flag goes up on construction and
/// is cleared on drop, on every exit path out of the render phase.
struct ActiveRenderGuard {
    host_ref: Rc<RefCell<HostRef>>,
}

impl ActiveRenderGuard {
    fn new(host_ref: &Rc<RefCell<HostRef>>) -> Self {
        host_ref.borrow_mut().is_active_render = true;
        ActiveRenderGuard {
            host_ref: Rc::clone(host_ref),
        }
    }
}

impl Drop for ActiveRenderGuard {
    fn drop(&mut self) {
        self.host_ref.borrow_mut().is_active_render = false;
    }
}

// =============================================================================
// The Update Pass
// =============================================================================

/// Run one full lifecycle pass for `host`.
///
/// Dispatched by the scheduler with `update_in_flight` already set; the
/// pass clears the queued flag first thing, so a mutation landing while
/// the pass runs schedules a fresh pass instead of being lost.
pub(crate) async fn run_update(runtime: Runtime, host: HostElement, is_initial_load: bool) {
    let Some(host_ref) = runtime.host_ref(host) else {
        return;
    };
    let (instance, meta) = {
        let state = host_ref.borrow();
        (state.instance.clone(), Rc::clone(&state.meta))
    };
    let tag = meta.tag.clone();

    host_ref.borrow_mut().is_queued_for_update = false;

    // Will-hooks, awaited. Errors are isolated per phase.
    if is_initial_load {
        emit_lifecycle_event(&runtime, host, WILL_LOAD);
        if let Some(instance) = &instance {
            settle_will_hook(instance, WILL_LOAD, &tag, |cmp| cmp.component_will_load()).await;
        }
    } else {
        emit_lifecycle_event(&runtime, host, WILL_UPDATE);
        if let Some(instance) = &instance {
            settle_will_hook(instance, WILL_UPDATE, &tag, |cmp| cmp.component_will_update()).await;
        }
    }
    emit_lifecycle_event(&runtime, host, WILL_RENDER);
    if let Some(instance) = &instance {
        settle_will_hook(instance, WILL_RENDER, &tag, |cmp| cmp.component_will_render()).await;
    }

    // The host may have been disconnected while a will-hook was pending.
    // Its node is gone from the document; settle the pass so the deferred
    // destroy can collect the ref.
    if host_ref.borrow().marked_for_removal {
        let mut state = host_ref.borrow_mut();
        state.update_in_flight = false;
        state.queued_while_in_flight = false;
        drop(state);
        runtime.collect_if_marked(host);
        return;
    }

    // One-time shadow root, when declared and the platform supports it.
    if is_initial_load
        && runtime.options().supports_shadow_dom
        && meta.flags.contains(ComponentFlags::SHADOW_DOM_ENCAPSULATION)
    {
        runtime.document_cell().borrow_mut().attach_shadow(host.node_id());
    }

    // Render window. Property writes in here do not re-enqueue; the
    // guard clears the flag on every path out.
    {
        let _active = ActiveRenderGuard::new(&host_ref);
        let produced = match &instance {
            Some(instance) => instance.borrow_mut().render(),
            None => Ok(None),
        };
        let bridge = runtime.bridge();
        if let Err(error) = produced.and_then(|tree| bridge.render_vdom(&runtime, host, &meta, tree)) {
            log_phase_error("render", &tag, error);
        }
    }

    if is_initial_load {
        runtime.attach_styles(host, &meta);
    }

    // It's official: this host has rendered.
    host_ref.borrow_mut().has_rendered = true;

    // Children were waiting on this parent's first render; release them.
    let callbacks = host_ref.borrow_mut().render_callbacks.take();
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }

    // Did-hooks: invoked, not awaited. Load events fire hook-then-event,
    // mirroring the will side's event-then-hook.
    if is_initial_load {
        if let Some(instance) = &instance {
            dispatch_did_hook(&runtime, instance, DID_LOAD, &tag, |cmp| cmp.component_did_load());
        }
        emit_lifecycle_event(&runtime, host, DID_LOAD);
    } else {
        if let Some(instance) = &instance {
            dispatch_did_hook(&runtime, instance, DID_UPDATE, &tag, |cmp| cmp.component_did_update());
        }
        emit_lifecycle_event(&runtime, host, DID_UPDATE);
    }
    if let Some(instance) = &instance {
        dispatch_did_hook(&runtime, instance, DID_RENDER, &tag, |cmp| cmp.component_did_render());
    }
    emit_lifecycle_event(&runtime, host, DID_RENDER);

    // Ancestor bookkeeping, hydration, ready resolution.
    finalize(&runtime, host, is_initial_load);

    // Settle scheduling state: serialize any request that arrived while
    // this pass was in flight, then let a deferred destroy collect us.
    let requeue = {
        let mut state = host_ref.borrow_mut();
        state.update_in_flight = false;
        std::mem::take(&mut state.queued_while_in_flight)
    };
    if requeue {
        runtime.enqueue_for_dispatch(host);
    }
    runtime.collect_if_marked(host);
}

// =============================================================================
// Finalize Cascade
// =============================================================================

/// Phases 10-12 of a pass, plus the "loaded" bubbling: removing a host
/// from its ancestor's actively-loading set may finalize the ancestor,
/// which may finalize *its* ancestor, and so on. Drained iteratively
/// over a work-list so deep trees cannot exhaust the stack.
pub(crate) fn finalize(runtime: &Runtime, host: HostElement, is_initial_load: bool) {
    let mut work = vec![(host, is_initial_load)];

    while let Some((element, initial)) = work.pop() {
        let Some(host_ref) = runtime.host_ref(element) else {
            continue;
        };

        // Consume the ancestor link: drop out of the ancestor's
        // actively-loading set, and finalize the ancestor when this was
        // its last loading child. Load events fire bottom-up this way,
        // with no separate tree walk.
        let ancestor = host_ref.borrow_mut().ancestor_host_element.take();
        if let Some(ancestor) = ancestor {
            if let Some(ancestor_ref) = runtime.host_ref(ancestor) {
                let became_empty = {
                    let mut state = ancestor_ref.borrow_mut();
                    match state.actively_loading_children.as_mut() {
                        Some(children) => {
                            children.remove(&element);
                            children.is_empty()
                        }
                        None => false,
                    }
                };
                if became_empty {
                    let ancestor_initial = !ancestor_ref.borrow().has_loaded;
                    work.push((ancestor, ancestor_initial));
                }
            }
        }

        // No loading children left (or none ever registered): this host
        // is visually settled.
        let no_loading_children = host_ref
            .borrow()
            .actively_loading_children
            .as_ref()
            .is_none_or(|children| children.is_empty());
        if no_loading_children {
            host_ref.borrow_mut().actively_loading_children = None;
            let mut doc = runtime.document_cell().borrow_mut();
            if doc.contains(element.node_id()) {
                doc.add_class(element.node_id(), &runtime.options().hydrated_class);
            }
        }

        // First load only: resolve the external ready callback, at most
        // once (take() enforces it).
        if initial {
            host_ref.borrow_mut().has_loaded = true;
            let ready = host_ref.borrow_mut().on_ready.take();
            if let Some(ready) = ready {
                ready(element);
            }
        }
    }
}
