//! Bubbling event dispatch over the host document.
//!
//! Lifecycle notifications (and anything else an embedder wants to fire)
//! travel as [`DomEvent`]s: dispatched at a target node, then bubbled
//! along the parent chain up to the document root. Dispatch is purely
//! observational - listeners cannot cancel an event or affect runtime
//! control flow.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::document::Document;
use crate::types::NodeId;

/// Listener callback. `Rc` so callbacks clone into the dispatch walk
/// without ownership issues.
pub type EventCallback = Rc<dyn Fn(&DomEvent)>;

/// An observable event travelling through the document.
#[derive(Debug, Clone)]
pub struct DomEvent {
    /// Event name, e.g. `flint_componentDidLoad`.
    pub name: String,
    /// The node the event was dispatched at.
    pub target: NodeId,
}

/// Dispatch an event at `target` and bubble it to the root.
///
/// Listener callbacks run after the document borrow is released, so they
/// are free to call back into the runtime (schedule updates, read
/// attributes, attach more listeners).
pub fn dispatch_event(document: &RefCell<Document>, target: NodeId, name: &str) {
    let callbacks: Vec<(EventCallback, DomEvent)> = {
        let doc = document.borrow();
        if !doc.contains(target) {
            return;
        }
        let event = DomEvent {
            name: name.to_string(),
            target,
        };

        let mut chain = vec![target];
        let mut current = target;
        while let Some(parent) = doc.parent(current) {
            chain.push(parent);
            current = parent;
        }

        chain
            .iter()
            .flat_map(|&node| doc.listeners_for(node, name))
            .map(|cb| (cb, event.clone()))
            .collect()
    };

    for (callback, event) in callbacks {
        callback(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_dispatch_bubbles_to_ancestors() {
        let document = RefCell::new(Document::new());
        let (outer, inner) = {
            let mut doc = document.borrow_mut();
            let outer = doc.create_element("outer");
            let inner = doc.create_element("inner");
            let root = doc.root();
            doc.append_child(root, outer);
            doc.append_child(outer, inner);
            (outer, inner)
        };

        let hits = Rc::new(Cell::new(0));
        {
            let mut doc = document.borrow_mut();
            let hits_inner = Rc::clone(&hits);
            doc.add_event_listener(inner, "ping", move |_| {
                hits_inner.set(hits_inner.get() + 1);
            });
            let hits_outer = Rc::clone(&hits);
            doc.add_event_listener(outer, "ping", move |event| {
                // Target stays the dispatch origin while bubbling.
                assert_eq!(event.target, inner);
                hits_outer.set(hits_outer.get() + 1);
            });
        }

        dispatch_event(&document, inner, "ping");
        assert_eq!(hits.get(), 2);

        // Different name: no listeners match.
        dispatch_event(&document, inner, "pong");
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_listener_may_reenter_document() {
        let document = RefCell::new(Document::new());
        let node = {
            let mut doc = document.borrow_mut();
            let node = doc.create_element("div");
            let root = doc.root();
            doc.append_child(root, node);
            node
        };

        // A listener that mutates the document must not deadlock on the
        // RefCell - dispatch releases the borrow before invoking.
        {
            let mut doc = document.borrow_mut();
            doc.add_event_listener(node, "ping", {
                move |event| {
                    // No document handle captured here on purpose; the
                    // integration tests cover runtime re-entry.
                    assert_eq!(event.name, "ping");
                }
            });
        }
        dispatch_event(&document, node, "ping");
    }
}
