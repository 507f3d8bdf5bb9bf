//! Host document arena.
//!
//! The runtime needs a live tree to mutate: elements with attributes,
//! class lists, parent/child links, text nodes and (optionally) an open
//! shadow root per element. This module provides exactly that surface and
//! nothing more - it is the substrate the lifecycle semantics are
//! observable through, not a DOM reimplementation.
//!
//! Nodes are indices into a slab with a free pool, so a [`NodeId`] is
//! stable for the node's lifetime and lookups are O(1).

use std::rc::Rc;

use crate::dom::events::{DomEvent, EventCallback};
use crate::types::NodeId;

// =============================================================================
// Nodes
// =============================================================================

pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

pub(crate) struct ElementData {
    pub tag: String,
    /// Attributes in insertion order (serialization preserves it).
    pub attributes: Vec<(String, String)>,
    /// Class list, kept separate from `attributes` like a live classList.
    pub class_list: Vec<String>,
    /// `Some` once a shadow root has been attached. Children rendered by
    /// the component go here instead of the light tree.
    pub shadow_children: Option<Vec<NodeId>>,
    /// Event listeners: (event name, callback).
    pub listeners: Vec<(String, EventCallback)>,
}

pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

// =============================================================================
// Document
// =============================================================================

/// The host document: a slab of nodes with one fixed root element.
pub struct Document {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Document {
    /// Create an empty document with a `<body>` root.
    pub fn new() -> Self {
        let mut doc = Document {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element("body");
        doc
    }

    /// The document root; nodes attached under it count as connected.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.nodes[index] = Some(node);
            NodeId(index)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0].as_ref().expect("node id out of document")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0].as_mut().expect("node id out of document")
    }

    fn element(&self, id: NodeId) -> &ElementData {
        match &self.node(id).kind {
            NodeKind::Element(data) => data,
            NodeKind::Text(_) => panic!("node {} is not an element", id.0),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> &mut ElementData {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => data,
            NodeKind::Text(_) => panic!("node {} is not an element", id.0),
        }
    }

    /// Whether the id refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|slot| slot.is_some())
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(Node {
            kind: NodeKind::Element(ElementData {
                tag: tag.to_string(),
                attributes: Vec::new(),
                class_list: Vec::new(),
                shadow_children: None,
                listeners: Vec::new(),
            }),
            parent: None,
            children: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(Node {
            kind: NodeKind::Text(text.to_string()),
            parent: None,
            children: Vec::new(),
        })
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Element tag name, or `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element(data) => Some(&data.tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children.clone()
    }

    /// Append `child` as the last light child of `parent`, detaching it
    /// from any previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Append `child` into the shadow tree of `host`.
    ///
    /// The child's parent pointer still refers to the host element, so
    /// bubbling and ancestor walks cross the shadow boundary naturally.
    pub fn append_shadow_child(&mut self, host: NodeId, child: NodeId) {
        self.detach(child);
        let shadow = self
            .element_mut(host)
            .shadow_children
            .as_mut()
            .expect("append_shadow_child on a host without a shadow root");
        shadow.push(child);
        self.node_mut(child).parent = Some(host);
    }

    /// Detach a node from its parent (light or shadow side).
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let parent_node = self.node_mut(parent);
        parent_node.children.retain(|&c| c != id);
        if let NodeKind::Element(data) = &mut parent_node.kind {
            if let Some(shadow) = data.shadow_children.as_mut() {
                shadow.retain(|&c| c != id);
            }
        }
        self.node_mut(id).parent = None;
    }

    /// Detach a node and free it together with its whole subtree.
    pub fn remove_subtree(&mut self, id: NodeId) {
        self.detach(id);
        for node in self.collect_subtree(id) {
            self.nodes[node.0] = None;
            self.free.push(node.0);
        }
    }

    /// The node plus every descendant, light and shadow, parents first.
    pub fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let node = self.node(current);
            stack.extend(node.children.iter().copied());
            if let NodeKind::Element(data) = &node.kind {
                if let Some(shadow) = &data.shadow_children {
                    stack.extend(shadow.iter().copied());
                }
            }
        }
        out
    }

    /// Whether the node is attached under the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // =========================================================================
    // Attributes and classes
    // =========================================================================

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let data = self.element_mut(id);
        for entry in &mut data.attributes {
            if entry.0 == name {
                entry.1 = value.to_string();
                return;
            }
        }
        data.attributes.push((name.to_string(), value.to_string()));
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        self.element_mut(id).attributes.retain(|(n, _)| n != name);
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let data = self.element_mut(id);
        if !data.class_list.iter().any(|c| c == class) {
            data.class_list.push(class.to_string());
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).class_list.iter().any(|c| c == class)
    }

    // =========================================================================
    // Shadow root
    // =========================================================================

    /// Attach an open shadow root. Idempotent: a second call is a no-op.
    pub fn attach_shadow(&mut self, id: NodeId) {
        let data = self.element_mut(id);
        if data.shadow_children.is_none() {
            data.shadow_children = Some(Vec::new());
        }
    }

    pub fn has_shadow_root(&self, id: NodeId) -> bool {
        self.element(id).shadow_children.is_some()
    }

    /// Children of the element's shadow tree (empty when no shadow root).
    pub fn shadow_children(&self, id: NodeId) -> Vec<NodeId> {
        self.element(id)
            .shadow_children
            .clone()
            .unwrap_or_default()
    }

    /// Where this element's rendered output goes: the shadow tree when a
    /// shadow root is attached, the light tree otherwise.
    pub(crate) fn render_target_children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.element(id).shadow_children {
            Some(shadow) => shadow.clone(),
            None => self.node(id).children.clone(),
        }
    }

    // =========================================================================
    // Event listeners
    // =========================================================================

    pub fn add_event_listener(&mut self, id: NodeId, name: &str, callback: impl Fn(&DomEvent) + 'static) {
        self.element_mut(id)
            .listeners
            .push((name.to_string(), Rc::new(callback)));
    }

    pub(crate) fn listeners_for(&self, id: NodeId, name: &str) -> Vec<EventCallback> {
        match &self.node(id).kind {
            NodeKind::Element(data) => data
                .listeners
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, cb)| Rc::clone(cb))
                .collect(),
            NodeKind::Text(_) => Vec::new(),
        }
    }

    // =========================================================================
    // Observation helpers
    // =========================================================================

    /// Concatenated text of the light subtree (shadow content excluded,
    /// like the platform's `textContent`).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &self.node(id).children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// HTML snapshot of the node and its light subtree.
    ///
    /// Class list serializes first, then attributes in insertion order;
    /// empty attribute values serialize as bare names. The output feeds
    /// string-equality assertions in tests.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// HTML snapshot of the element's light children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in &self.node(id).children {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// HTML snapshot of the element's shadow children.
    pub fn shadow_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(shadow) = &self.element(id).shadow_children {
            for child in shadow {
                self.write_html(*child, &mut out);
            }
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.tag);
                if !data.class_list.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&data.class_list.join(" "));
                    out.push('"');
                }
                for (name, value) in &data.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape(value));
                        out.push('"');
                    }
                }
                out.push('>');
                for child in &self.node(id).children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&data.tag);
                out.push('>');
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
