//! Virtual node trees.
//!
//! A [`VNode`] is what a component's render hook produces: a cheap,
//! plain-data description of the subtree the host should show. The
//! runtime hands the tree to the render bridge; it never interprets the
//! tree itself.

/// One node in a produced tree: an element with attributes and children,
/// or a text leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct VNode {
    /// Element tag; `None` for text nodes.
    pub tag: Option<String>,
    /// Text content; `None` for element nodes.
    pub text: Option<String>,
    /// Attributes in declaration order.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<VNode>,
}

impl VNode {
    /// An element node.
    pub fn element(tag: &str) -> Self {
        VNode {
            tag: Some(tag.to_string()),
            text: None,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        VNode {
            tag: None,
            text: Some(text.into()),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute (builder style).
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a child (builder style).
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add children (builder style).
    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}

/// Hyperscript-style shorthand for [`VNode::element`].
pub fn h(tag: &str) -> VNode {
    VNode::element(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let tree = h("div")
            .attr("id", "app")
            .child(VNode::text("hello"))
            .child(h("span").child(VNode::text("!")));

        assert_eq!(tree.tag.as_deref(), Some("div"));
        assert_eq!(tree.attrs, vec![("id".to_string(), "app".to_string())]);
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0].is_text());
        assert_eq!(tree.children[1].tag.as_deref(), Some("span"));
    }
}
