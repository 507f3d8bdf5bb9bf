//! Style attachment.
//!
//! Component CSS registers once per component type and attaches to each
//! host once, on first load (phase 6 of the update pass). Attachment is
//! idempotent per host by construction; the orchestrator only calls it
//! on the initial-load path anyway.

use std::collections::{HashMap, HashSet};

use crate::types::NodeId;

pub(crate) struct StyleRegistry {
    /// CSS text per component tag, registered on first attachment.
    registered: HashMap<String, String>,
    /// Hosts whose styles have been attached.
    attached: HashSet<NodeId>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        StyleRegistry {
            registered: HashMap::new(),
            attached: HashSet::new(),
        }
    }

    /// Attach a component's styles to a host. Returns true on the first
    /// attachment for this host.
    pub fn attach(&mut self, host: NodeId, tag: &str, style: Option<&str>) -> bool {
        if !self.attached.insert(host) {
            return false;
        }
        if let Some(css) = style {
            self.registered
                .entry(tag.to_string())
                .or_insert_with(|| css.to_string());
        }
        log::debug!("styles attached for <{tag}> host {host:?}");
        true
    }

    pub fn is_attached(&self, host: NodeId) -> bool {
        self.attached.contains(&host)
    }

    /// Registered CSS for a component tag, if any host of that type has
    /// loaded.
    pub fn registered_css(&self, tag: &str) -> Option<&str> {
        self.registered.get(tag).map(String::as_str)
    }

    /// Forget a host on disconnect.
    pub fn release(&mut self, host: NodeId) {
        self.attached.remove(&host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_once_per_host() {
        let mut styles = StyleRegistry::new();
        let host = NodeId(3);

        assert!(styles.attach(host, "cmp-a", Some(":host { color: red }")));
        assert!(!styles.attach(host, "cmp-a", Some(":host { color: red }")));
        assert!(styles.is_attached(host));
        assert_eq!(styles.registered_css("cmp-a"), Some(":host { color: red }"));
    }

    #[test]
    fn test_attach_without_css_still_marks_host() {
        let mut styles = StyleRegistry::new();
        let host = NodeId(4);
        assert!(styles.attach(host, "cmp-b", None));
        assert!(styles.is_attached(host));
        assert_eq!(styles.registered_css("cmp-b"), None);
    }

    #[test]
    fn test_release() {
        let mut styles = StyleRegistry::new();
        let host = NodeId(5);
        styles.attach(host, "cmp-a", None);
        styles.release(host);
        assert!(!styles.is_attached(host));
    }
}
