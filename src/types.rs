//! Core types for flint-runtime.
//!
//! These types define the foundation that everything builds on.
//! They flow between the host document, the property system and the
//! update orchestrator, and define what the runtime understands.

use bitflags::bitflags;

// =============================================================================
// Node / Host Identity
// =============================================================================

/// Identity of a node in the host document arena.
///
/// Plain index - nodes never move, so an id stays valid until the node
/// is removed from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw index value (stable for the node's lifetime).
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Opaque handle to a DOM-resident component instance.
///
/// A host element is an ordinary element in the document arena whose tag
/// was registered through [`Runtime::define`](crate::runtime::Runtime::define).
/// All mutable lifecycle state lives in the host's [`HostRef`](crate::runtime::HostRef)
/// side-table entry, keyed by this handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostElement(pub(crate) NodeId);

impl HostElement {
    /// The underlying document node.
    pub const fn node_id(self) -> NodeId {
        self.0
    }
}

// =============================================================================
// Property Values
// =============================================================================

/// Declared type of a component property.
///
/// Drives attribute coercion: the same serialized attribute string parses
/// differently depending on the declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropType {
    Boolean,
    Number,
    String,
}

/// A typed property value as observable through the host element.
///
/// `Undefined` means the property was never set (a missing attribute),
/// which is distinct from `Null` (explicitly cleared). Both serialize to
/// an absent attribute when reflected.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl PropValue {
    /// Read as a boolean, if this value is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Read as a number, if this value is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Read as a string slice, if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// True for `Undefined` and `Null` (both reflect to an absent attribute).
    pub fn is_nullish(&self) -> bool {
        matches!(self, PropValue::Undefined | PropValue::Null)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

// =============================================================================
// Component / Property Flags
// =============================================================================

bitflags! {
    /// Compile-time flags of a component type.
    ///
    /// Part of [`ComponentRuntimeMeta`](crate::component::ComponentRuntimeMeta);
    /// shared by all instances of the type and never mutated at runtime.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ComponentFlags: u8 {
        /// Render into an open shadow root (attached once, on first load).
        const SHADOW_DOM_ENCAPSULATION = 1 << 0;
        /// Scoped-style encapsulation (class-based, no shadow root).
        const SCOPED_CSS_ENCAPSULATION = 1 << 1;
    }
}

bitflags! {
    /// Per-property behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropFlags: u8 {
        /// Mirror the property's current value onto its attribute.
        const REFLECT = 1 << 0;
        /// The component instance itself may write this property.
        const MUTABLE = 1 << 1;
    }
}
