//! Component surface: the behavioral trait instances implement, the hook
//! result type the orchestrator drives, and the static per-type metadata.
//!
//! Every lifecycle hook is optional - the trait ships no-op defaults, so
//! a component overrides only what it needs. Will-hooks return a
//! [`HookResult`] that is either already settled (synchronous hook) or a
//! future the orchestrator awaits before moving on; that is what keeps
//! "render never begins until will-render hooks settle" true without
//! forcing an allocation on the synchronous path.

use futures::future::LocalBoxFuture;

use crate::error::RuntimeError;
use crate::types::{ComponentFlags, PropFlags, PropType, PropValue};
use crate::vdom::VNode;

// =============================================================================
// Hook Results
// =============================================================================

/// Future returned by an asynchronous lifecycle hook.
pub type HookFuture = LocalBoxFuture<'static, Result<(), RuntimeError>>;

/// Outcome of invoking a lifecycle hook.
///
/// Synchronous hooks return `Done` and cost nothing; asynchronous hooks
/// return `Pending` and suspend the update pass until they settle.
pub enum HookResult {
    Done(Result<(), RuntimeError>),
    Pending(HookFuture),
}

impl HookResult {
    /// A synchronous hook that succeeded (the default for absent hooks).
    pub fn ok() -> Self {
        HookResult::Done(Ok(()))
    }

    /// A synchronous hook that failed.
    pub fn err(error: RuntimeError) -> Self {
        HookResult::Done(Err(error))
    }

    /// Wrap a future as an asynchronous hook outcome.
    pub fn pending(future: impl std::future::Future<Output = Result<(), RuntimeError>> + 'static) -> Self {
        HookResult::Pending(Box::pin(future))
    }

    /// Await the outcome. `Done` settles immediately.
    pub(crate) async fn settle(self) -> Result<(), RuntimeError> {
        match self {
            HookResult::Done(result) => result,
            HookResult::Pending(future) => future.await,
        }
    }
}

impl Default for HookResult {
    fn default() -> Self {
        HookResult::ok()
    }
}

// =============================================================================
// Component Trait
// =============================================================================

/// User-authored behavior of a component type.
///
/// The instance is distinct from the host element: the host lives in the
/// document, the instance holds state and hooks. Hooks run in the fixed
/// order documented on [`Runtime::flush`](crate::runtime::Runtime::flush);
/// a hook error is logged and isolated, it never aborts the pass.
///
/// # Example
///
/// ```ignore
/// struct Greeting {
///     name: String,
/// }
///
/// impl Component for Greeting {
///     fn prop_changed(&mut self, name: &str, value: &PropValue) {
///         if name == "name" {
///             self.name = value.as_str().unwrap_or("").to_string();
///         }
///     }
///
///     fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
///         Ok(Some(VNode::element("span").child(VNode::text(&self.name))))
///     }
/// }
/// ```
pub trait Component {
    /// First-load hook, awaited before the first render.
    fn component_will_load(&mut self) -> HookResult {
        HookResult::ok()
    }

    /// Subsequent-update hook, awaited before each re-render.
    fn component_will_update(&mut self) -> HookResult {
        HookResult::ok()
    }

    /// Runs before every render (load and update), awaited.
    fn component_will_render(&mut self) -> HookResult {
        HookResult::ok()
    }

    /// Produce the node tree for this pass. `None` renders nothing.
    fn render(&mut self) -> Result<Option<VNode>, RuntimeError> {
        Ok(None)
    }

    /// Runs after the first render pass. Invoked, not awaited: a
    /// `Pending` result keeps running in the background.
    fn component_did_load(&mut self) -> HookResult {
        HookResult::ok()
    }

    /// Runs after each subsequent render pass. Invoked, not awaited.
    fn component_did_update(&mut self) -> HookResult {
        HookResult::ok()
    }

    /// Runs after every render pass (load and update). Invoked, not awaited.
    fn component_did_render(&mut self) -> HookResult {
        HookResult::ok()
    }

    /// Property-change notification from the runtime's write interceptor.
    ///
    /// Fired whenever a declared property receives a new value (attribute
    /// parse, external property write, or default application), before
    /// the update pass that will re-render with it.
    fn prop_changed(&mut self, name: &str, value: &PropValue) {
        let _ = (name, value);
    }
}

// =============================================================================
// Property Declarations
// =============================================================================

/// Declaration of one component property.
pub struct PropDef {
    /// Property name as user code sees it (camelCase allowed).
    pub name: String,
    /// Attribute the property binds to; derived from `name` by dash-casing
    /// unless overridden with [`PropDef::attribute`].
    pub attribute: String,
    pub prop_type: PropType,
    pub flags: PropFlags,
    /// Initial value applied when the host is created.
    pub default: Option<PropValue>,
}

impl PropDef {
    pub fn new(name: &str, prop_type: PropType) -> Self {
        PropDef {
            name: name.to_string(),
            attribute: dash_case(name),
            prop_type,
            flags: PropFlags::empty(),
            default: None,
        }
    }

    /// Override the bound attribute name.
    pub fn attribute(mut self, attribute: &str) -> Self {
        self.attribute = attribute.to_string();
        self
    }

    /// Mirror this property onto its attribute.
    pub fn reflect(mut self) -> Self {
        self.flags |= PropFlags::REFLECT;
        self
    }

    /// Allow the instance itself to write this property.
    pub fn mutable(mut self) -> Self {
        self.flags |= PropFlags::MUTABLE;
        self
    }

    /// Initial value applied when the host is created.
    pub fn default_value(mut self, value: impl Into<PropValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// camelCase -> dash-case attribute mapping (`multiWord` -> `multi-word`).
pub fn dash_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// =============================================================================
// Runtime Metadata
// =============================================================================

/// Static, immutable per-component-type metadata.
///
/// Declares the tag, encapsulation flags, property set and style text.
/// Shared by all instances of the type (the runtime hands out `Rc`s).
pub struct ComponentRuntimeMeta {
    pub tag: String,
    pub flags: ComponentFlags,
    pub props: Vec<PropDef>,
    /// Component CSS, attached to each host once on first load.
    pub style: Option<String>,
}

impl ComponentRuntimeMeta {
    pub fn new(tag: &str) -> Self {
        ComponentRuntimeMeta {
            tag: tag.to_string(),
            flags: ComponentFlags::empty(),
            props: Vec::new(),
            style: None,
        }
    }

    pub fn shadow(mut self) -> Self {
        self.flags |= ComponentFlags::SHADOW_DOM_ENCAPSULATION;
        self
    }

    pub fn scoped(mut self) -> Self {
        self.flags |= ComponentFlags::SCOPED_CSS_ENCAPSULATION;
        self
    }

    pub fn prop(mut self, def: PropDef) -> Self {
        self.props.push(def);
        self
    }

    pub fn style(mut self, css: &str) -> Self {
        self.style = Some(css.to_string());
        self
    }

    /// Look up a property declaration by property name.
    pub fn prop_by_name(&self, name: &str) -> Option<&PropDef> {
        self.props.iter().find(|def| def.name == name)
    }

    /// Look up a property declaration by bound attribute name.
    pub fn prop_by_attribute(&self, attribute: &str) -> Option<&PropDef> {
        self.props.iter().find(|def| def.attribute == attribute)
    }
}
