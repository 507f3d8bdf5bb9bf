//! Error taxonomy for the runtime.
//!
//! Two families matter at runtime: hook-execution errors (user code
//! failing inside a lifecycle hook) and render errors (the render hook or
//! the render bridge failing). Both are isolated per phase - the update
//! orchestrator logs them through the `log` facade and keeps going; they
//! never reach the caller that requested the update.
//!
//! The remaining variants cover fallible API entry points (definition and
//! element creation), which do propagate with `?`.

use thiserror::Error;

/// All errors produced by or flowing through the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A lifecycle hook failed. Caught and logged by the orchestrator.
    #[error("{hook}() failed on <{tag}>: {message}")]
    Hook {
        hook: &'static str,
        tag: String,
        message: String,
    },

    /// The render hook or the render bridge failed. Caught and logged.
    #[error("render failed on <{tag}>: {message}")]
    Render { tag: String, message: String },

    /// User code signalled failure without further context.
    ///
    /// Hooks typically return this through [`RuntimeError::component`];
    /// the orchestrator wraps it with the hook name and host tag before
    /// logging.
    #[error("{0}")]
    Component(String),

    /// `create_element` was called with a tag no component was defined for.
    #[error("unknown component tag `{0}`")]
    UnknownTag(String),

    /// `define` was called twice for the same tag.
    #[error("component tag `{0}` is already defined")]
    DuplicateTag(String),
}

impl RuntimeError {
    /// Shorthand for a component-signalled failure inside a hook.
    pub fn component(message: impl Into<String>) -> Self {
        RuntimeError::Component(message.into())
    }
}
