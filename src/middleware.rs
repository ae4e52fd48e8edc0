//! Interception of every field resolution.

use std::{fmt, ops::ControlFlow, sync::Arc};

use crate::{error::FieldError, params::ResolveParams, value::Value};

/// Interceptor of field resolution.
///
/// Returns [`ControlFlow::Continue`] to pass control onward, or
/// [`ControlFlow::Break`] to stop the resolution with its own result.
pub type Middleware =
    Arc<dyn Fn(&ResolveParams) -> Result<ControlFlow<Value>, FieldError> + Send + Sync>;

/// Ordered list of [`Middleware`]s, run in registration order.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Middleware>,
}

impl MiddlewareChain {
    /// Appends a middleware to the chain.
    pub fn push<F>(&mut self, f: F)
    where
        F: Fn(&ResolveParams) -> Result<ControlFlow<Value>, FieldError> + Send + Sync + 'static,
    {
        self.layers.push(Arc::new(f));
    }

    /// Number of registered middlewares.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Indicates whether no middlewares are registered.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Runs the chain against the provided `params`.
    ///
    /// Stops at the first middleware returning [`ControlFlow::Break`] or an
    /// error. Returns [`ControlFlow::Continue`] if every middleware passed
    /// control onward.
    ///
    /// # Errors
    ///
    /// With the error of the first failed middleware.
    pub fn run(&self, params: &ResolveParams) -> Result<ControlFlow<Value>, FieldError> {
        for layer in &self.layers {
            if let ControlFlow::Break(v) = layer(params)? {
                return Ok(ControlFlow::Break(v));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.layers.len())
            .finish()
    }
}
