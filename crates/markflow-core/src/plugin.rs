//! Plugin installation.

use std::fmt;

use crate::host::MarkdownHost;
use crate::render::Render;

/// Reusable bundle of interceptors with its own configuration.
///
/// A plugin is a factory: installing it builds a fresh configuration from
/// [`default_config`](Self::default_config), lets the caller adjust it, and
/// then calls [`register`](Self::register) with the result.
pub trait Plugin<R: Render> {
    /// Configuration type.
    type Config;

    /// Plugin name, for diagnostics.
    fn name(&self) -> &str;

    /// Fresh default configuration.
    fn default_config(&self) -> Self::Config;

    /// Register interceptors on `host` according to `config`.
    fn register(&self, host: &mut MarkdownHost<R>, config: Self::Config);
}

/// Plugin built from a pair of closures.
pub struct FnPlugin<C, D, F> {
    name: String,
    default_config: D,
    register: F,
    _config: std::marker::PhantomData<fn() -> C>,
}

impl<C, D, F> FnPlugin<C, D, F> {
    /// Create a plugin from a config factory and a registration function.
    #[must_use]
    pub fn new(name: impl Into<String>, default_config: D, register: F) -> Self {
        Self {
            name: name.into(),
            default_config,
            register,
            _config: std::marker::PhantomData,
        }
    }
}

impl<R, C, D, F> Plugin<R> for FnPlugin<C, D, F>
where
    R: Render,
    D: Fn() -> C,
    F: Fn(&mut MarkdownHost<R>, C),
{
    type Config = C;

    fn name(&self) -> &str {
        &self.name
    }

    fn default_config(&self) -> C {
        (self.default_config)()
    }

    fn register(&self, host: &mut MarkdownHost<R>, config: C) {
        (self.register)(host, config);
    }
}

impl<C, D, F> fmt::Debug for FnPlugin<C, D, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
