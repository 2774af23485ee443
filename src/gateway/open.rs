//! Presentation contexts opened before their URL is known.
//!
//! Hosts may only grant a new context synchronously in response to the
//! triggering action, so the context is opened first and navigated once the
//! gateway URL resolves.

/// A context that can be pointed at a URL after it was opened.
pub trait NavigationContext {
    /// Navigates the context to `url`.
    fn navigate(&self, url: &str);
}

/// Something that can open new blank contexts.
pub trait ContextHost {
    /// The context type this host opens.
    type Context: NavigationContext;

    /// Opens a blank context. Returns `None` when the host refuses.
    fn open_blank(&self, target: Option<&str>, features: Option<&str>) -> Option<Self::Context>;
}
