//! Application state.

use std::sync::Arc;

use casegen_completion::Completer;

/// Shared, read-only state handed to every handler.
///
/// Nothing here changes after startup; per-request choices such as the
/// model travel with the request instead.
pub(crate) struct AppState {
    /// Completion backend; blocking, so handlers call it on the blocking pool.
    pub(crate) completer: Arc<dyn Completer>,
    /// Model used when a request does not name one.
    pub(crate) default_model: String,
}

impl AppState {
    pub(crate) fn new(completer: Arc<dyn Completer>, default_model: String) -> Self {
        Self {
            completer,
            default_model,
        }
    }

    /// Pick the request's model, or the default when absent or blank.
    pub(crate) fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(model) if !model.is_empty() => model.to_string(),
            _ => self.default_model.clone(),
        }
    }
}
