//! Port isolating the fragile page-text heuristics from the governor.

use crate::domain::models::RestrictionSignal;

/// Collaborator-supplied page/response state to inspect.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// Visible text of the current page.
    pub body_text: String,
    /// Current URL after any redirects.
    pub url: String,
}

impl PageSnapshot {
    pub fn new(body_text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            body_text: body_text.into(),
            url: url.into(),
        }
    }
}

/// Reduces raw page state to typed restriction signals.
///
/// Detection heuristics are platform-specific and brittle; keeping them
/// behind this trait lets the governor's throttle/halt logic be tested
/// with scripted signals.
pub trait PageSignalInspector: Send + Sync {
    fn inspect(&self, page: &PageSnapshot) -> Vec<RestrictionSignal>;
}
