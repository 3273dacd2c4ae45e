//! Shared application state for axum handlers.

use std::sync::Arc;

use parentctl_app::ports::{ConfigStore, HostHintSource};
use parentctl_app::services::rule_form_service::RuleFormService;

/// Application state shared across all axum handlers.
///
/// Generic over the store and host-hint source to avoid dynamic dispatch.
/// `Clone` is implemented manually so that only the `Arc` is cloned.
pub struct AppState<S, H> {
    pub rule_form_service: Arc<RuleFormService<S, H>>,
}

impl<S, H> Clone for AppState<S, H> {
    fn clone(&self) -> Self {
        Self {
            rule_form_service: Arc::clone(&self.rule_form_service),
        }
    }
}

impl<S, H> AppState<S, H>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    pub fn new(rule_form_service: RuleFormService<S, H>) -> Self {
        Self {
            rule_form_service: Arc::new(rule_form_service),
        }
    }
}
