//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod form;
#[allow(clippy::missing_errors_doc)]
pub mod rules;
#[allow(clippy::missing_errors_doc)]
pub mod settings;

use axum::Router;
use axum::routing::get;

use parentctl_app::ports::{ConfigStore, HostHintSource};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, H>() -> Router<AppState<S, H>>
where
    S: ConfigStore + Send + Sync + 'static,
    H: HostHintSource + Send + Sync + 'static,
{
    Router::new()
        .route("/form", get(form::load::<S, H>).post(form::submit::<S, H>))
        .route(
            "/rules",
            get(rules::list::<S, H>).post(rules::create::<S, H>),
        )
        .route(
            "/rules/{id}",
            get(rules::get::<S, H>)
                .put(rules::update::<S, H>)
                .delete(rules::delete::<S, H>),
        )
        .route(
            "/settings",
            get(settings::get::<S, H>).put(settings::update::<S, H>),
        )
}
