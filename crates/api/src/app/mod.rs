//! Router assembly.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

pub mod dto;
pub mod errors;
pub mod guards;
pub mod routes;
pub mod services;

pub use services::{AppConfig, AppServices};

use crate::middleware::authenticate;

/// Build the full router against a wired service set.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let protected = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/users", get(routes::users::list).post(routes::users::create))
        .route(
            "/users/:id",
            get(routes::users::get).delete(routes::users::delete),
        )
        .route("/users/:id/role", post(routes::users::assign_role))
        .route("/users/:id/activate", post(routes::users::activate))
        .route("/users/:id/deactivate", post(routes::users::deactivate))
        .route(
            "/certificates",
            get(routes::certificates::list).post(routes::certificates::create),
        )
        .route(
            "/certificates/expire-sweep",
            post(routes::certificates::expire_sweep),
        )
        .route("/certificates/:id", get(routes::certificates::get))
        .route("/certificates/:id/sign", post(routes::certificates::sign))
        .route("/certificates/:id/revoke", post(routes::certificates::revoke))
        .route("/certificates/:id/export", get(routes::certificates::export))
        .layer(axum::middleware::from_fn_with_state(
            services.clone(),
            authenticate,
        ));

    Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .route("/verify/:token", get(routes::verify::verify))
        .route("/health", get(routes::system::health))
        .merge(protected)
        .with_state(services)
}
