//! HTTP gateway: application state, owner sessions, core routes, and server
//! assembly with plugin-contributed routes.

pub mod auth;
pub mod auth_middleware;
pub mod auth_routes;
pub mod routes;
pub mod server;
pub mod state;

pub use {
    auth_middleware::CurrentUser,
    server::{build_app, prepare_app, start_gateway},
    state::AppState,
};
