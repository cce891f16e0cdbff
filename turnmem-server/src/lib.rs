//! Localhost HTTP surface (spec §4.9, component C9): route table plus the
//! middleware stack in front of it. `main.rs` owns process startup; this
//! crate owns everything that can be driven from an in-process test.

mod error;
mod middleware;
mod processor;
mod rate_limit;
mod routes;
mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::Result;
pub use error::ServerError;
pub use processor::QueueProcessor;
pub use rate_limit::RateLimiter;
pub use state::AppState;

use axum::Router;
use axum::middleware::from_fn;
use axum::middleware::from_fn_with_state;

/// Builds the full router: the spec §6.1 route table wrapped in the spec
/// §4.9 middleware stack, applied in order (CORS, remote guard, rate
/// limit, body limit, auth, content-type). Layers added later run
/// earlier, so the stack is built innermost-first here.
pub fn build_app(state: AppState) -> Router {
    let port = state.config.port;
    routes::router(state.clone())
        .layer(from_fn(middleware::content_type::guard))
        .layer(from_fn_with_state(state.clone(), middleware::auth::guard))
        .layer(from_fn(middleware::body_limit::guard))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit::guard))
        .layer(from_fn_with_state(state.clone(), middleware::remote_guard::guard))
        .layer(middleware::cors::layer(port))
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
