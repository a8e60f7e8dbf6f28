//! HTTP API Module
//!
//! Read-only JSON surface over the published catalog snapshot.
//!
//! ## Routes
//! Requests are routed by the last segment of the path, so `/search` and
//! `/api/search` are the same route.
//! - **`search`**: `?query=...&limit=...` returns `{items, total}`.
//! - **`update`**: runs a reconciliation and returns its status line.
//! - **`total`**: returns `{total}` for the current catalog.
//! - **`browse`**: returns the whole catalog.
//!
//! ## Submodules
//! - **`service`**: `QueryService`, the façade the handlers call into.
//! - **`routes`**: The fixed set of supported routes.
//! - **`handlers`**: Router construction, dispatch and response framing.

pub mod handlers;
pub mod routes;
pub mod service;

pub use handlers::router;
pub use routes::Route;
pub use service::QueryService;
