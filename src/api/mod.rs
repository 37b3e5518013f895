//! REST API for the companion backend.
//!
//! Routes are nested under `/api/` and protected by a middleware stack:
//! Rate Limit → Auth → Audit → Handler.
//!
//! `api_router()` returns a `Router` that can be mounted on any axum
//! server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::{api_router, build_router};
pub use server::{start_api_server_on, ApiServer, ApiSession};
pub use types::ApiContext;
