//! Albums API library
//!
//! HTTP handlers, upload plumbing and application setup for the photo album
//! service.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;
pub mod utils;

pub mod error;
pub mod state;

pub use api_doc::get_openapi_spec;
pub use error::{ErrorResponse, FormErrors, HttpAppError};
pub use setup::routes::setup_routes;
pub use state::AppState;
