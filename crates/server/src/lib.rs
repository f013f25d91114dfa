//! HTTP front end for docchat.
//!
//! An axum router exposing document upload, chat sessions and knowledge
//! base statistics as JSON, plus the single-page chat UI at `/`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use router::{create_app, run};
pub use session::{ChatEntry, Session, SessionManager};
pub use state::AppState;
