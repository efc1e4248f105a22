use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod report;

pub use report::record_login;

pub fn router() -> Router<AppState> {
    handlers::session_routes()
}
