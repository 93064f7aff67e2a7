pub mod admin;
pub mod comments;
pub mod datasets;
pub mod movies;
pub mod recommendations;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
