pub mod billing;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod membership;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::api_routes;
pub use state::AppState;
