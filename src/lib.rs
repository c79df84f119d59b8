//! Prediction API for Fiji climate, mortality, environmental and economic
//! outlooks, served from pre-trained models and static year tables.

pub mod config;
pub mod error;
pub mod features;
pub mod forecast;
pub mod model;
pub mod routes;
pub mod state;
pub mod tables;
#[cfg(feature = "torch")]
pub mod torch;
pub mod types;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;
