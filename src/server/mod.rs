mod artist_routes;
pub mod config;
mod http_layers;
pub mod metrics;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub(self) use artist_routes::make_artist_routes;
pub use server::{make_app, run_server};
pub use state::ServerState;
