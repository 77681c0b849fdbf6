mod app;
mod handlers;
mod routes;
mod server;
mod state;

pub use app::get_app;
pub use server::DumpwatchServer;
pub use state::ServerState;
