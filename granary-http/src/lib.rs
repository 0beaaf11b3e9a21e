pub mod config;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod server;

pub use config::ServerConfig;
pub use server::{build_router, serve};
