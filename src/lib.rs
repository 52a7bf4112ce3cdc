pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod sandbox;
pub mod session;
pub mod web_server;
