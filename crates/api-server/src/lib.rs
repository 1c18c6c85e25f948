#![warn(clippy::unwrap_used)]

pub mod auth;
pub mod handlers;
pub mod models;
pub mod router;
pub mod server;

pub use server::ApiServer;
