//! HTTP surface for the tone adaptation service

pub mod server;

pub use server::{ApiServer, ApiServerConfig};
