//! Contact Card server library.
//!
//! Configuration, contact storage backends, the JSON API and the
//! server-rendered pages. The binary in `main.rs` adds Sentry and binds
//! the listener; tests and `cc-cli` use the library directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
mod filters;
pub mod middleware;
pub mod qr;
pub mod routes;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use routes::app;
pub use state::AppState;
