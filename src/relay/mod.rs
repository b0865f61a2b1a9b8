// Proxy relay module.
// A stateless forwarder that keeps the LMS token off the direct
// browser-to-upstream path: validates the target, injects the bearer
// credential, and relays pagination metadata back to the caller.

pub mod config;
pub mod server;

pub use config::RelayConfig;
pub use server::router;
