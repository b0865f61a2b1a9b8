// Core library for the homeroom dashboard.
// Relay server, LMS API client, resource cache, and the view pipeline.

pub mod cache;
pub mod canvas;
pub mod error;
pub mod relay;
pub mod state;

pub use error::{HomeroomError, Result};
