// Canvas LMS API module.
// Provides a relay-routed client and types for the upstream REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::CanvasClient;
pub use types::{CourseMap, Profile, TodoItem};
