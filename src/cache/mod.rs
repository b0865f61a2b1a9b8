// Cache module for local resource caching.
// Stores LMS API responses keyed by resource name, with read-time TTL.

pub mod paths;
pub mod store;

pub use store::{CacheEntry, CacheStore, COURSES_KEY, TODO_KEY};
