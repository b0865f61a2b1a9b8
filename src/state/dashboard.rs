// Freshness orchestration.
// Decides cache-vs-network per resource, keeps the course map and to-do
// list coherently paired for a render pass, and guards against a
// superseded refresh overwriting newer state.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::cache::{CacheStore, COURSES_KEY, TODO_KEY};
use crate::canvas::{CanvasClient, CourseMap, TodoItem};
use crate::error::Result;

/// Per-resource max ages. Courses change rarely; the to-do list churns.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub courses_max_age: Duration,
    pub todo_max_age: Duration,
    /// Looser bound used only for the optimistic first paint.
    pub optimistic_max_age: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            courses_max_age: Duration::from_secs(6 * 60 * 60),
            todo_max_age: Duration::from_secs(5 * 60),
            optimistic_max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// A coherent pair of resources for one render pass.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub courses: CourseMap,
    pub todo: Vec<TodoItem>,
}

/// Possibly-partial cached state for the optimistic first paint.
#[derive(Debug, Clone, Default)]
pub struct CachedSnapshot {
    pub courses: Option<CourseMap>,
    pub todo: Option<Vec<TodoItem>>,
}

impl CachedSnapshot {
    pub fn is_empty(&self) -> bool {
        self.courses.is_none() && self.todo.is_none()
    }
}

/// Owns the client, cache, and freshness policy for one session.
pub struct Dashboard {
    client: CanvasClient,
    cache: CacheStore,
    policy: FreshnessPolicy,
    /// Monotonic load generation; results from a superseded load are
    /// discarded instead of overwriting newer state.
    generation: AtomicU64,
    current: Mutex<Option<Snapshot>>,
}

impl Dashboard {
    pub fn new(client: CanvasClient, cache: CacheStore, policy: FreshnessPolicy) -> Self {
        Self {
            client,
            cache,
            policy,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Serve courses from cache when fresh enough, else fetch and
    /// write back before returning.
    pub async fn courses(&self) -> Result<CourseMap> {
        if let Some(cached) = self.cache.get(COURSES_KEY, self.policy.courses_max_age) {
            tracing::debug!("courses served from cache");
            return Ok(cached);
        }
        let courses = self.client.get_courses().await?;
        self.cache.set(COURSES_KEY, &courses);
        Ok(courses)
    }

    /// Serve the to-do list from cache when fresh enough, else fetch
    /// and write back before returning.
    pub async fn todo(&self) -> Result<Vec<TodoItem>> {
        if let Some(cached) = self.cache.get(TODO_KEY, self.policy.todo_max_age) {
            tracing::debug!("todo served from cache");
            return Ok(cached);
        }
        let todo = self.client.get_todo().await?;
        self.cache.set(TODO_KEY, &todo);
        Ok(todo)
    }

    /// Load both resources at normal freshness, concurrently. Either
    /// failure aborts the pass and surfaces as a single error; a stale
    /// (superseded) load returns its data without touching shared state.
    pub async fn load(&self) -> Result<Snapshot> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (courses, todo) = tokio::join!(self.courses(), self.todo());
        let snapshot = Snapshot {
            courses: courses?,
            todo: todo?,
        };

        if self.generation.load(Ordering::SeqCst) == generation {
            *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        } else {
            tracing::debug!(generation, "discarding superseded load");
        }
        Ok(snapshot)
    }

    /// Reload, optionally forcing a network round-trip for the to-do
    /// list by dropping its cache entry first. Courses ride their own
    /// longer max age.
    pub async fn refresh(&self, force: bool) -> Result<Snapshot> {
        if force {
            self.cache.delete(TODO_KEY);
        }
        self.load().await
    }

    /// Read whatever the cache holds under the optimistic max age,
    /// without any network. Callers may render this stale snapshot
    /// immediately and then call [`load`](Self::load) to reconcile.
    pub fn cached_snapshot(&self) -> CachedSnapshot {
        CachedSnapshot {
            courses: self.cache.get(COURSES_KEY, self.policy.optimistic_max_age),
            todo: self.cache.get(TODO_KEY, self.policy.optimistic_max_age),
        }
    }

    /// The most recent snapshot a non-superseded load produced.
    pub fn current(&self) -> Option<Snapshot> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }
}
