// State management module.
// Session lifecycle, freshness orchestration, local marks, and the pure
// view pipeline that rendering collaborators consume.

pub mod dashboard;
pub mod marks;
pub mod pipeline;
pub mod session;

pub use dashboard::{CachedSnapshot, Dashboard, FreshnessPolicy, Snapshot};
pub use marks::{DoneStore, FileMarks, MemoryMarks, SnoozeStore};
pub use pipeline::{
    AnnotatedItem, BucketCounts, BucketFilter, Category, SortOrder, Urgency, ViewFilters,
    ViewModel, build_view, category, due_label,
};
pub use session::{Session, disconnect, normalize_base_url};
