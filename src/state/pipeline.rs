// Categorization and view pipeline.
// A pure, deterministic transform from (items, course map, filters, now)
// to an ordered, bucketed view. Re-run in full on every filter change and
// data refresh; holds no incremental state.

use chrono::{DateTime, Duration, Utc};

use crate::canvas::{CourseMap, TodoItem};

use super::marks::{DoneStore, SnoozeStore};

/// Time bucket an item falls into relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Today,
    Week,
    Later,
    Past,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Today => "Today",
            Category::Week => "This Week",
            Category::Later => "Later",
            Category::Past => "Past",
        }
    }
}

/// Bucket requested by the UI filter control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketFilter {
    #[default]
    All,
    Today,
    Week,
    Later,
    Past,
    /// Checked against the done store, not the due date.
    Done,
}

/// Supported orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    DueAsc,
    DueDesc,
    CourseAsc,
}

/// UI-driven filter state fed into the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ViewFilters {
    pub search: String,
    pub bucket: BucketFilter,
    pub sort: SortOrder,
    pub hide_done: bool,
}

/// A to-do item with its derived view-model fields attached. Recomputed
/// on every run; never cached.
#[derive(Debug, Clone)]
pub struct AnnotatedItem {
    pub item: TodoItem,
    /// Course name joined from the course map, else the embedded context
    /// name. `None` when neither source knows the course.
    pub course_name: Option<String>,
    pub category: Category,
}

impl AnnotatedItem {
    /// Display label for the course column.
    pub fn course_label(&self) -> String {
        if let Some(name) = &self.course_name {
            return name.clone();
        }
        match self.item.course_id {
            Some(id) => format!("Course #{id}"),
            None => "Course".to_string(),
        }
    }
}

/// Item counts per bucket, computed over the filtered set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub today: usize,
    pub week: usize,
    pub later: usize,
    pub past: usize,
}

/// Ordered, annotated output of one pipeline run.
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub items: Vec<AnnotatedItem>,
    pub counts: BucketCounts,
}

/// Compute the time bucket for a due timestamp. Calendar-day boundaries
/// come from `now`'s own date.
pub fn category(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Category {
    let Some(due) = due else {
        return Category::Later;
    };
    if due < now {
        return Category::Past;
    }
    if due <= end_of_day(now) {
        return Category::Today;
    }
    if due <= end_of_day(now + Duration::days(7)) {
        return Category::Week;
    }
    Category::Later
}

fn end_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|naive| naive.and_utc())
        .unwrap_or(t)
}

/// Urgency level for rendering a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Ok,
    Warn,
    Bad,
}

/// Human label plus urgency for a due date, relative to `now`.
pub fn due_label(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (String, Urgency) {
    let Some(due) = due else {
        return ("No due date".to_string(), Urgency::Ok);
    };

    let pretty = due.format("%b %-d, %-I:%M %p").to_string();
    let diff = due.signed_duration_since(now);
    if diff < Duration::zero() {
        return (format!("Past Due: {pretty}"), Urgency::Bad);
    }
    match diff.num_days() {
        0 => (format!("Due Today: {pretty}"), Urgency::Bad),
        1 => (format!("Due Tomorrow: {pretty}"), Urgency::Warn),
        days if days <= 7 => (format!("Due in {days}d: {pretty}"), Urgency::Warn),
        _ => (format!("Due {pretty}"), Urgency::Ok),
    }
}

/// Run the full pipeline: snooze visibility, course annotation, search,
/// done visibility, bucket filter, then counts and a stable sort.
pub fn build_view(
    items: &[TodoItem],
    courses: &CourseMap,
    filters: &ViewFilters,
    done: &dyn DoneStore,
    snooze: &dyn SnoozeStore,
    now: DateTime<Utc>,
) -> ViewModel {
    let mut annotated: Vec<AnnotatedItem> = items
        .iter()
        .filter(|item| match snooze.snoozed_until(&item.key) {
            Some(until) => until <= now,
            None => true,
        })
        .map(|item| {
            let course_name = item
                .course_id
                .and_then(|id| courses.get(&id).cloned())
                .or_else(|| item.context_name.clone());
            AnnotatedItem {
                category: category(item.due_at, now),
                course_name,
                item: item.clone(),
            }
        })
        .collect();

    let query = filters.search.trim().to_lowercase();
    if !query.is_empty() {
        annotated.retain(|a| {
            // Raw title only: the "Untitled" display fallback is not
            // searchable text.
            a.item
                .title
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&query)
                || a.course_name
                    .as_deref()
                    .unwrap_or("")
                    .to_lowercase()
                    .contains(&query)
        });
    }

    if filters.hide_done {
        annotated.retain(|a| !done.is_done(&a.item.key));
    }

    match filters.bucket {
        BucketFilter::All => {}
        BucketFilter::Done => annotated.retain(|a| done.is_done(&a.item.key)),
        BucketFilter::Today => annotated.retain(|a| a.category == Category::Today),
        BucketFilter::Week => annotated.retain(|a| a.category == Category::Week),
        BucketFilter::Later => annotated.retain(|a| a.category == Category::Later),
        BucketFilter::Past => annotated.retain(|a| a.category == Category::Past),
    }

    // Counts are over the filtered set; the sort below cannot change them.
    let mut counts = BucketCounts::default();
    for a in &annotated {
        match a.category {
            Category::Today => counts.today += 1,
            Category::Week => counts.week += 1,
            Category::Later => counts.later += 1,
            Category::Past => counts.past += 1,
        }
    }

    // Undated items sort as a far-future sentinel: last ascending, first
    // descending. All sorts are stable so ties keep their input order.
    let due_key = |a: &AnnotatedItem| a.item.due_at.unwrap_or(DateTime::<Utc>::MAX_UTC);
    match filters.sort {
        SortOrder::DueAsc => annotated.sort_by_key(due_key),
        SortOrder::DueDesc => annotated.sort_by(|a, b| due_key(b).cmp(&due_key(a))),
        SortOrder::CourseAsc => annotated.sort_by(|a, b| {
            let name_a = a.course_name.as_deref().unwrap_or("");
            let name_b = b.course_name.as_deref().unwrap_or("");
            name_a.cmp(name_b)
        }),
    }

    ViewModel {
        items: annotated,
        counts,
    }
}
