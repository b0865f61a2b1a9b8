// Canvas API endpoint functions.
// Typed domain operations layered over the relay-routed client.

use crate::error::Result;

use super::client::CanvasClient;
use super::types::{CourseMap, Profile, RawCourse, RawTodoItem, TodoItem};

impl CanvasClient {
    /// Fetch the authenticated user's profile. Used to verify a token
    /// before a session is created.
    pub async fn get_profile(&self) -> Result<Profile> {
        let page = self.fetch_page("api/v1/users/self/profile").await?;
        let profile: Profile = serde_json::from_value(page.value)?;
        Ok(profile)
    }

    /// Fetch all active-enrollment courses and build the id -> name map.
    pub async fn get_courses(&self) -> Result<CourseMap> {
        let courses: Vec<RawCourse> = self
            .fetch_all_pages("api/v1/courses?enrollment_state=active&per_page=100")
            .await?;

        Ok(courses
            .into_iter()
            .map(|c| (c.id, c.display_name()))
            .collect())
    }

    /// Fetch the full to-do collection, normalized at this boundary.
    pub async fn get_todo(&self) -> Result<Vec<TodoItem>> {
        let items: Vec<RawTodoItem> = self
            .fetch_all_pages("api/v1/users/self/todo?per_page=100")
            .await?;

        Ok(items.into_iter().map(TodoItem::from).collect())
    }
}
