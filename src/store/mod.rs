//! Persistence contracts the marketplace engine depends on.
//!
//! Compound operations (`apply_acceptance`, `apply_conversion`,
//! `insert_application`, `delete_post`) are atomic: an implementation either
//! applies every write they describe or none of them. Status changes are
//! guarded by the expected current status, so a concurrent writer that got
//! there first makes the call return `None` instead of overwriting.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationFilter, ApplicationStatus, NewApplication};
use crate::models::notification::{NewNotification, Notification};
use crate::models::post::{
    AvailabilityPost, JobPost, NewAvailabilityPost, NewJobPost, Post, PostChanges, PostDeletion,
    PostFilter, PostKind, PostRef, PostStatus,
};
use crate::models::profile::{ArtistProfile, ClientProfile, NewArtistProfile, NewClientProfile, Role};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectFilter};
use crate::models::ParseEnumError;
use crate::utils::slug::SlugKind;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Unique index preventing an artist from applying twice to one job.
pub const ARTIST_JOB_UNIQUE: &str = "applications_artist_job_unique";
/// Unique index allowing one profile per role per user.
pub const ARTIST_USER_UNIQUE: &str = "artist_profiles_user_unique";
pub const CLIENT_USER_UNIQUE: &str = "client_profiles_user_unique";
/// Unique index allowing at most one project per job post.
pub const PROJECT_JOB_UNIQUE: &str = "projects_job_post_unique";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("slug already taken in {0}")]
    SlugConflict(SlugKind),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<ParseEnumError> for StoreError {
    fn from(err: ParseEnumError) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(20).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let total_pages = ((total as f64) / (request.per_page as f64)).ceil() as i64;
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Result of accepting one application on a post.
#[derive(Debug, Clone)]
pub struct AcceptanceOutcome {
    pub accepted: Application,
    /// Sibling applications that were still pending and got rejected.
    pub rejected: Vec<Application>,
    /// Project already linked to the job that was assigned to the artist.
    pub project: Option<Project>,
}

#[derive(Debug, Clone)]
pub enum ProjectSource {
    Create(NewProject),
    /// Reuse the project a client created up front for the job.
    Adopt { project_id: Uuid, changes: ProjectChanges },
}

#[derive(Debug, Clone)]
pub struct ConversionPlan {
    pub application_id: i64,
    pub project: ProjectSource,
    pub post: PostRef,
    pub post_status: PostStatus,
}

#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub application: Application,
    pub project: Project,
    pub post: Post,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Mirrors an upstream-verified user locally so it can own profiles and
    /// receive notifications.
    async fn upsert_user(&self, user_id: Uuid) -> StoreResult<()>;

    async fn find_profile_id(&self, user_id: Uuid, role: Role) -> StoreResult<Option<Uuid>>;

    async fn profile_user_id(&self, role: Role, profile_id: Uuid) -> StoreResult<Option<Uuid>>;

    async fn insert_artist_profile(&self, profile: NewArtistProfile) -> StoreResult<ArtistProfile>;

    async fn insert_client_profile(&self, profile: NewClientProfile) -> StoreResult<ClientProfile>;

    async fn get_artist_profile(&self, id: Uuid) -> StoreResult<Option<ArtistProfile>>;
}

#[async_trait]
pub trait SlugStore: Send + Sync {
    /// Whether `slug` is in use within `kind`, ignoring the row `exclude`.
    async fn slug_taken(&self, kind: SlugKind, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_job_post(&self, post: NewJobPost) -> StoreResult<JobPost>;

    async fn insert_availability_post(&self, post: NewAvailabilityPost) -> StoreResult<AvailabilityPost>;

    async fn get_post(&self, post: PostRef) -> StoreResult<Option<Post>>;

    async fn find_post_by_slug(&self, kind: PostKind, slug: &str) -> StoreResult<Option<Post>>;

    async fn list_posts(&self, kind: PostKind, filter: &PostFilter, page: PageRequest) -> StoreResult<Page<Post>>;

    async fn update_post(&self, post: PostRef, changes: PostChanges) -> StoreResult<Option<Post>>;

    async fn set_post_status(&self, post: PostRef, status: PostStatus) -> StoreResult<Option<Post>>;

    /// Atomic `view_count + 1`. Returns false when the post does not exist.
    async fn increment_view_count(&self, post: PostRef) -> StoreResult<bool>;

    /// Deletes the post together with its rejected applications, unless a
    /// pending, accepted or converted application still references it.
    async fn delete_post(&self, post: PostRef) -> StoreResult<PostDeletion>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn get_application(&self, id: i64) -> StoreResult<Option<Application>>;

    async fn list_applications(&self, filter: &ApplicationFilter, page: PageRequest) -> StoreResult<Page<Application>>;

    async fn find_artist_application(&self, job_post_id: Uuid, artist_id: Uuid) -> StoreResult<Option<Application>>;

    /// Persists a pending application and bumps the post's application
    /// counter in the same write.
    async fn insert_application(&self, application: NewApplication) -> StoreResult<Application>;

    /// Moves the application from `from` to `to`; `None` when it was no
    /// longer in `from`.
    async fn transition_application(
        &self,
        id: i64,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> StoreResult<Option<Application>>;

    /// Accepts a pending application, rejects every other pending
    /// application on the same post and, for jobs, assigns the artist to an
    /// open project linked to the job. `None` when the application was no
    /// longer pending.
    async fn apply_acceptance(&self, id: i64) -> StoreResult<Option<AcceptanceOutcome>>;

    /// Materializes the project, marks the application converted and moves
    /// the post to `plan.post_status`. `None` when the application was no
    /// longer accepted.
    async fn apply_conversion(&self, plan: ConversionPlan) -> StoreResult<Option<ConversionOutcome>>;

    /// Deletes a pending or rejected application. Returns false otherwise.
    async fn delete_application(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn find_project_for_job(&self, job_post_id: Uuid) -> StoreResult<Option<Project>>;

    async fn list_projects(&self, filter: &ProjectFilter, page: PageRequest) -> StoreResult<Page<Project>>;

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn recipient_exists(&self, user_id: Uuid) -> StoreResult<bool>;

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification>;

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> StoreResult<Page<Notification>>;

    async fn unread_count(&self, user_id: Uuid) -> StoreResult<i64>;

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>>;

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64>;

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

/// Everything the marketplace services need from one backend.
pub trait MarketStore:
    ProfileStore + SlugStore + PostStore + ApplicationStore + ProjectStore + NotificationStore
{
}

impl<T> MarketStore for T where
    T: ProfileStore + SlugStore + PostStore + ApplicationStore + ProjectStore + NotificationStore
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_requests_are_clamped() {
        let page = PageRequest::new(Some(0), Some(1_000));
        assert_eq!((page.page, page.per_page), (1, 100));
        assert_eq!(page.offset(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_numbers_saturate_instead_of_overflowing() {
        let page = PageRequest::new(Some(i64::MAX), Some(100));
        assert_eq!(page.offset(), i64::MAX);
    }
}
