//! In-process [`MarketStore`](super::MarketStore) backend.
//!
//! All state sits behind one async mutex, so every trait call is atomic and
//! concurrent calls serialize the same way row locks do in Postgres.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AcceptanceOutcome, ApplicationStore, ConversionOutcome, ConversionPlan, NotificationStore, Page,
    PageRequest, PostStore, ProfileStore, ProjectSource, ProjectStore, SlugStore, StoreError,
    StoreResult, ARTIST_JOB_UNIQUE, ARTIST_USER_UNIQUE, CLIENT_USER_UNIQUE, PROJECT_JOB_UNIQUE,
};
use crate::models::application::{Application, ApplicationFilter, ApplicationStatus, ApplicationType, NewApplication};
use crate::models::notification::{NewNotification, Notification};
use crate::models::post::{
    AvailabilityPost, JobPost, NewAvailabilityPost, NewJobPost, Post, PostChanges, PostDeletion,
    PostFilter, PostKind, PostRef, PostStatus,
};
use crate::models::profile::{ArtistProfile, ClientProfile, NewArtistProfile, NewClientProfile, Role};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectFilter, ProjectStatus, PaymentStatus};
use crate::utils::slug::SlugKind;

#[derive(Default)]
struct State {
    users: HashSet<Uuid>,
    artists: HashMap<Uuid, ArtistProfile>,
    clients: HashMap<Uuid, ClientProfile>,
    job_posts: HashMap<Uuid, JobPost>,
    availability_posts: HashMap<Uuid, AvailabilityPost>,
    applications: BTreeMap<i64, Application>,
    next_application_id: i64,
    projects: HashMap<Uuid, Project>,
    notifications: HashMap<Uuid, Notification>,
}

impl State {
    fn slug_taken(&self, kind: SlugKind, slug: &str, exclude: Option<Uuid>) -> bool {
        let other = |id: Uuid| Some(id) != exclude;
        match kind {
            SlugKind::JobPost => self.job_posts.values().any(|p| p.slug == slug && other(p.id)),
            SlugKind::AvailabilityPost => self
                .availability_posts
                .values()
                .any(|p| p.slug == slug && other(p.id)),
            SlugKind::Project => self.projects.values().any(|p| p.slug == slug && other(p.id)),
            SlugKind::ArtistProfile => self.artists.values().any(|p| p.slug == slug && other(p.id)),
        }
    }

    fn ensure_slug_free(&self, kind: SlugKind, slug: &str, exclude: Option<Uuid>) -> StoreResult<()> {
        if self.slug_taken(kind, slug, exclude) {
            return Err(StoreError::SlugConflict(kind));
        }
        Ok(())
    }

    fn post(&self, post: PostRef) -> Option<Post> {
        match post {
            PostRef::Job(id) => self.job_posts.get(&id).cloned().map(Post::Job),
            PostRef::Availability(id) => self.availability_posts.get(&id).cloned().map(Post::Availability),
        }
    }

    fn set_post_status(&mut self, post: PostRef, status: PostStatus) -> StoreResult<Option<Post>> {
        let now = Utc::now();
        match (post, status) {
            (PostRef::Job(id), PostStatus::Job(status)) => Ok(self.job_posts.get_mut(&id).map(|p| {
                p.status = status;
                p.updated_at = now;
                Post::Job(p.clone())
            })),
            (PostRef::Availability(id), PostStatus::Availability(status)) => {
                Ok(self.availability_posts.get_mut(&id).map(|p| {
                    p.status = status;
                    p.updated_at = now;
                    Post::Availability(p.clone())
                }))
            }
            (post, status) => Err(StoreError::Corrupt(format!(
                "status {} does not apply to {}",
                status.as_str(),
                post
            ))),
        }
    }

    fn insert_project(&mut self, project: NewProject) -> StoreResult<Project> {
        if let Some(job_post_id) = project.job_post_id {
            if self.project_for_job(job_post_id).is_some() {
                return Err(StoreError::UniqueViolation(PROJECT_JOB_UNIQUE.to_string()));
            }
        }
        self.ensure_slug_free(SlugKind::Project, &project.slug, None)?;
        let now = Utc::now();
        let row = Project {
            id: Uuid::new_v4(),
            client_id: project.client_id,
            artist_id: project.artist_id,
            job_post_id: project.job_post_id,
            application_id: project.application_id,
            title: project.title,
            slug: project.slug,
            description: project.description,
            budget: project.budget,
            deadline: project.deadline,
            status: project.status,
            payment_status: PaymentStatus::Unpaid,
            created_at: now,
            updated_at: now,
        };
        self.projects.insert(row.id, row.clone());
        Ok(row)
    }

    fn project_for_job(&self, job_post_id: Uuid) -> Option<&Project> {
        self.projects
            .values()
            .filter(|p| p.job_post_id == Some(job_post_id))
            .min_by_key(|p| (p.created_at, p.id))
    }

    fn update_project(&mut self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        if let Some(slug) = &changes.slug {
            self.ensure_slug_free(SlugKind::Project, slug, Some(id))?;
        }
        let Some(project) = self.projects.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            project.title = title;
        }
        if let Some(slug) = changes.slug {
            project.slug = slug;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(budget) = changes.budget {
            project.budget = budget;
        }
        if let Some(deadline) = changes.deadline {
            project.deadline = Some(deadline);
        }
        if let Some(artist_id) = changes.artist_id {
            project.artist_id = Some(artist_id);
        }
        if let Some(application_id) = changes.application_id {
            project.application_id = Some(application_id);
        }
        if let Some(status) = changes.status {
            project.status = status;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }
}

fn paginate<T>(mut items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as i64;
    let start = (page.offset() as usize).min(items.len());
    let end = (start + page.per_page as usize).min(items.len());
    let items = items.drain(start..end).collect();
    Page::new(items, total, page)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn upsert_user(&self, user_id: Uuid) -> StoreResult<()> {
        self.state.lock().await.users.insert(user_id);
        Ok(())
    }

    async fn find_profile_id(&self, user_id: Uuid, role: Role) -> StoreResult<Option<Uuid>> {
        let state = self.state.lock().await;
        let id = match role {
            Role::Artist => state.artists.values().find(|p| p.user_id == user_id).map(|p| p.id),
            Role::Client => state.clients.values().find(|p| p.user_id == user_id).map(|p| p.id),
            Role::Admin => None,
        };
        Ok(id)
    }

    async fn profile_user_id(&self, role: Role, profile_id: Uuid) -> StoreResult<Option<Uuid>> {
        let state = self.state.lock().await;
        let user = match role {
            Role::Artist => state.artists.get(&profile_id).map(|p| p.user_id),
            Role::Client => state.clients.get(&profile_id).map(|p| p.user_id),
            Role::Admin => None,
        };
        Ok(user)
    }

    async fn insert_artist_profile(&self, profile: NewArtistProfile) -> StoreResult<ArtistProfile> {
        let mut state = self.state.lock().await;
        if state.artists.values().any(|p| p.user_id == profile.user_id) {
            return Err(StoreError::UniqueViolation(ARTIST_USER_UNIQUE.to_string()));
        }
        state.ensure_slug_free(SlugKind::ArtistProfile, &profile.slug, None)?;
        let row = ArtistProfile {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            display_name: profile.display_name,
            slug: profile.slug,
            created_at: Utc::now(),
        };
        state.users.insert(row.user_id);
        state.artists.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_client_profile(&self, profile: NewClientProfile) -> StoreResult<ClientProfile> {
        let mut state = self.state.lock().await;
        if state.clients.values().any(|p| p.user_id == profile.user_id) {
            return Err(StoreError::UniqueViolation(CLIENT_USER_UNIQUE.to_string()));
        }
        let row = ClientProfile {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            company_name: profile.company_name,
            created_at: Utc::now(),
        };
        state.users.insert(row.user_id);
        state.clients.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_artist_profile(&self, id: Uuid) -> StoreResult<Option<ArtistProfile>> {
        Ok(self.state.lock().await.artists.get(&id).cloned())
    }
}

#[async_trait]
impl SlugStore for MemoryStore {
    async fn slug_taken(&self, kind: SlugKind, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        Ok(self.state.lock().await.slug_taken(kind, slug, exclude))
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_job_post(&self, post: NewJobPost) -> StoreResult<JobPost> {
        let mut state = self.state.lock().await;
        state.ensure_slug_free(SlugKind::JobPost, &post.slug, None)?;
        let now = Utc::now();
        let row = JobPost {
            id: Uuid::new_v4(),
            client_id: post.client_id,
            title: post.title,
            slug: post.slug,
            description: post.description,
            category: post.category,
            budget: post.budget,
            deadline: post.deadline,
            status: post.status,
            view_count: 0,
            application_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.job_posts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_availability_post(&self, post: NewAvailabilityPost) -> StoreResult<AvailabilityPost> {
        let mut state = self.state.lock().await;
        state.ensure_slug_free(SlugKind::AvailabilityPost, &post.slug, None)?;
        let now = Utc::now();
        let row = AvailabilityPost {
            id: Uuid::new_v4(),
            artist_id: post.artist_id,
            title: post.title,
            slug: post.slug,
            description: post.description,
            category: post.category,
            budget: post.budget,
            status: post.status,
            view_count: 0,
            application_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.availability_posts.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_post(&self, post: PostRef) -> StoreResult<Option<Post>> {
        Ok(self.state.lock().await.post(post))
    }

    async fn find_post_by_slug(&self, kind: PostKind, slug: &str) -> StoreResult<Option<Post>> {
        let state = self.state.lock().await;
        let found = match kind {
            PostKind::Job => state
                .job_posts
                .values()
                .find(|p| p.slug == slug)
                .cloned()
                .map(Post::Job),
            PostKind::Availability => state
                .availability_posts
                .values()
                .find(|p| p.slug == slug)
                .cloned()
                .map(Post::Availability),
        };
        Ok(found)
    }

    async fn list_posts(&self, kind: PostKind, filter: &PostFilter, page: PageRequest) -> StoreResult<Page<Post>> {
        let state = self.state.lock().await;
        let mut posts: Vec<Post> = match kind {
            PostKind::Job => state.job_posts.values().cloned().map(Post::Job).collect(),
            PostKind::Availability => state
                .availability_posts
                .values()
                .cloned()
                .map(Post::Availability)
                .collect(),
        };
        posts.retain(|post| {
            filter.status.map_or(true, |s| post.status() == s)
                && filter.owner_id.map_or(true, |o| post.owner_id() == o)
                && filter.category.map_or(true, |c| match post {
                    Post::Job(p) => p.category == c,
                    Post::Availability(p) => p.category == c,
                })
        });
        posts.sort_by_key(|post| {
            std::cmp::Reverse(match post {
                Post::Job(p) => p.created_at,
                Post::Availability(p) => p.created_at,
            })
        });
        Ok(paginate(posts, page))
    }

    async fn update_post(&self, post: PostRef, changes: PostChanges) -> StoreResult<Option<Post>> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        match post {
            PostRef::Job(id) => {
                if let Some(slug) = &changes.slug {
                    state.ensure_slug_free(SlugKind::JobPost, slug, Some(id))?;
                }
                let Some(p) = state.job_posts.get_mut(&id) else {
                    return Ok(None);
                };
                if let Some(title) = changes.title {
                    p.title = title;
                }
                if let Some(slug) = changes.slug {
                    p.slug = slug;
                }
                if let Some(description) = changes.description {
                    p.description = description;
                }
                if let Some(category) = changes.category {
                    p.category = category;
                }
                if let Some(budget) = changes.budget {
                    p.budget = budget;
                }
                if let Some(deadline) = changes.deadline {
                    p.deadline = Some(deadline);
                }
                p.updated_at = now;
                Ok(Some(Post::Job(p.clone())))
            }
            PostRef::Availability(id) => {
                if let Some(slug) = &changes.slug {
                    state.ensure_slug_free(SlugKind::AvailabilityPost, slug, Some(id))?;
                }
                let Some(p) = state.availability_posts.get_mut(&id) else {
                    return Ok(None);
                };
                if let Some(title) = changes.title {
                    p.title = title;
                }
                if let Some(slug) = changes.slug {
                    p.slug = slug;
                }
                if let Some(description) = changes.description {
                    p.description = description;
                }
                if let Some(category) = changes.category {
                    p.category = category;
                }
                if let Some(budget) = changes.budget {
                    p.budget = budget;
                }
                p.updated_at = now;
                Ok(Some(Post::Availability(p.clone())))
            }
        }
    }

    async fn set_post_status(&self, post: PostRef, status: PostStatus) -> StoreResult<Option<Post>> {
        self.state.lock().await.set_post_status(post, status)
    }

    async fn increment_view_count(&self, post: PostRef) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let counter = match post {
            PostRef::Job(id) => state.job_posts.get_mut(&id).map(|p| &mut p.view_count),
            PostRef::Availability(id) => state.availability_posts.get_mut(&id).map(|p| &mut p.view_count),
        };
        Ok(counter.map(|count| *count += 1).is_some())
    }

    async fn delete_post(&self, post: PostRef) -> StoreResult<PostDeletion> {
        let mut state = self.state.lock().await;
        if state.post(post).is_none() {
            return Ok(PostDeletion::NotFound);
        }
        let blocked = state
            .applications
            .values()
            .any(|a| a.post == post && a.status != ApplicationStatus::Rejected);
        if blocked {
            return Ok(PostDeletion::Blocked);
        }
        state.applications.retain(|_, a| a.post != post);
        match post {
            PostRef::Job(id) => {
                state.job_posts.remove(&id);
                for project in state.projects.values_mut() {
                    if project.job_post_id == Some(id) {
                        project.job_post_id = None;
                    }
                }
            }
            PostRef::Availability(id) => {
                state.availability_posts.remove(&id);
            }
        }
        Ok(PostDeletion::Deleted)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn get_application(&self, id: i64) -> StoreResult<Option<Application>> {
        Ok(self.state.lock().await.applications.get(&id).cloned())
    }

    async fn list_applications(&self, filter: &ApplicationFilter, page: PageRequest) -> StoreResult<Page<Application>> {
        let state = self.state.lock().await;
        let mut items: Vec<Application> = state
            .applications
            .values()
            .filter(|a| {
                filter.post.map_or(true, |p| a.post == p)
                    && filter.artist_id.map_or(true, |id| a.artist_id == id)
                    && filter.client_id.map_or(true, |id| a.client_id == id)
                    && filter.status.map_or(true, |s| a.status == s)
                    && filter.application_type.map_or(true, |t| a.application_type == t)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(items, page))
    }

    async fn find_artist_application(&self, job_post_id: Uuid, artist_id: Uuid) -> StoreResult<Option<Application>> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .values()
            .find(|a| {
                a.application_type == ApplicationType::ArtistToJob
                    && a.post == PostRef::Job(job_post_id)
                    && a.artist_id == artist_id
            })
            .cloned())
    }

    async fn insert_application(&self, application: NewApplication) -> StoreResult<Application> {
        let mut state = self.state.lock().await;
        if application.application_type == ApplicationType::ArtistToJob {
            let duplicate = state.applications.values().any(|a| {
                a.application_type == ApplicationType::ArtistToJob
                    && a.post == application.post
                    && a.artist_id == application.artist_id
            });
            if duplicate {
                return Err(StoreError::UniqueViolation(ARTIST_JOB_UNIQUE.to_string()));
            }
        }
        let counter = match application.post {
            PostRef::Job(id) => state.job_posts.get_mut(&id).map(|p| &mut p.application_count),
            PostRef::Availability(id) => state
                .availability_posts
                .get_mut(&id)
                .map(|p| &mut p.application_count),
        };
        match counter {
            Some(count) => *count += 1,
            None => {
                return Err(StoreError::Corrupt(format!(
                    "application references missing {}",
                    application.post
                )))
            }
        }

        state.next_application_id += 1;
        let now = Utc::now();
        let row = Application {
            id: state.next_application_id,
            application_type: application.application_type,
            post: application.post,
            artist_id: application.artist_id,
            client_id: application.client_id,
            message: application.message,
            proposed_budget: application.proposed_budget,
            proposed_deadline: application.proposed_deadline,
            status: ApplicationStatus::Pending,
            project_id: None,
            created_at: now,
            updated_at: now,
        };
        state.applications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn transition_application(
        &self,
        id: i64,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        let mut state = self.state.lock().await;
        Ok(state
            .applications
            .get_mut(&id)
            .filter(|a| a.status == from)
            .map(|a| {
                a.status = to;
                a.updated_at = Utc::now();
                a.clone()
            }))
    }

    async fn apply_acceptance(&self, id: i64) -> StoreResult<Option<AcceptanceOutcome>> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let post = match state.applications.get(&id) {
            Some(app) if app.status == ApplicationStatus::Pending => app.post,
            _ => return Ok(None),
        };
        // A post has at most one winner, including offers made after the first accept.
        if state.applications.values().any(|a| a.post == post && a.status.is_winner()) {
            return Ok(None);
        }

        let accepted = match state.applications.get_mut(&id) {
            Some(app) => {
                app.status = ApplicationStatus::Accepted;
                app.updated_at = now;
                app.clone()
            }
            None => return Ok(None),
        };

        let mut rejected = Vec::new();
        for app in state.applications.values_mut() {
            if app.post == accepted.post && app.id != id && app.status == ApplicationStatus::Pending {
                app.status = ApplicationStatus::Rejected;
                app.updated_at = now;
                rejected.push(app.clone());
            }
        }

        let open_project = match accepted.post {
            PostRef::Job(job_post_id) => state
                .project_for_job(job_post_id)
                .filter(|p| p.status == ProjectStatus::Open)
                .map(|p| p.id),
            PostRef::Availability(_) => None,
        };
        let project = match open_project {
            Some(project_id) => state
                .projects
                .get_mut(&project_id)
                .map(|p| {
                    p.artist_id = Some(accepted.artist_id);
                    p.status = ProjectStatus::InProgress;
                    p.updated_at = now;
                    p.clone()
                }),
            None => None,
        };

        Ok(Some(AcceptanceOutcome {
            accepted,
            rejected,
            project,
        }))
    }

    async fn apply_conversion(&self, plan: ConversionPlan) -> StoreResult<Option<ConversionOutcome>> {
        let mut state = self.state.lock().await;

        match state.applications.get(&plan.application_id) {
            Some(app) if app.status == ApplicationStatus::Accepted => {}
            _ => return Ok(None),
        }
        if state.post(plan.post).is_none() || plan.post_status.kind() != plan.post.kind() {
            return Err(StoreError::Corrupt(format!(
                "cannot move {} to {}",
                plan.post,
                plan.post_status.as_str()
            )));
        }
        match &plan.project {
            ProjectSource::Create(project) => {
                state.ensure_slug_free(SlugKind::Project, &project.slug, None)?;
            }
            ProjectSource::Adopt { project_id, changes } => {
                if !state.projects.contains_key(project_id) {
                    return Err(StoreError::Corrupt(format!("adopting missing project {}", project_id)));
                }
                if let Some(slug) = &changes.slug {
                    state.ensure_slug_free(SlugKind::Project, slug, Some(*project_id))?;
                }
            }
        }

        let project = match plan.project {
            ProjectSource::Create(project) => state.insert_project(project)?,
            ProjectSource::Adopt { project_id, changes } => state
                .update_project(project_id, changes)?
                .ok_or_else(|| StoreError::Corrupt(format!("adopting missing project {}", project_id)))?,
        };
        let post = state
            .set_post_status(plan.post, plan.post_status)?
            .ok_or_else(|| StoreError::Corrupt(format!("conversion of missing {}", plan.post)))?;

        let application = match state.applications.get_mut(&plan.application_id) {
            Some(app) => {
                app.status = ApplicationStatus::ConvertedToProject;
                app.project_id = Some(project.id);
                app.updated_at = Utc::now();
                app.clone()
            }
            None => return Ok(None),
        };

        Ok(Some(ConversionOutcome {
            application,
            project,
            post,
        }))
    }

    async fn delete_application(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let withdrawable = state
            .applications
            .get(&id)
            .map_or(false, |a| a.status.is_withdrawable());
        if withdrawable {
            state.applications.remove(&id);
        }
        Ok(withdrawable)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        self.state.lock().await.insert_project(project)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.state.lock().await.projects.get(&id).cloned())
    }

    async fn find_project_for_job(&self, job_post_id: Uuid) -> StoreResult<Option<Project>> {
        let state = self.state.lock().await;
        Ok(state.project_for_job(job_post_id).cloned())
    }

    async fn list_projects(&self, filter: &ProjectFilter, page: PageRequest) -> StoreResult<Page<Project>> {
        let state = self.state.lock().await;
        let mut items: Vec<Project> = state
            .projects
            .values()
            .filter(|p| {
                filter.client_id.map_or(true, |id| p.client_id == id)
                    && filter.artist_id.map_or(true, |id| p.artist_id == Some(id))
                    && filter.status.map_or(true, |s| p.status == s)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, page))
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        self.state.lock().await.update_project(id, changes)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn recipient_exists(&self, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.state.lock().await.users.contains(&user_id))
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        let mut state = self.state.lock().await;
        let row = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            from_user_id: notification.from_user_id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            link: notification.link,
            project_id: notification.project_id,
            application_id: notification.application_id,
            priority: notification.priority,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        state.notifications.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> StoreResult<Page<Notification>> {
        let state = self.state.lock().await;
        let mut items: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, page))
    }

    async fn unread_count(&self, user_id: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>> {
        let mut state = self.state.lock().await;
        Ok(state
            .notifications
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .map(|n| {
                if !n.is_read {
                    n.is_read = true;
                    n.read_at = Some(Utc::now());
                }
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut updated = 0;
        for n in state.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let owned = state.notifications.get(&id).map_or(false, |n| n.user_id == user_id);
        if owned {
            state.notifications.remove(&id);
        }
        Ok(owned)
    }
}
