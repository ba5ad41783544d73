use std::sync::Arc;

use uuid::Uuid;

use crate::dto::project_dto::{CreateProjectPayload, ProjectListQuery, UpdateProjectPayload};
use crate::error::{Error, Result};
use crate::models::post::{JobStatus, Post, PostRef};
use crate::models::profile::{Actor, Identity, Role};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectFilter, ProjectStatus};
use crate::services::profile_service::ProfileService;
use crate::services::slug_service::SlugService;
use crate::store::{MarketStore, Page, PageRequest, StoreError, PROJECT_JOB_UNIQUE};
use crate::utils::slug::SlugKind;
use crate::utils::validation::ensure_non_negative;

fn already_linked(post: PostRef) -> Error {
    Error::Conflict(format!("{} already has a project", post))
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn MarketStore>,
    profiles: ProfileService,
    slugs: SlugService,
}

impl ProjectService {
    pub fn new(store: Arc<dyn MarketStore>, profiles: ProfileService, slugs: SlugService) -> Self {
        Self {
            store,
            profiles,
            slugs,
        }
    }

    /// Opens a project directly, without an artist. When linked to one of
    /// the client's jobs, accepting an application on that job assigns it.
    pub async fn create(&self, identity: &Identity, payload: CreateProjectPayload) -> Result<Project> {
        ensure_non_negative("budget", Some(payload.budget))?;
        let client = self.profiles.resolve_actor(identity, Role::Client, None).await?;
        let client_id = client.profile_id();

        if let Some(job_post_id) = payload.job_post_id {
            let post = PostRef::Job(job_post_id);
            let job = match self.store.get_post(post).await? {
                Some(Post::Job(job)) if job.client_id == client_id => job,
                Some(_) => {
                    return Err(Error::Forbidden(format!(
                        "{} belongs to another client",
                        post
                    )))
                }
                None => return Err(Error::PostNotFound(post)),
            };
            if job.status != JobStatus::Open {
                return Err(Error::Conflict(format!(
                    "{} is {}, only open jobs take a project",
                    post, job.status
                )));
            }
            if self.store.find_project_for_job(job_post_id).await?.is_some() {
                return Err(already_linked(post));
            }
        }

        let project = self
            .slugs
            .write_with_slug(SlugKind::Project, &payload.title, None, |slug| {
                let store = self.store.clone();
                let new = NewProject {
                    client_id,
                    artist_id: None,
                    job_post_id: payload.job_post_id,
                    application_id: None,
                    title: payload.title.clone(),
                    slug,
                    description: payload.description.clone(),
                    budget: payload.budget,
                    deadline: payload.deadline,
                    status: ProjectStatus::Open,
                };
                async move { store.insert_project(new).await }
            })
            .await
            .map_err(|e| match (e, payload.job_post_id) {
                (Error::Storage(StoreError::UniqueViolation(c)), Some(job_post_id))
                    if c == PROJECT_JOB_UNIQUE =>
                {
                    already_linked(PostRef::Job(job_post_id))
                }
                (other, _) => other,
            })?;

        tracing::info!(project_id = %project.id, client_id = %client_id, "project created");
        Ok(project)
    }

    pub async fn get(&self, identity: &Identity, id: Uuid) -> Result<Project> {
        let project = self.load(id).await?;
        let is_artist = match project.artist_id {
            Some(artist_id) => self.profiles.owns(identity, Role::Artist, artist_id).await?,
            None => false,
        };
        if is_artist || self.profiles.owns(identity, Role::Client, project.client_id).await? {
            Ok(project)
        } else {
            Err(Error::Forbidden(format!("not a party to project {}", id)))
        }
    }

    /// Projects of the caller's own profile; admins see everything.
    pub async fn list(&self, identity: &Identity, query: ProjectListQuery) -> Result<Page<Project>> {
        let status = query
            .status
            .as_deref()
            .map(str::parse::<ProjectStatus>)
            .transpose()
            .map_err(|e| Error::InvalidStatus(e.to_string()))?;

        let mut filter = ProjectFilter {
            status,
            ..ProjectFilter::default()
        };
        if !identity.is_admin() {
            match self.profiles.resolve_actor(identity, identity.role, None).await? {
                Actor::Artist { artist_id, .. } => filter.artist_id = Some(artist_id),
                Actor::Client { client_id, .. } => filter.client_id = Some(client_id),
            }
        }

        let page = PageRequest::new(query.page, query.per_page);
        Ok(self.store.list_projects(&filter, page).await?)
    }

    /// Renames a project, moving its slug along with the title.
    pub async fn update_title(&self, identity: &Identity, id: Uuid, payload: UpdateProjectPayload) -> Result<Project> {
        let project = self.load(id).await?;
        if !self.profiles.owns(identity, Role::Client, project.client_id).await? {
            return Err(Error::Forbidden(format!(
                "only the client may rename project {}",
                id
            )));
        }
        if project.title == payload.title {
            return Ok(project);
        }

        self.slugs
            .write_with_slug(SlugKind::Project, &payload.title, Some(id), |slug| {
                let store = self.store.clone();
                let changes = ProjectChanges {
                    title: Some(payload.title.clone()),
                    slug: Some(slug),
                    ..ProjectChanges::default()
                };
                async move { store.update_project(id, changes).await }
            })
            .await?
            .ok_or_else(|| Error::NotFound(format!("project {}", id)))
    }

    async fn load(&self, id: Uuid) -> Result<Project> {
        self.store
            .get_project(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("project {}", id)))
    }
}
