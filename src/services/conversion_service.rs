use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::dto::application_dto::ConvertApplicationPayload;
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::notification::{NotificationTemplate, NotificationType, Priority};
use crate::models::post::{AvailabilityStatus, JobStatus, Post, PostRef, PostStatus};
use crate::models::profile::{Identity, Role};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectStatus};
use crate::services::notification_service::NotificationService;
use crate::services::profile_service::ProfileService;
use crate::services::slug_service::SlugService;
use crate::store::{ConversionPlan, MarketStore, ProjectSource};
use crate::utils::slug::SlugKind;
use crate::utils::validation::ensure_non_negative;

/// Status the originating post takes once its application became a project.
fn closed_status(post: PostRef) -> PostStatus {
    match post {
        PostRef::Job(_) => PostStatus::Job(JobStatus::InProgress),
        PostRef::Availability(_) => PostStatus::Availability(AvailabilityStatus::Closed),
    }
}

/// Terms of the project: caller overrides first, then the application's
/// proposal (deadline only), then the originating post.
struct Terms {
    title: String,
    description: String,
    budget: Decimal,
    deadline: Option<DateTime<Utc>>,
}

impl Terms {
    fn resolve(payload: ConvertApplicationPayload, application: &Application, post: &Post) -> Self {
        let post_deadline = match post {
            Post::Job(job) => job.deadline,
            Post::Availability(_) => None,
        };
        Self {
            title: payload.title.unwrap_or_else(|| post.title().to_string()),
            description: payload
                .description
                .unwrap_or_else(|| post.description().to_string()),
            budget: payload.budget.unwrap_or_else(|| post.budget()),
            deadline: payload
                .deadline
                .or(application.proposed_deadline)
                .or(post_deadline),
        }
    }
}

#[derive(Clone)]
pub struct ConversionService {
    store: Arc<dyn MarketStore>,
    profiles: ProfileService,
    slugs: SlugService,
    notifications: NotificationService,
}

impl ConversionService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        profiles: ProfileService,
        slugs: SlugService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            profiles,
            slugs,
            notifications,
        }
    }

    /// Turns an accepted application into a project. The project write, the
    /// application's move to `converted_to_project` and the post status
    /// change are applied together or not at all.
    pub async fn convert(
        &self,
        identity: &Identity,
        id: i64,
        payload: ConvertApplicationPayload,
    ) -> Result<Project> {
        ensure_non_negative("budget", payload.budget)?;
        let application = self
            .store
            .get_application(id)
            .await?
            .ok_or(Error::ApplicationNotFound(id))?;
        let is_party = self
            .profiles
            .owns(identity, Role::Artist, application.artist_id)
            .await?
            || self
                .profiles
                .owns(identity, Role::Client, application.client_id)
                .await?;
        if !is_party {
            return Err(Error::Forbidden(format!(
                "not a party to application {}",
                id
            )));
        }

        if application.status != ApplicationStatus::Accepted {
            return Err(Error::ApplicationNotAccepted {
                id,
                status: application.status,
            });
        }

        let post = self
            .store
            .get_post(application.post)
            .await?
            .ok_or(Error::PostNotFound(application.post))?;
        let terms = Terms::resolve(payload, &application, &post);

        // A project the client opened up front for this job is reused so
        // the job never ends up with two.
        let adopted = match application.post {
            PostRef::Job(job_post_id) => self
                .store
                .find_project_for_job(job_post_id)
                .await?
                .filter(|p| p.application_id.map_or(true, |linked| linked == id)),
            PostRef::Availability(_) => None,
        };

        let plan = |slug: Option<String>| {
            let project = match &adopted {
                Some(existing) => ProjectSource::Adopt {
                    project_id: existing.id,
                    changes: ProjectChanges {
                        title: Some(terms.title.clone()),
                        slug,
                        description: Some(terms.description.clone()),
                        budget: Some(terms.budget),
                        deadline: terms.deadline,
                        artist_id: Some(application.artist_id),
                        application_id: Some(id),
                        status: Some(ProjectStatus::InProgress),
                    },
                },
                None => ProjectSource::Create(NewProject {
                    client_id: application.client_id,
                    artist_id: Some(application.artist_id),
                    job_post_id: application.post.job_post_id(),
                    application_id: Some(id),
                    title: terms.title.clone(),
                    slug: slug.unwrap_or_default(),
                    description: terms.description.clone(),
                    budget: terms.budget,
                    deadline: terms.deadline,
                    status: ProjectStatus::InProgress,
                }),
            };
            ConversionPlan {
                application_id: id,
                project,
                post: application.post,
                post_status: closed_status(application.post),
            }
        };

        let outcome = match &adopted {
            Some(existing) if existing.title == terms.title => {
                self.store.apply_conversion(plan(None)).await?
            }
            _ => {
                let exclude = adopted.as_ref().map(|p| p.id);
                self.slugs
                    .write_with_slug(SlugKind::Project, &terms.title, exclude, |slug| {
                        let store = self.store.clone();
                        let plan = plan(Some(slug));
                        async move { store.apply_conversion(plan).await }
                    })
                    .await?
            }
        };

        let outcome = match outcome {
            Some(outcome) => outcome,
            None => {
                let status = self
                    .store
                    .get_application(id)
                    .await?
                    .map(|a| a.status)
                    .ok_or(Error::ApplicationNotFound(id))?;
                return Err(Error::ApplicationNotAccepted { id, status });
            }
        };

        let project = outcome.project;
        tracing::info!(
            application_id = id,
            project_id = %project.id,
            post = %outcome.post.post_ref(),
            post_status = outcome.post.status().as_str(),
            adopted = adopted.is_some(),
            "application converted to project"
        );

        let template = NotificationTemplate::new(
            NotificationType::ProjectCreated,
            "Project created",
            format!("\"{}\" is now a project", project.title),
        )
        .from_user(identity.user_id)
        .project(project.id)
        .application(id)
        .priority(Priority::High)
        .link(format!("/projects/{}", project.id));
        let mut recipients = Vec::with_capacity(2);
        for (role, profile_id) in [
            (Role::Artist, application.artist_id),
            (Role::Client, application.client_id),
        ] {
            if let Some(user_id) = self.profiles.recipient_user(role, profile_id).await {
                recipients.push(user_id);
            }
        }
        self.notifications.emit_many(&recipients, &template).await;

        Ok(project)
    }
}
