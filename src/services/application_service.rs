//! Offer creation and the application state machine.
//!
//! Creation resolves the acting party, validates the target post and
//! persists a pending application. Status updates validate the transition,
//! then hand the whole cascade (accept, reject siblings, assign the job's
//! project) to the store as one atomic write. Notifications go out only after
//! that write has committed and never affect its outcome.

use std::sync::Arc;

use uuid::Uuid;

use crate::dto::application_dto::{
    ApplicationListQuery, CreateApplicationPayload, UpdateApplicationStatusPayload,
};
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationFilter, ApplicationStatus, ApplicationType, NewApplication,
};
use crate::models::notification::{NotificationTemplate, NotificationType, Priority};
use crate::models::post::{JobStatus, Post, PostRef};
use crate::models::profile::{Actor, Identity, Role};
use crate::services::notification_service::NotificationService;
use crate::services::profile_service::ProfileService;
use crate::store::{AcceptanceOutcome, MarketStore, Page, PageRequest, StoreError, ARTIST_JOB_UNIQUE};
use crate::utils::validation::ensure_non_negative;

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn MarketStore>,
    profiles: ProfileService,
    notifications: NotificationService,
}

/// Post an offer targets, derived from the payload's type and post ids.
fn target_post(payload: &CreateApplicationPayload) -> Result<PostRef> {
    match (
        payload.application_type,
        payload.job_post_id,
        payload.availability_post_id,
    ) {
        (ApplicationType::ArtistToJob, Some(id), None) => Ok(PostRef::Job(id)),
        (ApplicationType::ClientToService, None, Some(id)) => Ok(PostRef::Availability(id)),
        (ApplicationType::ArtistToJob, _, _) => Err(Error::BadRequest(
            "artist_to_job applications reference a job_post_id only".into(),
        )),
        (ApplicationType::ClientToService, _, _) => Err(Error::BadRequest(
            "client_to_service applications reference an availability_post_id only".into(),
        )),
    }
}

fn with_note(message: String, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{}\n\n{}", message, note),
        None => message,
    }
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        profiles: ProfileService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            profiles,
            notifications,
        }
    }

    pub async fn create(&self, identity: &Identity, payload: CreateApplicationPayload) -> Result<Application> {
        ensure_non_negative("proposed_budget", payload.proposed_budget)?;
        let target = target_post(&payload)?;
        let application_type = payload.application_type;

        let explicit = match application_type {
            ApplicationType::ArtistToJob => payload.artist_id,
            ApplicationType::ClientToService => payload.client_id,
        };
        let actor = self
            .profiles
            .resolve_actor(identity, application_type.applicant_role(), explicit)
            .await?;

        let post = self
            .store
            .get_post(target)
            .await?
            .ok_or(Error::PostNotFound(target))?;
        if let Post::Job(job) = &post {
            if job.status != JobStatus::Open {
                return Err(Error::PostNotAcceptingApplications {
                    post: target,
                    status: job.status.as_str(),
                });
            }
        }

        let (artist_id, client_id) = match actor {
            Actor::Artist { artist_id, .. } => (artist_id, post.owner_id()),
            Actor::Client { client_id, .. } => (post.owner_id(), client_id),
        };

        // client_to_service offers may be repeated.
        if let PostRef::Job(job_post_id) = target {
            if self
                .store
                .find_artist_application(job_post_id, artist_id)
                .await?
                .is_some()
            {
                return Err(Error::DuplicateApplication {
                    post: target,
                    artist_id,
                });
            }
        }

        let application = self
            .store
            .insert_application(NewApplication {
                application_type,
                post: target,
                artist_id,
                client_id,
                message: payload.message,
                proposed_budget: payload.proposed_budget,
                proposed_deadline: payload.proposed_deadline,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(c) if c == ARTIST_JOB_UNIQUE => Error::DuplicateApplication {
                    post: target,
                    artist_id,
                },
                other => other.into(),
            })?;

        tracing::info!(
            application_id = application.id,
            application_type = %application_type,
            post = %target,
            "application created"
        );

        let template = NotificationTemplate::new(
            NotificationType::ApplicationReceived,
            "New application received",
            format!("You received a new application for \"{}\"", post.title()),
        )
        .from_user(actor.user_id())
        .application(application.id)
        .link(format!("/applications/{}", application.id));
        self.notify_profile(post.owner_role(), post.owner_id(), &template)
            .await;

        Ok(application)
    }

    pub async fn get(&self, identity: &Identity, id: i64) -> Result<Application> {
        let application = self.load(id).await?;
        self.ensure_party(identity, &application).await?;
        Ok(application)
    }

    pub async fn list(&self, identity: &Identity, query: ApplicationListQuery) -> Result<Page<Application>> {
        let post = match (query.job_post_id, query.availability_post_id) {
            (Some(_), Some(_)) => {
                return Err(Error::BadRequest(
                    "filter by job_post_id or availability_post_id, not both".into(),
                ))
            }
            (Some(id), None) => Some(PostRef::Job(id)),
            (None, Some(id)) => Some(PostRef::Availability(id)),
            (None, None) => None,
        };
        let status = query
            .status
            .as_deref()
            .map(str::parse::<ApplicationStatus>)
            .transpose()
            .map_err(|e| Error::InvalidStatus(e.to_string()))?;
        let application_type = query
            .application_type
            .as_deref()
            .map(str::parse::<ApplicationType>)
            .transpose()
            .map_err(|e| Error::BadRequest(e.to_string()))?;

        let mut filter = ApplicationFilter {
            post,
            artist_id: query.artist_id,
            client_id: query.client_id,
            status,
            application_type,
        };
        if !identity.is_admin() {
            self.scope_to_caller(identity, &mut filter).await?;
        }

        let page = PageRequest::new(query.page, query.per_page);
        Ok(self.store.list_applications(&filter, page).await?)
    }

    /// Moves a pending application to accepted or rejected. Requesting the
    /// status it already has returns it unchanged without side effects.
    pub async fn update_status(
        &self,
        identity: &Identity,
        id: i64,
        payload: UpdateApplicationStatusPayload,
    ) -> Result<Application> {
        let current = self.load(id).await?;
        let next = payload
            .status
            .trim()
            .parse::<ApplicationStatus>()
            .map_err(|e| Error::InvalidStatus(e.to_string()))?;

        let (owner_role, owner_id) = current.recipient();
        if !self.profiles.owns(identity, owner_role, owner_id).await? {
            return Err(Error::Forbidden(format!(
                "only the owner of {} may decide on application {}",
                current.post, id
            )));
        }

        if current.status.is_terminal() {
            return Err(Error::InvalidTransition {
                id,
                from: current.status,
                to: next,
            });
        }
        if current.status == next {
            return Ok(current);
        }
        if !current.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                id,
                from: current.status,
                to: next,
            });
        }

        let post_title = self
            .store
            .get_post(current.post)
            .await?
            .map(|post| post.title().to_string())
            .unwrap_or_else(|| current.post.to_string());
        let note = payload.message.as_deref();

        match next {
            ApplicationStatus::Accepted => {
                let outcome = match self.store.apply_acceptance(id).await? {
                    Some(outcome) => outcome,
                    None => return Err(self.lost_race(id, next).await),
                };
                tracing::info!(
                    application_id = id,
                    post = %outcome.accepted.post,
                    rejected = outcome.rejected.len(),
                    project_id = ?outcome.project.as_ref().map(|p| p.id),
                    "application accepted"
                );
                self.notify_acceptance(identity, &outcome, &post_title, note)
                    .await;
                Ok(outcome.accepted)
            }
            ApplicationStatus::Rejected => {
                let rejected = match self
                    .store
                    .transition_application(id, ApplicationStatus::Pending, ApplicationStatus::Rejected)
                    .await?
                {
                    Some(rejected) => rejected,
                    None => return Err(self.lost_race(id, next).await),
                };
                tracing::info!(application_id = id, post = %rejected.post, "application rejected");

                let template = NotificationTemplate::new(
                    NotificationType::ApplicationRejected,
                    "Application declined",
                    with_note(
                        format!("Your application for \"{}\" was declined", post_title),
                        note,
                    ),
                )
                .from_user(identity.user_id)
                .application(id)
                .link(format!("/applications/{}", id));
                let (role, profile_id) = rejected.applicant();
                self.notify_profile(role, profile_id, &template).await;
                Ok(rejected)
            }
            // can_transition_to only admits the two arms above
            _ => Err(Error::InvalidTransition {
                id,
                from: current.status,
                to: next,
            }),
        }
    }

    /// Deletes a pending or rejected application on behalf of its applicant.
    pub async fn withdraw(&self, identity: &Identity, id: i64) -> Result<()> {
        let application = self.load(id).await?;
        let (role, profile_id) = application.applicant();
        if !self.profiles.owns(identity, role, profile_id).await? {
            return Err(Error::Forbidden(format!(
                "only the applicant may withdraw application {}",
                id
            )));
        }
        if !application.status.is_withdrawable() || !self.store.delete_application(id).await? {
            return Err(Error::ApplicationLocked(format!(
                "application {} is {} and can no longer be withdrawn",
                id, application.status
            )));
        }
        tracing::info!(application_id = id, "application withdrawn");
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<Application> {
        self.store
            .get_application(id)
            .await?
            .ok_or(Error::ApplicationNotFound(id))
    }

    async fn ensure_party(&self, identity: &Identity, application: &Application) -> Result<()> {
        if self.profiles.owns(identity, Role::Artist, application.artist_id).await?
            || self.profiles.owns(identity, Role::Client, application.client_id).await?
        {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "not a party to application {}",
                application.id
            )))
        }
    }

    /// Restricts a listing to applications the caller is party to. With no
    /// explicit scope the caller's own profile for their role is used.
    async fn scope_to_caller(&self, identity: &Identity, filter: &mut ApplicationFilter) -> Result<()> {
        if let Some(post) = filter.post {
            if let Some(found) = self.store.get_post(post).await? {
                if self
                    .profiles
                    .owns(identity, found.owner_role(), found.owner_id())
                    .await?
                {
                    return Ok(());
                }
            }
        }
        if let Some(artist_id) = filter.artist_id {
            if self.profiles.owns(identity, Role::Artist, artist_id).await? {
                return Ok(());
            }
        }
        if let Some(client_id) = filter.client_id {
            if self.profiles.owns(identity, Role::Client, client_id).await? {
                return Ok(());
            }
        }

        if filter.artist_id.is_some() || filter.client_id.is_some() {
            return Err(Error::Forbidden("cannot list another party's applications".into()));
        }
        match self.profiles.resolve_actor(identity, identity.role, None).await? {
            Actor::Artist { artist_id, .. } => filter.artist_id = Some(artist_id),
            Actor::Client { client_id, .. } => filter.client_id = Some(client_id),
        }
        Ok(())
    }

    /// Error for a guarded write that found the application already moved.
    async fn lost_race(&self, id: i64, to: ApplicationStatus) -> Error {
        match self.store.get_application(id).await {
            Ok(Some(application)) => Error::InvalidTransition {
                id,
                from: application.status,
                to,
            },
            Ok(None) => Error::ApplicationNotFound(id),
            Err(e) => e.into(),
        }
    }

    async fn notify_acceptance(
        &self,
        identity: &Identity,
        outcome: &AcceptanceOutcome,
        post_title: &str,
        note: Option<&str>,
    ) {
        let accepted = &outcome.accepted;
        let template = NotificationTemplate::new(
            NotificationType::ApplicationAccepted,
            "Application accepted",
            with_note(
                format!("Your application for \"{}\" was accepted", post_title),
                note,
            ),
        )
        .from_user(identity.user_id)
        .application(accepted.id)
        .priority(Priority::High)
        .link(format!("/applications/{}", accepted.id));
        let (role, profile_id) = accepted.applicant();
        self.notify_profile(role, profile_id, &template).await;

        for rejected in &outcome.rejected {
            let template = NotificationTemplate::new(
                NotificationType::ApplicationRejected,
                "Application declined",
                format!(
                    "Another application for \"{}\" was accepted",
                    post_title
                ),
            )
            .from_user(identity.user_id)
            .application(rejected.id)
            .link(format!("/applications/{}", rejected.id));
            let (role, profile_id) = rejected.applicant();
            self.notify_profile(role, profile_id, &template).await;
        }

        if let Some(project) = &outcome.project {
            let template = NotificationTemplate::new(
                NotificationType::ProjectAssigned,
                "Project assigned",
                format!("You have been assigned to \"{}\"", project.title),
            )
            .from_user(identity.user_id)
            .project(project.id)
            .application(accepted.id)
            .priority(Priority::High)
            .link(format!("/projects/{}", project.id));
            self.notify_profile(Role::Artist, accepted.artist_id, &template)
                .await;
        }
    }

    async fn notify_profile(&self, role: Role, profile_id: Uuid, template: &NotificationTemplate) {
        if let Some(user_id) = self.profiles.recipient_user(role, profile_id).await {
            self.notifications.emit(user_id, template).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(
        application_type: ApplicationType,
        job_post_id: Option<Uuid>,
        availability_post_id: Option<Uuid>,
    ) -> CreateApplicationPayload {
        CreateApplicationPayload {
            application_type,
            job_post_id,
            availability_post_id,
            artist_id: None,
            client_id: None,
            message: "Interested".into(),
            proposed_budget: None,
            proposed_deadline: None,
        }
    }

    #[test]
    fn target_must_match_application_type() {
        let id = Uuid::new_v4();
        assert_eq!(
            target_post(&payload(ApplicationType::ArtistToJob, Some(id), None)).unwrap(),
            PostRef::Job(id)
        );
        assert_eq!(
            target_post(&payload(ApplicationType::ClientToService, None, Some(id))).unwrap(),
            PostRef::Availability(id)
        );
        assert!(matches!(
            target_post(&payload(ApplicationType::ArtistToJob, None, Some(id))),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            target_post(&payload(ApplicationType::ClientToService, Some(id), Some(id))),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn decision_note_is_appended_when_present() {
        assert_eq!(with_note("Accepted".into(), None), "Accepted");
        assert_eq!(with_note("Accepted".into(), Some("  ")), "Accepted");
        assert_eq!(
            with_note("Accepted".into(), Some("Welcome aboard")),
            "Accepted\n\nWelcome aboard"
        );
    }
}
