use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::post::PostRef;
use crate::models::profile::Role;

string_enum! {
    /// Direction of an offer.
    pub enum ApplicationType {
        /// An artist applies to a client's job post.
        ArtistToJob => "artist_to_job",
        /// A client hires an artist through their availability post.
        ClientToService => "client_to_service",
    }
}

impl ApplicationType {
    /// Role of the party making the offer.
    pub fn applicant_role(&self) -> Role {
        match self {
            ApplicationType::ArtistToJob => Role::Artist,
            ApplicationType::ClientToService => Role::Client,
        }
    }
}

string_enum! {
    pub enum ApplicationStatus {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
        ConvertedToProject => "converted_to_project",
    }
}

impl ApplicationStatus {
    /// No status update is permitted once an application became a project.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::ConvertedToProject)
    }

    /// Transitions reachable through a status update. Conversion to a
    /// project has its own operation and is not listed here.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Pending, ApplicationStatus::Accepted)
                | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
        )
    }

    /// Whether the application has won its post.
    pub fn is_winner(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::ConvertedToProject
        )
    }

    /// Whether the application may still be withdrawn by its applicant.
    pub fn is_withdrawable(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending | ApplicationStatus::Rejected
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub application_type: ApplicationType,
    pub post: PostRef,
    pub artist_id: Uuid,
    pub client_id: Uuid,
    pub message: String,
    pub proposed_budget: Option<Decimal>,
    pub proposed_deadline: Option<DateTime<Utc>>,
    pub status: ApplicationStatus,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Profile of the party that made the offer.
    pub fn applicant(&self) -> (Role, Uuid) {
        match self.application_type {
            ApplicationType::ArtistToJob => (Role::Artist, self.artist_id),
            ApplicationType::ClientToService => (Role::Client, self.client_id),
        }
    }

    /// Profile of the post owner the offer was made to.
    pub fn recipient(&self) -> (Role, Uuid) {
        match self.application_type {
            ApplicationType::ArtistToJob => (Role::Client, self.client_id),
            ApplicationType::ClientToService => (Role::Artist, self.artist_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub application_type: ApplicationType,
    pub post: PostRef,
    pub artist_id: Uuid,
    pub client_id: Uuid,
    pub message: String,
    pub proposed_budget: Option<Decimal>,
    pub proposed_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub post: Option<PostRef>,
    pub artist_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
    pub application_type: Option<ApplicationType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_applications_move_through_status_updates() {
        use ApplicationStatus::*;

        for from in ApplicationStatus::ALL {
            for to in ApplicationStatus::ALL {
                let allowed = from.can_transition_to(*to);
                let expected = *from == Pending && (*to == Accepted || *to == Rejected);
                assert_eq!(allowed, expected, "{} -> {}", from, to);
            }
        }
        assert!(ConvertedToProject.is_terminal());
        assert!(!Accepted.is_terminal());
        assert!(Accepted.is_winner() && ConvertedToProject.is_winner());
        assert!(!Pending.is_winner() && !Rejected.is_winner());
    }

    #[test]
    fn statuses_parse_from_their_stored_spelling() {
        assert_eq!(
            "converted_to_project".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::ConvertedToProject
        );
        let err = "approved".parse::<ApplicationStatus>().unwrap_err();
        assert_eq!(err.value, "approved");
        assert_eq!(ApplicationType::ClientToService.to_string(), "client_to_service");
    }

    #[test]
    fn application_type_fixes_the_applicant_role() {
        assert_eq!(ApplicationType::ArtistToJob.applicant_role(), Role::Artist);
        assert_eq!(ApplicationType::ClientToService.applicant_role(), Role::Client);
    }
}
