use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::ListResponse;
use crate::models::application::{Application, ApplicationStatus, ApplicationType};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    pub application_type: ApplicationType,
    pub job_post_id: Option<Uuid>,
    pub availability_post_id: Option<Uuid>,
    /// Acting artist profile; resolved from the caller when absent.
    pub artist_id: Option<Uuid>,
    /// Acting client profile; resolved from the caller when absent.
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
    pub proposed_budget: Option<Decimal>,
    pub proposed_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateApplicationStatusPayload {
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConvertApplicationPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub budget: Option<Decimal>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationListQuery {
    pub job_post_id: Option<Uuid>,
    pub availability_post_id: Option<Uuid>,
    pub artist_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub status: Option<String>,
    pub application_type: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: i64,
    pub application_type: ApplicationType,
    pub job_post_id: Option<Uuid>,
    pub availability_post_id: Option<Uuid>,
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

impl From<Application> for ApplicationResponse {
    fn from(application: Application) -> Self {
        Self {
            id: application.id,
            application_type: application.application_type,
            job_post_id: application.post.job_post_id(),
            availability_post_id: application.post.availability_post_id(),
            artist_id: application.artist_id,
            client_id: application.client_id,
            message: application.message,
            proposed_budget: application.proposed_budget,
            proposed_deadline: application.proposed_deadline,
            status: application.status,
            project_id: application.project_id,
            created_at: application.created_at,
            updated_at: application.updated_at,
        }
    }
}

pub type ApplicationListResponse = ListResponse<ApplicationResponse>;
