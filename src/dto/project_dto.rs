use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::ListResponse;
use crate::models::project::{PaymentStatus, Project, ProjectStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProjectPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub budget: Decimal,
    pub deadline: Option<DateTime<Utc>>,
    /// One of the caller's job posts the project is opened for.
    pub job_post_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProjectPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub artist_id: Option<Uuid>,
    pub job_post_id: Option<Uuid>,
    pub application_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub budget: Decimal,
    pub deadline: Option<DateTime<Utc>>,
    pub status: ProjectStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
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
            payment_status: project.payment_status,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

pub type ProjectListResponse = ListResponse<ProjectResponse>;
