use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    pub enum ProjectStatus {
        Open => "open",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        Paid => "paid",
    }
}

string_enum! {
    pub enum PaymentStatus {
        Unpaid => "unpaid",
        Pending => "pending",
        Paid => "paid",
        Refunded => "refunded",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
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

#[derive(Debug, Clone)]
pub struct NewProject {
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
}

#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub budget: Option<Decimal>,
    pub deadline: Option<DateTime<Utc>>,
    pub artist_id: Option<Uuid>,
    pub application_id: Option<i64>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub client_id: Option<Uuid>,
    pub artist_id: Option<Uuid>,
    pub status: Option<ProjectStatus>,
}
