use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::ListResponse;
use crate::models::post::{Category, Post};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPostPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub category: Category,
    pub budget: Decimal,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAvailabilityPostPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub category: Category,
    pub budget: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePostPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub category: Option<Category>,
    pub budget: Option<Decimal>,
    /// Ignored for availability posts.
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePostStatusPayload {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub owner_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub type PostListResponse = ListResponse<Post>;
