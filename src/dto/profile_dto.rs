use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::{ArtistProfile, ClientProfile};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterArtistPayload {
    #[validate(length(min = 1, max = 120))]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterClientPayload {
    #[validate(length(min = 1, max = 200))]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl From<ArtistProfile> for ArtistProfileResponse {
    fn from(profile: ArtistProfile) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            display_name: profile.display_name,
            slug: profile.slug,
            created_at: profile.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ClientProfile> for ClientProfileResponse {
    fn from(profile: ClientProfile) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            company_name: profile.company_name,
            created_at: profile.created_at,
        }
    }
}
