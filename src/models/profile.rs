use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    /// Role carried in the caller's token.
    pub enum Role {
        Artist => "artist",
        Client => "client",
        Admin => "admin",
    }
}

/// Already-authenticated caller, as handed over by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The acting party of a marketplace operation, resolved once from an
/// [`Identity`] to its role-specific profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Artist { user_id: Uuid, artist_id: Uuid },
    Client { user_id: Uuid, client_id: Uuid },
}

impl Actor {
    pub fn user_id(&self) -> Uuid {
        match self {
            Actor::Artist { user_id, .. } | Actor::Client { user_id, .. } => *user_id,
        }
    }

    pub fn profile_id(&self) -> Uuid {
        match self {
            Actor::Artist { artist_id, .. } => *artist_id,
            Actor::Client { client_id, .. } => *client_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArtistProfile {
    pub user_id: Uuid,
    pub display_name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct NewClientProfile {
    pub user_id: Uuid,
    pub company_name: Option<String>,
}
