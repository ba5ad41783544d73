use std::sync::Arc;

use uuid::Uuid;

use crate::dto::profile_dto::{RegisterArtistPayload, RegisterClientPayload};
use crate::error::{Error, Result};
use crate::models::profile::{Actor, ArtistProfile, ClientProfile, Identity, NewArtistProfile, NewClientProfile, Role};
use crate::services::slug_service::SlugService;
use crate::store::{MarketStore, StoreError, ARTIST_USER_UNIQUE, CLIENT_USER_UNIQUE};
use crate::utils::slug::SlugKind;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn MarketStore>,
    slugs: SlugService,
}

impl ProfileService {
    pub fn new(store: Arc<dyn MarketStore>, slugs: SlugService) -> Self {
        Self { store, slugs }
    }

    pub async fn register_artist(&self, identity: &Identity, payload: RegisterArtistPayload) -> Result<ArtistProfile> {
        self.store.upsert_user(identity.user_id).await?;
        let user_id = identity.user_id;
        let display_name = payload.display_name.trim().to_string();

        let profile = self
            .slugs
            .write_with_slug(SlugKind::ArtistProfile, &display_name, None, |slug| {
                let store = self.store.clone();
                let new = NewArtistProfile {
                    user_id,
                    display_name: display_name.clone(),
                    slug,
                };
                async move { store.insert_artist_profile(new).await }
            })
            .await
            .map_err(|e| match e {
                Error::Storage(StoreError::UniqueViolation(c)) if c == ARTIST_USER_UNIQUE => {
                    Error::Conflict(format!("user {} already has an artist profile", user_id))
                }
                other => other,
            })?;

        tracing::info!(artist_id = %profile.id, user_id = %user_id, "artist profile registered");
        Ok(profile)
    }

    pub async fn register_client(&self, identity: &Identity, payload: RegisterClientPayload) -> Result<ClientProfile> {
        self.store.upsert_user(identity.user_id).await?;
        let profile = self
            .store
            .insert_client_profile(NewClientProfile {
                user_id: identity.user_id,
                company_name: payload.company_name,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(c) if c == CLIENT_USER_UNIQUE => Error::Conflict(format!(
                    "user {} already has a client profile",
                    identity.user_id
                )),
                other => other.into(),
            })?;

        tracing::info!(client_id = %profile.id, user_id = %identity.user_id, "client profile registered");
        Ok(profile)
    }

    pub async fn get_artist(&self, id: Uuid) -> Result<ArtistProfile> {
        self.store
            .get_artist_profile(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("artist profile {}", id)))
    }

    /// Resolves the caller into the `role` party of an operation. An explicit
    /// profile id is honoured when it exists and belongs to the caller
    /// (admins may act for anyone).
    pub async fn resolve_actor(&self, identity: &Identity, role: Role, explicit: Option<Uuid>) -> Result<Actor> {
        let (user_id, profile_id) = match explicit {
            Some(profile_id) => {
                let owner = self
                    .store
                    .profile_user_id(role, profile_id)
                    .await?
                    .ok_or(Error::ActorProfileNotFound {
                        role,
                        user_id: identity.user_id,
                    })?;
                if owner != identity.user_id && !identity.is_admin() {
                    return Err(Error::Forbidden(format!(
                        "{} profile {} belongs to another user",
                        role, profile_id
                    )));
                }
                (owner, profile_id)
            }
            None => {
                let profile_id = self
                    .store
                    .find_profile_id(identity.user_id, role)
                    .await?
                    .ok_or(Error::ActorProfileNotFound {
                        role,
                        user_id: identity.user_id,
                    })?;
                (identity.user_id, profile_id)
            }
        };

        match role {
            Role::Artist => Ok(Actor::Artist {
                user_id,
                artist_id: profile_id,
            }),
            Role::Client => Ok(Actor::Client {
                user_id,
                client_id: profile_id,
            }),
            Role::Admin => Err(Error::BadRequest("admins do not act as a marketplace party".into())),
        }
    }

    /// Whether the caller owns the `role` profile `profile_id`. Admins own everything.
    pub async fn owns(&self, identity: &Identity, role: Role, profile_id: Uuid) -> Result<bool> {
        if identity.is_admin() {
            return Ok(true);
        }
        let own = self.store.find_profile_id(identity.user_id, role).await?;
        Ok(own == Some(profile_id))
    }

    /// User behind a profile, for addressing notifications. Lookup failures
    /// are logged and yield `None` so delivery can be skipped.
    pub async fn recipient_user(&self, role: Role, profile_id: Uuid) -> Option<Uuid> {
        match self.store.profile_user_id(role, profile_id).await {
            Ok(Some(user_id)) => Some(user_id),
            Ok(None) => {
                tracing::warn!(%role, profile_id = %profile_id, "notification recipient has no user");
                None
            }
            Err(e) => {
                tracing::warn!(error = ?e, %role, profile_id = %profile_id, "could not resolve notification recipient");
                None
            }
        }
    }
}
