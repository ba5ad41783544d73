use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile_dto::{
        ArtistProfileResponse, ClientProfileResponse, RegisterArtistPayload,
        RegisterClientPayload,
    },
    error::Result,
    models::profile::Identity,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/profiles/artist",
    request_body = RegisterArtistPayload,
    responses(
        (status = 201, description = "Artist profile registered", body = ArtistProfileResponse),
        (status = 409, description = "Caller already has an artist profile")
    )
)]
#[axum::debug_handler]
pub async fn register_artist(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<RegisterArtistPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state
        .profile_service
        .register_artist(&identity, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ArtistProfileResponse::from(profile))))
}

#[utoipa::path(
    post,
    path = "/api/profiles/client",
    request_body = RegisterClientPayload,
    responses(
        (status = 201, description = "Client profile registered", body = ClientProfileResponse),
        (status = 409, description = "Caller already has a client profile")
    )
)]
#[axum::debug_handler]
pub async fn register_client(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<RegisterClientPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state
        .profile_service
        .register_client(&identity, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ClientProfileResponse::from(profile))))
}

#[utoipa::path(
    get,
    path = "/api/profiles/artist/{id}",
    params(("id" = Uuid, Path, description = "Artist profile ID")),
    responses(
        (status = 200, description = "Artist profile found", body = ArtistProfileResponse),
        (status = 404, description = "Artist profile not found")
    )
)]
#[axum::debug_handler]
pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.get_artist(id).await?;
    Ok(Json(ArtistProfileResponse::from(profile)))
}
