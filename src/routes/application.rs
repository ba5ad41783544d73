use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::{
        application_dto::{
            ApplicationListQuery, ApplicationListResponse, ApplicationResponse,
            ConvertApplicationPayload, CreateApplicationPayload, UpdateApplicationStatusPayload,
        },
        project_dto::ProjectResponse,
    },
    error::Result,
    models::profile::Identity,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Post or acting profile not found"),
        (status = 409, description = "Post closed or duplicate application")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state.application_service.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(
        ("job_post_id" = Option<String>, Query, description = "Filter by job post"),
        ("availability_post_id" = Option<String>, Query, description = "Filter by availability post"),
        ("artist_id" = Option<String>, Query, description = "Filter by artist profile"),
        ("client_id" = Option<String>, Query, description = "Filter by client profile"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("application_type" = Option<String>, Query, description = "Filter by direction"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Applications visible to the caller", body = ApplicationListResponse),
        (status = 403, description = "Filter targets another party")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.application_service.list(&identity, query).await?;
    Ok(Json(ApplicationListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application found", body = ApplicationResponse),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get(&identity, id).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = UpdateApplicationStatusPayload,
    responses(
        (status = 200, description = "Application status updated", body = ApplicationResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateApplicationStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .update_status(&identity, id, payload)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/convert",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = ConvertApplicationPayload,
    responses(
        (status = 201, description = "Project created from the application", body = ProjectResponse),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application is not accepted")
    )
)]
#[axum::debug_handler]
pub async fn convert_application(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    // An empty body converts with the defaults; anything else must parse.
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        ConvertApplicationPayload::default()
    } else {
        serde_json::from_slice::<ConvertApplicationPayload>(&body)?
    };
    payload.validate()?;
    let project = state
        .conversion_service
        .convert(&identity, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 204, description = "Application withdrawn"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already decided on")
    )
)]
#[axum::debug_handler]
pub async fn withdraw_application(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.application_service.withdraw(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
