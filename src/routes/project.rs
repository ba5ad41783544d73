use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::project_dto::{
        CreateProjectPayload, ProjectListQuery, ProjectListResponse, ProjectResponse,
        UpdateProjectPayload,
    },
    error::Result,
    models::profile::Identity,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectPayload,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Linked job belongs to another client")
    )
)]
#[axum::debug_handler]
pub async fn create_project(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let project = state.project_service.create(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Projects of the caller", body = ProjectListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_projects(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.project_service.list(&identity, query).await?;
    Ok(Json(ProjectListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project found", body = ProjectResponse),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn get_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let project = state.project_service.get(&identity, id).await?;
    Ok(Json(ProjectResponse::from(project)))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectPayload,
    responses(
        (status = 200, description = "Project renamed", body = ProjectResponse),
        (status = 403, description = "Caller is not the project's client"),
        (status = 404, description = "Project not found")
    )
)]
#[axum::debug_handler]
pub async fn update_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let project = state
        .project_service
        .update_title(&identity, id, payload)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}
