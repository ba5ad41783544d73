use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::post_dto::{
        CreateAvailabilityPostPayload, CreateJobPostPayload, PostListQuery, PostListResponse,
        UpdatePostPayload, UpdatePostStatusPayload,
    },
    error::Result,
    models::post::{Post, PostKind, PostRef},
    models::profile::Identity,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/job-posts",
    request_body = CreateJobPostPayload,
    responses(
        (status = 201, description = "Job post created", body = Post),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Caller has no client profile")
    )
)]
#[axum::debug_handler]
pub async fn create_job_post(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateJobPostPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let post = state.post_service.create_job(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(Post::Job(post))))
}

#[utoipa::path(
    post,
    path = "/api/availability-posts",
    request_body = CreateAvailabilityPostPayload,
    responses(
        (status = 201, description = "Availability post created", body = Post),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Caller has no artist profile")
    )
)]
#[axum::debug_handler]
pub async fn create_availability_post(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateAvailabilityPostPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let post = state
        .post_service
        .create_availability(&identity, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(Post::Availability(post))))
}

#[utoipa::path(
    get,
    path = "/api/job-posts",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("owner_id" = Option<String>, Query, description = "Filter by client profile"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of job posts", body = PostListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_job_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.post_service.list(PostKind::Job, query).await?;
    Ok(Json(PostListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/availability-posts",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("owner_id" = Option<String>, Query, description = "Filter by artist profile"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of availability posts", body = PostListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_availability_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .post_service
        .list(PostKind::Availability, query)
        .await?;
    Ok(Json(PostListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/job-posts/{id}",
    params(("id" = Uuid, Path, description = "Job post ID")),
    responses(
        (status = 200, description = "Job post found", body = Post),
        (status = 404, description = "Job post not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let post = state.post_service.get(PostRef::Job(id)).await?;
    Ok(Json(post))
}

#[utoipa::path(
    get,
    path = "/api/availability-posts/{id}",
    params(("id" = Uuid, Path, description = "Availability post ID")),
    responses(
        (status = 200, description = "Availability post found", body = Post),
        (status = 404, description = "Availability post not found")
    )
)]
#[axum::debug_handler]
pub async fn get_availability_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let post = state.post_service.get(PostRef::Availability(id)).await?;
    Ok(Json(post))
}

#[utoipa::path(
    get,
    path = "/api/job-posts/slug/{slug}",
    params(("slug" = String, Path, description = "Job post slug")),
    responses(
        (status = 200, description = "Job post found", body = Post),
        (status = 404, description = "Job post not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let post = state.post_service.get_by_slug(PostKind::Job, &slug).await?;
    Ok(Json(post))
}

#[utoipa::path(
    get,
    path = "/api/availability-posts/slug/{slug}",
    params(("slug" = String, Path, description = "Availability post slug")),
    responses(
        (status = 200, description = "Availability post found", body = Post),
        (status = 404, description = "Availability post not found")
    )
)]
#[axum::debug_handler]
pub async fn get_availability_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let post = state
        .post_service
        .get_by_slug(PostKind::Availability, &slug)
        .await?;
    Ok(Json(post))
}

#[utoipa::path(
    patch,
    path = "/api/job-posts/{id}",
    params(("id" = Uuid, Path, description = "Job post ID")),
    request_body = UpdatePostPayload,
    responses(
        (status = 200, description = "Job post updated", body = Post),
        (status = 403, description = "Caller does not own the post"),
        (status = 404, description = "Job post not found")
    )
)]
#[axum::debug_handler]
pub async fn update_job_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let post = state
        .post_service
        .update(&identity, PostRef::Job(id), payload)
        .await?;
    Ok(Json(post))
}

#[utoipa::path(
    patch,
    path = "/api/availability-posts/{id}",
    params(("id" = Uuid, Path, description = "Availability post ID")),
    request_body = UpdatePostPayload,
    responses(
        (status = 200, description = "Availability post updated", body = Post),
        (status = 403, description = "Caller does not own the post"),
        (status = 404, description = "Availability post not found")
    )
)]
#[axum::debug_handler]
pub async fn update_availability_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let post = state
        .post_service
        .update(&identity, PostRef::Availability(id), payload)
        .await?;
    Ok(Json(post))
}

#[utoipa::path(
    post,
    path = "/api/job-posts/{id}/status",
    params(("id" = Uuid, Path, description = "Job post ID")),
    request_body = UpdatePostStatusPayload,
    responses(
        (status = 200, description = "Job post status changed", body = Post),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Job post not found")
    )
)]
#[axum::debug_handler]
pub async fn set_job_post_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let post = state
        .post_service
        .set_status(&identity, PostRef::Job(id), &payload.status)
        .await?;
    Ok(Json(post))
}

#[utoipa::path(
    post,
    path = "/api/availability-posts/{id}/status",
    params(("id" = Uuid, Path, description = "Availability post ID")),
    request_body = UpdatePostStatusPayload,
    responses(
        (status = 200, description = "Availability post status changed", body = Post),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Availability post not found")
    )
)]
#[axum::debug_handler]
pub async fn set_availability_post_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let post = state
        .post_service
        .set_status(&identity, PostRef::Availability(id), &payload.status)
        .await?;
    Ok(Json(post))
}

#[utoipa::path(
    post,
    path = "/api/job-posts/{id}/view",
    params(("id" = Uuid, Path, description = "Job post ID")),
    responses(
        (status = 204, description = "View recorded"),
        (status = 404, description = "Job post not found")
    )
)]
#[axum::debug_handler]
pub async fn record_job_post_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.post_service.record_view(PostRef::Job(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/availability-posts/{id}/view",
    params(("id" = Uuid, Path, description = "Availability post ID")),
    responses(
        (status = 204, description = "View recorded"),
        (status = 404, description = "Availability post not found")
    )
)]
#[axum::debug_handler]
pub async fn record_availability_post_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .post_service
        .record_view(PostRef::Availability(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/job-posts/{id}",
    params(("id" = Uuid, Path, description = "Job post ID")),
    responses(
        (status = 204, description = "Job post deleted"),
        (status = 404, description = "Job post not found"),
        (status = 409, description = "Open applications still reference the post")
    )
)]
#[axum::debug_handler]
pub async fn delete_job_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .post_service
        .delete(&identity, PostRef::Job(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/availability-posts/{id}",
    params(("id" = Uuid, Path, description = "Availability post ID")),
    responses(
        (status = 204, description = "Availability post deleted"),
        (status = 404, description = "Availability post not found"),
        (status = 409, description = "Open applications still reference the post")
    )
)]
#[axum::debug_handler]
pub async fn delete_availability_post(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .post_service
        .delete(&identity, PostRef::Availability(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
