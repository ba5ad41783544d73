use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::notification_dto::{
        MarkAllReadResponse, NotificationListQuery, NotificationListResponse,
        NotificationResponse, UnreadCountResponse,
    },
    error::Result,
    models::profile::Identity,
    store::PageRequest,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("unread_only" = Option<bool>, Query, description = "Only unread notifications"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Inbox of the caller", body = NotificationListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .notification_service
        .list(
            identity.user_id,
            query.unread_only,
            PageRequest::new(query.page, query.per_page),
        )
        .await?;
    Ok(Json(NotificationListResponse::from(page)))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread notifications", body = UnreadCountResponse)
    )
)]
#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let count = state
        .notification_service
        .unread_count(identity.user_id)
        .await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 404, description = "Notification not found")
    )
)]
#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state
        .notification_service
        .mark_read(identity.user_id, id)
        .await?;
    Ok(Json(NotificationResponse::from(notification)))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read", body = MarkAllReadResponse)
    )
)]
#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let updated = state
        .notification_service
        .mark_all_read(identity.user_id)
        .await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state
        .notification_service
        .delete(identity.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
