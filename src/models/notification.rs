use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

string_enum! {
    pub enum NotificationType {
        ApplicationReceived => "application_received",
        ApplicationAccepted => "application_accepted",
        ApplicationRejected => "application_rejected",
        ProjectCreated => "project_created",
        ProjectAssigned => "project_assigned",
    }
}

string_enum! {
    pub enum Priority {
        Low => "low",
        Normal => "normal",
        High => "high",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_user_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub project_id: Option<Uuid>,
    pub application_id: Option<i64>,
    pub priority: Priority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Recipient-independent part of a notification; the emitter stamps the
/// recipient on for each delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationTemplate {
    pub from_user_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub project_id: Option<Uuid>,
    pub application_id: Option<i64>,
    pub priority: Priority,
}

impl NotificationTemplate {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            from_user_id: None,
            notification_type,
            title: title.into(),
            message: message.into(),
            link: None,
            project_id: None,
            application_id: None,
            priority: Priority::Normal,
        }
    }

    pub fn from_user(mut self, user_id: Uuid) -> Self {
        self.from_user_id = Some(user_id);
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn application(mut self, application_id: i64) -> Self {
        self.application_id = Some(application_id);
        self
    }

    pub fn project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn to(&self, user_id: Uuid) -> NewNotification {
        NewNotification {
            user_id,
            from_user_id: self.from_user_id,
            notification_type: self.notification_type,
            title: self.title.clone(),
            message: self.message.clone(),
            link: self.link.clone(),
            project_id: self.project_id,
            application_id: self.application_id,
            priority: self.priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub from_user_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub project_id: Option<Uuid>,
    pub application_id: Option<i64>,
    pub priority: Priority,
}
