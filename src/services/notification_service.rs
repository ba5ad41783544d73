use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::notification::{Notification, NotificationTemplate};
use crate::store::{NotificationStore, Page, PageRequest};

/// Delivers lifecycle events to recipient inboxes and serves the inbox.
///
/// Emission is best-effort: a missing recipient or a failed insert is logged
/// and skipped, never returned to the operation that triggered it.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn emit(&self, recipient: Uuid, template: &NotificationTemplate) {
        match self.store.recipient_exists(recipient).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    recipient = %recipient,
                    notification_type = %template.notification_type,
                    "skipping notification for unknown recipient"
                );
                return;
            }
            Err(e) => {
                tracing::warn!(error = ?e, recipient = %recipient, "could not check notification recipient");
                return;
            }
        }

        if let Err(e) = self.store.insert_notification(template.to(recipient)).await {
            tracing::warn!(
                error = ?e,
                recipient = %recipient,
                notification_type = %template.notification_type,
                "failed to store notification"
            );
        }
    }

    pub async fn emit_many(&self, recipients: &[Uuid], template: &NotificationTemplate) {
        let mut seen = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            if seen.contains(recipient) {
                continue;
            }
            seen.push(*recipient);
            self.emit(*recipient, template).await;
        }
    }

    pub async fn list(&self, user_id: Uuid, unread_only: bool, page: PageRequest) -> Result<Page<Notification>> {
        Ok(self.store.list_notifications(user_id, unread_only, page).await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self.store.unread_count(user_id).await?)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification> {
        self.store
            .mark_read(user_id, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("notification {}", id)))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        Ok(self.store.mark_all_read(user_id).await?)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        if self.store.delete_notification(user_id, id).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("notification {}", id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NotificationType;
    use crate::store::{MockNotificationStore, StoreError};

    fn template() -> NotificationTemplate {
        NotificationTemplate::new(
            NotificationType::ApplicationReceived,
            "New application received",
            "Someone applied",
        )
    }

    #[tokio::test]
    async fn failed_insert_is_swallowed() {
        let mut store = MockNotificationStore::new();
        store.expect_recipient_exists().returning(|_| Ok(true));
        store
            .expect_insert_notification()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection reset".into())));

        let service = NotificationService::new(Arc::new(store));
        service.emit(Uuid::new_v4(), &template()).await;
    }

    #[tokio::test]
    async fn unknown_recipient_is_skipped() {
        let mut store = MockNotificationStore::new();
        store.expect_recipient_exists().returning(|_| Ok(false));
        store.expect_insert_notification().never();

        let service = NotificationService::new(Arc::new(store));
        service.emit(Uuid::new_v4(), &template()).await;
    }

    #[tokio::test]
    async fn emit_many_delivers_once_per_recipient() {
        let recipient = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut store = MockNotificationStore::new();
        store.expect_recipient_exists().returning(|_| Ok(true));
        store
            .expect_insert_notification()
            .times(2)
            .returning(|new| Err(StoreError::Corrupt(format!("not persisted for {}", new.user_id))));

        let service = NotificationService::new(Arc::new(store));
        service
            .emit_many(&[recipient, other, recipient], &template())
            .await;
    }
}
