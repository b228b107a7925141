// src/services/notification_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::NotificationStore,
    models::{auth::AuthContext, notification::Notification},
};

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, ctx: &AuthContext, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        self.store.list_for_user(ctx.user_id, unread_only).await
    }

    // Só o dono marca como lida; de fora, a notificação "não existe"
    pub async fn mark_read(&self, ctx: &AuthContext, id: Uuid) -> Result<Notification, AppError> {
        self.store
            .mark_read(id, ctx.user_id)
            .await?
            .ok_or(AppError::NotificationNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::notification::NotificationType;

    fn notification(user_id: Uuid, is_read: bool) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            notification_type: NotificationType::ApprovalRequired,
            title: "Aprovação pendente".into(),
            message: "...".into(),
            reference_type: "training_request".into(),
            reference_id: Uuid::new_v4(),
            is_read,
            created_at: Utc::now(),
        }
    }

    fn ctx(user_id: Uuid) -> AuthContext {
        AuthContext { user_id, email: None, roles: HashSet::new() }
    }

    #[tokio::test]
    async fn lists_only_own_and_filters_unread() {
        let store = Arc::new(MemoryStore::new());
        let me = Uuid::new_v4();
        store.with(|s| {
            s.notifications.push(notification(me, true));
            s.notifications.push(notification(me, false));
            s.notifications.push(notification(Uuid::new_v4(), false));
        });
        let service = NotificationService::new(store);

        assert_eq!(service.list(&ctx(me), false).await.unwrap().len(), 2);
        let unread = service.list(&ctx(me), true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert!(!unread[0].is_read);
    }

    #[tokio::test]
    async fn cannot_mark_someone_elses_notification() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();
        let n = notification(owner, false);
        let id = n.id;
        store.with(|s| s.notifications.push(n));
        let service = NotificationService::new(store);

        let denied = service.mark_read(&ctx(Uuid::new_v4()), id).await;
        assert!(matches!(denied, Err(AppError::NotificationNotFound(_))));

        let read = service.mark_read(&ctx(owner), id).await.unwrap();
        assert!(read.is_read);
    }
}
