// src/db/notification_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notification::{NewNotification, Notification},
};

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError>;

    /// Só marca se a notificação for do usuário. `None` se não existir para ele.
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>, AppError>;
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insere uma notificação usando o executor recebido (normalmente a transação da aprovação).
pub(crate) async fn insert_notification<'e, E>(
    executor: E,
    new: &NewNotification,
) -> Result<Notification, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let notification = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (
            user_id, notification_type, title, message, reference_type, reference_id
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(new.user_id)
    .bind(new.notification_type)
    .bind(&new.title)
    .bind(&new.message)
    .bind(new.reference_type)
    .bind(new.reference_id)
    .fetch_one(executor)
    .await?;

    Ok(notification)
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND ($2 = false OR is_read = false)
            ORDER BY created_at DESC
            LIMIT 200
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = true
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }
}
