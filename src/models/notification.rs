// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ApprovalRequired,
    RequestApproved,
    RequestRejected,
    ApprovalDelegated,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    #[schema(example = "Solicitação aprovada")]
    pub title: String,
    pub message: String,
    #[schema(example = "training_request")]
    pub reference_type: String,
    pub reference_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notificação ainda não gravada.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub reference_type: &'static str,
    pub reference_id: Uuid,
}
