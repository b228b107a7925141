// src/models/approval.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::notification::NewNotification;

// --- Enums (mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

/// Decisão do aprovador. Só existem dois caminhos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for ApprovalStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => ApprovalStatus::Approved,
            Decision::Rejected => ApprovalStatus::Rejected,
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    #[schema(example = "Curso de NR-35 (Trabalho em Altura)")]
    pub title: String,
    // Reaproveita o mesmo enum: pending -> approved | rejected
    pub status: ApprovalStatus,
    #[schema(example = 1)]
    pub current_approval_level: i32,
    pub current_approver_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub id: Uuid,
    pub training_request_id: Uuid,
    pub approver_id: Uuid,
    #[schema(example = "manager")]
    pub role: String,
    #[schema(example = 1)]
    pub approval_level: i32,
    pub status: ApprovalStatus,
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(example = "Alinhado com o PDI do colaborador")]
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Planos (o que o serviço decidiu; o repositório só aplica) ---

#[derive(Debug, Clone, PartialEq)]
pub struct NextApproval {
    pub approver_id: Uuid,
    pub role: String,
    pub approval_level: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub approval_id: Uuid,
    pub request_id: Uuid,
    pub decision: Decision,
    pub comments: Option<String>,
    pub request_status: ApprovalStatus,
    pub request_level: i32,
    pub current_approver_id: Option<Uuid>,
    pub next_approval: Option<NextApproval>,
    pub notifications: Vec<NewNotification>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelegationPlan {
    pub approval_id: Uuid,
    pub request_id: Uuid,
    pub previous_approver_id: Uuid,
    pub delegate_id: Uuid,
    pub comments: String,
    pub notification: NewNotification,
}

/// Resultado de uma decisão aplicada.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub approval: ApprovalRecord,
    pub request: TrainingRequest,
    pub next_approval: Option<ApprovalRecord>,
}
