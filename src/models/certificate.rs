// src/models/certificate.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub verification_token: String,
    pub recipient_name: String,
    pub course_title: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_result", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    Valid,
    Expired,
    Revoked,
    NotFound,
}

impl VerificationResult {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            VerificationResult::Valid => "certificate.valid",
            VerificationResult::Expired => "certificate.expired",
            VerificationResult::Revoked => "certificate.revoked",
            VerificationResult::NotFound => "certificate.not_found",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationResult::Valid => "valid",
            VerificationResult::Expired => "expired",
            VerificationResult::Revoked => "revoked",
            VerificationResult::NotFound => "not_found",
        }
    }
}

// Evento de auditoria gravado a cada consulta
#[derive(Debug, Clone)]
pub struct NewVerificationEvent {
    pub certificate_id: Option<Uuid>,
    pub token: String,
    pub result: VerificationResult,
    pub user_agent: Option<String>,
}
