// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Erros de domínio. Lacunas de configuração do per-diem NÃO passam por aqui:
// elas são um resultado esperado (`CalculationOutcome::ConfigMissing`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Intervalo de datas inválido: {start} > {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Perfil obrigatório ausente: {0}")]
    MissingRole(&'static str),

    #[error("Aprovação não encontrada: {0}")]
    ApprovalNotFound(Uuid),

    #[error("Solicitação de treinamento não encontrada: {0}")]
    TrainingRequestNotFound(Uuid),

    #[error("Notificação não encontrada: {0}")]
    NotificationNotFound(Uuid),

    #[error("Aprovação já decidida: {0}")]
    ApprovalAlreadyDecided(Uuid),

    #[error("Nível de aprovação inválido: atual {current}, pedido {requested}")]
    InvalidApprovalLevel { current: i32, requested: i32 },

    #[error("Identificadores não correspondem à aprovação")]
    RequestMismatch,

    #[error("Delegado inválido")]
    InvalidDelegate,

    #[error("Próximo aprovador não informado")]
    MissingNextApprover,

    #[error("Política de per-diem inválida: {0}")]
    PolicyConfig(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de template: {0}")]
    TemplateError(#[from] tera::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidDateRange { .. }
            | AppError::InvalidApprovalLevel { .. }
            | AppError::RequestMismatch
            | AppError::InvalidDelegate
            | AppError::MissingNextApprover => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::MissingRole(_) => StatusCode::FORBIDDEN,
            AppError::ApprovalNotFound(_)
            | AppError::TrainingRequestNotFound(_)
            | AppError::NotificationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ApprovalAlreadyDecided(_) => StatusCode::CONFLICT,
            AppError::PolicyConfig(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::TemplateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para a resposta pública, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status_code();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .map(Value::String)
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                (i18n.translate(lang, "error.validation"), Some(Value::Object(details)))
            }
            AppError::InvalidDateRange { start, end } => (
                i18n.translate_with(
                    lang,
                    "error.invalid_date_range",
                    &[("start", start.to_string()), ("end", end.to_string())],
                ),
                None,
            ),
            AppError::InvalidToken | AppError::JwtError(_) => {
                (i18n.translate(lang, "error.invalid_token"), None)
            }
            AppError::Forbidden => (i18n.translate(lang, "error.forbidden"), None),
            AppError::MissingRole(role) => (
                i18n.translate_with(lang, "error.missing_role", &[("role", role.to_string())]),
                None,
            ),
            AppError::ApprovalNotFound(id) => (
                i18n.translate_with(lang, "error.approval_not_found", &[("id", id.to_string())]),
                None,
            ),
            AppError::TrainingRequestNotFound(id) => (
                i18n.translate_with(lang, "error.request_not_found", &[("id", id.to_string())]),
                None,
            ),
            AppError::NotificationNotFound(id) => (
                i18n.translate_with(lang, "error.notification_not_found", &[("id", id.to_string())]),
                None,
            ),
            AppError::ApprovalAlreadyDecided(id) => (
                i18n.translate_with(lang, "error.approval_already_decided", &[("id", id.to_string())]),
                None,
            ),
            AppError::InvalidApprovalLevel { current, requested } => (
                i18n.translate_with(
                    lang,
                    "error.invalid_approval_level",
                    &[("current", current.to_string()), ("requested", requested.to_string())],
                ),
                None,
            ),
            AppError::RequestMismatch => (i18n.translate(lang, "error.request_mismatch"), None),
            AppError::InvalidDelegate => (i18n.translate(lang, "error.invalid_delegate"), None),
            AppError::MissingNextApprover => (i18n.translate(lang, "error.missing_next_approver"), None),

            // Todo o resto vira 500. O detalhe fica só no log.
            e => {
                tracing::error!("🔥 Erro Interno do Servidor: {}", e);
                (i18n.translate(lang, "error.internal"), None)
            }
        };

        ApiError { status, error, details }
    }
}

/// Erro já pronto para sair pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "required"))]
        name: String,
    }

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let errors = Payload { name: String::new() }.validate().unwrap_err();
        let api = AppError::ValidationError(errors).to_api_error(&pt(), &I18nStore::new());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details, Some(json!({ "name": ["required"] })));
    }

    #[test]
    fn conflict_and_not_found_are_mapped() {
        let id = Uuid::new_v4();
        let i18n = I18nStore::new();

        let conflict = AppError::ApprovalAlreadyDecided(id).to_api_error(&pt(), &i18n);
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert!(conflict.error.contains(&id.to_string()));

        let missing = AppError::ApprovalNotFound(id).to_api_error(&Locale("en".into()), &i18n);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.error, format!("Approval {} not found.", id));
    }

    #[test]
    fn missing_next_approver_is_a_bad_request() {
        let api = AppError::MissingNextApprover.to_api_error(&Locale("en".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "A next approver is required when a level or role is given.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = AppError::PolicyConfig("travel_day_rate".into()).to_api_error(&pt(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "Ocorreu um erro inesperado.");
        assert!(api.details.is_none());
    }
}
