// src/handlers/approvals.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        approval::{ApprovalRecord, Decision, DecisionOutcome},
        auth::AuthContext,
    },
    services::approval_service::{DecisionInput, DelegationInput},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPayload {
    #[schema(example = "approved")]
    pub status: Decision,

    #[validate(length(max = 2000, message = "too_long"))]
    #[schema(example = "De acordo")]
    pub comments: Option<String>,

    pub next_approver_id: Option<Uuid>,

    #[validate(range(min = 1, message = "invalid_level"))]
    #[schema(example = 2)]
    pub next_approval_level: Option<i32>,

    #[validate(length(min = 1, max = 50, message = "invalid_role"))]
    #[schema(example = "hr_manager")]
    pub next_approver_role: Option<String>,

    // Opcionais: se vierem, precisam bater com o banco
    pub request_id: Option<Uuid>,
    pub requester_id: Option<Uuid>,
}

impl From<DecisionPayload> for DecisionInput {
    fn from(p: DecisionPayload) -> Self {
        Self {
            decision: p.status,
            comments: p.comments,
            next_approver_id: p.next_approver_id,
            next_approval_level: p.next_approval_level,
            next_approver_role: p.next_approver_role,
            request_id: p.request_id,
            requester_id: p.requester_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DelegationPayload {
    pub delegate_id: Uuid,

    #[validate(length(max = 500, message = "too_long"))]
    #[schema(example = "Férias até dia 20")]
    pub reason: Option<String>,
}

// POST /api/approvals/{approval_id}/decision
#[utoipa::path(
    post,
    path = "/api/approvals/{approval_id}/decision",
    tag = "Approvals",
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Decisão registrada", body = DecisionOutcome),
        (status = 400, description = "Dados inválidos, nível inválido ou próximo aprovador ausente"),
        (status = 403, description = "Usuário não é o aprovador"),
        (status = 404, description = "Aprovação não encontrada"),
        (status = 409, description = "Aprovação já decidida")
    ),
    params(
        ("approval_id" = Uuid, Path, description = "ID da aprovação")
    ),
    security(("api_jwt" = []))
)]
pub async fn decide(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
    Path(approval_id): Path<Uuid>,
    Json(payload): Json<DecisionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .approval_service
        .decide(&ctx, approval_id, payload.into())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// POST /api/approvals/{approval_id}/delegate
#[utoipa::path(
    post,
    path = "/api/approvals/{approval_id}/delegate",
    tag = "Approvals",
    request_body = DelegationPayload,
    responses(
        (status = 200, description = "Aprovação delegada", body = ApprovalRecord),
        (status = 400, description = "Delegado inválido"),
        (status = 403, description = "Usuário não é o aprovador"),
        (status = 409, description = "Aprovação já decidida")
    ),
    params(
        ("approval_id" = Uuid, Path, description = "ID da aprovação")
    ),
    security(("api_jwt" = []))
)]
pub async fn delegate(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
    Path(approval_id): Path<Uuid>,
    Json(payload): Json<DelegationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let approval = app_state
        .approval_service
        .delegate(
            &ctx,
            approval_id,
            DelegationInput { delegate_id: payload.delegate_id, reason: payload.reason },
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(approval)))
}

// GET /api/approvals/pending
#[utoipa::path(
    get,
    path = "/api/approvals/pending",
    tag = "Approvals",
    responses(
        (status = 200, description = "Aprovações pendentes do usuário", body = Vec<ApprovalRecord>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
) -> Result<impl IntoResponse, ApiError> {
    let approvals = app_state
        .approval_service
        .list_pending(&ctx)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(approvals)))
}

// GET /api/training-requests/{request_id}/approvals
#[utoipa::path(
    get,
    path = "/api/training-requests/{request_id}/approvals",
    tag = "Approvals",
    responses(
        (status = 200, description = "Cadeia de aprovação da solicitação", body = Vec<ApprovalRecord>),
        (status = 403, description = "Sem acesso à solicitação"),
        (status = 404, description = "Solicitação não encontrada")
    ),
    params(
        ("request_id" = Uuid, Path, description = "ID da solicitação de treinamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_request_chain(
    State(app_state): State<AppState>,
    locale: Locale,
    ctx: AuthContext,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let chain = app_state
        .approval_service
        .list_chain(&ctx, request_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(chain)))
}
