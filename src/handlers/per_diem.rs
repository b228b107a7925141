// src/handlers/per_diem.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, RoleBackOffice},
    },
    models::{
        auth::AuthContext,
        per_diem::{BulkInput, CalculationMode, PerDiemPolicy, PerDiemResponse, TripInput},
    },
};

/// Corpo do endpoint: o campo `action` escolhe a operação, o resto são os dados da viagem.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PerDiemAction {
    Estimate(TripInput),
    CalculateFinal(TripInput),
    /// Reexecuta a estimativa com as taxas atuais; gera um registro novo.
    Recalculate(TripInput),
    BulkCalculate(BulkInput),
}

// Falhas saem no mesmo formato `{success:false, error}`, com a mensagem do erro
fn failure(err: AppError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!("🔥 Falha no cálculo de per-diem: {}", err);
    }
    (status, Json(PerDiemResponse::failure(err.to_string()))).into_response()
}

// POST /functions/v1/calculate-per-diem
#[utoipa::path(
    post,
    path = "/functions/v1/calculate-per-diem",
    tag = "Per-diem",
    request_body = PerDiemAction,
    responses(
        (status = 200, description = "Cálculo realizado ou configuração ausente (`config_missing`)", body = PerDiemResponse),
        (status = 400, description = "Dados inválidos", body = PerDiemResponse),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 500, description = "Falha inesperada", body = PerDiemResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn calculate_per_diem(
    State(app_state): State<AppState>,
    ctx: AuthContext,
    payload: Result<Json<PerDiemAction>, JsonRejection>,
) -> Response {
    let Json(action) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, Json(PerDiemResponse::failure(rejection.body_text())))
                .into_response();
        }
    };

    let service = &app_state.per_diem_service;
    let acting_user = Some(ctx.user_id);

    let (input, mode) = match action {
        PerDiemAction::Estimate(input) | PerDiemAction::Recalculate(input) => {
            (input, CalculationMode::Estimate)
        }
        PerDiemAction::CalculateFinal(input) => (input, CalculationMode::Final),
        PerDiemAction::BulkCalculate(bulk) => {
            if let Err(e) = bulk.validate() {
                return failure(AppError::ValidationError(e));
            }
            let response = service.calculate_bulk(&bulk, acting_user).await;
            return (StatusCode::OK, Json(response)).into_response();
        }
    };

    if let Err(e) = input.validate() {
        return failure(AppError::ValidationError(e));
    }

    match service.calculate(&input, mode, acting_user).await {
        Ok(outcome) => (StatusCode::OK, Json(PerDiemResponse::from(outcome))).into_response(),
        Err(e) => failure(e),
    }
}

// GET /api/per-diem/policy
#[utoipa::path(
    get,
    path = "/api/per-diem/policy",
    tag = "Per-diem",
    responses(
        (status = 200, description = "Política de per-diem em vigor", body = PerDiemPolicy),
        (status = 403, description = "Requer perfil de RH ou administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_policy(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<RoleBackOffice>,
) -> Result<impl IntoResponse, ApiError> {
    let policy = app_state
        .per_diem_service
        .load_policy()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(policy)))
}
