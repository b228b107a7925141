// src/handlers/certificates.rs

use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse},
};
use serde::Deserialize;

use crate::{common::error::ApiError, config::AppState, middleware::i18n::Locale};

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub t: Option<String>,
}

// GET /verify-certificate?t=
#[utoipa::path(
    get,
    path = "/verify-certificate",
    tag = "Certificates",
    responses(
        (status = 200, description = "Página HTML com o status do certificado", body = String, content_type = "text/html"),
        (status = 400, description = "Token ausente", body = String, content_type = "text/html"),
        (status = 404, description = "Certificado não encontrado", body = String, content_type = "text/html")
    ),
    params(
        ("t" = Option<String>, Query, description = "Token de verificação impresso no certificado")
    )
)]
pub async fn verify_certificate(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    Query(query): Query<VerifyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let page = app_state
        .certificate_service
        .verify(query.t.as_deref(), user_agent, &app_state.i18n_store, &locale.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((page.status, Html(page.html)))
}
