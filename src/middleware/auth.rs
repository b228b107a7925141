// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{AuthContext, Claims},
};

/// Valida o JWT (HS256, segredo compartilhado com o provedor) e monta o contexto.
pub fn decode_context(token: &str, secret: &str) -> Result<AuthContext, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // O provedor emite `aud` próprio; só nos importam assinatura e expiração
    validation.validate_aud = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(AuthContext::from_claims(data.claims))
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let ctx = decode_context(token.token(), &app_state.config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Token rejeitado");
        AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store)
    })?;

    // Contexto vive só nesta requisição
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

// Extrator para obter o contexto autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }

        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
        Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
    }
}
