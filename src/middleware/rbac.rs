// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{AppRole, AuthContext},
};

/// O que é um requisito de perfil
pub trait RoleDef: Send + Sync + 'static {
    /// Nome exibido na mensagem de erro.
    fn slug() -> &'static str;

    /// Perfis aceitos; basta ter um.
    fn accepted() -> &'static [AppRole];

    fn allows(ctx: &AuthContext) -> bool {
        Self::accepted().iter().any(|role| ctx.has_role(*role))
    }
}

/// Guardião: só deixa passar quem tem um dos perfis de `T`.
pub struct RequireRole<T>(pub AuthContext, pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Usuário autenticado (já rejeita com 401)
        let ctx = AuthContext::from_request_parts(parts, state).await?;

        // B. Perfil
        if !T::allows(&ctx) {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
            return Err(AppError::MissingRole(T::slug()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(ctx, PhantomData))
    }
}

// ---
// PERFIS
// ---

/// RH ou administrador.
pub struct RoleBackOffice;
impl RoleDef for RoleBackOffice {
    fn slug() -> &'static str { AppRole::HrManager.slug() }
    fn accepted() -> &'static [AppRole] { &[AppRole::HrManager, AppRole::Admin] }
}
