// src/models/auth.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Claims do JWT emitido pelo provedor de autenticação externo
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time
    #[serde(default)]
    pub iat: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    Admin,
    HrManager,
    Manager,
    Employee,
}

impl AppRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(AppRole::Admin),
            "hr_manager" | "hr" => Some(AppRole::HrManager),
            "manager" => Some(AppRole::Manager),
            "employee" => Some(AppRole::Employee),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            AppRole::Admin => "admin",
            AppRole::HrManager => "hr_manager",
            AppRole::Manager => "manager",
            AppRole::Employee => "employee",
        }
    }
}

/// Quem está chamando. Montado por requisição no `auth_guard`; não existe
/// estado de sessão global no processo.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub roles: HashSet<AppRole>,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        let roles = claims
            .roles
            .iter()
            .filter_map(|r| AppRole::parse(r))
            .collect();

        Self {
            user_id: claims.sub,
            email: claims.email,
            roles,
        }
    }

    pub fn has_role(&self, role: AppRole) -> bool {
        self.roles.contains(&role)
    }

    /// Admin e RH podem agir em nome de qualquer aprovador.
    pub fn is_back_office(&self) -> bool {
        self.has_role(AppRole::Admin) || self.has_role(AppRole::HrManager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_are_dropped() {
        let ctx = AuthContext::from_claims(Claims {
            sub: Uuid::new_v4(),
            exp: 0,
            iat: 0,
            email: None,
            roles: vec!["HR".into(), "superuser".into(), "employee".into()],
        });

        assert_eq!(ctx.roles.len(), 2);
        assert!(ctx.is_back_office());
        assert!(ctx.has_role(AppRole::Employee));
    }
}
