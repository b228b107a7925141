// src/db/certificate_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::certificate::{Certificate, NewVerificationEvent},
};

#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<Certificate>, AppError>;

    async fn log_verification(&self, event: &NewVerificationEvent) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct CertificateRepository {
    pool: PgPool,
}

impl CertificateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CertificateStore for CertificateRepository {
    async fn find_by_token(&self, token: &str) -> Result<Option<Certificate>, AppError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            r#"
            SELECT id, verification_token, recipient_name, course_title,
                   issued_at, expires_at, revoked_at
            FROM certificates
            WHERE verification_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(certificate)
    }

    async fn log_verification(&self, event: &NewVerificationEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO certificate_verifications (certificate_id, token, result, user_agent)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.certificate_id)
        .bind(&event.token)
        .bind(event.result)
        .bind(&event.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
