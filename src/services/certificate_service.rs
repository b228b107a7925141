// src/services/certificate_service.rs

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use tera::{Context, Tera};

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::CertificateStore,
    models::certificate::{Certificate, NewVerificationEvent, VerificationResult},
};

const TEMPLATE_NAME: &str = "certificate_verification.html";
const TEMPLATE: &str = include_str!("../../templates/certificate_verification.html");

/// Status efetivo: revogação vence expiração.
pub fn effective_status(certificate: &Certificate, now: DateTime<Utc>) -> VerificationResult {
    if certificate.revoked_at.is_some() {
        VerificationResult::Revoked
    } else if certificate.expires_at.is_some_and(|expires| expires < now) {
        VerificationResult::Expired
    } else {
        VerificationResult::Valid
    }
}

/// Página pronta para devolver ao navegador.
#[derive(Debug)]
pub struct VerificationPage {
    pub status: StatusCode,
    pub result: Option<VerificationResult>,
    pub html: String,
}

#[derive(Clone)]
pub struct CertificateService {
    store: Arc<dyn CertificateStore>,
    tera: Arc<Tera>,
}

impl CertificateService {
    pub fn new(store: Arc<dyn CertificateStore>) -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { store, tera: Arc::new(tera) })
    }

    pub async fn verify(
        &self,
        token: Option<&str>,
        user_agent: Option<String>,
        i18n: &I18nStore,
        lang: &str,
    ) -> Result<VerificationPage, AppError> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            let html = self.render(i18n, lang, "missing", "certificate.missing_token", None)?;
            return Ok(VerificationPage { status: StatusCode::BAD_REQUEST, result: None, html });
        };

        let certificate = self.store.find_by_token(token).await?;
        let result = match &certificate {
            Some(cert) => effective_status(cert, Utc::now()),
            None => VerificationResult::NotFound,
        };

        let event = NewVerificationEvent {
            certificate_id: certificate.as_ref().map(|c| c.id),
            token: token.to_string(),
            result,
            user_agent,
        };
        // Auditoria não pode derrubar a consulta
        if let Err(e) = self.store.log_verification(&event).await {
            tracing::warn!(error = %e, result = result.as_str(), "Falha ao registrar verificação de certificado");
        }

        tracing::info!(result = result.as_str(), "🎓 Certificado verificado");

        let status = match result {
            VerificationResult::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::OK,
        };
        let html = self.render(i18n, lang, result.as_str(), result.i18n_key(), certificate.as_ref())?;

        Ok(VerificationPage { status, result: Some(result), html })
    }

    fn render(
        &self,
        i18n: &I18nStore,
        lang: &str,
        status_class: &str,
        headline_key: &str,
        certificate: Option<&Certificate>,
    ) -> Result<String, AppError> {
        let t = |key: &str| i18n.translate(lang, key);
        let date = |d: DateTime<Utc>| d.format("%d/%m/%Y").to_string();

        let mut ctx = Context::new();
        ctx.insert("lang", lang);
        ctx.insert("title", &t("certificate.title"));
        ctx.insert("headline", &t(headline_key));
        ctx.insert("status", status_class);
        ctx.insert("label_recipient", &t("certificate.recipient"));
        ctx.insert("label_course", &t("certificate.course"));
        ctx.insert("label_issued_at", &t("certificate.issued_at"));
        ctx.insert("label_expires_at", &t("certificate.expires_at"));
        ctx.insert("label_revoked_at", &t("certificate.revoked_at"));

        if let Some(cert) = certificate {
            ctx.insert("recipient_name", &cert.recipient_name);
            ctx.insert("course_title", &cert.course_title);
            ctx.insert("issued_at", &date(cert.issued_at));
            ctx.insert("expires_at", &cert.expires_at.map(date));
            ctx.insert("revoked_at", &cert.revoked_at.map(date));
        }

        Ok(self.tera.render(TEMPLATE_NAME, &ctx)?)
    }
}
