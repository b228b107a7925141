// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Per-diem ---
        handlers::per_diem::calculate_per_diem,
        handlers::per_diem::get_policy,

        // --- Approvals ---
        handlers::approvals::decide,
        handlers::approvals::delegate,
        handlers::approvals::list_pending,
        handlers::approvals::list_request_chain,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,

        // --- Certificates ---
        handlers::certificates::verify_certificate,
    ),
    components(
        schemas(
            // --- Per-diem ---
            models::per_diem::CalculationStatus,
            models::per_diem::CalculationMode,
            models::per_diem::DateSource,
            models::per_diem::DestinationBand,
            models::per_diem::GradeBand,
            models::per_diem::TravelDayRate,
            models::per_diem::DefaultCurrency,
            models::per_diem::PerDiemPolicy,
            models::per_diem::TripInput,
            models::per_diem::PerDiemCalculation,
            models::per_diem::PerDiemBreakdown,
            models::per_diem::PerDiemResponse,
            models::per_diem::BulkParticipant,
            models::per_diem::BulkInput,
            models::per_diem::BulkItemResult,
            models::per_diem::BulkSummary,
            models::per_diem::BulkResponse,
            handlers::per_diem::PerDiemAction,

            // --- Approvals ---
            models::approval::ApprovalStatus,
            models::approval::Decision,
            models::approval::TrainingRequest,
            models::approval::ApprovalRecord,
            models::approval::DecisionOutcome,
            handlers::approvals::DecisionPayload,
            handlers::approvals::DelegationPayload,

            // --- Notifications ---
            models::notification::NotificationType,
            models::notification::Notification,
        )
    ),
    tags(
        (name = "Per-diem", description = "Cálculo de diárias de viagem de treinamento"),
        (name = "Approvals", description = "Cadeia de aprovação das solicitações de treinamento"),
        (name = "Notifications", description = "Notificações do usuário"),
        (name = "Certificates", description = "Verificação pública de certificados")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
