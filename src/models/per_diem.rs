// src/models/per_diem.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "per_diem_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CalculationStatus {
    Pending,    // Estimativa
    Calculated, // Valor final (viagem concluída)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMode {
    Estimate,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    Planned,
    Actual,
}

// --- Tabelas de taxa ---

/// Faixa de destino: taxa diária base por país (e opcionalmente cidade).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DestinationBand {
    pub id: Uuid,
    #[schema(example = "PT")]
    pub country: String,
    #[schema(example = "Lisboa")]
    pub city: Option<String>,
    #[schema(example = "120.00")]
    pub rate: Decimal,
    #[schema(example = "EUR")]
    pub currency: Option<String>,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub valid_from: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub valid_until: Option<NaiveDate>,
    pub is_active: bool,
}

/// Faixa de cargo: intervalo de graus com um multiplicador.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GradeBand {
    pub id: Uuid,
    #[schema(example = "Sênior")]
    pub name: String,
    pub min_grade: i32,
    pub max_grade: i32,
    #[schema(example = "1.25")]
    pub multiplier: Decimal,
    pub is_active: bool,
}

impl GradeBand {
    pub fn covers(&self, grade: i32) -> bool {
        self.is_active && self.min_grade <= grade && grade <= self.max_grade
    }
}

// --- Política (configuração tipada) ---

/// Linha crua de `per_diem_policies` (chave + JSON).
#[derive(Debug, Clone, FromRow)]
pub struct PolicyEntry {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TravelDayRate {
    #[schema(example = "50")]
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DefaultCurrency {
    #[schema(example = "USD")]
    pub code: String,
}

/// Conjunto fechado de opções da política. O snapshot gravado em cada cálculo é este struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerDiemPolicy {
    pub travel_day_rate: TravelDayRate,
    pub default_currency: DefaultCurrency,
}

impl Default for PerDiemPolicy {
    fn default() -> Self {
        Self {
            travel_day_rate: TravelDayRate { percentage: Decimal::from(50) },
            default_currency: DefaultCurrency { code: "USD".to_string() },
        }
    }
}

impl PerDiemPolicy {
    /// Monta a política a partir das linhas do banco, validando cada valor.
    /// Chaves desconhecidas são ignoradas; valores malformados são erro.
    pub fn from_entries(entries: &[PolicyEntry]) -> Result<Self, AppError> {
        let mut policy = Self::default();

        for entry in entries {
            match entry.key.as_str() {
                "travel_day_rate" => {
                    let rate: TravelDayRate = serde_json::from_value(entry.value.clone())
                        .map_err(|e| AppError::PolicyConfig(format!("travel_day_rate: {}", e)))?;
                    if rate.percentage < Decimal::ZERO || rate.percentage > Decimal::ONE_HUNDRED {
                        return Err(AppError::PolicyConfig(format!(
                            "travel_day_rate: percentual fora de 0..=100 ({})",
                            rate.percentage
                        )));
                    }
                    policy.travel_day_rate = rate;
                }
                "default_currency" => {
                    let currency: DefaultCurrency = serde_json::from_value(entry.value.clone())
                        .map_err(|e| AppError::PolicyConfig(format!("default_currency: {}", e)))?;
                    if currency.code.trim().is_empty() {
                        return Err(AppError::PolicyConfig("default_currency: código vazio".into()));
                    }
                    policy.default_currency = currency;
                }
                other => {
                    tracing::warn!(key = other, "Chave de política de per-diem desconhecida, ignorando");
                }
            }
        }

        Ok(policy)
    }
}

// --- Entrada do cálculo ---

/// Dados de uma viagem para cálculo.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TripInput {
    pub employee_id: Uuid,
    pub training_request_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub travel_visa_id: Option<Uuid>,

    #[validate(length(min = 2, message = "required"))]
    #[schema(example = "PT")]
    pub destination_country: String,
    #[schema(example = "Lisboa")]
    pub destination_city: Option<String>,

    #[schema(example = 7)]
    pub employee_grade: Option<i32>,

    #[schema(value_type = Option<String>, format = Date, example = "2025-03-10")]
    pub planned_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2025-03-14")]
    pub planned_end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_end_date: Option<NaiveDate>,

    #[serde(default)]
    pub is_domestic: bool,
    #[serde(default)]
    pub accommodation_covered: bool,
}

// --- Registro persistido ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PerDiemCalculation {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub training_request_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub travel_visa_id: Option<Uuid>,
    pub calculated_by: Option<Uuid>,

    #[schema(value_type = Option<String>, format = Date)]
    pub planned_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub planned_end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub actual_end_date: Option<NaiveDate>,

    pub destination_country: String,
    pub destination_city: Option<String>,
    pub destination_band_id: Uuid,
    pub is_domestic: bool,
    pub accommodation_covered: bool,

    pub employee_grade: Option<i32>,
    pub grade_band_id: Option<Uuid>,
    pub grade_multiplier: Decimal,

    pub total_days: i32,
    pub full_days: i32,
    pub travel_days: i32,
    pub excluded_days: i32,
    pub total_eligible_days: Decimal,
    pub daily_rate: Decimal,
    pub currency: String,
    pub estimated_amount: Decimal,
    pub final_amount: Option<Decimal>,
    pub status: CalculationStatus,

    #[schema(value_type = Object)]
    pub policy_snapshot: Value,
    pub created_at: DateTime<Utc>,
}

/// O que o serviço manda o repositório inserir (sem id/created_at).
#[derive(Debug, Clone)]
pub struct NewPerDiemCalculation {
    pub employee_id: Uuid,
    pub training_request_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub travel_visa_id: Option<Uuid>,
    pub calculated_by: Option<Uuid>,
    pub planned_start_date: Option<NaiveDate>,
    pub planned_end_date: Option<NaiveDate>,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub destination_country: String,
    pub destination_city: Option<String>,
    pub destination_band_id: Uuid,
    pub is_domestic: bool,
    pub accommodation_covered: bool,
    pub employee_grade: Option<i32>,
    pub grade_band_id: Option<Uuid>,
    pub grade_multiplier: Decimal,
    pub total_days: i32,
    pub full_days: i32,
    pub travel_days: i32,
    pub excluded_days: i32,
    pub total_eligible_days: Decimal,
    pub daily_rate: Decimal,
    pub currency: String,
    pub estimated_amount: Decimal,
    pub final_amount: Option<Decimal>,
    pub status: CalculationStatus,
    pub policy_snapshot: Value,
}

// --- Resultado ---

/// Detalhamento pronto para exibição.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PerDiemBreakdown {
    pub mode: CalculationMode,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    pub date_source: DateSource,
    pub total_days: i32,
    pub full_days: i32,
    pub travel_days: i32,
    pub excluded_days: i32,
    pub total_eligible_days: Decimal,
    pub full_day_percentage: Decimal,
    pub travel_day_percentage: Decimal,
    pub base_rate: Decimal,
    pub grade_multiplier: Decimal,
    pub daily_rate: Decimal,
    pub currency: String,
    pub accommodation_covered: bool,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CalculationSuccess {
    pub calculation: PerDiemCalculation,
    pub destination_band: DestinationBand,
    pub grade_band: Option<GradeBand>,
    pub breakdown: PerDiemBreakdown,
}

#[derive(Debug, Clone)]
pub enum CalculationOutcome {
    Calculated(Box<CalculationSuccess>),
    ConfigMissing { reason: String },
}

impl CalculationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CalculationOutcome::Calculated(_))
    }
}

/// Corpo de resposta do endpoint (mesmo formato para item de lote).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PerDiemResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<PerDiemCalculation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_band: Option<DestinationBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_band: Option<GradeBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<PerDiemBreakdown>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub config_missing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_missing_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PerDiemResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            calculation: None,
            destination_band: None,
            grade_band: None,
            breakdown: None,
            config_missing: false,
            config_missing_reason: None,
            error: Some(error.into()),
        }
    }
}

impl From<CalculationOutcome> for PerDiemResponse {
    fn from(outcome: CalculationOutcome) -> Self {
        match outcome {
            CalculationOutcome::Calculated(success) => {
                let CalculationSuccess { calculation, destination_band, grade_band, breakdown } = *success;
                Self {
                    success: true,
                    calculation: Some(calculation),
                    destination_band: Some(destination_band),
                    grade_band,
                    breakdown: Some(breakdown),
                    config_missing: false,
                    config_missing_reason: None,
                    error: None,
                }
            }
            CalculationOutcome::ConfigMissing { reason } => Self {
                success: false,
                calculation: None,
                destination_band: None,
                grade_band: None,
                breakdown: None,
                config_missing: true,
                config_missing_reason: Some(reason),
                error: None,
            },
        }
    }
}

// --- Lote ---

/// Participante de um cálculo em lote. Campos ausentes herdam do lote.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkParticipant {
    pub employee_id: Uuid,
    pub employee_grade: Option<i32>,
    pub destination_country: Option<String>,
    pub destination_city: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub planned_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub planned_end_date: Option<NaiveDate>,
    pub accommodation_covered: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkInput {
    pub training_request_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub destination_country: Option<String>,
    pub destination_city: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub planned_start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub planned_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_domestic: bool,
    #[serde(default)]
    pub accommodation_covered: bool,

    #[validate(length(min = 1, message = "required"))]
    pub participants: Vec<BulkParticipant>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkItemResult {
    pub employee_id: Uuid,
    #[serde(flatten)]
    pub result: PerDiemResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct BulkSummary {
    pub total: usize,
    pub calculated: usize,
    pub config_missing: usize,
    pub failed: usize,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkResponse {
    pub success: bool,
    pub results: Vec<BulkItemResult>,
    pub summary: BulkSummary,
}
