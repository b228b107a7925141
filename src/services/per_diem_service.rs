// src/services/per_diem_service.rs

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PerDiemStore,
    models::per_diem::{
        BulkInput, BulkItemResult, BulkParticipant, BulkResponse, BulkSummary,
        CalculationMode, CalculationOutcome, CalculationStatus, CalculationSuccess, DateSource,
        DestinationBand, GradeBand, NewPerDiemCalculation, PerDiemBreakdown, PerDiemPolicy,
        PerDiemResponse, TripInput,
    },
};

/// Primeiro e último dia da viagem. Fixo, independente da duração.
pub const TRAVEL_DAYS: i32 = 2;
/// Fins de semana / dias excluídos: ainda não há regra, sempre zero.
pub const EXCLUDED_DAYS: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub total_days: i32,
    pub full_days: i32,
    pub travel_days: i32,
    pub excluded_days: i32,
    pub total_eligible_days: Decimal,
}

/// Conta os dias da viagem (inclusivo nas duas pontas) e aplica o rateio dos dias de deslocamento.
pub fn count_days(start: NaiveDate, end: NaiveDate, travel_day_percentage: Decimal) -> DayCount {
    let total_days = ((end - start).num_days() + 1) as i32;
    let full_days = (total_days - TRAVEL_DAYS).max(0);
    let total_eligible_days = Decimal::from(full_days)
        + Decimal::from(TRAVEL_DAYS) * travel_day_percentage / Decimal::ONE_HUNDRED;

    DayCount {
        total_days,
        full_days,
        travel_days: TRAVEL_DAYS,
        excluded_days: EXCLUDED_DAYS,
        total_eligible_days,
    }
}

/// Escolhe o par de datas conforme o modo. No final, as datas reais têm prioridade
/// campo a campo, caindo para as planejadas.
pub fn select_dates(
    input: &TripInput,
    mode: CalculationMode,
) -> Option<(NaiveDate, NaiveDate, DateSource)> {
    let (start, end, used_actual) = match mode {
        CalculationMode::Estimate => (input.planned_start_date, input.planned_end_date, false),
        CalculationMode::Final => (
            input.actual_start_date.or(input.planned_start_date),
            input.actual_end_date.or(input.planned_end_date),
            input.actual_start_date.is_some() || input.actual_end_date.is_some(),
        ),
    };

    let source = if used_actual { DateSource::Actual } else { DateSource::Planned };
    Some((start?, end?, source))
}

/// Aritmética pura do per-diem. Não toca no banco.
pub fn compute_breakdown(
    mode: CalculationMode,
    (start, end, date_source): (NaiveDate, NaiveDate, DateSource),
    destination: &DestinationBand,
    grade: Option<&GradeBand>,
    accommodation_covered: bool,
    policy: &PerDiemPolicy,
) -> PerDiemBreakdown {
    let days = count_days(start, end, policy.travel_day_rate.percentage);
    let grade_multiplier = grade.map(|g| g.multiplier).unwrap_or(Decimal::ONE);

    let daily_rate = if accommodation_covered {
        Decimal::ZERO
    } else {
        (destination.rate * grade_multiplier).round_dp(2)
    };
    let amount = (daily_rate * days.total_eligible_days).round_dp(2);

    let currency = destination
        .currency
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| policy.default_currency.code.clone());

    PerDiemBreakdown {
        mode,
        start_date: start,
        end_date: end,
        date_source,
        total_days: days.total_days,
        full_days: days.full_days,
        travel_days: days.travel_days,
        excluded_days: days.excluded_days,
        total_eligible_days: days.total_eligible_days,
        full_day_percentage: Decimal::ONE_HUNDRED,
        travel_day_percentage: policy.travel_day_rate.percentage,
        base_rate: destination.rate,
        grade_multiplier,
        daily_rate,
        currency,
        accommodation_covered,
        amount,
    }
}

fn describe_destination(country: &str, city: Option<&str>) -> String {
    match city {
        Some(city) => format!("{}/{}", country, city),
        None => country.to_string(),
    }
}

#[derive(Clone)]
pub struct PerDiemService {
    store: Arc<dyn PerDiemStore>,
}

impl PerDiemService {
    pub fn new(store: Arc<dyn PerDiemStore>) -> Self {
        Self { store }
    }

    pub async fn load_policy(&self) -> Result<PerDiemPolicy, AppError> {
        let entries = self.store.list_policy_entries().await?;
        PerDiemPolicy::from_entries(&entries)
    }

    /// Calcula e grava um novo registro. Falta de configuração volta como
    /// `ConfigMissing` (nada é gravado); só falhas inesperadas viram `Err`.
    pub async fn calculate(
        &self,
        input: &TripInput,
        mode: CalculationMode,
        acting_user: Option<Uuid>,
    ) -> Result<CalculationOutcome, AppError> {
        // 1. Datas
        let Some(dates) = select_dates(input, mode) else {
            return Ok(CalculationOutcome::ConfigMissing {
                reason: "Datas da viagem não informadas (início e fim são obrigatórios).".into(),
            });
        };
        let (start, end, _) = dates;
        if end < start {
            return Err(AppError::InvalidDateRange { start, end });
        }

        let country = input.destination_country.trim();
        let city = input
            .destination_city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        // 2. Faixa de destino
        let Some(destination_band) = self.store.find_destination_band(country, city, start).await?
        else {
            tracing::info!(
                employee_id = %input.employee_id,
                destination = %describe_destination(country, city),
                "⚠️ Sem faixa de per-diem para o destino"
            );
            return Ok(CalculationOutcome::ConfigMissing {
                reason: format!(
                    "Nenhuma faixa de per-diem ativa para {} em {}. Cadastre as taxas do destino.",
                    describe_destination(country, city),
                    start
                ),
            });
        };

        // 3. Faixa de cargo (opcional)
        let grade_band = match input.employee_grade {
            Some(grade) => self.store.find_grade_band(grade).await?,
            None => None,
        };

        // 4..8. Aritmética
        let policy = self.load_policy().await?;
        let breakdown = compute_breakdown(
            mode,
            dates,
            &destination_band,
            grade_band.as_ref(),
            input.accommodation_covered,
            &policy,
        );

        // 9. Grava (sempre insert) com o snapshot da política usada
        let policy_snapshot = serde_json::to_value(&policy)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::new(e)))?;

        let (status, final_amount) = match mode {
            CalculationMode::Estimate => (CalculationStatus::Pending, None),
            CalculationMode::Final => (CalculationStatus::Calculated, Some(breakdown.amount)),
        };

        let new = NewPerDiemCalculation {
            employee_id: input.employee_id,
            training_request_id: input.training_request_id,
            session_id: input.session_id,
            travel_visa_id: input.travel_visa_id,
            calculated_by: acting_user,
            planned_start_date: input.planned_start_date,
            planned_end_date: input.planned_end_date,
            actual_start_date: input.actual_start_date,
            actual_end_date: input.actual_end_date,
            destination_country: country.to_string(),
            destination_city: city.map(str::to_string),
            destination_band_id: destination_band.id,
            is_domestic: input.is_domestic,
            accommodation_covered: input.accommodation_covered,
            employee_grade: input.employee_grade,
            grade_band_id: grade_band.as_ref().map(|g| g.id),
            grade_multiplier: breakdown.grade_multiplier,
            total_days: breakdown.total_days,
            full_days: breakdown.full_days,
            travel_days: breakdown.travel_days,
            excluded_days: breakdown.excluded_days,
            total_eligible_days: breakdown.total_eligible_days,
            daily_rate: breakdown.daily_rate,
            currency: breakdown.currency.clone(),
            estimated_amount: breakdown.amount,
            final_amount,
            status,
            policy_snapshot,
        };

        let calculation = self.store.insert_calculation(&new).await?;

        tracing::info!(
            calculation_id = %calculation.id,
            employee_id = %calculation.employee_id,
            amount = %breakdown.amount,
            currency = %breakdown.currency,
            mode = ?mode,
            "💰 Per-diem calculado"
        );

        Ok(CalculationOutcome::Calculated(Box::new(CalculationSuccess {
            calculation,
            destination_band,
            grade_band,
            breakdown,
        })))
    }

    /// Lote: sempre estimativa, um resultado por participante. Falha de um não
    /// interrompe os demais.
    pub async fn calculate_bulk(&self, input: &BulkInput, acting_user: Option<Uuid>) -> BulkResponse {
        let mut results = Vec::with_capacity(input.participants.len());
        let mut summary = BulkSummary { total: input.participants.len(), ..Default::default() };

        for participant in &input.participants {
            let result = match merge_participant(input, participant) {
                None => PerDiemResponse::from(CalculationOutcome::ConfigMissing {
                    reason: "Destino da viagem não informado para o participante.".into(),
                }),
                Some(trip) => match self.calculate(&trip, CalculationMode::Estimate, acting_user).await {
                    Ok(outcome) => PerDiemResponse::from(outcome),
                    Err(e) => {
                        tracing::warn!(
                            employee_id = %participant.employee_id,
                            error = %e,
                            "Falha no cálculo de per-diem do participante"
                        );
                        PerDiemResponse::failure(e.to_string())
                    }
                },
            };

            if result.success {
                summary.calculated += 1;
                if let Some(breakdown) = &result.breakdown {
                    summary.total_amount += breakdown.amount;
                }
            } else if result.config_missing {
                summary.config_missing += 1;
            } else {
                summary.failed += 1;
            }

            results.push(BulkItemResult { employee_id: participant.employee_id, result });
        }

        tracing::info!(
            total = summary.total,
            calculated = summary.calculated,
            config_missing = summary.config_missing,
            failed = summary.failed,
            "📦 Lote de per-diem processado"
        );

        BulkResponse { success: true, results, summary }
    }
}

/// Dados do participante sobrepõem os do lote. Sem país em nenhum dos dois, não há o que calcular.
fn merge_participant(batch: &BulkInput, participant: &BulkParticipant) -> Option<TripInput> {
    let country = non_blank(&participant.destination_country)
        .or_else(|| non_blank(&batch.destination_country))?;

    Some(TripInput {
        employee_id: participant.employee_id,
        training_request_id: batch.training_request_id,
        session_id: batch.session_id,
        travel_visa_id: None,
        destination_country: country,
        destination_city: non_blank(&participant.destination_city)
            .or_else(|| non_blank(&batch.destination_city)),
        employee_grade: participant.employee_grade,
        planned_start_date: participant.planned_start_date.or(batch.planned_start_date),
        planned_end_date: participant.planned_end_date.or(batch.planned_end_date),
        actual_start_date: None,
        actual_end_date: None,
        is_domestic: batch.is_domestic,
        accommodation_covered: participant
            .accommodation_covered
            .unwrap_or(batch.accommodation_covered),
    })
}

/// Texto em branco conta como ausente.
fn non_blank(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}
