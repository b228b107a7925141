// src/db/per_diem_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::per_diem::{
        DestinationBand, GradeBand, NewPerDiemCalculation, PerDiemCalculation, PolicyEntry,
    },
};

/// Tudo que o cálculo de per-diem precisa do banco.
#[async_trait]
pub trait PerDiemStore: Send + Sync {
    /// Faixa ativa mais recente do país com `valid_from <= on`. Se a cidade bater, ela vence a faixa nacional.
    async fn find_destination_band(
        &self,
        country: &str,
        city: Option<&str>,
        on: NaiveDate,
    ) -> Result<Option<DestinationBand>, AppError>;

    async fn find_grade_band(&self, grade: i32) -> Result<Option<GradeBand>, AppError>;

    async fn list_policy_entries(&self) -> Result<Vec<PolicyEntry>, AppError>;

    /// Insere sempre um registro novo; cálculos antigos nunca são alterados.
    async fn insert_calculation(
        &self,
        new: &NewPerDiemCalculation,
    ) -> Result<PerDiemCalculation, AppError>;
}

#[derive(Clone)]
pub struct PerDiemRepository {
    pool: PgPool,
}

impl PerDiemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PerDiemStore for PerDiemRepository {
    async fn find_destination_band(
        &self,
        country: &str,
        city: Option<&str>,
        on: NaiveDate,
    ) -> Result<Option<DestinationBand>, AppError> {
        let band = sqlx::query_as::<_, DestinationBand>(
            r#"
            SELECT id, country, city, rate, currency, valid_from, valid_until, is_active
            FROM per_diem_destination_bands
            WHERE is_active = true
              AND upper(country) = upper($1)
              AND valid_from <= $3
              AND (valid_until IS NULL OR valid_until >= $3)
              AND (city IS NULL OR ($2::text IS NOT NULL AND lower(city) = lower($2)))
            ORDER BY (city IS NOT NULL) DESC, valid_from DESC
            LIMIT 1
            "#,
        )
        .bind(country)
        .bind(city)
        .bind(on)
        .fetch_optional(&self.pool)
        .await?;

        Ok(band)
    }

    async fn find_grade_band(&self, grade: i32) -> Result<Option<GradeBand>, AppError> {
        // Em caso de sobreposição, a faixa mais estreita ganha
        let band = sqlx::query_as::<_, GradeBand>(
            r#"
            SELECT id, name, min_grade, max_grade, multiplier, is_active
            FROM per_diem_grade_bands
            WHERE is_active = true
              AND min_grade <= $1
              AND max_grade >= $1
            ORDER BY (max_grade - min_grade) ASC
            LIMIT 1
            "#,
        )
        .bind(grade)
        .fetch_optional(&self.pool)
        .await?;

        Ok(band)
    }

    async fn list_policy_entries(&self) -> Result<Vec<PolicyEntry>, AppError> {
        let entries = sqlx::query_as::<_, PolicyEntry>(
            "SELECT key, value FROM per_diem_policies WHERE is_active = true ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn insert_calculation(
        &self,
        new: &NewPerDiemCalculation,
    ) -> Result<PerDiemCalculation, AppError> {
        let calculation = sqlx::query_as::<_, PerDiemCalculation>(
            r#"
            INSERT INTO per_diem_calculations (
                employee_id, training_request_id, session_id, travel_visa_id, calculated_by,
                planned_start_date, planned_end_date, actual_start_date, actual_end_date,
                destination_country, destination_city, destination_band_id,
                is_domestic, accommodation_covered,
                employee_grade, grade_band_id, grade_multiplier,
                total_days, full_days, travel_days, excluded_days, total_eligible_days,
                daily_rate, currency, estimated_amount, final_amount, status, policy_snapshot
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9,
                $10, $11, $12,
                $13, $14,
                $15, $16, $17,
                $18, $19, $20, $21, $22,
                $23, $24, $25, $26, $27, $28
            )
            RETURNING *
            "#,
        )
        .bind(new.employee_id)
        .bind(new.training_request_id)
        .bind(new.session_id)
        .bind(new.travel_visa_id)
        .bind(new.calculated_by)
        .bind(new.planned_start_date)
        .bind(new.planned_end_date)
        .bind(new.actual_start_date)
        .bind(new.actual_end_date)
        .bind(&new.destination_country)
        .bind(&new.destination_city)
        .bind(new.destination_band_id)
        .bind(new.is_domestic)
        .bind(new.accommodation_covered)
        .bind(new.employee_grade)
        .bind(new.grade_band_id)
        .bind(new.grade_multiplier)
        .bind(new.total_days)
        .bind(new.full_days)
        .bind(new.travel_days)
        .bind(new.excluded_days)
        .bind(new.total_eligible_days)
        .bind(new.daily_rate)
        .bind(&new.currency)
        .bind(new.estimated_amount)
        .bind(new.final_amount)
        .bind(new.status)
        .bind(&new.policy_snapshot)
        .fetch_one(&self.pool)
        .await?;

        Ok(calculation)
    }
}
