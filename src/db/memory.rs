// src/db/memory.rs
//
// Implementação em memória dos stores, usada nos testes dos serviços e handlers.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ApprovalStore, CertificateStore, NotificationStore, PerDiemStore},
    models::{
        approval::{
            ApprovalRecord, ApprovalStatus, DecisionOutcome, DelegationPlan, TrainingRequest,
            TransitionPlan,
        },
        certificate::{Certificate, NewVerificationEvent},
        notification::{NewNotification, Notification},
        per_diem::{
            DestinationBand, GradeBand, NewPerDiemCalculation, PerDiemCalculation, PolicyEntry,
        },
    },
};

#[derive(Default)]
pub struct MemoryState {
    pub destination_bands: Vec<DestinationBand>,
    pub grade_bands: Vec<GradeBand>,
    pub policies: Vec<PolicyEntry>,
    pub calculations: Vec<PerDiemCalculation>,
    pub requests: Vec<TrainingRequest>,
    pub approvals: Vec<ApprovalRecord>,
    pub notifications: Vec<Notification>,
    pub certificates: Vec<Certificate>,
    pub verifications: Vec<NewVerificationEvent>,
    /// Países cuja consulta de faixa simula uma falha de banco.
    pub failing_countries: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut state = self.state.lock().expect("memory store poisoned");
        f(&mut state)
    }
}

fn to_notification(new: &NewNotification) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        notification_type: new.notification_type,
        title: new.title.clone(),
        message: new.message.clone(),
        reference_type: new.reference_type.to_string(),
        reference_id: new.reference_id,
        is_read: false,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl PerDiemStore for MemoryStore {
    async fn find_destination_band(
        &self,
        country: &str,
        city: Option<&str>,
        on: NaiveDate,
    ) -> Result<Option<DestinationBand>, AppError> {
        self.with(|s| {
            if s.failing_countries.iter().any(|c| c.eq_ignore_ascii_case(country)) {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "conexão perdida consultando {}",
                    country
                )));
            }

            let mut candidates: Vec<&DestinationBand> = s
                .destination_bands
                .iter()
                .filter(|b| b.is_active && b.country.eq_ignore_ascii_case(country))
                .filter(|b| b.valid_from <= on && b.valid_until.is_none_or(|until| until >= on))
                .filter(|b| match (&b.city, city) {
                    (None, _) => true,
                    (Some(band_city), Some(wanted)) => band_city.eq_ignore_ascii_case(wanted),
                    (Some(_), None) => false,
                })
                .collect();

            candidates.sort_by(|a, b| {
                b.city.is_some().cmp(&a.city.is_some()).then(b.valid_from.cmp(&a.valid_from))
            });

            Ok(candidates.first().map(|b| (*b).clone()))
        })
    }

    async fn find_grade_band(&self, grade: i32) -> Result<Option<GradeBand>, AppError> {
        Ok(self.with(|s| {
            s.grade_bands
                .iter()
                .filter(|b| b.covers(grade))
                .min_by_key(|b| b.max_grade - b.min_grade)
                .cloned()
        }))
    }

    async fn list_policy_entries(&self) -> Result<Vec<PolicyEntry>, AppError> {
        Ok(self.with(|s| s.policies.clone()))
    }

    async fn insert_calculation(
        &self,
        new: &NewPerDiemCalculation,
    ) -> Result<PerDiemCalculation, AppError> {
        // Mesmas escalas das colunas NUMERIC da migração
        let calculation = PerDiemCalculation {
            id: Uuid::new_v4(),
            employee_id: new.employee_id,
            training_request_id: new.training_request_id,
            session_id: new.session_id,
            travel_visa_id: new.travel_visa_id,
            calculated_by: new.calculated_by,
            planned_start_date: new.planned_start_date,
            planned_end_date: new.planned_end_date,
            actual_start_date: new.actual_start_date,
            actual_end_date: new.actual_end_date,
            destination_country: new.destination_country.clone(),
            destination_city: new.destination_city.clone(),
            destination_band_id: new.destination_band_id,
            is_domestic: new.is_domestic,
            accommodation_covered: new.accommodation_covered,
            employee_grade: new.employee_grade,
            grade_band_id: new.grade_band_id,
            grade_multiplier: new.grade_multiplier.round_dp(3),
            total_days: new.total_days,
            full_days: new.full_days,
            travel_days: new.travel_days,
            excluded_days: new.excluded_days,
            total_eligible_days: new.total_eligible_days,
            daily_rate: new.daily_rate.round_dp(2),
            currency: new.currency.clone(),
            estimated_amount: new.estimated_amount.round_dp(2),
            final_amount: new.final_amount.map(|a| a.round_dp(2)),
            status: new.status,
            policy_snapshot: new.policy_snapshot.clone(),
            created_at: Utc::now(),
        };

        self.with(|s| s.calculations.push(calculation.clone()));
        Ok(calculation)
    }
}

#[async_trait]
impl ApprovalStore for MemoryStore {
    async fn find_approval(&self, id: Uuid) -> Result<Option<ApprovalRecord>, AppError> {
        Ok(self.with(|s| s.approvals.iter().find(|a| a.id == id).cloned()))
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<TrainingRequest>, AppError> {
        Ok(self.with(|s| s.requests.iter().find(|r| r.id == id).cloned()))
    }

    async fn list_request_approvals(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, AppError> {
        Ok(self.with(|s| {
            let mut approvals: Vec<ApprovalRecord> = s
                .approvals
                .iter()
                .filter(|a| a.training_request_id == request_id)
                .cloned()
                .collect();
            approvals.sort_by_key(|a| a.approval_level);
            approvals
        }))
    }

    async fn list_pending_for_approver(
        &self,
        approver_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, AppError> {
        Ok(self.with(|s| {
            s.approvals
                .iter()
                .filter(|a| a.approver_id == approver_id && a.status == ApprovalStatus::Pending)
                .cloned()
                .collect()
        }))
    }

    async fn apply_transition(&self, plan: &TransitionPlan) -> Result<DecisionOutcome, AppError> {
        self.with(|s| {
            let now = Utc::now();

            let approval_idx = s
                .approvals
                .iter()
                .position(|a| a.id == plan.approval_id && a.status == ApprovalStatus::Pending)
                .ok_or(AppError::ApprovalAlreadyDecided(plan.approval_id))?;
            let request_idx = s
                .requests
                .iter()
                .position(|r| r.id == plan.request_id)
                .ok_or(AppError::TrainingRequestNotFound(plan.request_id))?;

            let approval = &mut s.approvals[approval_idx];
            approval.status = plan.decision.into();
            approval.comments = plan.comments.clone();
            approval.decided_at = Some(now);
            approval.updated_at = now;
            let approval = approval.clone();

            let request = &mut s.requests[request_idx];
            request.status = plan.request_status;
            request.current_approval_level = plan.request_level;
            request.current_approver_id = plan.current_approver_id;
            request.updated_at = now;
            let request = request.clone();

            let next_approval = plan.next_approval.as_ref().map(|next| ApprovalRecord {
                id: Uuid::new_v4(),
                training_request_id: plan.request_id,
                approver_id: next.approver_id,
                role: next.role.clone(),
                approval_level: next.approval_level,
                status: ApprovalStatus::Pending,
                decided_at: None,
                comments: None,
                created_at: now,
                updated_at: now,
            });
            if let Some(next) = &next_approval {
                s.approvals.push(next.clone());
            }

            for notification in &plan.notifications {
                s.notifications.push(to_notification(notification));
            }

            Ok(DecisionOutcome { approval, request, next_approval })
        })
    }

    async fn apply_delegation(&self, plan: &DelegationPlan) -> Result<ApprovalRecord, AppError> {
        self.with(|s| {
            let approval = s
                .approvals
                .iter_mut()
                .find(|a| {
                    a.id == plan.approval_id
                        && a.status == ApprovalStatus::Pending
                        && a.approver_id == plan.previous_approver_id
                })
                .ok_or(AppError::ApprovalAlreadyDecided(plan.approval_id))?;

            approval.approver_id = plan.delegate_id;
            approval.comments = Some(plan.comments.clone());
            approval.updated_at = Utc::now();
            let approval = approval.clone();

            if let Some(request) = s.requests.iter_mut().find(|r| {
                r.id == plan.request_id && r.current_approver_id == Some(plan.previous_approver_id)
            }) {
                request.current_approver_id = Some(plan.delegate_id);
            }

            s.notifications.push(to_notification(&plan.notification));
            Ok(approval)
        })
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        Ok(self.with(|s| {
            s.notifications
                .iter()
                .rev()
                .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
                .cloned()
                .collect()
        }))
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>, AppError> {
        Ok(self.with(|s| {
            s.notifications
                .iter_mut()
                .find(|n| n.id == id && n.user_id == user_id)
                .map(|n| {
                    n.is_read = true;
                    n.clone()
                })
        }))
    }
}

#[async_trait]
impl CertificateStore for MemoryStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<Certificate>, AppError> {
        Ok(self.with(|s| {
            s.certificates.iter().find(|c| c.verification_token == token).cloned()
        }))
    }

    async fn log_verification(&self, event: &NewVerificationEvent) -> Result<(), AppError> {
        self.with(|s| s.verifications.push(event.clone()));
        Ok(())
    }
}
