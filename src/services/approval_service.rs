// src/services/approval_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ApprovalStore,
    models::{
        approval::{
            ApprovalRecord, ApprovalStatus, Decision, DecisionOutcome, DelegationPlan,
            NextApproval, TrainingRequest, TransitionPlan,
        },
        auth::AuthContext,
        notification::{NewNotification, NotificationType},
    },
};

const REFERENCE_TYPE: &str = "training_request";
const DEFAULT_NEXT_ROLE: &str = "approver";

/// Decisão já validada pelo handler. `request_id`/`requester_id` são opcionais:
/// quando vierem, precisam bater com o que está no banco.
#[derive(Debug, Clone)]
pub struct DecisionInput {
    pub decision: Decision,
    pub comments: Option<String>,
    pub next_approver_id: Option<Uuid>,
    pub next_approval_level: Option<i32>,
    pub next_approver_role: Option<String>,
    pub request_id: Option<Uuid>,
    pub requester_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct DelegationInput {
    pub delegate_id: Uuid,
    pub reason: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Decide a transição sem tocar no banco.
pub fn plan_transition(
    approval: &ApprovalRecord,
    request: &TrainingRequest,
    input: &DecisionInput,
) -> Result<TransitionPlan, AppError> {
    if approval.status.is_terminal() || request.status.is_terminal() {
        return Err(AppError::ApprovalAlreadyDecided(approval.id));
    }

    if let Some(level) = input.next_approval_level.filter(|l| *l <= approval.approval_level) {
        return Err(AppError::InvalidApprovalLevel {
            current: approval.approval_level,
            requested: level,
        });
    }

    // Nível ou perfil sem aprovador não encerra a cadeia
    let wants_next_step = input.next_approval_level.is_some() || non_blank(&input.next_approver_role).is_some();
    if matches!(input.decision, Decision::Approved) && input.next_approver_id.is_none() && wants_next_step {
        return Err(AppError::MissingNextApprover);
    }

    let comments = non_blank(&input.comments);
    let base = TransitionPlan {
        approval_id: approval.id,
        request_id: request.id,
        decision: input.decision,
        comments: comments.clone(),
        request_status: ApprovalStatus::Pending,
        request_level: request.current_approval_level,
        current_approver_id: None,
        next_approval: None,
        notifications: Vec::new(),
    };

    let plan = match (input.decision, input.next_approver_id) {
        (Decision::Rejected, _) => {
            let reason = comments.map(|c| format!(" Motivo: {}", c)).unwrap_or_default();
            TransitionPlan {
                request_status: ApprovalStatus::Rejected,
                notifications: vec![NewNotification {
                    user_id: request.requester_id,
                    notification_type: NotificationType::RequestRejected,
                    title: "Solicitação rejeitada".into(),
                    message: format!("Sua solicitação \"{}\" foi rejeitada.{}", request.title, reason),
                    reference_type: REFERENCE_TYPE,
                    reference_id: request.id,
                }],
                ..base
            }
        }
        (Decision::Approved, Some(next_approver_id)) => {
            let level = input.next_approval_level.unwrap_or(approval.approval_level + 1);
            let role = non_blank(&input.next_approver_role).unwrap_or_else(|| DEFAULT_NEXT_ROLE.into());
            TransitionPlan {
                request_status: ApprovalStatus::Pending,
                request_level: level,
                current_approver_id: Some(next_approver_id),
                next_approval: Some(NextApproval {
                    approver_id: next_approver_id,
                    role,
                    approval_level: level,
                }),
                notifications: vec![NewNotification {
                    user_id: next_approver_id,
                    notification_type: NotificationType::ApprovalRequired,
                    title: "Aprovação pendente".into(),
                    message: format!(
                        "A solicitação \"{}\" aguarda sua aprovação (nível {}).",
                        request.title, level
                    ),
                    reference_type: REFERENCE_TYPE,
                    reference_id: request.id,
                }],
                ..base
            }
        }
        (Decision::Approved, None) => TransitionPlan {
            request_status: ApprovalStatus::Approved,
            notifications: vec![NewNotification {
                user_id: request.requester_id,
                notification_type: NotificationType::RequestApproved,
                title: "Solicitação aprovada".into(),
                message: format!("Sua solicitação \"{}\" foi aprovada.", request.title),
                reference_type: REFERENCE_TYPE,
                reference_id: request.id,
            }],
            ..base
        },
    };

    Ok(plan)
}

pub fn plan_delegation(
    approval: &ApprovalRecord,
    request: &TrainingRequest,
    input: &DelegationInput,
) -> Result<DelegationPlan, AppError> {
    if approval.status.is_terminal() {
        return Err(AppError::ApprovalAlreadyDecided(approval.id));
    }
    if input.delegate_id == approval.approver_id {
        return Err(AppError::InvalidDelegate);
    }

    let comments = match non_blank(&input.reason) {
        Some(reason) => format!("Delegated: {}", reason),
        None => "Delegated:".to_string(),
    };

    Ok(DelegationPlan {
        approval_id: approval.id,
        request_id: request.id,
        previous_approver_id: approval.approver_id,
        delegate_id: input.delegate_id,
        comments,
        notification: NewNotification {
            user_id: input.delegate_id,
            notification_type: NotificationType::ApprovalDelegated,
            title: "Aprovação delegada a você".into(),
            message: format!(
                "A aprovação da solicitação \"{}\" (nível {}) foi delegada a você.",
                request.title, approval.approval_level
            ),
            reference_type: REFERENCE_TYPE,
            reference_id: request.id,
        },
    })
}

#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn ApprovalStore>,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn ApprovalStore>) -> Self {
        Self { store }
    }

    async fn load(&self, approval_id: Uuid) -> Result<(ApprovalRecord, TrainingRequest), AppError> {
        let approval = self
            .store
            .find_approval(approval_id)
            .await?
            .ok_or(AppError::ApprovalNotFound(approval_id))?;

        let request = self
            .store
            .find_request(approval.training_request_id)
            .await?
            .ok_or(AppError::TrainingRequestNotFound(approval.training_request_id))?;

        Ok((approval, request))
    }

    fn ensure_can_act(ctx: &AuthContext, approval: &ApprovalRecord) -> Result<(), AppError> {
        if ctx.user_id == approval.approver_id || ctx.is_back_office() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub async fn decide(
        &self,
        ctx: &AuthContext,
        approval_id: Uuid,
        input: DecisionInput,
    ) -> Result<DecisionOutcome, AppError> {
        let (approval, request) = self.load(approval_id).await?;

        Self::ensure_can_act(ctx, &approval)?;

        if input.request_id.is_some_and(|id| id != request.id)
            || input.requester_id.is_some_and(|id| id != request.requester_id)
        {
            return Err(AppError::RequestMismatch);
        }

        let plan = plan_transition(&approval, &request, &input)?;
        let outcome = self.store.apply_transition(&plan).await?;

        tracing::info!(
            approval_id = %approval.id,
            request_id = %request.id,
            decided_by = %ctx.user_id,
            decision = ?input.decision,
            request_status = ?outcome.request.status,
            level = outcome.request.current_approval_level,
            "✅ Decisão de aprovação registrada"
        );

        Ok(outcome)
    }

    pub async fn delegate(
        &self,
        ctx: &AuthContext,
        approval_id: Uuid,
        input: DelegationInput,
    ) -> Result<ApprovalRecord, AppError> {
        let (approval, request) = self.load(approval_id).await?;

        Self::ensure_can_act(ctx, &approval)?;

        let plan = plan_delegation(&approval, &request, &input)?;
        let updated = self.store.apply_delegation(&plan).await?;

        tracing::info!(
            approval_id = %approval.id,
            from = %plan.previous_approver_id,
            to = %plan.delegate_id,
            "🔁 Aprovação delegada"
        );

        Ok(updated)
    }

    pub async fn list_pending(&self, ctx: &AuthContext) -> Result<Vec<ApprovalRecord>, AppError> {
        self.store.list_pending_for_approver(ctx.user_id).await
    }

    /// Cadeia de aprovação. Visível ao solicitante, a quem participa da cadeia e ao back-office.
    pub async fn list_chain(
        &self,
        ctx: &AuthContext,
        request_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, AppError> {
        let request = self
            .store
            .find_request(request_id)
            .await?
            .ok_or(AppError::TrainingRequestNotFound(request_id))?;

        let chain = self.store.list_request_approvals(request_id).await?;

        let allowed = ctx.is_back_office()
            || request.requester_id == ctx.user_id
            || chain.iter().any(|a| a.approver_id == ctx.user_id);
        if !allowed {
            return Err(AppError::Forbidden);
        }

        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::auth::AppRole;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: ApprovalService,
        requester: Uuid,
        approver: Uuid,
        request_id: Uuid,
        approval_id: Uuid,
    }

    fn ctx(user_id: Uuid, roles: &[AppRole]) -> AuthContext {
        AuthContext { user_id, email: None, roles: roles.iter().copied().collect::<HashSet<_>>() }
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let requester = Uuid::new_v4();
        let approver = Uuid::new_v4();
        let request_id = Uuid::new_v4();
        let approval_id = Uuid::new_v4();
        let now = Utc::now();

        store.with(|s| {
            s.requests.push(TrainingRequest {
                id: request_id,
                requester_id: requester,
                title: "Curso de Liderança".into(),
                status: ApprovalStatus::Pending,
                current_approval_level: 1,
                current_approver_id: Some(approver),
                created_at: now,
                updated_at: now,
            });
            s.approvals.push(ApprovalRecord {
                id: approval_id,
                training_request_id: request_id,
                approver_id: approver,
                role: "manager".into(),
                approval_level: 1,
                status: ApprovalStatus::Pending,
                decided_at: None,
                comments: None,
                created_at: now,
                updated_at: now,
            });
        });

        Fixture {
            service: ApprovalService::new(store.clone()),
            store,
            requester,
            approver,
            request_id,
            approval_id,
        }
    }

    fn decision(decision: Decision) -> DecisionInput {
        DecisionInput {
            decision,
            comments: None,
            next_approver_id: None,
            next_approval_level: None,
            next_approver_role: None,
            request_id: None,
            requester_id: None,
        }
    }

    #[tokio::test]
    async fn rejection_closes_request_and_notifies_requester() {
        let f = fixture();
        let mut input = decision(Decision::Rejected);
        input.comments = Some("Fora do orçamento".into());
        // Próximo aprovador é ignorado na rejeição
        input.next_approver_id = Some(Uuid::new_v4());

        let outcome = f.service.decide(&ctx(f.approver, &[]), f.approval_id, input).await.unwrap();

        assert_eq!(outcome.approval.status, ApprovalStatus::Rejected);
        assert_eq!(outcome.request.status, ApprovalStatus::Rejected);
        assert_eq!(outcome.request.current_approver_id, None);
        assert!(outcome.next_approval.is_none());

        f.store.with(|s| {
            assert_eq!(s.approvals.len(), 1);
            assert_eq!(s.notifications.len(), 1);
            assert_eq!(s.notifications[0].user_id, f.requester);
            assert_eq!(s.notifications[0].notification_type, NotificationType::RequestRejected);
            assert!(s.notifications[0].message.contains("Fora do orçamento"));
        });
    }

    #[tokio::test]
    async fn approval_with_next_step_advances_level() {
        let f = fixture();
        let next = Uuid::new_v4();
        let mut input = decision(Decision::Approved);
        input.next_approver_id = Some(next);
        input.next_approval_level = Some(3);
        input.next_approver_role = Some("hr_manager".into());

        let outcome = f.service.decide(&ctx(f.approver, &[]), f.approval_id, input).await.unwrap();

        assert_eq!(outcome.request.status, ApprovalStatus::Pending);
        assert_eq!(outcome.request.current_approval_level, 3);
        assert_eq!(outcome.request.current_approver_id, Some(next));
        let created = outcome.next_approval.unwrap();
        assert_eq!(created.approver_id, next);
        assert_eq!(created.approval_level, 3);
        assert_eq!(created.role, "hr_manager");

        f.store.with(|s| {
            let pending: Vec<_> = s.approvals.iter().filter(|a| a.status == ApprovalStatus::Pending).collect();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].approver_id, next);
            assert_eq!(s.notifications.len(), 1);
            assert_eq!(s.notifications[0].user_id, next);
            assert_eq!(s.notifications[0].notification_type, NotificationType::ApprovalRequired);
        });
    }

    #[tokio::test]
    async fn next_level_defaults_to_current_plus_one() {
        let f = fixture();
        let mut input = decision(Decision::Approved);
        input.next_approver_id = Some(Uuid::new_v4());

        let outcome = f.service.decide(&ctx(f.approver, &[]), f.approval_id, input).await.unwrap();
        assert_eq!(outcome.request.current_approval_level, 2);
        assert_eq!(outcome.next_approval.unwrap().role, DEFAULT_NEXT_ROLE);
    }

    #[tokio::test]
    async fn final_approval_completes_request() {
        let f = fixture();
        let outcome = f
            .service
            .decide(&ctx(f.approver, &[]), f.approval_id, decision(Decision::Approved))
            .await
            .unwrap();

        assert_eq!(outcome.request.status, ApprovalStatus::Approved);
        assert_eq!(outcome.request.current_approver_id, None);
        f.store.with(|s| {
            assert_eq!(s.notifications.len(), 1);
            assert_eq!(s.notifications[0].user_id, f.requester);
            assert_eq!(s.notifications[0].notification_type, NotificationType::RequestApproved);
        });
    }

    #[tokio::test]
    async fn second_decision_conflicts_and_changes_nothing() {
        let f = fixture();
        let mut first = decision(Decision::Approved);
        first.next_approver_id = Some(Uuid::new_v4());
        f.service.decide(&ctx(f.approver, &[]), f.approval_id, first).await.unwrap();

        let again = f
            .service
            .decide(&ctx(f.approver, &[]), f.approval_id, decision(Decision::Approved))
            .await;

        assert!(matches!(again, Err(AppError::ApprovalAlreadyDecided(_))));
        f.store.with(|s| {
            assert_eq!(s.approvals.len(), 2);
            assert_eq!(s.notifications.len(), 1);
            assert_eq!(s.requests[0].status, ApprovalStatus::Pending);
        });
    }

    #[tokio::test]
    async fn stale_plan_is_rejected_by_the_store() {
        // Dois planos montados sobre o mesmo snapshot: só o primeiro entra.
        let f = fixture();
        let (approval, request) = f.service.load(f.approval_id).await.unwrap();
        let plan = plan_transition(&approval, &request, &decision(Decision::Approved)).unwrap();

        f.store.apply_transition(&plan).await.unwrap();
        let lost = f.store.apply_transition(&plan).await;

        assert!(matches!(lost, Err(AppError::ApprovalAlreadyDecided(_))));
        assert_eq!(f.store.with(|s| s.notifications.len()), 1);
    }

    #[tokio::test]
    async fn stranger_cannot_decide_but_back_office_can() {
        let f = fixture();
        let stranger = ctx(Uuid::new_v4(), &[AppRole::Manager]);
        let denied = f.service.decide(&stranger, f.approval_id, decision(Decision::Approved)).await;
        assert!(matches!(denied, Err(AppError::Forbidden)));

        let hr = ctx(Uuid::new_v4(), &[AppRole::HrManager]);
        let outcome = f.service.decide(&hr, f.approval_id, decision(Decision::Approved)).await.unwrap();
        assert_eq!(outcome.request.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn unknown_approval_is_not_found() {
        let f = fixture();
        let missing = Uuid::new_v4();
        let result = f.service.decide(&ctx(f.approver, &[]), missing, decision(Decision::Approved)).await;
        assert!(matches!(result, Err(AppError::ApprovalNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn next_level_must_increase() {
        let f = fixture();
        let mut input = decision(Decision::Approved);
        input.next_approver_id = Some(Uuid::new_v4());
        input.next_approval_level = Some(1);

        let result = f.service.decide(&ctx(f.approver, &[]), f.approval_id, input).await;
        assert!(matches!(result, Err(AppError::InvalidApprovalLevel { current: 1, requested: 1 })));
        assert_eq!(f.store.with(|s| s.requests[0].status), ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn next_level_or_role_without_approver_is_rejected() {
        let f = fixture();

        let mut with_level = decision(Decision::Approved);
        with_level.next_approval_level = Some(2);
        let result = f.service.decide(&ctx(f.approver, &[]), f.approval_id, with_level).await;
        assert!(matches!(result, Err(AppError::MissingNextApprover)));

        let mut with_role = decision(Decision::Approved);
        with_role.next_approver_role = Some("hr_manager".into());
        let result = f.service.decide(&ctx(f.approver, &[]), f.approval_id, with_role).await;
        assert!(matches!(result, Err(AppError::MissingNextApprover)));

        f.store.with(|s| {
            assert_eq!(s.requests[0].status, ApprovalStatus::Pending);
            assert_eq!(s.approvals[0].status, ApprovalStatus::Pending);
            assert!(s.notifications.is_empty());
        });

        // Em branco não conta; a aprovação final segue normal
        let mut blank_role = decision(Decision::Approved);
        blank_role.next_approver_role = Some("  ".into());
        let outcome = f.service.decide(&ctx(f.approver, &[]), f.approval_id, blank_role).await.unwrap();
        assert_eq!(outcome.request.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn client_supplied_ids_must_match() {
        let f = fixture();
        let mut input = decision(Decision::Approved);
        input.request_id = Some(f.request_id);
        input.requester_id = Some(Uuid::new_v4());

        let result = f.service.decide(&ctx(f.approver, &[]), f.approval_id, input).await;
        assert!(matches!(result, Err(AppError::RequestMismatch)));
    }

    #[tokio::test]
    async fn delegation_swaps_approver_and_keeps_level() {
        let f = fixture();
        let delegate = Uuid::new_v4();

        let updated = f
            .service
            .delegate(
                &ctx(f.approver, &[]),
                f.approval_id,
                DelegationInput { delegate_id: delegate, reason: Some("Férias".into()) },
            )
            .await
            .unwrap();

        assert_eq!(updated.approver_id, delegate);
        assert_eq!(updated.approval_level, 1);
        assert_eq!(updated.status, ApprovalStatus::Pending);
        assert_eq!(updated.comments.as_deref(), Some("Delegated: Férias"));

        f.store.with(|s| {
            assert_eq!(s.requests[0].current_approver_id, Some(delegate));
            assert_eq!(s.notifications[0].user_id, delegate);
            assert_eq!(s.notifications[0].notification_type, NotificationType::ApprovalDelegated);
        });

        // O antigo aprovador perdeu o acesso
        let old = f.service.decide(&ctx(f.approver, &[]), f.approval_id, decision(Decision::Approved)).await;
        assert!(matches!(old, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn delegating_to_current_approver_is_invalid() {
        let f = fixture();
        let result = f
            .service
            .delegate(
                &ctx(f.approver, &[]),
                f.approval_id,
                DelegationInput { delegate_id: f.approver, reason: None },
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidDelegate)));
    }

    #[tokio::test]
    async fn chain_is_hidden_from_outsiders() {
        let f = fixture();

        let chain = f.service.list_chain(&ctx(f.requester, &[]), f.request_id).await.unwrap();
        assert_eq!(chain.len(), 1);

        let outsider = f.service.list_chain(&ctx(Uuid::new_v4(), &[]), f.request_id).await;
        assert!(matches!(outsider, Err(AppError::Forbidden)));

        let pending = f.service.list_pending(&ctx(f.approver, &[])).await.unwrap();
        assert_eq!(pending.len(), 1);
    }
}
