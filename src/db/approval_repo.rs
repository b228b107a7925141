// src/db/approval_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::notification_repo::insert_notification,
    models::approval::{
        ApprovalRecord, ApprovalStatus, DecisionOutcome, DelegationPlan, TrainingRequest,
        TransitionPlan,
    },
};

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    async fn find_approval(&self, id: Uuid) -> Result<Option<ApprovalRecord>, AppError>;

    async fn find_request(&self, id: Uuid) -> Result<Option<TrainingRequest>, AppError>;

    async fn list_request_approvals(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, AppError>;

    async fn list_pending_for_approver(
        &self,
        approver_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, AppError>;

    /// Aplica o plano de forma atômica. Se a aprovação já não estiver pendente,
    /// devolve `ApprovalAlreadyDecided` e nada é gravado.
    async fn apply_transition(&self, plan: &TransitionPlan) -> Result<DecisionOutcome, AppError>;

    async fn apply_delegation(&self, plan: &DelegationPlan) -> Result<ApprovalRecord, AppError>;
}

#[derive(Clone)]
pub struct ApprovalRepository {
    pool: PgPool,
}

impl ApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalStore for ApprovalRepository {
    async fn find_approval(&self, id: Uuid) -> Result<Option<ApprovalRecord>, AppError> {
        let approval = sqlx::query_as::<_, ApprovalRecord>("SELECT * FROM approvals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(approval)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<TrainingRequest>, AppError> {
        let request =
            sqlx::query_as::<_, TrainingRequest>("SELECT * FROM training_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    async fn list_request_approvals(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, AppError> {
        let approvals = sqlx::query_as::<_, ApprovalRecord>(
            r#"
            SELECT * FROM approvals
            WHERE training_request_id = $1
            ORDER BY approval_level ASC, created_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(approvals)
    }

    async fn list_pending_for_approver(
        &self,
        approver_id: Uuid,
    ) -> Result<Vec<ApprovalRecord>, AppError> {
        let approvals = sqlx::query_as::<_, ApprovalRecord>(
            r#"
            SELECT * FROM approvals
            WHERE approver_id = $1 AND status = 'pending'
            ORDER BY created_at ASC
            "#,
        )
        .bind(approver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(approvals)
    }

    async fn apply_transition(&self, plan: &TransitionPlan) -> Result<DecisionOutcome, AppError> {
        // 1. Inicia a transação: decisão, solicitação, próximo nível e notificações
        //    entram juntos ou não entram.
        let mut tx = self.pool.begin().await?;

        // 2. Update condicional: só decide se ainda estiver pendente (evita avanço duplo)
        let approval = sqlx::query_as::<_, ApprovalRecord>(
            r#"
            UPDATE approvals
            SET status = $2, comments = $3, decided_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(plan.approval_id)
        .bind(ApprovalStatus::from(plan.decision))
        .bind(&plan.comments)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::ApprovalAlreadyDecided(plan.approval_id))?;

        // 3. Atualiza a solicitação
        let request = sqlx::query_as::<_, TrainingRequest>(
            r#"
            UPDATE training_requests
            SET status = $2, current_approval_level = $3, current_approver_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(plan.request_id)
        .bind(plan.request_status)
        .bind(plan.request_level)
        .bind(plan.current_approver_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::TrainingRequestNotFound(plan.request_id))?;

        // 4. Cria o registro do próximo nível, se houver
        let next_approval = match &plan.next_approval {
            Some(next) => Some(
                sqlx::query_as::<_, ApprovalRecord>(
                    r#"
                    INSERT INTO approvals (training_request_id, approver_id, role, approval_level, status)
                    VALUES ($1, $2, $3, $4, 'pending')
                    RETURNING *
                    "#,
                )
                .bind(plan.request_id)
                .bind(next.approver_id)
                .bind(&next.role)
                .bind(next.approval_level)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        // 5. Notificações
        for notification in &plan.notifications {
            insert_notification(&mut *tx, notification).await?;
        }

        // 6. Commit
        tx.commit().await?;

        Ok(DecisionOutcome { approval, request, next_approval })
    }

    async fn apply_delegation(&self, plan: &DelegationPlan) -> Result<ApprovalRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        // Nível e status ficam como estão; só troca quem decide
        let approval = sqlx::query_as::<_, ApprovalRecord>(
            r#"
            UPDATE approvals
            SET approver_id = $2, comments = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending' AND approver_id = $4
            RETURNING *
            "#,
        )
        .bind(plan.approval_id)
        .bind(plan.delegate_id)
        .bind(&plan.comments)
        .bind(plan.previous_approver_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::ApprovalAlreadyDecided(plan.approval_id))?;

        sqlx::query(
            r#"
            UPDATE training_requests
            SET current_approver_id = $2, updated_at = NOW()
            WHERE id = $1 AND current_approver_id = $3
            "#,
        )
        .bind(plan.request_id)
        .bind(plan.delegate_id)
        .bind(plan.previous_approver_id)
        .execute(&mut *tx)
        .await?;

        insert_notification(&mut *tx, &plan.notification).await?;

        tx.commit().await?;

        Ok(approval)
    }
}
