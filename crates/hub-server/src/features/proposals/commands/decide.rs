//! Accept or reject a proposal

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::propose::{dataset_proposals, lock_dataset};
use crate::features::proposals::types::{
    decision_message, plan_decision, DecisionPlan, OutcomeKind, Proposal, ProposalOutcome,
    ProposalStatus, MSG_CONFLICTING_ACCEPTANCE, PROPOSAL_COLUMNS,
};
use crate::features::shared::error_helpers::is_unique_violation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecideProposalCommand {
    pub proposal_id: Uuid,
    pub accept: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DecideProposalError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ProposalOutcome, DecideProposalError>> for DecideProposalCommand {}

impl crate::cqrs::middleware::Command for DecideProposalCommand {}

impl DecideProposalCommand {
    pub fn accept(proposal_id: Uuid) -> Self {
        Self {
            proposal_id,
            accept: true,
        }
    }

    pub fn reject(proposal_id: Uuid) -> Self {
        Self {
            proposal_id,
            accept: false,
        }
    }
}

#[tracing::instrument(skip(pool), fields(proposal_id = %command.proposal_id, accept = command.accept))]
pub async fn handle(
    pool: PgPool,
    command: DecideProposalCommand,
) -> Result<ProposalOutcome, DecideProposalError> {
    let mut tx = pool.begin().await?;

    let dataset_id: Option<Uuid> =
        sqlx::query_scalar("SELECT dataset_id FROM community_dataset_proposals WHERE id = $1")
            .bind(command.proposal_id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(dataset_id) = dataset_id else {
        return Ok(ProposalOutcome::not_found());
    };

    lock_dataset(&mut tx, dataset_id).await?;

    let existing = dataset_proposals(&mut tx, dataset_id).await?;
    let Some(target) = existing.iter().find(|p| p.id == command.proposal_id).cloned() else {
        return Ok(ProposalOutcome::not_found());
    };

    let status = match plan_decision(&existing, &target, command.accept) {
        DecisionPlan::Refuse { kind, message } => {
            tracing::debug!(?kind, "Decision refused");
            return Ok(ProposalOutcome::new(kind, Some(target), message));
        },
        DecisionPlan::Apply(status) => status,
    };

    let sql = format!(
        "UPDATE community_dataset_proposals SET status = $2, decided_at = NOW() \
         WHERE id = $1 RETURNING {}",
        PROPOSAL_COLUMNS
    );
    let updated = sqlx::query_as::<_, Proposal>(&sql)
        .bind(target.id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await;

    let updated = match updated {
        Ok(proposal) => proposal,
        Err(e) if is_unique_violation(&e) && status == ProposalStatus::Accepted => {
            tracing::warn!("Concurrent acceptance detected");
            return Ok(ProposalOutcome::new(
                OutcomeKind::ConflictingAcceptance,
                Some(target),
                MSG_CONFLICTING_ACCEPTANCE,
            ));
        },
        Err(e) => return Err(e.into()),
    };

    tx.commit().await?;

    let (kind, message) = decision_message(status);
    tracing::info!(dataset_id = %dataset_id, status = %status, "Proposal decided");

    Ok(ProposalOutcome::new(kind, Some(updated), message))
}
