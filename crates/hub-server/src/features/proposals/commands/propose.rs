//! Propose a dataset to a community

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::features::proposals::types::{
    plan_propose, OutcomeKind, Proposal, ProposalOutcome, ProposePlan, MSG_ALREADY_IN_ANY_COMMUNITY,
    MSG_DUPLICATE_PENDING, MSG_RESUBMITTED, MSG_SUBMITTED, PROPOSAL_COLUMNS,
};
use crate::features::shared::error_helpers::{is_unique_violation, violated_constraint};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeDatasetCommand {
    pub dataset_id: Uuid,
    pub community_id: Uuid,
    /// Taken from the authenticated principal
    #[serde(skip)]
    pub proposer_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum ProposeDatasetError {
    #[error("Dataset '{0}' not found")]
    DatasetNotFound(Uuid),

    #[error("Community '{0}' not found")]
    CommunityNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ProposalOutcome, ProposeDatasetError>> for ProposeDatasetCommand {}

impl crate::cqrs::middleware::Command for ProposeDatasetCommand {}

/// Lock the dataset row so proposal writes for one dataset are serialised.
/// Returns false when the dataset does not exist.
pub(crate) async fn lock_dataset(
    tx: &mut Transaction<'_, Postgres>,
    dataset_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM datasets WHERE id = $1 FOR UPDATE")
        .bind(dataset_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(locked.is_some())
}

pub(crate) async fn dataset_proposals(
    tx: &mut Transaction<'_, Postgres>,
    dataset_id: Uuid,
) -> Result<Vec<Proposal>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM community_dataset_proposals WHERE dataset_id = $1 ORDER BY created_at, id",
        PROPOSAL_COLUMNS
    );
    sqlx::query_as::<_, Proposal>(&sql)
        .bind(dataset_id)
        .fetch_all(&mut **tx)
        .await
}

#[tracing::instrument(
    skip(pool),
    fields(dataset_id = %command.dataset_id, community_id = %command.community_id)
)]
pub async fn handle(
    pool: PgPool,
    command: ProposeDatasetCommand,
) -> Result<ProposalOutcome, ProposeDatasetError> {
    let mut tx = pool.begin().await?;

    if !lock_dataset(&mut tx, command.dataset_id).await? {
        return Err(ProposeDatasetError::DatasetNotFound(command.dataset_id));
    }

    let community_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM communities WHERE id = $1)")
            .bind(command.community_id)
            .fetch_one(&mut *tx)
            .await?;
    if !community_exists {
        return Err(ProposeDatasetError::CommunityNotFound(command.community_id));
    }

    let existing = dataset_proposals(&mut tx, command.dataset_id).await?;

    let outcome = match plan_propose(&existing, command.community_id) {
        ProposePlan::Refuse {
            kind,
            message,
            proposal,
        } => {
            tracing::debug!(?kind, "Proposal refused");
            return Ok(ProposalOutcome::new(kind, proposal, message));
        },
        ProposePlan::Reopen(rejected) => {
            let sql = format!(
                "UPDATE community_dataset_proposals SET status = 'pending', decided_at = NULL \
                 WHERE id = $1 RETURNING {}",
                PROPOSAL_COLUMNS
            );
            let reopened = sqlx::query_as::<_, Proposal>(&sql)
                .bind(rejected.id)
                .fetch_one(&mut *tx)
                .await?;
            ProposalOutcome::new(OutcomeKind::Resubmitted, Some(reopened), MSG_RESUBMITTED)
        },
        ProposePlan::Insert => {
            let sql = format!(
                "INSERT INTO community_dataset_proposals (dataset_id, community_id, proposed_by_user_id) \
                 VALUES ($1, $2, $3) RETURNING {}",
                PROPOSAL_COLUMNS
            );
            let inserted = sqlx::query_as::<_, Proposal>(&sql)
                .bind(command.dataset_id)
                .bind(command.community_id)
                .bind(command.proposer_id)
                .fetch_one(&mut *tx)
                .await;

            match inserted {
                Ok(proposal) => {
                    ProposalOutcome::new(OutcomeKind::Submitted, Some(proposal), MSG_SUBMITTED)
                },
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(constraint = ?violated_constraint(&e), "Concurrent proposal detected");
                    return Ok(refusal_for_constraint(violated_constraint(&e)));
                },
                Err(e) => return Err(e.into()),
            }
        },
    };

    tx.commit().await?;

    tracing::info!(kind = ?outcome.kind, "Proposal recorded");

    Ok(outcome)
}

fn refusal_for_constraint(constraint: Option<&str>) -> ProposalOutcome {
    match constraint {
        Some("uq_dataset_community") => {
            ProposalOutcome::new(OutcomeKind::DuplicatePending, None, MSG_DUPLICATE_PENDING)
        },
        _ => ProposalOutcome::new(
            OutcomeKind::AlreadyInCommunity,
            None,
            MSG_ALREADY_IN_ANY_COMMUNITY,
        ),
    }
}
