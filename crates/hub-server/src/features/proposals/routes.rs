//! Proposal API routes, mounted under `/api/v1/communities`
//!
//! - `POST /propose` - Propose a dataset to a community (dataset owner)
//! - `GET /:id/proposals?status=` - List a community's proposals (responsible user)
//! - `POST /:id/proposals/:pid/accept` - Accept a proposal (responsible user)
//! - `POST /:id/proposals/:pid/reject` - Reject a proposal (responsible user)
//!
//! Refused proposals and decisions answer `409` with the refusal message;
//! the decision email is sent in the background after a successful decision.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;
use crate::middleware::CurrentUser;
use crate::notify::{decision_email, dispatch};

use super::{
    commands::{
        DecideProposalCommand, DecideProposalError, ProposeDatasetCommand, ProposeDatasetError,
    },
    queries::{access, ListProposalsError, ListProposalsQuery},
    types::{OutcomeKind, Proposal, ProposalOutcome, ProposalStatus},
};

pub fn proposals_routes() -> Router<FeatureState> {
    Router::new()
        .route("/propose", post(propose_dataset))
        .route("/:id/proposals", get(list_proposals))
        .route("/:id/proposals/:proposal_id/accept", post(accept_proposal))
        .route("/:id/proposals/:proposal_id/reject", post(reject_proposal))
}

#[derive(Debug, Deserialize)]
struct ProposeRequest {
    dataset_id: Uuid,
    community_id: Uuid,
}

#[tracing::instrument(skip(state, request), fields(user_id = %user.id(), dataset_id = %request.dataset_id))]
async fn propose_dataset(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Json(request): Json<ProposeRequest>,
) -> Result<Response, ProposalApiError> {
    let owner = access::dataset_owner(&state.db, request.dataset_id)
        .await?
        .ok_or(ProposalApiError::NotFound("Dataset not found"))?;
    if owner != user.id() {
        return Err(ProposalApiError::Forbidden("Only the dataset owner can propose it"));
    }

    let command = ProposeDatasetCommand {
        dataset_id: request.dataset_id,
        community_id: request.community_id,
        proposer_id: user.id(),
    };
    let outcome = super::commands::propose::handle(state.db, command).await?;

    let status = match outcome.kind {
        OutcomeKind::Submitted => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok(outcome_response(outcome, status))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<ProposalStatus>,
}

#[tracing::instrument(skip(state), fields(user_id = %user.id()))]
async fn list_proposals(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Path(community_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Response, ProposalApiError> {
    require_responsible(&state, community_id, &user).await?;

    let items = super::queries::list::handle(
        state.db,
        ListProposalsQuery {
            community_id,
            status: params.status,
        },
    )
    .await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(items))).into_response())
}

async fn accept_proposal(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Path((community_id, proposal_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ProposalApiError> {
    decide(state, user, community_id, proposal_id, true).await
}

async fn reject_proposal(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Path((community_id, proposal_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ProposalApiError> {
    decide(state, user, community_id, proposal_id, false).await
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id()))]
async fn decide(
    state: FeatureState,
    user: CurrentUser,
    community_id: Uuid,
    proposal_id: Uuid,
    accept: bool,
) -> Result<Response, ProposalApiError> {
    let community_name = require_responsible(&state, community_id, &user).await?;

    match access::find_proposal(&state.db, proposal_id).await? {
        Some(proposal) if proposal.community_id == community_id => {},
        _ => return Err(ProposalApiError::NotFound("Proposal not found")),
    }

    let command = DecideProposalCommand {
        proposal_id,
        accept,
    };
    let outcome = super::commands::decide::handle(state.db.clone(), command).await?;

    if outcome.ok {
        if let Some(ref proposal) = outcome.proposal {
            notify_proposer(&state, proposal, &community_name, accept).await;
        }
    }

    Ok(outcome_response(outcome, StatusCode::OK))
}

/// Look up the proposer and queue the decision email. Lookup failures are logged only.
async fn notify_proposer(state: &FeatureState, proposal: &Proposal, community_name: &str, accepted: bool) {
    match access::decision_recipient(&state.db, proposal).await {
        Ok(Some(recipient)) if !recipient.email.is_empty() => {
            let message =
                decision_email(&recipient.email, &recipient.dataset_title, community_name, accepted);
            dispatch(state.notifier.clone(), message);
        },
        Ok(_) => tracing::debug!(proposal_id = %proposal.id, "Proposer has no email"),
        Err(e) => tracing::warn!(error = %e, "Failed to look up decision email recipient"),
    }
}

/// Ensure `user` is responsible for the community; returns the community name.
async fn require_responsible(
    state: &FeatureState,
    community_id: Uuid,
    user: &CurrentUser,
) -> Result<String, ProposalApiError> {
    let (responsible, name) = access::community_responsible(&state.db, community_id)
        .await?
        .ok_or(ProposalApiError::NotFound("Community not found"))?;

    if responsible != user.id() {
        return Err(ProposalApiError::Forbidden(
            "Only the community's responsible user can manage its proposals",
        ));
    }

    Ok(name)
}

fn outcome_response(outcome: ProposalOutcome, success_status: StatusCode) -> Response {
    if outcome.ok {
        return (success_status, Json(ApiResponse::success(outcome))).into_response();
    }

    let (code, status) = match outcome.kind {
        OutcomeKind::NotFound => ("NOT_FOUND", StatusCode::NOT_FOUND),
        _ => ("CONFLICT", StatusCode::CONFLICT),
    };
    ErrorResponse::with_details(code, outcome.message.clone(), json!({ "kind": outcome.kind }))
        .into_response_with(status)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum ProposalApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Propose(#[from] ProposeDatasetError),
    #[error(transparent)]
    Decide(#[from] DecideProposalError),
    #[error(transparent)]
    List(#[from] ListProposalsError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ProposalApiError {
    fn into_response(self) -> Response {
        match self {
            ProposalApiError::NotFound(_)
            | ProposalApiError::Propose(ProposeDatasetError::DatasetNotFound(_))
            | ProposalApiError::Propose(ProposeDatasetError::CommunityNotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", self.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            ProposalApiError::Forbidden(_) => {
                ErrorResponse::new("FORBIDDEN", self.to_string())
                    .into_response_with(StatusCode::FORBIDDEN)
            },
            ProposalApiError::Propose(ProposeDatasetError::Database(_))
            | ProposalApiError::Decide(DecideProposalError::Database(_))
            | ProposalApiError::List(ListProposalsError::Database(_))
            | ProposalApiError::Database(_) => {
                tracing::error!("Database error in proposal endpoint: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::proposals::types::{MSG_DUPLICATE_PENDING, MSG_SUBMITTED};

    #[test]
    fn test_refusal_is_conflict() {
        let outcome = ProposalOutcome::new(OutcomeKind::DuplicatePending, None, MSG_DUPLICATE_PENDING);
        let response = outcome_response(outcome, StatusCode::OK);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_outcome_is_404() {
        let response = outcome_response(ProposalOutcome::not_found(), StatusCode::OK);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_success_uses_given_status() {
        let outcome = ProposalOutcome::new(OutcomeKind::Submitted, None, MSG_SUBMITTED);
        let response = outcome_response(outcome, StatusCode::CREATED);
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_forbidden_status() {
        let response = ProposalApiError::Forbidden("no").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
