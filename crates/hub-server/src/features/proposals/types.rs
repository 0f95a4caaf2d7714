//! Proposal types and the decision rules of the proposal workflow
//!
//! `plan_propose` and `plan_decision` decide what a propose or accept/reject
//! call should do, given every proposal that currently exists for the
//! dataset. The command handlers load that snapshot under a row lock and
//! apply the plan; the rules themselves never touch the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MSG_SUBMITTED: &str = "Proposal submitted to the community.";
pub const MSG_RESUBMITTED: &str = "Proposal resubmitted to the community.";
pub const MSG_ALREADY_IN_ANY_COMMUNITY: &str =
    "This dataset is already in a community and cannot be proposed again.";
pub const MSG_ALREADY_IN_COMMUNITY: &str = "This dataset is already in a community.";
pub const MSG_DUPLICATE_PENDING: &str = "There is already a pending proposal for this community.";
pub const MSG_NOT_FOUND: &str = "Proposal not found.";
pub const MSG_CONFLICTING_ACCEPTANCE: &str = "Dataset already belongs to another community.";
pub const MSG_ACCEPTED: &str = "Proposal accepted.";
pub const MSG_REJECTED: &str = "Proposal rejected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown proposal status: {0}")]
pub struct UnknownProposalStatus(pub String);

impl FromStr for ProposalStatus {
    type Err = UnknownProposalStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ProposalStatus::Pending),
            "accepted" => Ok(ProposalStatus::Accepted),
            "rejected" => Ok(ProposalStatus::Rejected),
            _ => Err(UnknownProposalStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProposalStatus {
    type Error = UnknownProposalStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A request to place a dataset in a community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub community_id: Uuid,
    pub proposed_by_user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Columns of the proposals table, in [`Proposal`] field order.
pub(crate) const PROPOSAL_COLUMNS: &str =
    "id, dataset_id, community_id, proposed_by_user_id, status, created_at, decided_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Submitted,
    Resubmitted,
    Accepted,
    Rejected,
    AlreadyInCommunity,
    DuplicatePending,
    NotFound,
    ConflictingAcceptance,
}

impl OutcomeKind {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            OutcomeKind::Submitted
                | OutcomeKind::Resubmitted
                | OutcomeKind::Accepted
                | OutcomeKind::Rejected
        )
    }
}

/// Result of a propose or decide call. Business-rule refusals are outcomes
/// with `ok = false`, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalOutcome {
    pub ok: bool,
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<Proposal>,
    pub message: String,
}

impl ProposalOutcome {
    pub fn new(kind: OutcomeKind, proposal: Option<Proposal>, message: &str) -> Self {
        Self {
            ok: kind.is_success(),
            kind,
            proposal,
            message: message.to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(OutcomeKind::NotFound, None, MSG_NOT_FOUND)
    }
}

/// What a propose call should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposePlan {
    /// Refuse without writing
    Refuse {
        kind: OutcomeKind,
        message: &'static str,
        proposal: Option<Proposal>,
    },
    /// Reset a rejected proposal of the same pair back to pending
    Reopen(Proposal),
    /// Create a new pending proposal
    Insert,
}

/// Decide a propose call. `existing` holds every proposal of the dataset.
pub fn plan_propose(existing: &[Proposal], community_id: Uuid) -> ProposePlan {
    if let Some(accepted) = existing.iter().find(|p| p.status == ProposalStatus::Accepted) {
        return ProposePlan::Refuse {
            kind: OutcomeKind::AlreadyInCommunity,
            message: MSG_ALREADY_IN_ANY_COMMUNITY,
            proposal: Some(accepted.clone()),
        };
    }

    match existing.iter().find(|p| p.community_id == community_id) {
        Some(pair) => match pair.status {
            ProposalStatus::Rejected => ProposePlan::Reopen(pair.clone()),
            ProposalStatus::Pending => ProposePlan::Refuse {
                kind: OutcomeKind::DuplicatePending,
                message: MSG_DUPLICATE_PENDING,
                proposal: Some(pair.clone()),
            },
            // Unreachable after the any-community check; kept for the pair rule.
            ProposalStatus::Accepted => ProposePlan::Refuse {
                kind: OutcomeKind::AlreadyInCommunity,
                message: MSG_ALREADY_IN_COMMUNITY,
                proposal: Some(pair.clone()),
            },
        },
        None => ProposePlan::Insert,
    }
}

/// What an accept/reject call should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionPlan {
    Refuse {
        kind: OutcomeKind,
        message: &'static str,
    },
    /// Move the proposal to this status and stamp the decision time
    Apply(ProposalStatus),
}

/// Decide an accept/reject of `proposal`. `existing` holds every proposal of
/// the same dataset, `proposal` included.
pub fn plan_decision(existing: &[Proposal], proposal: &Proposal, accept: bool) -> DecisionPlan {
    if !accept {
        return DecisionPlan::Apply(ProposalStatus::Rejected);
    }

    let conflicting = existing
        .iter()
        .any(|p| p.status == ProposalStatus::Accepted && p.id != proposal.id);
    if conflicting {
        return DecisionPlan::Refuse {
            kind: OutcomeKind::ConflictingAcceptance,
            message: MSG_CONFLICTING_ACCEPTANCE,
        };
    }

    DecisionPlan::Apply(ProposalStatus::Accepted)
}

/// Success message for a decision that was applied
pub fn decision_message(status: ProposalStatus) -> (OutcomeKind, &'static str) {
    match status {
        ProposalStatus::Accepted => (OutcomeKind::Accepted, MSG_ACCEPTED),
        _ => (OutcomeKind::Rejected, MSG_REJECTED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn proposal(community_id: Uuid, status: ProposalStatus) -> Proposal {
        Proposal {
            id: Uuid::new_v4(),
            dataset_id: Uuid::nil(),
            community_id,
            proposed_by_user_id: Uuid::nil(),
            status,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [ProposalStatus::Pending, ProposalStatus::Accepted, ProposalStatus::Rejected] {
            assert_eq!(status.as_str().parse::<ProposalStatus>().unwrap(), status);
        }
        assert!(ProposalStatus::try_from("archived".to_string()).is_err());
    }

    #[test]
    fn test_propose_fresh_pair_inserts() {
        assert_eq!(plan_propose(&[], Uuid::new_v4()), ProposePlan::Insert);
    }

    #[test]
    fn test_propose_blocked_by_acceptance_elsewhere() {
        let accepted = proposal(Uuid::new_v4(), ProposalStatus::Accepted);
        let plan = plan_propose(&[accepted.clone()], Uuid::new_v4());
        assert_eq!(
            plan,
            ProposePlan::Refuse {
                kind: OutcomeKind::AlreadyInCommunity,
                message: MSG_ALREADY_IN_ANY_COMMUNITY,
                proposal: Some(accepted),
            }
        );
    }

    #[test]
    fn test_propose_reopens_rejected_pair() {
        let community = Uuid::new_v4();
        let rejected = proposal(community, ProposalStatus::Rejected);
        assert_eq!(
            plan_propose(&[rejected.clone()], community),
            ProposePlan::Reopen(rejected)
        );
    }

    #[test]
    fn test_propose_duplicate_pending() {
        let community = Uuid::new_v4();
        let pending = proposal(community, ProposalStatus::Pending);
        assert!(matches!(
            plan_propose(&[pending], community),
            ProposePlan::Refuse { kind: OutcomeKind::DuplicatePending, .. }
        ));
    }

    #[test]
    fn test_decision_rules() {
        let a = proposal(Uuid::new_v4(), ProposalStatus::Accepted);
        let b = proposal(Uuid::new_v4(), ProposalStatus::Pending);
        let snapshot = vec![a.clone(), b.clone()];

        assert_eq!(
            plan_decision(&snapshot, &b, true),
            DecisionPlan::Refuse {
                kind: OutcomeKind::ConflictingAcceptance,
                message: MSG_CONFLICTING_ACCEPTANCE,
            }
        );
        assert_eq!(plan_decision(&snapshot, &a, true), DecisionPlan::Apply(ProposalStatus::Accepted));
        assert_eq!(plan_decision(&snapshot, &b, false), DecisionPlan::Apply(ProposalStatus::Rejected));
        // Rejecting an accepted proposal is allowed.
        assert_eq!(plan_decision(&snapshot, &a, false), DecisionPlan::Apply(ProposalStatus::Rejected));
    }

    #[test]
    fn test_outcome_ok_follows_kind() {
        assert!(ProposalOutcome::new(OutcomeKind::Resubmitted, None, MSG_RESUBMITTED).ok);
        assert!(!ProposalOutcome::not_found().ok);
        assert_eq!(ProposalOutcome::not_found().message, "Proposal not found.");
    }

    // In-memory model of one dataset's proposals, driven only by the plans.

    #[derive(Debug, Clone)]
    enum Op {
        Propose(usize),
        Decide(usize, bool),
    }

    const COMMUNITIES: usize = 3;

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..COMMUNITIES).prop_map(Op::Propose),
            (0..COMMUNITIES, any::<bool>()).prop_map(|(c, accept)| Op::Decide(c, accept)),
        ]
    }

    struct Model {
        communities: Vec<Uuid>,
        rows: Vec<Proposal>,
    }

    impl Model {
        fn new() -> Self {
            Self {
                communities: (0..COMMUNITIES).map(|_| Uuid::new_v4()).collect(),
                rows: Vec::new(),
            }
        }

        fn propose(&mut self, community: usize) -> ProposePlan {
            let community_id = self.communities[community];
            let plan = plan_propose(&self.rows, community_id);
            match &plan {
                ProposePlan::Reopen(existing) => {
                    if let Some(row) = self.rows.iter_mut().find(|p| p.id == existing.id) {
                        row.status = ProposalStatus::Pending;
                        row.decided_at = None;
                    }
                },
                ProposePlan::Insert => self.rows.push(proposal(community_id, ProposalStatus::Pending)),
                ProposePlan::Refuse { .. } => {},
            }
            plan
        }

        fn decide(&mut self, community: usize, accept: bool) {
            let community_id = self.communities[community];
            let Some(target) = self.rows.iter().find(|p| p.community_id == community_id).cloned() else {
                return;
            };
            if let DecisionPlan::Apply(status) = plan_decision(&self.rows, &target, accept) {
                if let Some(row) = self.rows.iter_mut().find(|p| p.id == target.id) {
                    row.status = status;
                    row.decided_at = Some(Utc::now());
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_at_most_one_accepted(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut model = Model::new();
            for op in ops {
                match op {
                    Op::Propose(c) => { model.propose(c); },
                    Op::Decide(c, accept) => model.decide(c, accept),
                }
                let accepted = model.rows.iter().filter(|p| p.status == ProposalStatus::Accepted).count();
                prop_assert!(accepted <= 1);
            }
        }

        #[test]
        fn prop_one_row_per_pair(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut model = Model::new();
            for op in ops {
                match op {
                    Op::Propose(c) => { model.propose(c); },
                    Op::Decide(c, accept) => model.decide(c, accept),
                }
            }
            for community_id in &model.communities {
                let rows = model.rows.iter().filter(|p| p.community_id == *community_id).count();
                prop_assert!(rows <= 1);
            }
            for row in &model.rows {
                prop_assert_eq!(row.status == ProposalStatus::Pending, row.decided_at.is_none());
            }
        }

        #[test]
        fn prop_resubmission_reuses_row(c in 0..COMMUNITIES) {
            let mut model = Model::new();
            model.propose(c);
            model.decide(c, false);
            let original_id = model.rows[0].id;

            let plan = model.propose(c);
            prop_assert!(matches!(plan, ProposePlan::Reopen(_)));
            prop_assert_eq!(model.rows.len(), 1);
            prop_assert_eq!(model.rows[0].id, original_id);
            prop_assert_eq!(model.rows[0].status, ProposalStatus::Pending);
        }

        #[test]
        fn prop_duplicate_pending_is_noop(c in 0..COMMUNITIES, repeats in 1usize..5) {
            let mut model = Model::new();
            model.propose(c);
            let before = model.rows.clone();
            for _ in 0..repeats {
                let plan = model.propose(c);
                let is_duplicate = matches!(plan, ProposePlan::Refuse { kind: OutcomeKind::DuplicatePending, .. });
                prop_assert!(is_duplicate);
            }
            prop_assert_eq!(model.rows, before);
        }
    }
}
