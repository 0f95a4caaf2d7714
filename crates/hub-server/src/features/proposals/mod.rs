//! Community proposals: propose, accept, reject and list
//!
//! A dataset belongs to at most one community (its single accepted
//! proposal) and has at most one proposal per community.

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{DecideProposalCommand, ProposeDatasetCommand};
pub use queries::{ListProposalsQuery, ProposalListItem};
pub use routes::proposals_routes;
pub use types::{OutcomeKind, Proposal, ProposalOutcome, ProposalStatus};
