pub mod access;
pub mod list;

pub use list::{ListProposalsError, ListProposalsQuery, ProposalListItem};
