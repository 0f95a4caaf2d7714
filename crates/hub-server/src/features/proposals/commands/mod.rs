pub mod decide;
pub mod propose;

pub use decide::{DecideProposalCommand, DecideProposalError};
pub use propose::{ProposeDatasetCommand, ProposeDatasetError};
