pub mod create;
pub mod set_icon;

pub use create::{CreateCommunityCommand, CreateCommunityError};
pub use set_icon::{SetIconCommand, SetIconError};
