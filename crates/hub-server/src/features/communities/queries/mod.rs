pub mod get;
pub mod icon;
pub mod list;

pub use get::{GetCommunityError, GetCommunityQuery};
pub use icon::GetIconError;
pub use list::{ListCommunitiesError, ListCommunitiesQuery};
