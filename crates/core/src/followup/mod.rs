pub mod actions;
pub mod email;

pub use actions::recommend_actions;
pub use email::FollowUpComposer;
