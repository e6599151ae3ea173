pub mod git;
pub mod ownership;
pub mod portfolio;
pub mod response;
pub mod user_profiles;
