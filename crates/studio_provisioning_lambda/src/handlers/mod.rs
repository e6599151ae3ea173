pub mod populate_git;
pub mod portfolio_toggle;
pub mod protocol;
