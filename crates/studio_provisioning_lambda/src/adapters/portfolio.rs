use crate::runtime::portfolio::PortfolioShare;

pub trait PortfolioRegistry {
    fn enable_portfolio_integration(&self) -> Result<(), String>;

    fn disable_portfolio_integration(&self) -> Result<(), String>;

    fn list_accepted_portfolio_shares(&self) -> Result<Vec<PortfolioShare>, String>;

    fn associate_principal(&self, portfolio_id: &str, principal_arn: &str) -> Result<(), String>;

    fn disassociate_principal(&self, portfolio_id: &str, principal_arn: &str)
        -> Result<(), String>;
}
