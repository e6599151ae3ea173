use tracing::info;

use crate::adapters::portfolio::PortfolioRegistry;
use crate::config::PortfolioToggleConfig;
use crate::runtime::contract::{HandlerOutcome, LifecycleEvent};
use crate::runtime::error::ProvisioningError;
use crate::runtime::lifecycle::LifecycleHandler;
use crate::runtime::portfolio::select_portfolio;

pub const EXECUTION_ROLE_PROPERTY: &str = "ExecutionRole";

/// Turns on SageMaker Projects for the account and lets an execution role
/// use the SageMaker-provided Service Catalog portfolio. Delete reverses
/// both steps. Every failure fails the resource.
pub struct PortfolioToggleHandler<'a> {
    pub config: &'a PortfolioToggleConfig,
    pub registry: &'a dyn PortfolioRegistry,
}

impl PortfolioToggleHandler<'_> {
    fn resolve_portfolio_id(&self) -> Result<String, ProvisioningError> {
        let shares = self
            .registry
            .list_accepted_portfolio_shares()
            .map_err(|error| {
                ProvisioningError::portfolio_operation("list_accepted_portfolio_shares", error)
            })?;
        let share = select_portfolio(&shares, &self.config.provider_name)?;
        Ok(share.id.clone())
    }

    fn enable(&self, execution_role: &str) -> Result<(), ProvisioningError> {
        self.registry
            .enable_portfolio_integration()
            .map_err(|error| {
                ProvisioningError::portfolio_operation("enable_portfolio_integration", error)
            })?;

        let portfolio_id = self.resolve_portfolio_id()?;
        self.registry
            .associate_principal(&portfolio_id, execution_role)
            .map_err(|error| ProvisioningError::portfolio_operation("associate_principal", error))?;

        info!(
            event = "principal_associated",
            portfolio_id = portfolio_id.as_str(),
            principal_arn = execution_role
        );
        Ok(())
    }

    fn disable(&self, execution_role: &str) -> Result<(), ProvisioningError> {
        self.registry
            .disable_portfolio_integration()
            .map_err(|error| {
                ProvisioningError::portfolio_operation("disable_portfolio_integration", error)
            })?;

        let portfolio_id = self.resolve_portfolio_id()?;
        self.registry
            .disassociate_principal(&portfolio_id, execution_role)
            .map_err(|error| {
                ProvisioningError::portfolio_operation("disassociate_principal", error)
            })?;

        info!(
            event = "principal_disassociated",
            portfolio_id = portfolio_id.as_str(),
            principal_arn = execution_role
        );
        Ok(())
    }
}

impl LifecycleHandler for PortfolioToggleHandler<'_> {
    fn on_create(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError> {
        let execution_role = event.required_property(EXECUTION_ROLE_PROPERTY)?;
        self.enable(execution_role)?;
        Ok(HandlerOutcome::unchanged())
    }

    fn on_update(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError> {
        info!(
            event = "update_ignored",
            physical_resource_id = event.physical_resource_id.as_deref().unwrap_or_default()
        );
        Ok(HandlerOutcome::unchanged())
    }

    fn on_delete(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError> {
        let execution_role = event.required_property(EXECUTION_ROLE_PROPERTY)?;
        self.disable(execution_role)?;
        Ok(HandlerOutcome::unchanged())
    }
}
