use serde::{Deserialize, Serialize};

use crate::error::ProvisioningError;

/// Provider name SageMaker uses for the portfolio backing SageMaker Projects.
pub const SAGEMAKER_PORTFOLIO_PROVIDER: &str = "Amazon SageMaker";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortfolioShare {
    pub id: String,
    pub provider_name: String,
}

/// Picks the accepted share published by `provider_name`.
///
/// When several shares match, the last one listed wins.
pub fn select_portfolio<'a>(
    shares: &'a [PortfolioShare],
    provider_name: &str,
) -> Result<&'a PortfolioShare, ProvisioningError> {
    shares
        .iter()
        .rev()
        .find(|share| share.provider_name == provider_name && !share.id.is_empty())
        .ok_or_else(|| ProvisioningError::PortfolioNotFound {
            provider_name: provider_name.to_string(),
        })
}
