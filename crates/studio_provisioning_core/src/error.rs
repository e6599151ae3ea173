use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisioningError {
    #[error("Invalid request type: {0}")]
    UnrecognizedRequestType(String),

    #[error("Malformed lifecycle event: {0}")]
    MalformedEvent(String),

    #[error("Missing required resource property `{0}`")]
    MissingProperty(String),

    #[error("Invalid resource property `{name}`: {message}")]
    InvalidProperty { name: String, message: String },

    #[error("No physical resource id available for {request_type} request")]
    MissingPhysicalResourceId { request_type: String },

    #[error("Failed to resolve user profile `{user_profile_name}` in domain `{domain_id}`: {message}")]
    UserProfileLookupFailed {
        domain_id: String,
        user_profile_name: String,
        message: String,
    },

    #[error("No accepted portfolio share found for provider `{provider_name}`")]
    PortfolioNotFound { provider_name: String },

    #[error("Portfolio operation `{operation}` failed: {message}")]
    PortfolioOperationFailed { operation: String, message: String },

    #[error("Failed to deliver custom resource response: {0}")]
    ResponseDeliveryFailed(String),
}

impl ProvisioningError {
    pub fn invalid_property(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidProperty {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn portfolio_operation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PortfolioOperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
