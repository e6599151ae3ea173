use crate::contract::{
    resolve_physical_id, HandlerOutcome, LifecycleEvent, ProviderResponse, RequestType,
};
use crate::error::ProvisioningError;

pub trait LifecycleHandler {
    fn on_create(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError>;

    fn on_update(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError>;

    fn on_delete(&self, event: &LifecycleEvent) -> Result<HandlerOutcome, ProvisioningError>;
}

/// Routes a lifecycle event to the matching handler callback.
///
/// Handler errors are returned untouched so the control plane marks the
/// resource as failed.
pub fn dispatch(
    event: &LifecycleEvent,
    handler: &dyn LifecycleHandler,
) -> Result<ProviderResponse, ProvisioningError> {
    let request_type = event.request_type()?;
    let outcome = match request_type {
        RequestType::Create => handler.on_create(event)?,
        RequestType::Update => handler.on_update(event)?,
        RequestType::Delete => handler.on_delete(event)?,
    };
    resolve_physical_id(event, request_type, outcome)
}
