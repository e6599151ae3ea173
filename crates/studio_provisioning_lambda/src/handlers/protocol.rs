use serde_json::Value;
use tracing::{error, info};

use crate::adapters::response::ResponseSender;
use crate::config::ResponseMode;
use crate::runtime::cfn_response::CfnResponseDocument;
use crate::runtime::contract::LifecycleEvent;
use crate::runtime::error::ProvisioningError;
use crate::runtime::lifecycle::{dispatch, LifecycleHandler};

/// Runs one lifecycle invocation end to end and produces the function result.
///
/// In provider mode the handler result is returned as is and errors
/// propagate to the provider framework. In direct mode the outcome, failed
/// or not, is uploaded to the event's `ResponseURL`; only a failed upload
/// fails the invocation. A payload that does not decode is an error in both
/// modes, reported as FAILED first in direct mode when it names a `ResponseURL`.
pub fn complete_invocation(
    payload: Value,
    handler: &dyn LifecycleHandler,
    mode: ResponseMode,
    sender: &dyn ResponseSender,
    log_stream: &str,
) -> Result<Value, ProvisioningError> {
    let event = match LifecycleEvent::from_value(payload.clone()) {
        Ok(event) => event,
        Err(failure) => {
            error!(event = "lifecycle_event_malformed", error = %failure);
            if mode == ResponseMode::Direct {
                report_malformed_payload(&payload, &failure, sender, log_stream);
            }
            return Err(failure);
        }
    };
    info!(
        event = "lifecycle_event_received",
        request_type = event.request_type.as_str(),
        request_id = event.request_id.as_deref().unwrap_or_default(),
        logical_resource_id = event.logical_resource_id.as_deref().unwrap_or_default()
    );

    let result = dispatch(&event, handler);
    if let Err(failure) = &result {
        error!(
            event = "lifecycle_event_failed",
            request_type = event.request_type.as_str(),
            error = %failure
        );
    }

    match mode {
        ResponseMode::Provider => {
            let response = result?;
            serde_json::to_value(response)
                .map_err(|error| ProvisioningError::MalformedEvent(error.to_string()))
        }
        ResponseMode::Direct => {
            let document = match &result {
                Ok(response) => CfnResponseDocument::success(&event, response, log_stream),
                Err(failure) => CfnResponseDocument::failure(&event, failure, log_stream),
            };
            let response_url = event.response_url.as_deref().ok_or_else(|| {
                ProvisioningError::ResponseDeliveryFailed(
                    "event carries no ResponseURL".to_string(),
                )
            })?;
            sender
                .send(response_url, &document)
                .map_err(ProvisioningError::ResponseDeliveryFailed)?;
            info!(
                event = "response_delivered",
                status = ?document.status,
                physical_resource_id = document.physical_resource_id.as_str()
            );
            serde_json::to_value(&document)
                .map_err(|error| ProvisioningError::ResponseDeliveryFailed(error.to_string()))
        }
    }
}

/// Best effort FAILED upload for a payload that never decoded. Upload errors
/// are only logged; the caller returns the decode error either way.
fn report_malformed_payload(
    payload: &Value,
    failure: &ProvisioningError,
    sender: &dyn ResponseSender,
    log_stream: &str,
) {
    let Some(response_url) = payload.get("ResponseURL").and_then(Value::as_str) else {
        return;
    };
    let document = CfnResponseDocument::failure_from_payload(payload, failure, log_stream);
    match sender.send(response_url, &document) {
        Ok(()) => info!(
            event = "response_delivered",
            status = ?document.status,
            physical_resource_id = document.physical_resource_id.as_str()
        ),
        Err(upload_error) => error!(
            event = "response_delivery_failed",
            error = %upload_error
        ),
    }
}
