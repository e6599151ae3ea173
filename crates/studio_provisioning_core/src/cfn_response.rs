//! Response document for custom resources that answer CloudFormation
//! directly through the pre-signed `ResponseURL`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::{LifecycleEvent, ProviderResponse, ResponseData};
use crate::error::ProvisioningError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CfnResponseDocument {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl CfnResponseDocument {
    pub fn success(event: &LifecycleEvent, response: &ProviderResponse, log_stream: &str) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: log_stream_reason(log_stream),
            physical_resource_id: response.physical_resource_id.clone(),
            stack_id: event.stack_id.clone().unwrap_or_default(),
            request_id: event.request_id.clone().unwrap_or_default(),
            logical_resource_id: event.logical_resource_id.clone().unwrap_or_default(),
            no_echo: false,
            data: response.data.clone(),
        }
    }

    pub fn failure(event: &LifecycleEvent, error: &ProvisioningError, log_stream: &str) -> Self {
        Self::failed(
            event.physical_resource_id.as_deref(),
            event.stack_id.as_deref(),
            event.request_id.as_deref(),
            event.logical_resource_id.as_deref(),
            error,
            log_stream,
        )
    }

    /// FAILED document for a payload that did not decode into a
    /// [`LifecycleEvent`]. Identifiers are taken from whatever string fields
    /// the payload still carries.
    pub fn failure_from_payload(payload: &Value, error: &ProvisioningError, log_stream: &str) -> Self {
        let field = |name: &str| payload.get(name).and_then(Value::as_str);
        Self::failed(
            field("PhysicalResourceId"),
            field("StackId"),
            field("RequestId"),
            field("LogicalResourceId"),
            error,
            log_stream,
        )
    }

    fn failed(
        physical_resource_id: Option<&str>,
        stack_id: Option<&str>,
        request_id: Option<&str>,
        logical_resource_id: Option<&str>,
        error: &ProvisioningError,
        log_stream: &str,
    ) -> Self {
        let physical_resource_id = physical_resource_id
            .filter(|value| !value.is_empty())
            .unwrap_or(log_stream);

        Self {
            status: ResponseStatus::Failed,
            reason: format!("{error}. {}", log_stream_reason(log_stream)),
            physical_resource_id: physical_resource_id.to_string(),
            stack_id: stack_id.unwrap_or_default().to_string(),
            request_id: request_id.unwrap_or_default().to_string(),
            logical_resource_id: logical_resource_id.unwrap_or_default().to_string(),
            no_echo: false,
            data: None,
        }
    }
}

fn log_stream_reason(log_stream: &str) -> String {
    format!("See the details in CloudWatch Log Stream: {log_stream}")
}
