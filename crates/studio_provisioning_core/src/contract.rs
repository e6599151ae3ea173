use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProvisioningError;

pub type ResourceProperties = Map<String, Value>;
pub type ResponseData = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ProvisioningError> {
        match value {
            "Create" => Ok(Self::Create),
            "Update" => Ok(Self::Update),
            "Delete" => Ok(Self::Delete),
            other => Err(ProvisioningError::UnrecognizedRequestType(other.to_string())),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom-resource lifecycle notification as delivered by CloudFormation.
///
/// `RequestType` stays a raw string so that unknown values reach the
/// dispatcher and fail there with [`ProvisioningError::UnrecognizedRequestType`]
/// instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(
        default,
        rename = "ResponseURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<ResourceProperties>,
}

impl LifecycleEvent {
    pub fn new(request_type: impl Into<String>, resource_properties: ResourceProperties) -> Self {
        Self {
            request_type: request_type.into(),
            request_id: None,
            stack_id: None,
            logical_resource_id: None,
            resource_type: None,
            response_url: None,
            service_token: None,
            physical_resource_id: None,
            resource_properties,
            old_resource_properties: None,
        }
    }

    pub fn from_value(payload: Value) -> Result<Self, ProvisioningError> {
        serde_json::from_value(payload)
            .map_err(|error| ProvisioningError::MalformedEvent(error.to_string()))
    }

    pub fn request_type(&self) -> Result<RequestType, ProvisioningError> {
        RequestType::parse(&self.request_type)
    }

    pub fn required_property(&self, name: &str) -> Result<&str, ProvisioningError> {
        let value = self
            .resource_properties
            .get(name)
            .ok_or_else(|| ProvisioningError::MissingProperty(name.to_string()))?;

        let Some(text) = value.as_str() else {
            return Err(ProvisioningError::invalid_property(
                name,
                "expected a string value",
            ));
        };

        if text.trim().is_empty() {
            return Err(ProvisioningError::invalid_property(name, "must not be blank"));
        }

        Ok(text)
    }

    pub fn optional_property(&self, name: &str) -> Option<&str> {
        self.resource_properties.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub physical_resource_id: Option<String>,
    pub data: Option<ResponseData>,
}

impl HandlerOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn with_physical_id(physical_resource_id: impl Into<String>) -> Self {
        Self {
            physical_resource_id: Some(physical_resource_id.into()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ProviderResponse {
    pub physical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

/// Completes a handler outcome the way the custom-resource provider framework
/// does when a handler leaves the physical id unset.
pub fn resolve_physical_id(
    event: &LifecycleEvent,
    request_type: RequestType,
    outcome: HandlerOutcome,
) -> Result<ProviderResponse, ProvisioningError> {
    let fallback = match request_type {
        RequestType::Create => event.request_id.clone(),
        RequestType::Update | RequestType::Delete => event.physical_resource_id.clone(),
    };

    let physical_resource_id = outcome
        .physical_resource_id
        .or(fallback)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ProvisioningError::MissingPhysicalResourceId {
            request_type: request_type.to_string(),
        })?;

    Ok(ProviderResponse {
        physical_resource_id,
        data: outcome.data,
    })
}
