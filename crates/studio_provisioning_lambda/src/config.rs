//! Process configuration read from the function environment.
//!
//! Values are read once at cold start. Every loader also accepts an explicit
//! lookup so tests do not touch the process environment.

use std::path::PathBuf;

use crate::runtime::home_layout::DEFAULT_EFS_MOUNT_PATH;
use crate::runtime::portfolio::SAGEMAKER_PORTFOLIO_PROVIDER;

pub const EFS_MOUNT_PATH_VAR: &str = "EFS_MOUNT_PATH";
pub const GIT_BINARY_VAR: &str = "GIT_BINARY";
pub const GIT_CLONE_DEPTH_VAR: &str = "GIT_CLONE_DEPTH";
pub const PORTFOLIO_PROVIDER_NAME_VAR: &str = "PORTFOLIO_PROVIDER_NAME";
pub const CFN_RESPONSE_MODE_VAR: &str = "CFN_RESPONSE_MODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Return the result to the provider framework that invoked the function.
    #[default]
    Provider,
    /// Upload the result to the event's `ResponseURL`.
    Direct,
}

impl ResponseMode {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "provider" => Ok(Self::Provider),
            "direct" => Ok(Self::Direct),
            other => Err(format!(
                "{CFN_RESPONSE_MODE_VAR} must be 'provider' or 'direct', got '{other}'"
            )),
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        lookup(CFN_RESPONSE_MODE_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(|value| Self::parse(&value))
            .unwrap_or(Ok(Self::Provider))
    }

    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(env_lookup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitPopulationConfig {
    pub mount_root: PathBuf,
    pub git_binary: PathBuf,
    pub clone_depth: Option<u32>,
}

impl Default for GitPopulationConfig {
    fn default() -> Self {
        Self {
            mount_root: PathBuf::from(DEFAULT_EFS_MOUNT_PATH),
            git_binary: PathBuf::from("git"),
            clone_depth: None,
        }
    }
}

impl GitPopulationConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        let mount_root = non_blank(lookup(EFS_MOUNT_PATH_VAR))
            .map(PathBuf::from)
            .unwrap_or(defaults.mount_root);
        let git_binary = non_blank(lookup(GIT_BINARY_VAR))
            .map(PathBuf::from)
            .unwrap_or(defaults.git_binary);
        let clone_depth = match non_blank(lookup(GIT_CLONE_DEPTH_VAR)) {
            None => None,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(depth) if depth > 0 => Some(depth),
                _ => {
                    return Err(format!(
                        "{GIT_CLONE_DEPTH_VAR} must be a positive integer, got '{raw}'"
                    ))
                }
            },
        };

        Ok(Self {
            mount_root,
            git_binary,
            clone_depth,
        })
    }

    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(env_lookup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioToggleConfig {
    pub provider_name: String,
}

impl Default for PortfolioToggleConfig {
    fn default() -> Self {
        Self {
            provider_name: SAGEMAKER_PORTFOLIO_PROVIDER.to_string(),
        }
    }
}

impl PortfolioToggleConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            provider_name: non_blank(lookup(PORTFOLIO_PROVIDER_NAME_VAR))
                .unwrap_or_else(|| SAGEMAKER_PORTFOLIO_PROVIDER.to_string()),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
