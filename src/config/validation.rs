//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check module names and path prefixes
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GuardConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("identity header name must not be empty ({0})")]
    EmptyIdentityHeader(&'static str),

    #[error("module #{0} has no name")]
    UnnamedModule(usize),

    #[error("duplicate module name '{0}'")]
    DuplicateModule(String),

    #[error("module '{module}': path prefix '{prefix}' must start with '/'")]
    PathPrefix { module: String, prefix: String },

    #[error("module '{module}': path prefix '{prefix}' must not contain route parameters or wildcards")]
    RoutePattern { module: String, prefix: String },

    #[error("path prefix '{0}' is mounted more than once")]
    DuplicatePathPrefix(String),

    #[error("module '{0}': claim names must not be blank")]
    BlankClaim(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.identity.user_header.trim().is_empty() {
        errors.push(ValidationError::EmptyIdentityHeader("user_header"));
    }
    if config.identity.claims_header.trim().is_empty() {
        errors.push(ValidationError::EmptyIdentityHeader("claims_header"));
    }

    let mut seen = HashSet::new();
    let mut prefixes = HashSet::new();
    for (index, module) in config.modules.iter().enumerate() {
        if module.name.trim().is_empty() {
            errors.push(ValidationError::UnnamedModule(index));
        } else if !seen.insert(module.name.as_str()) {
            errors.push(ValidationError::DuplicateModule(module.name.clone()));
        }

        if !module.path_prefix.starts_with('/') {
            errors.push(ValidationError::PathPrefix {
                module: module.name.clone(),
                prefix: module.path_prefix.clone(),
            });
        } else if module
            .path_prefix
            .contains(|c: char| matches!(c, '{' | '}' | '*'))
        {
            errors.push(ValidationError::RoutePattern {
                module: module.name.clone(),
                prefix: module.path_prefix.clone(),
            });
        } else if !prefixes.insert(module.path_prefix.trim_end_matches('/')) {
            errors.push(ValidationError::DuplicatePathPrefix(
                module.path_prefix.clone(),
            ));
        }

        let blank_claim = module
            .required_claims
            .iter()
            .chain(&module.any_of_claims)
            .any(|claim| claim.trim().is_empty());
        if blank_claim {
            errors.push(ValidationError::BlankClaim(module.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
