//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard
//! server. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// How the request scheme is determined behind proxies.
    pub forwarding: ForwardingConfig,

    /// Where the upstream gateway puts the authenticated identity.
    pub identity: IdentityConfig,

    /// Guarded modules, each mounted at its own path prefix.
    pub modules: Vec<ModuleConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Scheme detection behind TLS-terminating proxies.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Trust `X-Forwarded-Proto` for the request scheme.
    /// Only enable when every client reaches us through a proxy that sets it.
    pub trust_forwarded_proto: bool,
}

/// Identity headers set by an authenticating gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Header carrying the user name.
    pub user_header: String,

    /// Header carrying the claims. Absent header = no claims collection.
    pub claims_header: String,

    /// Separator between claims in `claims_header`.
    pub claims_separator: char,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_header: "x-forwarded-user".to_string(),
            claims_header: "x-forwarded-claims".to_string(),
            claims_separator: ',',
        }
    }
}

/// A guarded module.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ModuleConfig {
    /// Module identifier for logging.
    pub name: String,

    /// Path prefix the module is mounted at.
    pub path_prefix: String,

    /// Require an authenticated user.
    #[serde(default)]
    pub require_authentication: bool,

    /// Require every one of these claims.
    #[serde(default)]
    pub required_claims: Vec<String>,

    /// Require at least one of these claims.
    #[serde(default)]
    pub any_of_claims: Vec<String>,

    /// Require HTTPS.
    #[serde(default)]
    pub https: Option<HttpsConfig>,
}

/// HTTPS requirement for a module.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpsConfig {
    /// Redirect plaintext GETs instead of refusing them.
    #[serde(default = "default_redirect")]
    pub redirect: bool,

    /// HTTPS port for redirects, when not the default.
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_redirect() -> bool {
    true
}

impl Default for HttpsConfig {
    fn default() -> Self {
        Self {
            redirect: default_redirect(),
            port: None,
        }
    }
}
