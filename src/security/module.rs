//! Modules: named handlers that own a before-request pipeline.

use crate::config::schema::ModuleConfig;
use crate::security::pipeline::{BeforePipeline, FrozenPipeline};
use crate::security::policy::ModuleSecurity;

/// Anything exposing a before-request pipeline can receive security policies.
pub trait HookedModule {
    fn before(&mut self) -> &mut BeforePipeline;
}

impl HookedModule for BeforePipeline {
    fn before(&mut self) -> &mut BeforePipeline {
        self
    }
}

/// A handler registration: a name plus its guard pipeline.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    before: BeforePipeline,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before: BeforePipeline::new(),
        }
    }

    /// Build a module from its declarative configuration.
    ///
    /// Policies are applied in a fixed order: https, authentication, claims,
    /// any-claim. Checks that need code (validated claims) can be added to
    /// the returned module.
    pub fn from_config(config: &ModuleConfig) -> Self {
        let mut module = Module::new(config.name.clone());

        if let Some(https) = &config.https {
            match https.port {
                Some(port) => module.requires_https_on_port(https.redirect, port),
                None => module.requires_https(https.redirect),
            };
        }
        if config.require_authentication {
            module.requires_authentication();
        }
        if !config.required_claims.is_empty() {
            module.requires_claims(config.required_claims.iter().cloned());
        }
        if !config.any_of_claims.is_empty() {
            module.requires_any_claim(config.any_of_claims.iter().cloned());
        }

        tracing::debug!(
            module = %module.name,
            guards = ?module.before.names(),
            "Module pipeline registered"
        );
        module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &BeforePipeline {
        &self.before
    }

    /// Freeze the pipeline for serving.
    pub fn freeze(&self) -> FrozenPipeline {
        self.before.freeze()
    }
}

impl HookedModule for Module {
    fn before(&mut self) -> &mut BeforePipeline {
        &mut self.before
    }
}
