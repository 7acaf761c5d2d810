//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with one mount per module
//! - Put each module behind its own guard middleware
//! - Wire up shared middleware (request ID, tracing, timeout, identity)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware,
    routing::any,
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GuardConfig;
use crate::http::middleware::{guard_middleware, header_identity_middleware, GuardState};
use crate::security::identity::Identity;
use crate::security::module::Module;

/// A module mounted at a path prefix.
#[derive(Debug, Clone)]
struct Mount {
    path_prefix: String,
    module: Module,
}

/// HTTP server hosting guarded modules.
pub struct GuardServer {
    config: GuardConfig,
    mounts: Vec<Mount>,
}

impl GuardServer {
    /// Create a server with the modules declared in `config`.
    pub fn new(config: GuardConfig) -> Self {
        let mounts = config
            .modules
            .iter()
            .map(|module| Mount {
                path_prefix: module.path_prefix.clone(),
                module: Module::from_config(module),
            })
            .collect();
        Self { config, mounts }
    }

    /// Mount a module built in code (e.g. one with validated-claims policies).
    pub fn mount(mut self, path_prefix: impl Into<String>, module: Module) -> Self {
        self.mounts.push(Mount {
            path_prefix: path_prefix.into(),
            module,
        });
        self
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let mut app: Router = Router::new();

        for mount in &self.mounts {
            let name: Arc<str> = Arc::from(mount.module.name());
            let guard_state = GuardState {
                module: name.clone(),
                pipeline: mount.module.freeze(),
                forwarding: self.config.forwarding.clone(),
            };

            let module_router: Router = module_routes(&mount.path_prefix)
                .into_iter()
                .fold(Router::new(), |router, path| {
                    router.route(&path, any(module_handler))
                })
                .with_state(name)
                .layer(middleware::from_fn_with_state(guard_state, guard_middleware));

            app = app.merge(module_router);
        }

        let identity = Arc::new(self.config.identity.clone());
        app.layer(middleware::from_fn_with_state(identity, header_identity_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            modules = self.mounts.len(),
            "Guard server starting"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Guard server stopped");
        Ok(())
    }

}

/// Paths served by a module mounted at `prefix`: the prefix itself, with a
/// trailing slash, and everything below it.
fn module_routes(prefix: &str) -> Vec<String> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return vec!["/".to_string(), "/{*path}".to_string()];
    }
    vec![
        prefix.to_string(),
        format!("{prefix}/"),
        format!("{prefix}/{{*path}}"),
    ]
}

/// Handler body reached once every guard passed.
async fn module_handler(
    State(module): State<Arc<str>>,
    req: Request<Body>,
) -> Json<serde_json::Value> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| req.uri().path().to_string(), |uri| uri.0.path().to_string());
    let user = req
        .extensions()
        .get::<Identity>()
        .and_then(|identity| identity.user_name.clone());

    Json(serde_json::json!({
        "module": &*module,
        "method": req.method().as_str(),
        "path": path,
        "user": user,
    }))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
