//! route-guard server and policy checker.
//!
//! ```text
//!   Client ──▶ request id ──▶ trace ──▶ timeout ──▶ identity ──▶ module guard ──▶ handler
//!                                                   (headers)    (pipeline)
//!                                                                    │
//!                                                                    └──▶ 401 / 403 / 303
//! ```

use std::path::PathBuf;

use axum::http::Method;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use url::Url;

use route_guard::config::{load_config, GuardConfig};
use route_guard::http::{GuardServer, RequestContext};
use route_guard::observability::{logging, metrics};
use route_guard::security::{Claims, Identity, Module};

#[derive(Parser)]
#[command(name = "route-guard")]
#[command(about = "Per-module security guards for HTTP services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configured modules
    Serve {
        /// Path to the TOML configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the listener bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Evaluate one module's guards against a simulated request
    Check {
        #[arg(short, long)]
        config: PathBuf,

        /// Module name
        #[arg(short, long)]
        module: String,

        #[arg(long, default_value = "GET")]
        method: Method,

        /// Absolute request URL
        #[arg(long)]
        url: Url,

        /// Authenticated user name
        #[arg(long)]
        user: Option<String>,

        /// Comma-separated claims; omit for no claims collection
        #[arg(long)]
        claims: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => serve(config, bind).await,
        Commands::Check {
            config,
            module,
            method,
            url,
            user,
            claims,
        } => check(config, module, method, url, user, claims),
    }
}

async fn serve(
    path: Option<PathBuf>,
    bind: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &path {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("route-guard v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        config = ?path,
        bind_address = %config.listener.bind_address,
        modules = config.modules.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    GuardServer::new(config).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn check(
    path: PathBuf,
    module: String,
    method: Method,
    url: Url,
    user: Option<String>,
    claims: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&path)?;
    let module_config = config
        .modules
        .iter()
        .find(|m| m.name == module)
        .ok_or_else(|| format!("no module named '{module}' in {}", path.display()))?;
    let pipeline = Module::from_config(module_config).freeze();

    let mut context = RequestContext::new(method, url);
    if let Some(user) = user {
        let claims = match claims {
            Some(raw) => Claims::present(
                raw.split(config.identity.claims_separator)
                    .map(str::trim)
                    .filter(|c| !c.is_empty()),
            ),
            None => Claims::Absent,
        };
        context = context.with_user(Identity {
            user_name: Some(user),
            claims,
        });
    }

    let decision = match pipeline.invoke(&context)? {
        None => serde_json::json!({
            "module": module,
            "guards": pipeline.names(),
            "decision": "pass",
        }),
        Some(response) => serde_json::json!({
            "module": module,
            "guards": pipeline.names(),
            "decision": "reject",
            "status": response.status.as_u16(),
            "headers": response.headers,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
