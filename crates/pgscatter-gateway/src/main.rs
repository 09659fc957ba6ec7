//! pgscatter Gateway
//!
//! Connects to a set of PostgreSQL shards on behalf of one client session:
//! - Startup parameters and session overrides reach every shard
//! - Password authentication requests from backends are refused
//! - One query runs on all shards at once and its results, notices,
//!   and parameter changes are logged

mod pg_client;
mod scatter;
mod telemetry;

use crate::pg_client::{BackendConfig, TcpConnector};
use crate::scatter::{ScatterConn, SessionState, ShardResult};
use anyhow::Context;
use clap::Parser;
use pgscatter_common::{find_diagnostic, GatewayConfig, ShardTarget};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "pgscatter-gateway")]
#[command(about = "pgscatter Gateway - scatter a session across PostgreSQL shards")]
struct Args {
    /// JSON configuration file
    #[arg(long, env = "PGSCATTER_CONFIG")]
    config: Option<PathBuf>,

    /// Shard as name=host:port (repeatable, added to the config file's)
    #[arg(long = "shard", value_parser = parse_shard)]
    shards: Vec<ShardTarget>,

    /// Role for backend connections
    #[arg(long)]
    user: Option<String>,

    /// Database for backend connections
    #[arg(long)]
    database: Option<String>,

    /// Client startup parameter as name=value (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Session override as name=value, applied after startup (repeatable)
    #[arg(long = "set", value_parser = parse_key_value)]
    settings: Vec<(String, String)>,

    /// Query to run on every shard
    #[arg(long, default_value = "SELECT 1")]
    query: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn parse_shard(s: &str) -> Result<ShardTarget, String> {
    ShardTarget::parse(s).map_err(|e| e.to_string())
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("'{}' must look like name=value", s)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    telemetry::init(&args.log_level)?;

    info!("Starting pgscatter Gateway");

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    config.shards.extend(args.shards.iter().cloned());
    if config.shards.is_empty() {
        anyhow::bail!("no shards configured; pass --shard name=host:port or --config");
    }

    let mut backend = BackendConfig::default();
    if let Some(user) = args.user.clone().or_else(|| config.user.clone()) {
        backend.user = user;
    }
    if let Some(database) = args.database.clone().or_else(|| config.database.clone()) {
        backend.database = Some(database);
    }
    backend.log_config();

    let mut startup: HashMap<String, String> = config.startup_params.clone();
    startup.extend(args.params.iter().cloned());

    info!("  Shards: {}", config.shards.len());
    for shard in &config.shards {
        info!("    {}", shard);
    }

    let session = Arc::new(SessionState::new(startup));
    let scatter = ScatterConn::new(session, Arc::new(TcpConnector::new(backend)));
    for (name, value) in &args.settings {
        scatter.set_session_variable(name, value);
    }

    tokio::select! {
        outcome = scatter.execute(&config.shards, &args.query) => {
            match outcome {
                Ok(results) => {
                    for shard in &results {
                        log_shard_result(shard);
                    }
                }
                Err(e) => {
                    let err = anyhow::Error::new(e).context(format!("running '{}'", args.query));
                    match find_diagnostic(&*err) {
                        Some(diag) => error!(
                            sqlstate = %diag.code,
                            detail = diag.detail.as_deref().unwrap_or(""),
                            "{}: {}",
                            err,
                            diag.render_full()
                        ),
                        None => error!("{:#}", err),
                    }
                    scatter.close_all().await;
                    return Err(err);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, closing shard connections");
        }
    }

    scatter.close_all().await;
    info!("pgscatter Gateway finished");
    Ok(())
}

fn log_shard_result(shard: &ShardResult) {
    for (i, result) in shard.results.iter().enumerate() {
        info!(
            shard = %shard.shard,
            statement = i,
            columns = result.fields.len(),
            rows = result.rows.len(),
            "{}",
            result.command_tag
        );
        for row in &result.rows {
            let values: Vec<String> = row
                .values
                .iter()
                .map(|v| v.as_str().map(|s| s.into_owned()).unwrap_or_else(|| "NULL".to_string()))
                .collect();
            info!(shard = %shard.shard, "  {}", values.join(" | "));
        }
        for notice in &result.notices {
            info!(shard = %shard.shard, sqlstate = %notice.code, "{}", notice);
        }
    }
    if let Some(params) = &shard.parameter_status {
        for (name, value) in params {
            info!(shard = %shard.shard, parameter = %name, value = %value, "parameter status");
        }
    }
}
