//! # cadence-agent
//!
//! Scheduling widget server binary. Loads settings, picks the widget
//! planner, wires the session store, router and sweeper, and serves
//! `WebSocket` clients until Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cadence_llm::{GeminiConfig, GeminiDecisionModel};
use cadence_runtime::{ActionRouter, SessionStore, ToolPlanner, spawn_sweeper};
use cadence_server::config::ServerConfig;
use cadence_server::server::CadenceServer;
use cadence_server::shutdown::DEFAULT_SHUTDOWN_TIMEOUT;
use cadence_settings::{
    CadenceSettings, PlannerMode, PlannerSettings, WidgetSettings, load_settings_from_path,
    settings_path,
};
use cadence_widgets::{BuiltinTemplates, DirectoryTemplates, TemplateSource, WidgetPopulator};
use clap::Parser;
use tracing::{info, warn};

/// Cadence scheduling widget server.
#[derive(Parser, Debug)]
#[command(name = "cadence-agent", about = "Scheduling widget WebSocket server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Widget planner: `model` or `lookup` (overrides settings).
    #[arg(long)]
    planner: Option<String>,

    /// Settings file (default `~/.cadence/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// Apply CLI flags on top of loaded settings.
fn apply_cli(settings: &mut CadenceSettings, cli: &Cli) -> Result<()> {
    if let Some(host) = &cli.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(planner) = &cli.planner {
        let Some(mode) = PlannerMode::parse(planner) else {
            bail!("unknown planner '{planner}', expected 'model' or 'lookup'");
        };
        settings.planner.mode = mode;
    }
    Ok(())
}

/// Choose the planning strategy once, at startup.
fn build_planner(settings: &PlannerSettings) -> ToolPlanner {
    if settings.mode == PlannerMode::Lookup {
        info!("widget planner: lookup table");
        return ToolPlanner::Lookup;
    }

    let Some(api_key) = settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        warn!("no API key configured (planner.apiKey / GOOGLE_API_KEY), using lookup table");
        return ToolPlanner::Lookup;
    };

    let mut config = GeminiConfig::new(&settings.model, api_key);
    config.base_url.clone_from(&settings.base_url);
    config.timeout = Duration::from_millis(settings.timeout_ms);

    match GeminiDecisionModel::new(config) {
        Ok(model) => {
            info!(model = %settings.model, "widget planner: decision model with lookup fallback");
            ToolPlanner::Model(Arc::new(model))
        }
        Err(e) => {
            warn!(error = %e, "decision model unavailable, using lookup table");
            ToolPlanner::Lookup
        }
    }
}

/// Primary template source and, when it is a directory, the built-in
/// fallback.
fn build_templates(
    settings: &WidgetSettings,
) -> Result<(Arc<dyn TemplateSource>, Option<Arc<dyn TemplateSource>>)> {
    let builtin: Arc<dyn TemplateSource> =
        Arc::new(BuiltinTemplates::new().context("built-in widget templates are invalid")?);
    match &settings.templates_dir {
        Some(dir) => {
            info!(dir = %dir, "serving widget templates from directory");
            Ok((Arc::new(DirectoryTemplates::new(dir)), Some(builtin)))
        }
        None => Ok((builtin, None)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.settings.clone().unwrap_or_else(settings_path);
    let mut settings = load_settings_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    apply_cli(&mut settings, &cli)?;

    cadence_core::logging::init_subscriber(&settings.logging.level);
    let metrics = cadence_server::metrics::install_recorder();

    let planner = build_planner(&settings.planner);
    let (templates, fallback) = build_templates(&settings.widgets)?;

    let store = Arc::new(SessionStore::new(settings.session.idle_timeout()));
    let mut router = ActionRouter::new(Arc::clone(&store), Arc::clone(&templates), planner)
        .with_populator(WidgetPopulator::new(settings.widgets.date_count));
    if let Some(fallback) = fallback {
        router = router.with_fallback_templates(fallback);
    }

    let server = CadenceServer::new(
        ServerConfig::from_settings(&settings.server),
        Arc::new(router),
        templates,
        Some(metrics),
    );
    let sweeper = spawn_sweeper(
        store,
        settings.session.sweep_interval(),
        server.shutdown().token(),
    );

    let (addr, serve) = server
        .listen()
        .await
        .with_context(|| format!("failed to bind {}", server.config().bind_addr()))?;
    info!(
        %addr,
        idle_timeout_secs = settings.session.idle_timeout_secs,
        sweep_interval_secs = settings.session.sweep_interval_secs,
        "cadence ready"
    );

    server.shutdown().wait_for_signal().await;
    server
        .shutdown()
        .graceful_shutdown(vec![serve, sweeper], DEFAULT_SHUTDOWN_TIMEOUT)
        .await;
    info!("cadence stopped");
    Ok(())
}
