use anyhow::Context;
use axum::{Router, routing::get};
use delve::{
    AppState,
    api::routes::create_router,
    cli::{Cli, Commands, init, output::Output},
    jobs::{JobStore, Orchestrator},
    research::ResearchCoordinator,
    tools::{DuckDuckGoSearch, WebSearchProvider},
    types::ResearchStatus,
    utils::toml_config::{DelveConfig, DelveConfigManager, SearchBackend},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
            host,
            port,
        }) => {
            let result = init::run(
                init::InitConfig {
                    path,
                    force,
                    provider,
                    host,
                    port,
                },
                &output,
            );
            match result {
                init::InitResult::Error(e) => anyhow::bail!(e),
                _ => Ok(()),
            }
        }
        Some(Commands::Config { validate }) => show_config(&cli.config, validate, &output),
        Some(Commands::Run { ref topic }) => {
            let manager = load_config(&cli.config)?;
            init_tracing(&manager.config(), cli.verbose, cli.json_logs);
            run_topic(manager, topic, &output).await
        }
        Some(Commands::Serve) | None => {
            let manager = load_config(&cli.config)?;
            init_tracing(&manager.config(), cli.verbose, cli.json_logs);
            serve(manager).await
        }
    }
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &std::path::Path) -> anyhow::Result<Arc<DelveConfigManager>> {
    if path.exists() {
        let manager = DelveConfigManager::new(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(Arc::new(manager))
    } else {
        let config = DelveConfig::default();
        config.validate()?;
        Ok(Arc::new(DelveConfigManager::from_config(config)))
    }
}

fn init_tracing(config: &DelveConfig, verbose: bool, json: bool) {
    let default_directive = if verbose {
        "delve=debug,tower_http=debug".to_string()
    } else {
        format!("delve={0},tower_http={0}", config.server.log_level)
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_orchestrator(config: &DelveConfig) -> anyhow::Result<Arc<Orchestrator>> {
    let provider = config.provider()?;
    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        "Using LLM provider"
    );
    let llm = provider.create_client().await?;

    let search: Arc<dyn WebSearchProvider> = match config.search.backend {
        SearchBackend::DuckDuckGo => Arc::new(DuckDuckGoSearch::new()),
    };
    let engine = Arc::new(ResearchCoordinator::new(llm, search.clone()));

    let mut orchestrator = Orchestrator::new(
        Arc::new(JobStore::new()),
        search,
        engine,
        config.job_settings(),
    );
    if let Some(limit) = config.research.max_concurrent_jobs {
        orchestrator = orchestrator.with_job_limit(limit);
    }
    Ok(Arc::new(orchestrator))
}

async fn serve(config_manager: Arc<DelveConfigManager>) -> anyhow::Result<()> {
    let config = config_manager.config();
    let orchestrator = build_orchestrator(&config).await?;

    if config_manager.config_path().exists() {
        if let Err(e) = config_manager.start_watching() {
            tracing::warn!("Config hot reload disabled: {}", e);
        }
    }

    let state = AppState {
        config_manager: config_manager.clone(),
        orchestrator,
    };

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", create_router())
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use delve::api::ApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    };

    let app = app.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Delve listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    config_manager.stop_watching();
    tracing::info!("Delve stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Research one topic in the foreground, printing sites as they are found.
async fn run_topic(
    config_manager: Arc<DelveConfigManager>,
    topic: &str,
    output: &Output,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(&config_manager.config()).await?;
    let created = orchestrator.create_research(topic)?;

    output.header(&format!("Researching \"{}\"", topic.trim()));
    output.kv("job", &created.id);

    let mut printed = 0;
    loop {
        let status = orchestrator.get_status(&created.id);
        for site in status.sites.iter().skip(printed) {
            output.list_item(&format!("{} : {}", site.title, site.url));
        }
        printed = status.sites.len();

        match status.status {
            ResearchStatus::Completed => {
                output.subheader("Result");
                println!("{}", status.result);
                output.complete("Research completed");
                return Ok(());
            }
            ResearchStatus::Error => {
                output.error(&status.result);
                anyhow::bail!("research failed");
            }
            _ => tokio::time::sleep(Duration::from_millis(500)).await,
        }
    }
}

fn show_config(path: &std::path::Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    let config = if path.exists() {
        DelveConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        output.warning(&format!("{} not found, showing defaults", path.display()));
        DelveConfig::default()
    };

    if validate {
        config.validate()?;
        output.success("Configuration is valid");
    }

    output.header("Configuration");
    output.kv("server", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log_level", &config.server.log_level);
    output.kv(
        "max_web_research_loops",
        &config.research.max_web_research_loops.to_string(),
    );
    output.kv("seed_results", &config.research.seed_results.to_string());
    output.kv(
        "max_concurrent_jobs",
        &config
            .research
            .max_concurrent_jobs
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
    );
    match config.provider() {
        Ok(provider) => {
            output.kv("llm", provider.name());
            output.kv("model", provider.model());
        }
        Err(e) => output.warning(&e.to_string()),
    }
    Ok(())
}
