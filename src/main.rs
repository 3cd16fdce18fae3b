//! RiskLens - threat analysis for CSV activity logs.
//!
//! This binary starts the HTTP server or runs a one-off analysis.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use risklens::{
    config::{AnalyzeConfig, AnalyzerArgs, AnalyzerKind, Cli, Command, ServeConfig},
    create_router, CommandAnalyzer, HeuristicAnalyzer, RouterConfig, SampleDataset,
    ThreatAnalyzer,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Analyze(config) => run_analyze(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("RiskLens v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Base directory: {}", config.base_dir.display());
    info!("  Media directory: {}", config.media_dir.display());
    info!("  Max upload size: {} bytes", config.max_upload_size);
    log_analyzer(&config.analyzer);

    for dataset in [SampleDataset::Clean, SampleDataset::Dirty] {
        let path = dataset.path(&config.base_dir);
        if !path.is_file() {
            warn!(
                "  Sample dataset '{}' not found at {}; /{}_dataset_page/ will fail",
                dataset,
                path.display(),
                dataset
            );
        }
    }

    let analyzer = build_analyzer(&config.analyzer);
    let router = create_router(analyzer, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/clean_dataset_page/", addr);
    info!(
        "    curl -F report_name=demo -F csv_file=@events.csv http://{}/model_page/",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new(&config.base_dir, &config.media_dir)
        .with_max_upload_size(config.max_upload_size)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Analyze Command
// =============================================================================

async fn run_analyze(config: AnalyzeConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    if let Err(e) = config.analyzer.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let analyzer = build_analyzer(&config.analyzer);
    let result = match analyzer.analyze(&config.csv_path).await {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let rendered = if config.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    };

    match rendered {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Build the analyzer selected on the command line (call validate() first).
fn build_analyzer(args: &AnalyzerArgs) -> Box<dyn ThreatAnalyzer> {
    match args.analyzer {
        AnalyzerKind::Heuristic => Box::new(HeuristicAnalyzer::new()),
        AnalyzerKind::Command => Box::new(CommandAnalyzer::new(
            args.analyzer_command.clone().unwrap_or_default(),
            args.analyzer_args.clone(),
            Duration::from_secs(args.analyzer_timeout),
        )),
    }
}

fn log_analyzer(args: &AnalyzerArgs) {
    match args.analyzer {
        AnalyzerKind::Heuristic => info!("  Analyzer: built-in heuristic"),
        AnalyzerKind::Command => {
            info!(
                "  Analyzer: command '{}' {:?} (timeout {}s)",
                args.analyzer_command.as_deref().unwrap_or(""),
                args.analyzer_args,
                args.analyzer_timeout
            );
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "risklens=debug,tower_http=debug"
    } else {
        "risklens=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
