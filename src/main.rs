use anyhow::Context;
use copyedit::{
    api::routes::create_app,
    cli::{
        edit::{self, EditInput, EditOptions},
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands,
    },
    AppState, CopyeditConfig,
};
use owo_colors::OwoColorize;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        if output.colored {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::Serve);

    if let Commands::Init { path, force } = command {
        return match init::run(InitConfig { path, force }, output) {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => Err(anyhow::anyhow!(e)),
        };
    }

    let config = CopyeditConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config.server.log_level, cli.verbose);
    log_config_source(&cli.config);

    let state = AppState::from_config(config)?;

    match command {
        Commands::Serve => serve(state).await,
        Commands::Check => check(&state, output).await,
        Commands::Edit {
            inputs,
            text,
            output: target,
            format,
        } => {
            let options = EditOptions {
                input: EditInput::from_args(inputs, text),
                output: target,
                format,
            };
            edit::run(&state, options, output).await?;
            Ok(())
        }
        Commands::Init { .. } => Ok(()),
    }
}

/// `RUST_LOG` wins; otherwise the configured level, or `debug` with `--verbose`.
fn init_tracing(log_level: &str, verbose: bool) {
    let default_level = if verbose { "debug" } else { log_level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "copyedit={0},copyedit_server={0},tower_http={0}",
            default_level
        ))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn log_config_source(path: &Path) {
    if path.exists() {
        tracing::info!(path = %path.display(), "Loaded configuration");
    } else {
        tracing::warn!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    tracing::info!(
        addr = %addr,
        model = %state.config.ollama.model,
        ollama = %state.config.ollama.base_url,
        output_dir = %state.config.storage.output_dir.display(),
        "Starting copyedit server"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn check(state: &AppState, output: &Output) -> anyhow::Result<()> {
    output.header("Editing service");
    output.kv("url", &state.config.ollama.base_url);
    output.kv("model", &state.config.ollama.model);

    match state.pipeline.editor().ensure_available().await {
        Ok(()) => {
            output.success("Service reachable and model installed");
            Ok(())
        }
        Err(e) => {
            output.error(&e.to_string());
            output.hint("Start Ollama and pull the model:");
            output.command(&format!("ollama pull {}", state.config.ollama.model));
            Err(e.into())
        }
    }
}
