use anyhow::Context;
use edgectl::cli::{Args, ExecutionMode, ManagerConfig, OutputFormat, Reporter, run_menu};
use edgectl::container::ContainerOrchestrator;
use edgectl::manager::{LifecycleController, StdinPrompt};
use edgectl::platform::SystemInventory;
use edgectl::watchtower::WatchtowerClient;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("edgectl=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mode = args.mode();

    let config = match ManagerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            return ExitCode::from(Reporter::stdout(mode.default_output()).conclude(Err(e)));
        }
    };

    let format = args.output_format(&config);
    let outcome = run(mode, &config, format).await;
    ExitCode::from(Reporter::stdout(format).conclude(outcome))
}

async fn run(
    mode: ExecutionMode,
    config: &ManagerConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    info!("Starting edgectl with {:?}", config);

    let runtime = ContainerOrchestrator::new()
        .await
        .context("Failed to connect to the container runtime")?;
    let host = SystemInventory::new();
    let watcher = WatchtowerClient::new(&config.watchtower_url, config.watchtower_token.clone())?;
    let prompt = StdinPrompt::new();

    let mut controller = LifecycleController::new(
        config,
        &runtime,
        &host,
        &watcher,
        &prompt,
        Reporter::stdout(format),
    );

    match mode {
        ExecutionMode::Menu => run_menu(&mut controller, &prompt).await?,
        ExecutionMode::SingleShot(command) => controller.execute(command).await?,
    }
    Ok(())
}
