use clap::{Parser, Subcommand};
use fewatch::{
    cmd::health_check, config::AppConfig, http_client::build_api_client,
    providers::NvidiaApiSource, supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the main monitoring supervisor.
    Run,
    /// Probes the running tracker and exits 0 (healthy) or 1 (unhealthy).
    HealthCheck,
}

#[tokio::main]
#[tracing::instrument(level = "info")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_supervisor().await?,
        Commands::HealthCheck => {
            let healthy = health_check::execute(None).await;
            std::process::exit(if healthy { 0 } else { 1 });
        }
    }

    Ok(())
}

async fn run_supervisor() -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(None)?;
    tracing::debug!(
        product_url = %config.product_url,
        locale = %config.target.locale,
        gpu_model = %config.target.gpu_model,
        "Configuration loaded."
    );

    tracing::debug!("Initializing NVIDIA store data source...");
    let api_client = build_api_client(&config.http_base_config)?;
    let data_source = NvidiaApiSource::new(api_client, &config);
    tracing::info!(
        stock_check_interval = ?config.stock_check_interval_ms,
        sku_check_interval = ?config.sku_check_interval_ms,
        "NVIDIA store data source initialized."
    );

    let supervisor =
        Supervisor::builder().config(config).data_source(Box::new(data_source)).build()?;

    tracing::info!("Supervisor initialized, starting monitoring...");

    supervisor.run().await?;

    Ok(())
}
