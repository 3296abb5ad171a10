mod appliances;
mod runs;
mod sync;

use appsync_core::{AppConfig, Environment};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::appliances::ApplianceCommands;
use crate::runs::RunsCommands;

#[derive(Debug, Parser)]
#[command(name = "appsync")]
#[command(about = "Appliance catalog sync command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk the listing and upsert every product into the catalog
    Sync {
        /// Override the configured listing endpoint
        #[arg(long)]
        base_url: Option<String>,

        /// Override the configured page cap
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_pages: Option<u32>,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
    Appliances {
        #[command(subcommand)]
        command: ApplianceCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("appsync: nothing to do (try `appsync --help`)");
        return Ok(());
    };

    let config = appsync_core::load_app_config_from_env()?;
    init_tracing(&config)?;

    let pool_config = appsync_db::PoolConfig::from_app_config(&config);
    let pool = appsync_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Sync {
            base_url,
            max_pages,
        } => {
            appsync_db::run_migrations(&pool).await?;
            let mut settings = config.sync_settings();
            if let Some(base_url) = base_url {
                settings.base_url = base_url;
            }
            if let Some(max_pages) = max_pages {
                settings.max_pages = max_pages;
            }
            sync::run_sync(&pool, &config, settings).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                appsync_db::ping(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = appsync_db::run_migrations(&pool).await?;
                println!("migrations up to date ({applied} applied)");
            }
        },
        Commands::Runs { command } => runs::run_runs(&pool, command).await?,
        Commands::Appliances { command } => {
            appliances::run_appliances(&pool, command).await?;
        }
    }

    Ok(())
}

/// Sets up the global subscriber. `RUST_LOG` wins over `APPSYNC_LOG_LEVEL`.
/// Outside development the output has no ANSI colors or event targets.
fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let interactive = is_interactive(&config.env);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(interactive)
        .with_target(interactive)
        .init();
    tracing::debug!(env = %config.env, "logging initialized");
    Ok(())
}

fn is_interactive(env: &Environment) -> bool {
    matches!(env, Environment::Development)
}

/// Marks a sync run failed. Errors from the status update are logged only.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = appsync_db::fail_sync_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark sync run as failed"
        );
    }
}
