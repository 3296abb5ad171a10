//! `appsync runs`: inspect sync run history.

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum RunsCommands {
    /// List the most recent sync runs
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(1..=1000))]
        limit: i64,
    },
    /// Show one sync run by its numeric ID
    Show { id: i64 },
}

pub(crate) async fn run_runs(pool: &sqlx::PgPool, command: RunsCommands) -> anyhow::Result<()> {
    match command {
        RunsCommands::List { limit } => {
            let runs = appsync_db::list_sync_runs(pool, limit).await?;
            if runs.is_empty() {
                println!("no sync runs recorded");
            }
            for run in &runs {
                println!("{}", format_run(run));
            }
        }
        RunsCommands::Show { id } => {
            let run = appsync_db::get_sync_run(pool, id).await?;
            println!("{}", format_run(&run));
            if let Some(message) = &run.error_message {
                println!("  error: {message}");
            }
        }
    }
    Ok(())
}

fn format_run(run: &appsync_db::SyncRunRow) -> String {
    let started = run
        .started_at
        .map_or_else(|| "-".to_owned(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
    format!(
        "#{:<5} {:<9} started {started}  pages={} records={}  {}",
        run.id, run.status, run.pages_visited, run.records_processed, run.listing_url
    )
}
