//! `appsync appliances`: read back the synced catalog.

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum ApplianceCommands {
    /// List the most recently updated catalog entries
    List {
        /// Only show entries with this category tag
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of entries to show
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(i64).range(1..=1000))]
        limit: i64,
    },
    /// Show one catalog entry by vendor product ID
    Show { external_id: String },
    /// Print the number of catalog entries
    Count,
}

pub(crate) async fn run_appliances(
    pool: &sqlx::PgPool,
    command: ApplianceCommands,
) -> anyhow::Result<()> {
    match command {
        ApplianceCommands::List { category, limit } => {
            let rows = appsync_db::list_appliances(pool, category.as_deref(), limit).await?;
            if rows.is_empty() {
                println!("no appliances found");
            }
            for row in &rows {
                println!("{}", format_row(row));
            }
        }
        ApplianceCommands::Show { external_id } => {
            let row = appsync_db::get_appliance_by_external_id(pool, &external_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("appliance '{external_id}' not found"))?;
            println!("{}", format_row(&row));
            println!("  url:         {}", row.product_url);
            println!("  image:       {} ({})", row.image, row.image_url);
            println!("  description: {}", row.description);
            println!("  updated:     {}", row.updated_at.format("%Y-%m-%d %H:%M:%S"));
        }
        ApplianceCommands::Count => {
            let count = appsync_db::count_appliances(pool).await?;
            println!("{count} appliances");
        }
    }
    Ok(())
}

fn format_row(row: &appsync_db::ApplianceRow) -> String {
    format!(
        "{:<8} {} {:<6} [{}] {}",
        row.external_id,
        format_price(row.price_amount),
        row.price_currency,
        row.category,
        row.title
    )
}

/// Renders minor units as a fixed two-decimal amount, e.g. `123450` → `1234.50`.
fn format_price(amount: i64) -> String {
    format!("{:>9}.{:02}", amount / 100, (amount % 100).abs())
}
