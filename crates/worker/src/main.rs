use anyhow::Context;
use clap::{Parser, Subcommand};
use goalplan_core::config::Settings;
use goalplan_core::ingest::{
    InflationRateProvider, MarketDataClient, WorldBankInflationProvider, YahooMarketClient,
};
use goalplan_core::planner::PlanCalculator;
use goalplan_core::storage::PgStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod expenses;

#[derive(Debug, Parser)]
#[command(name = "goalplan_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the inflation rate plans would use.
    Inflation {
        /// Skip the on-disk cache and fetch a fresh value.
        #[arg(long)]
        refresh: bool,
    },

    /// Print the NIFTY 50 and SENSEX summary.
    Market,

    /// Parse a goal sentence and print its plan.
    Plan {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Work with `date,amount,description` expense statements.
    Expenses {
        #[command(subcommand)]
        command: ExpensesCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ExpensesCommand {
    /// Categorised totals for a statement.
    Summary { file: PathBuf },

    /// Normalise, categorise and store a statement.
    Import {
        file: PathBuf,

        /// Do everything except writing to the database.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(args.command, &settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Inflation { refresh } => {
            let provider = WorldBankInflationProvider::from_settings(settings)?;
            let rate = if refresh {
                provider.refresh().await?
            } else {
                provider.fetch_inflation().await?
            };
            print_json(&rate)
        }
        Command::Market => {
            let client = YahooMarketClient::from_settings(settings)?;
            print_json(&client.index_summary().await)
        }
        Command::Plan { text } => {
            let text = text.join(" ");
            let goal = goalplan_core::nlp::parse_goal(&text)?
                .validate(goalplan_core::finance::current_year())?;
            let provider = Arc::new(WorldBankInflationProvider::from_settings(settings)?);
            let planner = PlanCalculator::new(provider, settings.fallback_inflation);
            let plan = planner
                .plan_event(&goal.event_name, goal.today_cost, goal.target_year)
                .await;
            print_json(&plan)
        }
        Command::Expenses { command } => match command {
            ExpensesCommand::Summary { file } => {
                let rows = goalplan_core::ledger::read_statement_file(&file)?;
                print_json(&expenses::summarize(&rows))
            }
            ExpensesCommand::Import { file, dry_run } => {
                let rows = goalplan_core::ledger::read_statement_file(&file)?;

                if dry_run {
                    tracing::info!(
                        file = %file.display(),
                        dry_run = true,
                        rows_len = rows.len(),
                        "expense import (dry-run)"
                    );
                    return print_json(&expenses::summarize(&rows));
                }

                let db_url = settings.require_database_url()?;
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(5)
                    .connect(db_url)
                    .await
                    .context("connect DATABASE_URL failed")?;

                goalplan_core::storage::migrate(&pool).await?;

                let store = PgStore::new(pool);
                let inserted = expenses::import_rows(&store, &rows).await?;
                tracing::info!(file = %file.display(), inserted, "imported expense statement");
                Ok(())
            }
        },
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
