use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "sovdb-cli")]
#[command(about = "SOVDB operations command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations.
    Migrate,
    /// Enqueue a report re-run for a brand.
    Rerun {
        #[arg(long)]
        brand: String,
    },
    /// Watch a queued run until its counter reaches the target or the
    /// one-hour ceiling passes.
    Await {
        #[arg(long)]
        run: Uuid,
    },
    /// Validate and print the competitor roster.
    Roster {
        #[arg(long, default_value = "./config/competitors.yaml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => migrate().await,
        Commands::Rerun { brand } => rerun(&brand).await,
        Commands::Await { run } => await_run(run).await,
        Commands::Roster { path } => roster(&path),
    }
}

async fn migrate() -> anyhow::Result<()> {
    let pool = sovdb_db::connect_pool_from_env().await?;
    let applied = sovdb_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

async fn rerun(brand_slug: &str) -> anyhow::Result<()> {
    let pool = sovdb_db::connect_pool_from_env().await?;
    let brand = sovdb_db::get_brand_by_slug(&pool, brand_slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("unknown brand: {brand_slug}"))?;

    let prompts_total = sovdb_db::count_active_prompts(&pool, brand.id).await?;
    let run = sovdb_db::enqueue_report_run(
        &pool,
        brand.id,
        "cli",
        i32::try_from(prompts_total).unwrap_or(i32::MAX),
    )
    .await?;

    println!(
        "enqueued run {} for {} ({} prompt(s))",
        run.public_id, brand.slug, run.prompts_total
    );
    Ok(())
}

async fn await_run(public_id: Uuid) -> anyhow::Result<()> {
    let pool = sovdb_db::connect_pool_from_env().await?;
    let run = sovdb_db::get_queue_run(&pool, public_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("unknown queue run: {public_id}"))?;

    let target = i64::from(run.prompts_total);
    println!(
        "watching run {public_id}: {}/{} prompt(s) complete",
        run.prompts_completed, run.prompts_total
    );

    let outcome = sovdb_pipeline::poll_counter(sovdb_pipeline::PollConfig::default(), target, || {
        let pool = pool.clone();
        async move {
            let run = sovdb_db::get_queue_run(&pool, public_id)
                .await?
                .ok_or(sovdb_db::DbError::NotFound)?;
            Ok::<_, sovdb_db::DbError>(i64::from(run.prompts_completed))
        }
    })
    .await?;

    match outcome {
        sovdb_pipeline::PollOutcome::Completed { value } => {
            println!("run complete: {value}/{target} prompt(s)");
        }
        sovdb_pipeline::PollOutcome::TimedOut { last_value } => {
            println!(
                "taking longer than expected ({last_value}/{target} after 1 hour); \
                 check back later or enqueue a fresh run"
            );
        }
    }
    Ok(())
}

fn roster(path: &std::path::Path) -> anyhow::Result<()> {
    let roster = sovdb_core::load_competitors(path)?;
    println!("{} competitor(s):", roster.competitors.len());
    for competitor in &roster.competitors {
        println!(
            "  {:<24} {:<8} {}",
            competitor.slug(),
            competitor.color,
            competitor.website.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
