use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use timeline_common::{Config, CrawlPlan};
use timeline_crawler::backoff::{Backoff, BackoffPolicy, TokioSleeper};
use timeline_crawler::cleaner::Cleaner;
use timeline_crawler::fetcher::DayFetcher;
use timeline_crawler::scheduler::{build_tasks, Scheduler};
use timeline_crawler::session::SessionManager;
use timeline_crawler::writer::OutputWriter;
use x_client::XClient;

#[derive(Parser)]
#[command(name = "timeline-crawler", about = "Keyword crawler over curated event date windows")]
struct Cli {
    /// Plan TOML (keywords, anchor dates, pacing). Built-in reference plan if omitted.
    #[arg(long, global = true)]
    plan: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl every (keyword, day) task and write one CSV per task.
    Crawl {
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        cookies: Option<PathBuf>,
    },
    /// Clean crawl CSVs: entities, mentions, timestamp suffix, exclusions.
    Clean {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the task schedule without crawling.
    Tasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("timeline=info".parse()?)
                .add_directive("x_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let plan = match &cli.plan {
        Some(path) => CrawlPlan::load(path)?,
        None => CrawlPlan::reference(),
    };
    let mut config = Config::from_env();

    match cli.command {
        Command::Crawl { data_dir, cookies } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(path) = cookies {
                config.cookies_path = path;
            }
            crawl(&config, &plan).await
        }
        Command::Clean { input, output } => {
            let input = input.unwrap_or_else(|| config.data_dir.clone());
            let output = output.unwrap_or_else(|| config.clean_dir.clone());
            let stats = Cleaner::new(plan.cleaner.exclusions.clone()).clean_dir(&input, &output)?;
            info!(output = %output.display(), "{stats}");
            Ok(())
        }
        Command::Tasks => {
            let tasks = build_tasks(&plan.anchors, &plan.offsets, &plan.keywords);
            for task in &tasks {
                println!("{}\t{}", task, task.artifact_stem());
            }
            info!(tasks = tasks.len(), "Schedule printed");
            Ok(())
        }
    }
}

async fn crawl(config: &Config, plan: &CrawlPlan) -> Result<()> {
    info!("Timeline crawler starting...");
    config.log_redacted();

    let client = Arc::new(XClient::new(config.api_base.clone(), plan.language.clone()));

    let session = SessionManager::from_config(config)
        .acquire(client.as_ref())
        .await?;

    let backoff = Backoff::new(
        BackoffPolicy::from_settings(&plan.backoff),
        Arc::new(TokioSleeper),
    );
    let fetcher = DayFetcher::new(client.clone(), backoff.clone(), &plan.language);
    let writer = OutputWriter::new(config.data_dir.clone());
    let scheduler = Scheduler::new(fetcher, writer, backoff, plan.max_results);

    let tasks = build_tasks(&plan.anchors, &plan.offsets, &plan.keywords);
    let stats = scheduler.run(&session, &tasks).await?;

    info!(data_dir = %config.data_dir.display(), "All tasks complete. {stats}");
    Ok(())
}
