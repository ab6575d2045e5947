mod db;
mod fetcher;
mod parser;
mod pipeline;
mod settings;
mod sources;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use fetcher::{HttpFetcher, Paced};
use parser::Extractor;
use settings::Settings;

#[derive(Parser)]
#[command(name = "product_scraper", about = "Catalog product page scraper")]
struct Cli {
    /// SQLite store path (overrides settings)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and store every product of every category
    Run {
        /// Category list file (overrides settings)
        #[arg(long)]
        categories: Option<PathBuf>,
        /// Directory holding <category>-product-links.txt files
        #[arg(long)]
        links_dir: Option<PathBuf>,
        /// Max products per category
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch and extract a single product page, printing the record
    Fetch {
        url: String,
        /// Also store the record in this collection
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Extract a record from a saved HTML file (no network)
    Extract { path: PathBuf },
    /// Show store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }
    let extractor = Extractor::new(&settings.regions)?;

    let result = match cli.command {
        Commands::Run {
            categories,
            links_dir,
            limit,
        } => {
            if let Some(path) = categories {
                settings.categories_file = path;
            }
            if let Some(dir) = links_dir {
                settings.links_dir = dir;
            }
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let fetcher = http_fetcher(&settings)?;
            let totals = run_all(&settings, &fetcher, &extractor, &conn, limit).await?;
            println!(
                "Done: {} categories, {} stored, {} failed, {} anomalies.",
                totals.categories, totals.stored, totals.failed, totals.anomalies
            );
            Ok(())
        }
        Commands::Fetch { url, collection } => {
            let fetcher = http_fetcher(&settings)?;
            let record = pipeline::fetch_record(&fetcher, &extractor, &url).await?;
            if let Some(name) = collection {
                let conn = db::connect(&settings.db_path)?;
                db::init_schema(&conn)?;
                let collection = sources::collection_name(&name);
                let id = db::insert_product(&conn, &collection, &url, &record)?;
                info!("Stored {} in {} (id {})", url, collection, id);
            }
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Extract { path } => {
            let record = pipeline::extract_file(&extractor, &path)?;
            if let Some(breadcrumb) = record.product_path.present() {
                info!("Category path: {}", breadcrumb);
            }
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Documents:     {}", s.documents);
            println!("Anomalies:     {}", s.anomalies);
            println!("Transport err: {}", s.transport_failures);
            println!("Missing data:  {}", s.missing_data_failures);
            if !s.collections.is_empty() {
                println!("\n--- Collections ---");
                for (name, count) in &s.collections {
                    println!("  {:<32} {:>6}", name, count);
                }
            }
            if let Some(run) = s.last_run {
                println!(
                    "\nLast run: {} -> {} ({} categories, {} stored, {} failed, {} anomalies)",
                    run.started_at,
                    run.finished_at.as_deref().unwrap_or("unfinished"),
                    run.totals.categories,
                    run.totals.stored,
                    run.totals.failed,
                    run.totals.anomalies,
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn http_fetcher(settings: &Settings) -> anyhow::Result<Paced<HttpFetcher>> {
    let http = HttpFetcher::new(
        settings.request_timeout(),
        &settings.user_agent,
        settings.status_policy,
    )?;
    Ok(Paced::new(http, settings.request_delay()))
}

/// Walk every category in file order, one product at a time.
async fn run_all(
    settings: &Settings,
    fetcher: &Paced<HttpFetcher>,
    extractor: &Extractor,
    conn: &rusqlite::Connection,
    limit: Option<usize>,
) -> anyhow::Result<db::RunTotals> {
    let categories = sources::read_categories(&settings.categories_file)?;
    info!("{} categories in {:?}", categories.len(), settings.categories_file);

    let run_id = db::start_run(conn)?;
    let mut totals = db::RunTotals::default();

    for category in &categories {
        let mut urls = match sources::read_links(&settings.links_dir, category) {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Skipping category {}: {:#}", category, e);
                continue;
            }
        };
        if let Some(n) = limit {
            urls.truncate(n);
        }
        let collection = sources::collection_name(category);
        info!("Category {} -> {} ({} products)", category, collection, urls.len());

        let cat_totals =
            pipeline::run_category(fetcher, extractor, conn, &collection, &urls).await?;
        totals.add(&cat_totals);
    }

    db::finish_run(conn, run_id, &totals)?;
    Ok(totals)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
