mod aggregate;
mod config;
mod discover;
mod extract;
mod fetch;
mod output;
mod pipeline;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use config::ScrapeConfig;

#[derive(Parser)]
#[command(
    name = "pesktop_scraper",
    about = "Scrape embedded download links from pesktop detail pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover detail-page links from the base page and list them
    Discover {
        /// Base page to scan
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Discover, fetch each page, extract links, write results
    Run {
        /// Max pages to process (default: all discovered)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Base page to scan
        #[arg(long)]
        base_url: Option<String>,
        /// Directory the timestamped run folder is created under
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
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

    let result = match cli.command {
        Commands::Discover { base_url } => {
            let mut config = ScrapeConfig::default();
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            let fetcher = fetch::Fetcher::new()?;
            match pipeline::discover_links(&fetcher, &config).await {
                Ok(links) if links.is_empty() => {
                    println!("No detail-page links found on {}", config.base_url);
                    Ok(())
                }
                Ok(links) => {
                    for url in &links {
                        println!("{}", url);
                    }
                    println!("\n{} detail pages discovered", links.len());
                    Ok(())
                }
                Err(e) => {
                    println!("Discovery failed: {}", e);
                    Ok(())
                }
            }
        }
        Commands::Run {
            limit,
            base_url,
            out_dir,
        } => {
            let mut config = ScrapeConfig {
                limit,
                out_root: out_dir,
                ..ScrapeConfig::default()
            };
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }

            let outcome = pipeline::run(&config).await?;
            if outcome.records.is_empty() {
                print_summary(&outcome.stats, None);
                return Ok(());
            }

            let dir = output::create_run_dir(&config.out_root)?;
            output::write_results(&dir, &outcome.records)?;
            print_summary(&outcome.stats, Some(&dir));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_summary(stats: &pipeline::RunStats, out_dir: Option<&Path>) {
    println!();
    println!("Links discovered:   {}", stats.discovered);
    println!("Pages fetched:      {}", stats.fetched);
    println!("Pages skipped:      {}", stats.failed);
    println!("Unique records:     {}", stats.records);
    println!("Duplicates removed: {}", stats.duplicates_removed);
    match out_dir {
        Some(dir) => println!("Output folder:      {}", dir.display()),
        None => println!("No download links found, nothing written."),
    }
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
