use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use kuchikomi::config::Config;
use kuchikomi::notify::{DisabledNotifier, LineNotifier, Notifier};
use kuchikomi::pipeline::check::{self, Outcome};
use kuchikomi::session::WebDriverSession;
use kuchikomi::signature::SignatureStore;

/// Kuchikomi: new-review watcher for a single Google Maps listing.
///
/// Polls the listing page, extracts the most recent review, and sends a
/// LINE broadcast exactly once per genuinely new review.
#[derive(Parser)]
#[command(name = "kuchikomi", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one poll against the target page
    Check,

    /// Show the persisted state (stored signature, file age)
    Status,

    /// Clear the persisted signature — the next check classifies as new
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kuchikomi=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            let config = Config::load()?;
            config.require_target()?;
            let store = SignatureStore::new(&config.state_file);

            let notifier: Box<dyn Notifier> = if config.notifications_enabled() {
                Box::new(LineNotifier::new(config.line_access_token.clone()))
            } else {
                info!("LINE_ACCESS_TOKEN not set, running with notifications disabled");
                Box::new(DisabledNotifier)
            };

            println!("Connecting to WebDriver at {}...", config.webdriver_url);
            let session = WebDriverSession::connect(&config.webdriver_url).await?;

            println!("Checking for new reviews...");
            let report =
                check::run(&session, notifier.as_ref(), &store, &config.target_url).await?;

            match report.outcome {
                Outcome::New { preview } => {
                    println!("\n{}", "New review detected.".green().bold());
                    println!("  \"{preview}\"");
                }
                Outcome::Duplicate => {
                    println!(
                        "\nNo change — top review is the same as last time ({} on the page).",
                        report.review_count
                    );
                }
                Outcome::Empty => {
                    println!("\n{}", "No review elements found on the page.".yellow());
                    println!(
                        "{}",
                        "The page may have loaded slowly, or its layout changed again.".dimmed()
                    );
                }
            }

            if !report.sort_applied {
                println!(
                    "{}",
                    "Note: could not apply newest-first sort; the page's own ordering was used."
                        .dimmed()
                );
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let store = SignatureStore::new(&config.state_file);
            kuchikomi::status::show(&store)?;
        }

        Commands::Reset => {
            let config = Config::load()?;
            let store = SignatureStore::new(&config.state_file);
            store.clear()?;
            println!("Cleared stored signature at {}", store.path().display());
        }
    }

    Ok(())
}
