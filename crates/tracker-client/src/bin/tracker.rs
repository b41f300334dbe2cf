//! tracker - command-line client for the research-tracker backend.
//!
//! Loaded items are printed to stdout as JSON; logs go to stderr.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tracker_client::{CategoryLoadState, ClientConfig, Dashboard};
use tracker_core::{Category, CodeSort, FilterState};

#[derive(Parser)]
#[command(name = "tracker", version, about = "Research tracker command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a category and print its items as JSON.
    Load {
        /// papers, code, community or company
        category: Category,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Trigger a crawl for a category, then reload it.
    Refresh {
        category: Category,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Probe the backend health endpoint.
    Health,
    /// List unread notifications.
    Notifications,
}

#[derive(Args, Default)]
struct FilterArgs {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    tag: Option<String>,
    #[arg(long)]
    days: Option<u32>,
    #[arg(long)]
    source: Option<String>,
    /// arXiv category (papers)
    #[arg(long = "arxiv-category")]
    arxiv_category: Option<String>,
    #[arg(long)]
    conference_days: Option<u32>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    affiliation: Option<String>,
    #[arg(long)]
    keyword: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,
    /// YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    min_citations: Option<u32>,
    /// code and community
    #[arg(long)]
    domain: Option<String>,
    /// Sort code posts by stars instead of creation time.
    #[arg(long)]
    stars: bool,
    /// company
    #[arg(long)]
    direction: Option<String>,
    /// company
    #[arg(long)]
    company: Option<String>,
}

impl FilterArgs {
    fn apply(self, filters: &mut FilterState) {
        fn set(slot: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        fn set_num(slot: &mut u32, value: Option<u32>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        match filters {
            FilterState::Papers(f) => {
                set(&mut f.search, self.search);
                set(&mut f.tag, self.tag);
                set_num(&mut f.days, self.days);
                set_num(&mut f.conference_days, self.conference_days);
                set(&mut f.source, self.source);
                set(&mut f.category, self.arxiv_category);
                set(&mut f.author, self.author);
                set(&mut f.affiliation, self.affiliation);
                set(&mut f.keyword, self.keyword);
                f.from_date = self.from.or(f.from_date);
                f.to_date = self.to.or(f.to_date);
                f.min_citations = self.min_citations.or(f.min_citations);
            }
            FilterState::Code(f) => {
                set(&mut f.search, self.search);
                set(&mut f.tag, self.tag);
                set_num(&mut f.days, self.days);
                set(&mut f.source, self.source);
                set(&mut f.domain, self.domain);
                if self.stars {
                    f.sort = CodeSort::Star;
                }
            }
            FilterState::Community(f) => {
                set(&mut f.search, self.search);
                set(&mut f.tag, self.tag);
                set_num(&mut f.days, self.days);
                set(&mut f.source, self.source);
                set(&mut f.domain, self.domain);
            }
            FilterState::Company(f) => {
                set(&mut f.search, self.search);
                set(&mut f.tag, self.tag);
                set_num(&mut f.days, self.days);
                set(&mut f.direction, self.direction);
                set(&mut f.company, self.company);
            }
        }
    }
}

fn init_tracing() {
    // LOG_FORMAT - "json" or "text" (default: "text")
    // RUST_LOG   - standard env filter (default: "tracker_client=info")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tracker_client=info,tracker_core=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    info!(target_url = %config.base_url(), "Client configured");
    let dashboard = Dashboard::connect(&config)?;

    match cli.command {
        Command::Load { category, filters } => {
            let controller = dashboard.category(category);
            controller.commit_filters(|f| filters.apply(f))?;
            match controller.load_and_wait().await? {
                CategoryLoadState::Loaded(items) => print_json(&items)?,
                CategoryLoadState::Failed(err) => anyhow::bail!(err.hint),
                other => anyhow::bail!("load ended in state {}", other.label()),
            }
        }
        Command::Refresh { category, filters } => {
            let controller = dashboard.category(category);
            controller.commit_filters(|f| filters.apply(f))?;
            let outcome = match dashboard.refresh(category).await {
                Ok(outcome) => outcome,
                Err(err) => anyhow::bail!(err.user_hint()),
            };
            eprintln!("{} added", outcome.added);
            if let Some(hint) = &outcome.hint {
                eprintln!("{}", hint);
            }
            print_json(&outcome.response)?;
        }
        Command::Health => match dashboard.health().await {
            Ok(()) => println!("ok ({})", config.base_url()),
            Err(err) => anyhow::bail!("backend unhealthy at {}: {}", config.base_url(), err),
        },
        Command::Notifications => {
            let items = dashboard.resources().unread_notifications().await?;
            print_json(&items)?;
        }
    }

    Ok(())
}
