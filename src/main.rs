use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use briki::catalog::{JsonPlanSource, PlanSource};
use briki::models::RankedPlanView;
use briki::ranker::filter_by_country;
use briki::utils::init_logger;
use briki::{create_router, AppState, Config, PlanRanker, RankerConfig};

#[derive(Parser, Debug)]
#[command(name = "briki")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Rank a plan catalog against a query and print the results as JSON
    Rank {
        /// Free-text query, e.g. "seguro económico para mi perro"
        query: String,
        /// Catalog file or directory
        #[arg(long, env = "BRIKI_CATALOG_DIR", default_value = "data/plans")]
        catalog: PathBuf,
        #[arg(long, short = 'n', default_value_t = 3)]
        limit: usize,
        /// ISO country code used to pre-filter plans
        #[arg(long)]
        country: Option<String>,
        /// JSON file overriding the keyword tables
        #[arg(long, env = "BRIKI_RANKER_CONFIG")]
        ranker_config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Rank {
            query,
            catalog,
            limit,
            country,
            ranker_config,
        } => rank(&query, catalog, limit, country.as_deref(), ranker_config).await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);
    info!(catalog = %config.catalog.path.display(), provider = %config.llm.provider, "Starting Briki API");

    let state = AppState::from_config(config.clone())?;
    let app = create_router(state);

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.server.host))?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn rank(
    query: &str,
    catalog: PathBuf,
    limit: usize,
    country: Option<&str>,
    ranker_config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = match ranker_config {
        Some(path) => RankerConfig::from_file(&path)?,
        None => RankerConfig::default(),
    };
    let ranker = PlanRanker::new(config)?;

    let plans = JsonPlanSource::new(catalog).load_plans().await?;
    let plans = filter_by_country(plans, country);

    let results: Vec<RankedPlanView> = ranker
        .scored_plans(query, &plans, limit)
        .into_iter()
        .map(|scored| RankedPlanView {
            plan: scored.plan.clone(),
            score: scored.score,
        })
        .collect();

    let output = serde_json::json!({
        "query": query,
        "shoppingIntent": ranker.should_suggest_plans(query),
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
