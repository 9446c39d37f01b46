use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trip_planner::cache::{MokaCacheService, RouteCache};
use trip_planner::config::AppConfig;
use trip_planner::dataset::Dataset;
use trip_planner::domain::{BuiltRoute, CityId, TransportType};
use trip_planner::geometry::{OsrmClient, PathGeometryService};
use trip_planner::graph::{GraphStore, SnapshotFileStore};
use trip_planner::planner::{RealityCheckTarget, RouteRequest, RoutePlanner};
use trip_planner::pricing::PriceCalculator;
use trip_planner::validate::RouteValidator;

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Plan multimodal trips over a transport dataset.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Dataset JSON with cities, stops, edges, legs and hubs
    #[arg(long)]
    dataset: PathBuf,

    /// Serve this saved graph version instead of the dataset's graph
    #[arg(long)]
    graph_version: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a route between two cities
    Build {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        booking_date: Option<NaiveDate>,
        /// Allowed transport types, comma separated
        #[arg(long, value_delimiter = ',')]
        modes: Vec<TransportType>,
        #[arg(long)]
        max_transfers: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        baggage_kg: f64,
        #[arg(long)]
        insurance: bool,
    },
    /// Suggest cities matching a query
    Autocomplete {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Report connectivity of the graph
    Connectivity,
    /// Re-validate a built route saved as JSON
    RealityCheck {
        #[arg(long)]
        route: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let dataset = Dataset::load(&cli.dataset)?;

    let snapshots = config.snapshot_dir.as_ref().map(SnapshotFileStore::new);
    let graph = match (&cli.graph_version, &snapshots) {
        (Some(version), Some(store)) => store.load(version)?,
        (Some(_), None) => return Err("--graph-version needs GRAPH_SNAPSHOT_DIR".into()),
        (None, Some(store)) => {
            let path = store.save(&dataset.graph)?;
            info!(path = %path.display(), "Saved graph snapshot");
            dataset.graph
        }
        (None, None) => dataset.graph,
    };

    let store = Arc::new(GraphStore::new());
    store.publish(graph);

    let router = OsrmClient::new(config.router.clone())?;
    let geometry = PathGeometryService::new(router, config.geometry.clone(), &config.router_cache);
    let cache = RouteCache::new(MokaCacheService::new(&config.route_cache), &config.route_cache);
    let pricing = PriceCalculator::new(config.pricing.clone());

    let planner = RoutePlanner::new(
        store,
        Arc::new(dataset.stops),
        Arc::new(dataset.schedules),
        geometry,
        cache,
    )
    .with_hubs(dataset.hubs)
    .with_validator(RouteValidator::new(config.validation.clone(), pricing.clone()))
    .with_pricing(pricing)
    .with_config(config.search.clone());

    match cli.command {
        Command::Build {
            from,
            to,
            date,
            booking_date,
            modes,
            max_transfers,
            baggage_kg,
            insurance,
        } => {
            let mut request = RouteRequest::new(CityId::parse(&from)?, CityId::parse(&to)?, date)
                .with_modes(&modes)
                .with_baggage(baggage_kg);
            request.booking_date = booking_date;
            request.preferences.max_transfers = max_transfers;
            if insurance {
                request = request.with_insurance();
            }
            print_json(&planner.build_response(&request).await)
        }
        Command::Autocomplete { query, limit } => print_json(&planner.autocomplete(&query, limit)?),
        Command::Connectivity => print_json(&planner.connectivity()?),
        Command::RealityCheck { route } => {
            let contents = std::fs::read_to_string(&route)?;
            let route: BuiltRoute = serde_json::from_str(&contents)?;
            let check = planner
                .reality_check(RealityCheckTarget::Route(Box::new(route)))
                .await?;
            print_json(&check)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
