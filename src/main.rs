//! EDC Landscape - design archetype point cloud viewer
//!
//! CLI commands:
//! - gui: Launch the native viewer
//! - list: List issues from the data manifest
//! - neighbors: Print the nearest neighbors of a point
//! - export: Write the normalized point cloud as JSON

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use edc_landscape::adapters::Issue;
use edc_landscape::detail::DetailDisplayModel;
use edc_landscape::store::LandscapeStore;
use edc_landscape::view::detail_view_model;
use edc_landscape::{gui, knn, logging};

#[derive(Parser)]
#[command(name = "edc_landscape")]
#[command(about = "2D landscape viewer for design archetype corpora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data base: an http(s) URL or a local directory containing json/
    #[arg(short, long, default_value = "data")]
    base: String,

    /// Issue (paper corpus) id; unknown values fall back to ec2025
    #[arg(short, long, default_value = "ec2025")]
    issue: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the native viewer
    Gui,

    /// List issues from the data manifest
    List,

    /// Print the k nearest neighbors of a point
    Neighbors {
        /// Point id, formatted as <filestem>::<tag_idx>
        #[arg(long)]
        point_id: String,

        #[arg(short, long, default_value = "5")]
        k: usize,

        #[arg(long, default_value = "abstract")]
        cluster_type: String,

        #[arg(long, default_value = "32")]
        version: u32,
    },

    /// Write the normalized point cloud as JSON
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "abstract")]
        cluster_type: String,

        #[arg(long, default_value = "32")]
        version: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging("logs")?;
    tracing::info!("EDC Landscape starting up");

    let cli = Cli::parse();
    let issue = Issue::resolve(&cli.issue);
    if issue.as_str() != cli.issue {
        tracing::warn!("unknown issue '{}', using '{}'", cli.issue, issue);
    }

    match cli.command {
        Commands::Gui => {
            tracing::info!("Launching native viewer");
            gui::run_viewer(cli.base, issue)?;
        }

        Commands::List => {
            let store = LandscapeStore::new(cli.base);
            list_issues(&store).await?;
        }

        Commands::Neighbors {
            point_id,
            k,
            cluster_type,
            version,
        } => {
            let store = LandscapeStore::new(cli.base);
            print_neighbors(&store, issue, &point_id, k, &cluster_type, version).await?;
        }

        Commands::Export {
            output,
            cluster_type,
            version,
        } => {
            let store = LandscapeStore::new(cli.base);
            export_points(&store, issue, &cluster_type, version, &output).await?;
        }
    }

    Ok(())
}

async fn list_issues(store: &LandscapeStore) -> anyhow::Result<()> {
    let config = store.issue_config().await?;
    let mut ids: Vec<&String> = config.issues.keys().collect();
    ids.sort();

    println!("Available issues:");
    for id in ids {
        let entry = &config.issues[id];
        let types: Vec<&str> = entry
            .type_options
            .iter()
            .map(|o| o.value.as_str())
            .collect();
        println!(
            "  {} [{}] types: {} clusters: {:?}",
            id,
            entry.adapter_kind,
            types.join(", "),
            entry.cluster_options
        );
    }
    Ok(())
}

async fn print_neighbors(
    store: &LandscapeStore,
    issue: Issue,
    point_id: &str,
    k: usize,
    cluster_type: &str,
    version: u32,
) -> anyhow::Result<()> {
    let points = store.point_cloud(issue, cluster_type, version).await?;
    let target = points
        .iter()
        .find(|p| p.point_id == point_id)
        .ok_or_else(|| anyhow::anyhow!("point not found: {point_id}"))?;

    let model = DetailDisplayModel::for_issue(issue);
    let detail = detail_view_model(target, model);
    println!("{} ({})", detail.title, detail.type_label);

    for neighbor in knn::k_nearest(&points, target, k) {
        let point = &points[neighbor.idx];
        let detail = detail_view_model(point, model);
        println!(
            "  {:.4}  {}  {}",
            neighbor.dist, point.point_id, detail.title
        );
    }
    Ok(())
}

async fn export_points(
    store: &LandscapeStore,
    issue: Issue,
    cluster_type: &str,
    version: u32,
    output: &PathBuf,
) -> anyhow::Result<()> {
    let points = store.fetch_data_points(issue, cluster_type, version).await?;
    let file = std::fs::File::create(output)?;
    serde_json::to_writer_pretty(file, &points)?;
    tracing::info!("Wrote {} points to {:?}", points.len(), output);
    println!("Wrote {} points to {}", points.len(), output.display());
    Ok(())
}
