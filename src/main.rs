use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use scene_bundler::config::ExportConfig;
use scene_bundler::scene_graph::Scene;
use scene_bundler::sync::{self, EntityData};

const CHANGES_FILE_NAME: &str = "changes.json";

/// Splits a scene into one bundle per mesh hierarchy and writes a metadata
/// file describing how to place them.
#[derive(Parser, Debug)]
#[command(name = "scene_bundler", version)]
struct Args {
    /// Directory the bundles and the metadata file are written to
    output_dir: PathBuf,

    /// Scene to export (.gltf or .glb)
    #[arg(long)]
    scene: PathBuf,

    /// JSON list of project entities to diff the export against
    #[arg(long)]
    entities: Option<PathBuf>,

    /// Project directory to copy the finished bundles into
    #[arg(long)]
    project: Option<PathBuf>,
}

fn main() -> Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let mut scene = Scene::load_gltf(&args.scene)?;
    let config = ExportConfig::default();

    let metadata = scene_bundler::pipeline::run(&mut scene, &args.output_dir, &config)
        .context("Export failed")?;

    if let Some(entities_path) = &args.entities {
        let contents = std::fs::read_to_string(entities_path)
            .with_context(|| format!("Failed to read {}", entities_path.display()))?;
        let entities: Vec<EntityData> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", entities_path.display()))?;

        let changes = sync::detect_changes(&metadata.objects, &entities);
        log::info!("Detected {} changes", changes.len());

        let changes_path = args.output_dir.join(CHANGES_FILE_NAME);
        std::fs::write(&changes_path, serde_json::to_string_pretty(&changes)?)
            .with_context(|| format!("Failed to write {}", changes_path.display()))?;
    }

    if let Some(project_dir) = &args.project {
        sync::copy_bundles_to_project(&args.output_dir, project_dir)?;
    }

    Ok(())
}
