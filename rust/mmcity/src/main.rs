//! Command-line front end for the city builder.
//!
//! Usage:
//!   mmcity build scene.xml --out SHOP   # build a city into a SHOP tree
//!   mmcity inspect CITY/mycity.PTL      # dump a binary file

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use citybuilder::facade::FacadeScales;
use citybuilder::props::PropDimensions;
use citybuilder::{ProgressEventListener, Scene};
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mm::bms::Bms;
use mm::bnd::Bnd;
use mm::bng::Bng;
use mm::fcd::Fcd;
use mm::physics::PhysicsDb;
use mm::ptl::Ptl;

#[derive(Parser)]
#[command(name = "mmcity")]
#[command(about = "Build Midtown Madness city content from a scene description")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every city file from a scene into a SHOP tree
    Build {
        scene: PathBuf,
        /// Root of the SHOP tree to write
        #[arg(long, default_value = "SHOP")]
        out: PathBuf,
        /// Prop dimensions table, `name x y z` per line
        #[arg(long)]
        prop_dimensions: Option<PathBuf>,
        /// Facade scales table, `name: scale` per line
        #[arg(long)]
        facade_scales: Option<PathBuf>,
        /// PHYSICS.DB to apply the scene's material edits to
        #[arg(long)]
        physics_db: Option<PathBuf>,
        #[arg(long)]
        no_minimap: bool,
        /// Match portal edges end to end; turns off colinear merging
        #[arg(long)]
        strict_edges: bool,
    },
    /// Decode a BND, BMS, BNG, FCD, PTL or PHYSICS.DB file and print it
    Inspect { file: PathBuf },
}

struct ConsoleProgressListener {
    progress_bar: MultiProgress,
    progress_types: HashMap<String, ProgressBar>,
}

impl ConsoleProgressListener {
    fn new() -> Self {
        ConsoleProgressListener {
            progress_bar: MultiProgress::new(),
            progress_types: HashMap::new(),
        }
    }
}

impl ProgressEventListener for ConsoleProgressListener {
    fn progress(&mut self, current: u32, total: u32, status: String, finish_status: String) {
        if total == 0 {
            let _ = self.progress_bar.println(status);
            return;
        }
        let progress_bar = &self.progress_bar;
        let bar = self
            .progress_types
            .entry(finish_status.clone())
            .or_insert_with(|| {
                let pbar = progress_bar.add(ProgressBar::new(total as u64));
                if let Ok(sty) = ProgressStyle::with_template("{msg:30} {bar:40.cyan/blue} {pos:>7}/{len:7}") {
                    pbar.set_style(sty);
                }
                pbar
            });
        bar.set_length(total as u64);
        bar.set_position(current as u64);
        bar.set_message(status);
        if current == total {
            bar.finish_with_message(finish_status);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            scene,
            out,
            prop_dimensions,
            facade_scales,
            physics_db,
            no_minimap,
            strict_edges,
        } => build(
            &scene,
            &out,
            prop_dimensions.as_deref(),
            facade_scales.as_deref(),
            physics_db.as_deref(),
            no_minimap,
            strict_edges,
        ),
        Commands::Inspect { file } => inspect(&file),
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn build(
    scene_path: &Path,
    out: &Path,
    prop_dimensions: Option<&Path>,
    facade_scales: Option<&Path>,
    physics_db: Option<&Path>,
    no_minimap: bool,
    strict_edges: bool,
) -> Result<()> {
    let scene = Scene::parse(&read_text(scene_path)?)
        .with_context(|| format!("Failed to parse {}", scene_path.display()))?;
    let mut builder = scene.to_builder()?;

    if strict_edges {
        let mut config = scene.portal_config();
        config.strict_edges = true;
        config.merge_colinear = false;
        builder.set_portal_config(config)?;
    }
    if let Some(path) = prop_dimensions {
        builder.set_prop_dimensions(
            PropDimensions::parse(&read_text(path)?).with_context(|| path.display().to_string())?,
        );
    }
    if let Some(path) = facade_scales {
        builder.set_facade_scales(
            FacadeScales::parse(&read_text(path)?).with_context(|| path.display().to_string())?,
        );
    }
    if let Some(path) = physics_db {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        builder.set_physics_db(PhysicsDb::from_bytes(bytes)?);
    }
    builder.set_minimap(!no_minimap);

    let mut listener = ConsoleProgressListener::new();
    let output = builder.build(&mut listener)?;
    output
        .write_shop(out)
        .with_context(|| format!("Failed to write SHOP tree to {}", out.display()))?;

    let stats = output.stats;
    println!("City Report");
    println!("Cells: {}", stats.cells);
    println!("Polygons: {} ({} vertices)", stats.polygons, stats.vertices);
    println!("Boundary edges: {}", stats.edges);
    println!("Meshes: {}", stats.meshes);
    println!(
        "Portals: {} ({} cell pairs, {} edge pairs tested)",
        stats.portals, stats.cell_pairs, stats.edge_pairs
    );
    println!("Props: {}, facades: {}", stats.props, stats.facades);
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_uppercase())
        .unwrap_or_default();

    if file_name == "PHYSICS.DB" {
        println!("{:#?}", PhysicsDb::from_bytes(&bytes)?);
        return Ok(());
    }
    match extension.as_str() {
        "BND" => println!("{:#?}", Bnd::from_bytes(&bytes)?),
        "BMS" => println!("{:#?}", Bms::from_bytes(&bytes)?),
        "BNG" => println!("{:#?}", Bng::from_bytes(&bytes)?),
        "FCD" => println!("{:#?}", Fcd::from_bytes(&bytes)?),
        "PTL" => println!("{:#?}", Ptl::from_bytes(&bytes)?),
        other => bail!("Don't know how to decode '.{}' files", other.to_lowercase()),
    }
    Ok(())
}
