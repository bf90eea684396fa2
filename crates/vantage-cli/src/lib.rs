//! # Vantage CLI
//!
//! Headless driver for the Vantage LOD renderer.
//!
//! ## Commands
//! - `simulate` - Run the animated scene and report the detail levels chosen
//! - `describe` - Print the procedural scene and the effective configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use vantage_assets::primitives::tessellated_box;
use vantage_assets::{AssetError, Scene, SceneTextures, TextureHandle, Topology, extract_bounding_box};
use vantage_core::Stopwatch;
use vantage_renderer::{DetailLevel, RecordingBackend, Renderer, RendererConfig, RendererError, draw_calls};

/// Vantage LOD renderer CLI
#[derive(Parser)]
#[command(name = "vantage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Mesh topology of the procedural scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TopologyArg {
    List,
    IndexedList,
    Strips,
    IndexedStrips,
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::List => Topology::List,
            TopologyArg::IndexedList => Topology::IndexedList,
            TopologyArg::Strips => Topology::Strips,
            TopologyArg::IndexedStrips => Topology::IndexedStrips,
        }
    }
}

/// Procedural scene options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct SceneArgs {
    /// Renderer configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Mesh topology
    #[arg(short, long, value_enum, default_value = "indexed-list")]
    pub topology: TopologyArg,

    /// Quads per face edge of the high detail mesh
    #[arg(long, default_value = "16")]
    pub high_subdivisions: u32,

    /// Quads per face edge of the low detail mesh
    #[arg(long, default_value = "4")]
    pub low_subdivisions: u32,

    /// Half size of the box
    #[arg(long, default_value = "20")]
    pub half_extent: f32,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the animated scene headless
    Simulate {
        #[command(flatten)]
        scene: SceneArgs,

        /// Number of frames
        #[arg(short, long, default_value = "1250")]
        frames: u32,

        /// Coverage threshold, overriding the configuration
        #[arg(long)]
        threshold: Option<f32>,

        /// Hysteresis band, overriding the configuration
        #[arg(long)]
        hysteresis: Option<f32>,

        /// Viewport aspect ratio, overriding the configuration
        #[arg(long)]
        aspect: Option<f32>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe the procedural scene
    Describe {
        #[command(flatten)]
        scene: SceneArgs,
    },
}

/// Result of a headless run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub frames: u64,
    pub high_frames: u64,
    pub low_frames: u64,
    pub switches: u64,
    pub degenerate_frames: u64,
    pub draw_calls: u64,
    pub triangles: u64,
    /// Smallest covered area seen
    pub min_area: Option<f32>,
    /// Largest covered area seen
    pub max_area: Option<f32>,
    /// False when the reference mesh was invalid and LOD stayed off
    pub lod_enabled: bool,
    /// Mean wall-clock time between frames
    pub mean_frame_ms: f64,
}

/// Load and validate a renderer configuration, falling back to defaults
pub fn load_config(path: Option<&Path>) -> Result<RendererConfig> {
    let Some(path) = path else {
        return Ok(RendererConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: RendererConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    config.validate().with_context(|| format!("validating {}", path.display()))?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Handle of the procedural reflection map
pub const REFLECTION_TEXTURE: TextureHandle = TextureHandle(1);
/// Handle of the procedural normal map
pub const NORMAL_MAP_TEXTURE: TextureHandle = TextureHandle(2);

/// Two-node scene of tessellated boxes: node 0 high detail, node 1 low.
/// Both nodes share the reflection and normal map textures.
pub fn build_scene(args: &SceneArgs) -> Scene {
    let topology = Topology::from(args.topology);
    Scene::with_detail_pair(
        tessellated_box("box_high", args.half_extent, args.high_subdivisions, topology),
        tessellated_box("box_low", args.half_extent, args.low_subdivisions, topology),
    )
    .with_textures(SceneTextures {
        reflection: Some(REFLECTION_TEXTURE),
        normal_map: Some(NORMAL_MAP_TEXTURE),
    })
}

/// Run `frames` animated frames of `scene` against a recording backend
pub fn simulate(config: RendererConfig, scene: &Scene, frames: u32) -> Result<SimulationSummary> {
    let mut renderer = Renderer::new(config);
    let mut backend = RecordingBackend::new();

    match renderer.init_view(scene, &mut backend) {
        Ok(()) => {}
        Err(RendererError::Asset(err @ AssetError::InvalidMesh { .. })) if renderer.has_view() => {
            log::warn!("Continuing at high detail: {}", err);
        }
        Err(err) => return Err(err).context("initialising view"),
    }

    let mut summary = SimulationSummary {
        lod_enabled: renderer.lod_enabled(),
        ..SimulationSummary::default()
    };

    for _ in 0..frames {
        let report = renderer.render_frame(&mut backend)?;
        backend.take_commands();

        log::trace!("frame {}: {} area {:?}", report.frame, report.label(), report.area);

        summary.draw_calls += u64::from(report.draw_calls);
        summary.triangles += u64::from(report.triangles);
        if let Some(area) = report.area {
            summary.min_area = Some(summary.min_area.map_or(area, |m| m.min(area)));
            summary.max_area = Some(summary.max_area.map_or(area, |m| m.max(area)));
        }
    }

    let clock = renderer.clock();
    if clock.frame_count() > 0 {
        summary.mean_frame_ms = clock.total_time() * 1000.0 / clock.frame_count() as f64;
        log::debug!("Smoothed frame rate: {:.1} fps", clock.fps());
    }

    let stats = renderer.lod_stats();
    summary.frames = renderer.frame_number();
    summary.high_frames = stats.high_frames;
    summary.low_frames = stats.low_frames;
    summary.switches = stats.switches;
    summary.degenerate_frames = stats.degenerate_frames;

    renderer.release_view(&mut backend);
    Ok(summary)
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Simulate {
            scene,
            frames,
            threshold,
            hysteresis,
            aspect,
            json,
        } => {
            let mut config = load_config(scene.config.as_deref())?;
            if let Some(threshold) = threshold {
                config.lod.threshold = threshold;
            }
            if hysteresis.is_some() {
                config.lod.hysteresis = hysteresis;
            }
            if let Some(aspect) = aspect {
                config.aspect_ratio = aspect;
            }
            config.validate().context("applying command-line overrides")?;

            log::info!("Simulating {} frames...", frames);
            log::info!("  Topology: {:?}", scene.topology);
            log::info!("  Threshold: {}", config.lod.threshold);
            if let Some(band) = config.lod.hysteresis {
                log::info!("  Hysteresis: {}", band);
            }

            let mut watch = Stopwatch::new();
            let summary = simulate(config, &build_scene(&scene), frames)?;
            watch.stop();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                log::info!("Simulation complete in {:.3}s", watch.elapsed_secs());
                log::info!("  {}: {} frames", DetailLevel::High.label(), summary.high_frames);
                log::info!("  {}: {} frames", DetailLevel::Low.label(), summary.low_frames);
                log::info!("  Switches: {}", summary.switches);
                log::info!("  Degenerate frames: {}", summary.degenerate_frames);
                log::info!("  Draw calls: {}", summary.draw_calls);
                log::info!("  Triangles: {}", summary.triangles);
                log::info!("  Mean frame time: {:.4}ms", summary.mean_frame_ms);
                if let (Some(min), Some(max)) = (summary.min_area, summary.max_area) {
                    log::info!("  Coverage: {:.5} .. {:.5}", min, max);
                }
            }
        }

        Commands::Describe { scene: args } => {
            let config = load_config(args.config.as_deref())?;
            let scene = build_scene(&args);
            let topologies = scene.validate()?;

            for ((index, mesh), topology) in scene.meshes.iter().enumerate().zip(topologies) {
                log::info!("Mesh {} '{}':", index, mesh.name);
                log::info!("  Topology: {:?}", topology);
                log::info!("  Vertices: {}", mesh.vertex_count());
                log::info!("  Faces: {}", mesh.face_count);
                log::info!(
                    "  Draw calls: {}",
                    draw_calls(topology, mesh.face_count, mesh.strips()).len()
                );
            }
            for node in &scene.nodes {
                log::info!("Node '{}' -> mesh {}", node.name, node.mesh_index);
            }

            let reference = scene.reference_mesh()?;
            let bounds = extract_bounding_box(&reference.name, &reference.vertices)?;
            let aabb = bounds.aabb();
            log::info!("Reference bounds: {} .. {}", aabb.min, aabb.max);

            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
