use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use hotspot_common::{Transform, Viewport};
use hotspot_overlay::{Hotspot, HotspotOverlay, Presenter, ViewerConfig, ViewerContext};
use hotspot_render::{DebugTextRenderer, Renderer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hotspot-cli", about = "Headless tools for hotspot viewer configurations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ViewArgs {
    /// Viewer configuration (YAML). Built-in foot viewer defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Viewport width in pixels
    #[arg(long, default_value = "800")]
    width: f32,
    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    height: f32,
    /// Use an empty placeholder instead of loading the model
    #[arg(long)]
    no_model: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Check a configuration and the model it references
    Validate {
        /// Viewer configuration (YAML)
        config: PathBuf,
    },
    /// Print the screen position of every hotspot
    Project {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Resolve a click at a pixel position
    Pick {
        #[command(flatten)]
        view: ViewArgs,
        /// Pointer x in pixels
        x: f32,
        /// Pointer y in pixels
        y: f32,
    },
    /// Dump the scene graph with markers attached, plus how it was built
    Inspect {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Print the default configuration as YAML
    DefaultConfig,
}

/// Writes the selection to stdout.
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn show(&mut self, hotspot: &Hotspot) {
        println!("{}", hotspot.name);
        if !hotspot.info.is_empty() {
            println!("  {}", hotspot.info);
        }
        println!("  [See All {}]", hotspot.name);
    }

    fn hide(&mut self) {
        println!("(no hotspot)");
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

/// A viewer context with the model (or a placeholder) attached and the
/// markers initialized.
fn build_context(view: &ViewArgs) -> Result<ViewerContext> {
    let config = load_config(view.config.as_ref())?;
    let mut ctx = ViewerContext::from_config(&config, Viewport::new(view.width, view.height))?;
    let root = ctx.scene().root();
    let model = match (&config.model, view.no_model) {
        (Some(path), false) => hotspot_assets::load_gltf(path)
            .with_context(|| format!("failed to load model {}", path.display()))?
            .instantiate(ctx.scene_mut(), root, config.model_scale)?,
        _ => ctx
            .scene_mut()
            .add_group(root, "model", Transform::from_scale(config.model_scale))?,
    };
    ctx.attach_model(model)?;
    Ok(ctx)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("hotspot-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("scene: {}", hotspot_scene::crate_info());
            println!("render: {}", hotspot_render::crate_info());
            println!("input: {}", hotspot_input::crate_info());
            println!("assets: {}", hotspot_assets::crate_info());
            println!("overlay: {}", hotspot_overlay::crate_info());
        }
        Commands::Validate { config: path } => {
            let config = load_config(Some(&path))?;
            let overlay = HotspotOverlay::new(config.hotspots(), config.markers)?;
            println!("hotspots: {}", overlay.hotspots().len());
            for h in overlay.hotspots() {
                println!(
                    "  {} \"{}\" at ({:.2}, {:.2}, {:.2})",
                    h.id, h.name, h.position.x, h.position.y, h.position.z
                );
            }
            match &config.model {
                Some(model_path) => {
                    let model = hotspot_assets::load_gltf(model_path)
                        .with_context(|| format!("failed to load model {}", model_path.display()))?;
                    println!(
                        "model: {} id={} nodes={} triangles={}",
                        model_path.display(),
                        model.id,
                        model.nodes.len(),
                        model.triangle_count()
                    );
                }
                None => println!("model: none"),
            }
            println!("OK");
        }
        Commands::Project { view } => {
            let ctx = build_context(&view)?;
            let anchors = ctx
                .overlay()
                .screen_anchors(ctx.camera(), ctx.viewport())?;
            for anchor in anchors {
                let inside = ctx
                    .viewport()
                    .contains(anchor.position.x, anchor.position.y);
                println!(
                    "{:<20} x={:>8.1} y={:>8.1}{}",
                    anchor.id.as_str(),
                    anchor.position.x,
                    anchor.position.y,
                    if inside { "" } else { "  (off screen)" }
                );
            }
        }
        Commands::Pick { view, x, y } => {
            let mut ctx = build_context(&view)?;
            let selected = ctx.click(Vec2::new(x, y), &mut ConsolePresenter)?;
            tracing::debug!("pick at ({x}, {y}) -> {selected:?}");
        }
        Commands::Inspect { view } => {
            let ctx = build_context(&view)?;
            print!("{}", DebugTextRenderer::new().render(ctx.scene(), ctx.camera()));
            println!("events: {}", ctx.scene().events().len());
            for event in ctx.scene().events() {
                println!("  {event:?}");
            }
        }
        Commands::DefaultConfig => {
            print!("{}", ViewerConfig::default().to_yaml()?);
        }
    }

    Ok(())
}
