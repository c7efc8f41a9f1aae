use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use lumi_assets::{ModelData, ModelOptions};
use lumi_common::{OverlaySettings, SceneKind, Settings};
use lumi_input::KeyBindings;
use lumi_render::{
    Camera, DebugTextRenderer, FrameContext, ProgramId, Renderer, build_scene, scatter_instances,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumi-cli", about = "Headless tools for the LUMI renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Settings file (JSON); defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load a model and print its meshes and textures
    Inspect {
        /// Path to an OBJ file
        model: PathBuf,
        /// Store colour textures linear instead of sRGB
        #[arg(long)]
        no_gamma: bool,
    },
    /// Print the frame plan a scene submits
    Plan {
        /// Scene to plan: shadows, pbr or instancing
        #[arg(long)]
        scene: Option<SceneKind>,
        /// Seconds since start, for animated lights
        #[arg(long, default_value = "0")]
        time: f32,
        /// Enable every optional overlay
        #[arg(long)]
        all_overlays: bool,
        /// Print uniform values
        #[arg(long)]
        uniforms: bool,
    },
    /// Print prefab instance transforms
    Scatter {
        #[arg(short, long, default_value = "10")]
        amount: u32,
        #[arg(short, long, default_value = "15")]
        radius: f32,
        #[arg(short, long, default_value = "1")]
        seed: u64,
    },
    /// Print the built-in WGSL source of a program, e.g. to start an override
    Shader {
        /// Program name: lit, unlit, shadow_depth, depth_debug, skybox, pbr, instanced
        name: String,
    },
    /// Print the effective settings as JSON, or write them to a file
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default key bindings as JSON
    Bindings,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("lumi-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", lumi_common::crate_info());
            println!("assets: {}", lumi_assets::crate_info());
            println!("render: {}", lumi_render::crate_info());
            println!("render-wgpu: {}", lumi_render_wgpu::crate_info());
            println!("input: {}", lumi_input::crate_info());
            println!("scene: {} (assets {})", settings.scene, settings.assets_dir.display());
        }
        Commands::Inspect { model, no_gamma } => {
            let options = ModelOptions {
                gamma_correction: !no_gamma,
                ..ModelOptions::default()
            };
            let data = ModelData::load(&model, options)?;
            println!(
                "{}: {} meshes, {} vertices, {} indices",
                model.display(),
                data.meshes.len(),
                data.vertex_count(),
                data.index_count()
            );
            for mesh in &data.meshes {
                let textures: Vec<_> = mesh
                    .textures
                    .iter()
                    .map(|t| format!("{:?}#{}", t.kind, t.index))
                    .collect();
                println!(
                    "  mesh '{}': {} vertices, {} triangles, textures [{}]",
                    mesh.name,
                    mesh.vertices.len(),
                    mesh.triangle_count(),
                    textures.join(", ")
                );
            }
            for (i, texture) in data.textures_loaded.iter().enumerate() {
                println!(
                    "  texture #{i} {:?} {}x{} {}{}",
                    texture.kind,
                    texture.image.width,
                    texture.image.height,
                    texture.path.display(),
                    if texture.fallback { " (fallback)" } else { "" }
                );
            }
        }
        Commands::Plan {
            scene,
            time,
            all_overlays,
            uniforms,
        } => {
            let mut settings = settings;
            if let Some(scene) = scene {
                settings.scene = scene;
            }
            let overlays = if all_overlays {
                OverlaySettings {
                    skybox: true,
                    light_cube: true,
                    depth_debug: true,
                    animate_lights: true,
                    inspector: true,
                }
            } else {
                settings.overlays
            };

            let scene = build_scene(&settings);
            let manifest = scene.manifest();
            println!("scene '{}'", scene.kind());
            for (i, model) in manifest.models.iter().enumerate() {
                let optional = if model.optional { " (optional)" } else { "" };
                println!("  model#{i} {}{optional}", model.path.display());
            }
            for (i, prefab) in manifest.prefabs.iter().enumerate() {
                println!(
                    "  prefab#{i} {} x{}",
                    prefab.path.display(),
                    prefab.transforms.len()
                );
            }
            if let Some(skybox) = &manifest.skybox {
                println!("  skybox {}", skybox.display());
            }
            if let Some(resolution) = manifest.shadow_map_resolution {
                println!("  shadow map {resolution}x{resolution}");
            }

            let camera = Camera::from_settings(&settings.camera);
            let plan = scene.build_frame(&FrameContext {
                camera: &camera,
                aspect: settings.aspect_ratio(),
                time,
                overlays,
                clear_color: settings.window.clear_color,
            });
            let mut renderer = if uniforms {
                DebugTextRenderer::verbose()
            } else {
                DebugTextRenderer::new()
            };
            print!("{}", renderer.render(&plan));
        }
        Commands::Scatter {
            amount,
            radius,
            seed,
        } => {
            println!("scatter: amount={amount}, radius={radius}, seed={seed}");
            for (i, m) in scatter_instances(amount, radius, seed).iter().enumerate() {
                let (scale, rotation, translation) = m.to_scale_rotation_translation();
                let (axis, angle) = rotation.to_axis_angle();
                let yaw = if axis.y < 0.0 { -angle } else { angle };
                println!(
                    "  #{i:<4} pos=({:7.2}, {:7.2}, {:7.2}) scale={:.2} yaw={:6.1}",
                    translation.x,
                    translation.y,
                    translation.z,
                    scale.x,
                    yaw.to_degrees()
                );
            }
        }
        Commands::Shader { name } => {
            let program = ProgramId::ALL
                .into_iter()
                .find(|p| p.name() == name)
                .ok_or_else(|| anyhow!("unknown program '{name}'"))?;
            print!("{}", lumi_render_wgpu::shaders::builtin(program));
        }
        Commands::Config { output } => match output {
            Some(path) => {
                settings.save(&path)?;
                tracing::info!("settings written to {}", path.display());
            }
            None => println!("{}", serde_json::to_string_pretty(&settings)?),
        },
        Commands::Bindings => {
            println!("{}", serde_json::to_string_pretty(&KeyBindings::default())?);
        }
    }

    Ok(())
}
