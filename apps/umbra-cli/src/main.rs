use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use umbra_input::Action;
use umbra_kernel::{Scene, SceneConfig};
use umbra_render::{FrameDriver, RecordingDevice};

#[derive(Parser)]
#[command(name = "umbra-cli", about = "Headless tools for the umbra renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Run frames against the recording device and print the final state
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Hold the rotate-right key every frame
        #[arg(long)]
        rotate_right: bool,
        /// Hold the fog-up key every frame
        #[arg(long)]
        fog_up: bool,
        /// Hold the light-orbit key every frame
        #[arg(long)]
        orbit_light: bool,
    },
    /// Run one frame and print the device commands it issued
    Trace {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Frames are paced as if running at 60 Hz.
const FRAME_SECONDS: f32 = 1.0 / 60.0;
const VIEWPORT: (u32, u32) = (1920, 1080);

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => {
            SceneConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(SceneConfig::default()),
    }
}

fn setup(config: &SceneConfig) -> anyhow::Result<(FrameDriver, RecordingDevice, Scene)> {
    let scene = Scene::from_config(config).context("invalid camera configuration")?;
    let mut driver = FrameDriver::new(&config.shadow, VIEWPORT.0, VIEWPORT.1);
    let mut device = RecordingDevice::new();
    driver.initialize(&mut device)?;
    info!(
        width = config.shadow.width,
        height = config.shadow.height,
        depth_targets = device.depth_target_count(),
        "recording device ready"
    );
    device.take_commands();
    Ok((driver, device, scene))
}

/// Actions held on every simulated frame.
fn simulated_actions(
    config: &SceneConfig,
    rotate_right: bool,
    fog_up: bool,
    orbit_light: bool,
) -> Vec<Action> {
    let mut held = Vec::new();
    if rotate_right {
        held.push(Action::RotateScene(config.animation.scene_angle_step));
    }
    if fog_up {
        held.push(Action::AdjustFog(config.animation.fog_step));
    }
    if orbit_light {
        held.push(Action::OrbitLight(config.light.angle_step));
    }
    held
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("umbra-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", umbra_common::crate_info());
            println!("input: {}", umbra_input::crate_info());
            println!("kernel: {}", umbra_kernel::crate_info());
            println!("render: {}", umbra_render::crate_info());
        }
        Commands::Simulate {
            frames,
            rotate_right,
            fog_up,
            orbit_light,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let (mut driver, mut device, mut scene) = setup(&config)?;

            let held = simulated_actions(&config, rotate_right, fog_up, orbit_light);
            info!(frames, held = held.len(), "simulating");

            let mut shadow_draws = 0;
            let mut forward_draws = 0;
            let mut device_errors = 0;
            for i in 0..frames {
                let report =
                    driver.frame(&mut device, &mut scene, &held, i as f32 * FRAME_SECONDS)?;
                shadow_draws += report.shadow_draws;
                forward_draws += report.forward_draws;
                device_errors += report.device_errors;
                device.take_commands();
            }

            let anim = scene.animation();
            let camera = scene.camera();
            println!("Simulated {} frames", driver.frames_rendered());
            println!("camera: position={} front={}", camera.position(), camera.front());
            println!(
                "scene angle={:.2} bird={:.2} wind sway={:.4}",
                anim.scene_angle, anim.bird_rotation, anim.wind_sway
            );
            println!(
                "light angle={:.2} position={}",
                scene.light().angle(),
                scene.light().position()
            );
            println!("fog density={:.4}", anim.fog_density);
            println!("draws: shadow={shadow_draws} forward={forward_draws} errors={device_errors}");
        }
        Commands::Trace { json } => {
            let config = load_config(cli.config.as_ref())?;
            let (mut driver, mut device, mut scene) = setup(&config)?;
            let report = driver.frame(&mut device, &mut scene, &[], 0.0)?;
            info!(
                shadow_draws = report.shadow_draws,
                forward_draws = report.forward_draws,
                "traced one frame"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(device.commands())?);
            } else {
                print!("{}", device.describe());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_actions_follow_flags() {
        let config = SceneConfig::default();
        assert!(simulated_actions(&config, false, false, false).is_empty());

        let held = simulated_actions(&config, true, false, true);
        assert_eq!(
            held,
            vec![
                Action::RotateScene(config.animation.scene_angle_step),
                Action::OrbitLight(config.light.angle_step),
            ]
        );
    }

    #[test]
    fn setup_records_nothing_after_initialize() {
        let config = SceneConfig::default();
        let (driver, device, _scene) = setup(&config).unwrap();
        assert!(device.commands().is_empty());
        assert_eq!(device.depth_target_count(), 1);
        assert_eq!(driver.frames_rendered(), 0);
    }
}
