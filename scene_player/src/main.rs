//! Headless scene player
//!
//! Loads a scene description, runs a fixed number of frames and logs what the
//! renderer would draw each frame.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use scene_runtime::foundation::{logging, time::FrameTimer};
use scene_runtime::prelude::*;

const DEFAULT_FRAMES: &str = "120";
const DEFAULT_DT: &str = "0.0166667";

#[derive(Debug)]
struct PlayerOptions {
    scene: PathBuf,
    config: Option<PathBuf>,
    frames: u32,
    dt: f32,
    camera: Option<String>,
    mode: Option<CameraMode>,
    paused: bool,
}

fn parse_args() -> Result<PlayerOptions> {
    let matches = Command::new("scene_player")
        .about("Loads an s72 scene and steps its animation, camera and culling without a window")
        .arg(
            Arg::new("scene")
                .value_name("SCENE")
                .help("Path to the .s72 scene file")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Runtime configuration (.toml or .ron)"),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames to run")
                .default_value(DEFAULT_FRAMES),
        )
        .arg(
            Arg::new("dt")
                .long("dt")
                .value_name("SECONDS")
                .help("Time step per frame")
                .default_value(DEFAULT_DT),
        )
        .arg(
            Arg::new("camera")
                .long("camera")
                .value_name("NAME")
                .help("Scene camera to view through"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .help("Camera mode")
                .value_parser(["scene", "user", "debug"]),
        )
        .arg(
            Arg::new("paused")
                .long("paused")
                .help("Start with the animation paused")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let frames = matches
        .get_one::<String>("frames")
        .map_or(DEFAULT_FRAMES, String::as_str)
        .parse::<u32>()
        .context("--frames must be a non-negative integer")?;
    let dt = matches
        .get_one::<String>("dt")
        .map_or(DEFAULT_DT, String::as_str)
        .parse::<f32>()
        .context("--dt must be a number of seconds")?;
    let mode = matches.get_one::<String>("mode").map(|mode| match mode.as_str() {
        "user" => CameraMode::User,
        "debug" => CameraMode::Debug,
        _ => CameraMode::Scene,
    });

    Ok(PlayerOptions {
        scene: matches
            .get_one::<String>("scene")
            .map(PathBuf::from)
            .context("a scene path is required")?,
        config: matches.get_one::<String>("config").map(PathBuf::from),
        frames,
        dt,
        camera: matches.get_one::<String>("camera").cloned(),
        mode,
        paused: matches.get_flag("paused"),
    })
}

fn runtime_config(options: &PlayerOptions) -> Result<RuntimeConfig> {
    let mut config = match &options.config {
        Some(path) => RuntimeConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if let Some(mode) = options.mode {
        config = config.with_camera_mode(mode);
    }
    if let Some(camera) = &options.camera {
        config = config.with_initial_camera(camera.clone());
    }
    if options.paused {
        config = config.with_start_playing(false);
    }
    Ok(config)
}

fn main() -> Result<()> {
    logging::init();

    let options = parse_args()?;
    log::debug!("Options: {options:?}");
    let config = runtime_config(&options)?;

    log::info!("Loading scene {}", options.scene.display());
    let mut scene = SceneContext::from_file(&options.scene, config)
        .with_context(|| format!("failed to load scene {}", options.scene.display()))?;

    let cameras: Vec<&str> = scene.scene_camera_names().collect();
    log::info!("Scene cameras: {cameras:?}");
    log::info!(
        "Animation: {:.3}s loop, {} drivers",
        scene.clock().duration(),
        scene.document().drivers.len()
    );

    let mut timer = FrameTimer::new();
    let mut total_visible = 0usize;
    let mut total_culled = 0usize;

    for index in 0..options.frames {
        timer.begin();
        let frame = scene.update(options.dt);
        timer.end();

        total_visible += frame.instances.len();
        total_culled += frame.culled;
        log::info!(
            "frame {index:>4} t={:>7.3}s camera='{}' visible={} culled={}",
            frame.time,
            frame.camera,
            frame.instances.len(),
            frame.culled
        );
    }

    log::info!(
        "Ran {} frames: {total_visible} instances drawn, {total_culled} culled, {:.3}ms average update, {:.3}ms slowest",
        timer.frame_count(),
        timer.average_millis(),
        timer.slowest_millis()
    );
    Ok(())
}
