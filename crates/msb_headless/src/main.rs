mod replay;

use std::path::{Path, PathBuf};

use msb_bridge::memory_scene::load_level_from_path;
use msb_bridge::poller::InputPoller;
use msb_bridge::step::PartPose;
use msb_bridge::texture::save_texture_png;
use msb_bridge::{CharacterSession, TickOutcome};
use msb_core::config::{load_config_from_path, BridgeConfig};
use msb_core::transform::Transform;
use msb_native::{default_library_file_name, Sm64Library};
use serde::Serialize;

use crate::replay::{load_replay_from_path, ReplayGamepad};

const DEFAULT_FRAMES: u32 = 90;

fn usage() -> String {
    "Usage: cargo run -p msb_headless -- --level <level.json> --rom <rom.z64> [--library <path>] [--config <config.json>] [--replay <replay.json>] [--frames N] [--texture-out <atlas.png>]\nExample: cargo run -p msb_headless -- --level assets/levels/floor.json --rom baserom.us.z64 --frames 60".to_string()
}

#[derive(Debug, Clone, PartialEq)]
struct HeadlessArgs {
    level: PathBuf,
    rom: PathBuf,
    library: Option<PathBuf>,
    config: Option<PathBuf>,
    replay: Option<PathBuf>,
    frames: Option<u32>,
    texture_out: Option<PathBuf>,
}

impl HeadlessArgs {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut level = None;
        let mut rom = None;
        let mut library = None;
        let mut config = None;
        let mut replay = None;
        let mut frames = None;
        let mut texture_out = None;

        let mut iter = args.iter();
        while let Some(flag) = iter.next() {
            let mut value = || {
                iter.next()
                    .cloned()
                    .ok_or_else(|| format!("Missing value for {flag}\n{}", usage()))
            };
            match flag.as_str() {
                "--level" => level = Some(PathBuf::from(value()?)),
                "--rom" => rom = Some(PathBuf::from(value()?)),
                "--library" => library = Some(PathBuf::from(value()?)),
                "--config" => config = Some(PathBuf::from(value()?)),
                "--replay" => replay = Some(PathBuf::from(value()?)),
                "--texture-out" => texture_out = Some(PathBuf::from(value()?)),
                "--frames" => {
                    let raw = value()?;
                    let parsed = raw
                        .parse::<u32>()
                        .map_err(|_| format!("Invalid --frames value '{raw}'"))?;
                    frames = Some(parsed);
                }
                "-h" | "--help" => return Err(usage()),
                other => return Err(format!("Unknown argument '{other}'\n{}", usage())),
            }
        }

        Ok(Self {
            level: level.ok_or_else(usage)?,
            rom: rom.ok_or_else(usage)?,
            library,
            config,
            replay,
            frames,
            texture_out,
        })
    }
}

#[derive(Debug, Serialize)]
struct HeadlessReport {
    character: String,
    state: String,
    frames_run: u32,
    spawn_point: Option<[f32; 3]>,
    root: Option<Transform>,
    parts: Vec<PartPose>,
    velocity: Option<[f32; 3]>,
    health: Option<i16>,
    collision_triangles: usize,
    dropped_triangles: usize,
    long_frames: u64,
}

impl HeadlessReport {
    fn from_session(session: &CharacterSession, frames_run: u32) -> Self {
        let pose = session.last_pose();
        Self {
            character: session.config().character_name.clone(),
            state: format!("{:?}", session.state()),
            frames_run,
            spawn_point: session.spawn_point().map(|p| p.to_array()),
            root: pose.map(|p| p.root),
            parts: pose.map(|p| p.parts.clone()).unwrap_or_default(),
            velocity: pose.map(|p| p.velocity.to_array()),
            health: pose.map(|p| p.health),
            collision_triangles: session.collision().map_or(0, |c| c.len()),
            dropped_triangles: session.collision().map_or(0, |c| c.dropped()),
            long_frames: session.stats().long_frames,
        }
    }
}

fn resolve_library_path(explicit: Option<&Path>, config: &BridgeConfig) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = &config.library_path {
        return path.clone();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(default_library_file_name())))
        .unwrap_or_else(|| PathBuf::from(default_library_file_name()))
}

fn run(args: &HeadlessArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => BridgeConfig::default(),
    };
    let mut scene = load_level_from_path(&args.level)?;
    let replay = args
        .replay
        .as_deref()
        .map(load_replay_from_path)
        .transpose()?;

    let library_path = resolve_library_path(args.library.as_deref(), &config);
    let library = Sm64Library::load(&library_path).map_err(|e| e.to_string())?;

    let poller = match &replay {
        Some(replay) => InputPoller::new(Some(Box::new(ReplayGamepad::new(replay)))),
        None => InputPoller::detect(),
    };
    let dt = replay
        .as_ref()
        .map_or(1.0 / config.tick_rate as f64, |r| r.frame_dt);
    let frames = args
        .frames
        .or_else(|| replay.as_ref().map(|r| r.expanded_inputs().len() as u32))
        .unwrap_or(DEFAULT_FRAMES);

    let mut session = CharacterSession::new(config, Box::new(library), poller);
    session
        .insert(&mut scene, &args.rom)
        .map_err(|e| format!("Insert failed: {e}"))?;

    if let (Some(out), Some(texture)) = (&args.texture_out, session.texture()) {
        save_texture_png(texture, out).map_err(|e| e.to_string())?;
    }

    let mut frames_run = 0;
    for _ in 0..frames {
        match session
            .tick(&mut scene, dt)
            .map_err(|e| format!("Frame {frames_run} failed: {e}"))?
        {
            TickOutcome::Stepped(_) => frames_run += 1,
            TickOutcome::Idle | TickOutcome::Removed => break,
        }
    }
    log::info!("Ran {frames_run} frames");

    let report = HeadlessReport::from_session(&session, frames_run);
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to serialize report: {e}"))?;
    println!("{json}");

    session.teardown(&mut scene);
    Ok(())
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = HeadlessArgs::parse(&args)?;
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_required_and_optional_flags() {
        let args = HeadlessArgs::parse(&strings(&[
            "--level",
            "floor.json",
            "--rom",
            "rom.z64",
            "--frames",
            "12",
            "--texture-out",
            "atlas.png",
        ]))
        .expect("valid args");
        assert_eq!(args.level, PathBuf::from("floor.json"));
        assert_eq!(args.rom, PathBuf::from("rom.z64"));
        assert_eq!(args.frames, Some(12));
        assert_eq!(args.texture_out, Some(PathBuf::from("atlas.png")));
        assert!(args.library.is_none());
    }

    #[test]
    fn missing_rom_prints_usage() {
        let err = HeadlessArgs::parse(&strings(&["--level", "floor.json"])).expect_err("no rom");
        assert!(err.starts_with("Usage:"));
    }

    #[test]
    fn flag_without_value_is_rejected() {
        let err = HeadlessArgs::parse(&strings(&["--level"])).expect_err("dangling flag");
        assert!(err.contains("Missing value for --level"));
    }

    #[test]
    fn bad_frame_count_is_rejected() {
        let err = HeadlessArgs::parse(&strings(&[
            "--level", "l.json", "--rom", "r.z64", "--frames", "many",
        ]))
        .expect_err("frames must be numeric");
        assert!(err.contains("many"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = HeadlessArgs::parse(&strings(&["--fast"])).expect_err("unknown flag");
        assert!(err.contains("--fast"));
    }

    #[test]
    fn explicit_library_path_wins() {
        let config = BridgeConfig {
            library_path: Some(PathBuf::from("/opt/lib/libsm64.so")),
            ..BridgeConfig::default()
        };
        assert_eq!(
            resolve_library_path(Some(Path::new("custom.so")), &config),
            PathBuf::from("custom.so")
        );
        assert_eq!(
            resolve_library_path(None, &config),
            PathBuf::from("/opt/lib/libsm64.so")
        );
        let fallback = resolve_library_path(None, &BridgeConfig::default());
        assert!(fallback.ends_with(default_library_file_name()));
    }
}
