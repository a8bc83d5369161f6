mod frame_dump;
mod run_config;
mod serial_console;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};
use run_config::{EmulationMode, RunConfig};
use serial_console::ConsoleSerial;
use tickboy_core::display::FrameBufferDisplay;
use tickboy_core::{Cartridge, Config, GameBoy, Model, Sinks};

#[derive(Parser)]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Force DMG mode
    #[arg(long, conflicts_with = "cgb")]
    dmg: bool,

    /// Force CGB mode
    #[arg(long, conflicts_with = "dmg")]
    cgb: bool,

    /// Path to boot ROM file; overrides the config file
    #[arg(long)]
    bootrom: Option<PathBuf>,

    /// Start at 0x0100 even if a boot ROM is configured
    #[arg(long)]
    skip_boot: bool,

    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store the effective settings back to the config file
    #[arg(long)]
    save_config: bool,

    /// Number of frames to run
    #[arg(long)]
    frames: Option<u64>,

    /// Number of seconds to run
    #[arg(long)]
    seconds: Option<u64>,

    /// Write the last frame to this PNG file on exit
    #[arg(long)]
    dump_frame: Option<PathBuf>,

    /// Print bytes sent over the link cable
    #[arg(long)]
    serial: bool,
}

impl Args {
    fn emulation_mode(&self, cfg: &RunConfig) -> EmulationMode {
        if self.dmg {
            EmulationMode::ForceDmg
        } else if self.cgb {
            EmulationMode::ForceCgb
        } else {
            cfg.emulation_mode
        }
    }

    /// Command line values win over the config file.
    fn apply_to(&self, cfg: &mut RunConfig, model: Model) {
        cfg.emulation_mode = self.emulation_mode(cfg);
        if let Some(path) = &self.bootrom {
            match model {
                Model::Dmg => cfg.dmg_bootrom_path = Some(path.clone()),
                Model::Cgb => cfg.cgb_bootrom_path = Some(path.clone()),
            }
        }
        if self.frames.is_some() {
            cfg.frames = self.frames;
        }
        if self.dump_frame.is_some() {
            cfg.dump_frame_path = self.dump_frame.clone();
        }
    }
}

fn load_boot_rom(args: &Args, cfg: &RunConfig, model: Model) -> Option<Vec<u8>> {
    if args.skip_boot {
        return None;
    }
    let path = cfg.bootrom_path(model)?;
    match std::fs::read(path) {
        Ok(data) => Some(data),
        Err(e) => {
            warn!("Failed to load boot ROM {}: {e}", path.display());
            None
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(run_config::default_config_path);
    let mut cfg = run_config::load_from_file(&config_path);

    let rom = match std::fs::read(&args.rom) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to load ROM {}: {e}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };
    let model = args.emulation_mode(&cfg).model_for(&rom);
    args.apply_to(&mut cfg, model);
    if args.save_config {
        match run_config::save_to_file(&config_path, &cfg) {
            Ok(()) => info!("Saved settings to {}", config_path.display()),
            Err(e) => warn!("Failed to save config {}: {e}", config_path.display()),
        }
    }

    let mut cartridge = match Cartridge::from_bytes(rom) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load ROM {}: {e}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };
    let boot_rom = load_boot_rom(&args, &cfg, model);
    let skip_boot = boot_rom.is_none();
    if let Some(image) = boot_rom {
        cartridge = match cartridge.with_boot_rom(image, model) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to map boot ROM: {e}");
                return ExitCode::FAILURE;
            }
        };
    }

    let (display, frames) = FrameBufferDisplay::new();
    let (serial, serial_rx) = ConsoleSerial::new();
    let sinks = Sinks {
        display: Box::new(display),
        serial: Box::new(serial),
        ..Sinks::default()
    };
    let mut gb = GameBoy::new(Config { model, skip_boot }, cartridge, sinks);
    info!("Emulating {} in {model:?} mode", args.rom.display());

    let cancel = Arc::new(AtomicBool::new(false));
    let emulator = {
        let cancel = Arc::clone(&cancel);
        thread::spawn(move || gb.run(&cancel))
    };

    let second_limit = args.seconds.map(Duration::from_secs);
    let start = Instant::now();
    let mut last_frame = None;
    let mut frame_count = 0u64;
    while let Some(frame) = frames.recv() {
        last_frame = Some(frame);
        frame_count += 1;

        if args.serial {
            let bytes: Vec<u8> = serial_rx.try_iter().collect();
            if !bytes.is_empty() {
                print!("{}", serial_console::printable(&bytes));
            }
        }

        if cfg.frames.is_some_and(|max| frame_count >= max) {
            break;
        }
        if second_limit.is_some_and(|limit| start.elapsed() >= limit) {
            break;
        }
    }

    cancel.store(true, Ordering::Relaxed);
    // unblocks an emulator waiting for its frame to be picked up
    drop(frames);
    let mut status = ExitCode::SUCCESS;
    match emulator.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("Emulation stopped: {e}");
            status = ExitCode::FAILURE;
        }
        Err(_) => {
            error!("Emulator thread panicked");
            status = ExitCode::FAILURE;
        }
    }
    info!("Ran {frame_count} frames in {:.2?}", start.elapsed());

    if let (Some(path), Some(frame)) = (&cfg.dump_frame_path, &last_frame) {
        match frame_dump::write_png(path, frame) {
            Ok(()) => info!("Wrote {}", path.display()),
            Err(e) => {
                error!("Failed to write {}: {e}", path.display());
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}
