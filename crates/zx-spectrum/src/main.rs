//! Headless ZX Spectrum 48K runner.
//!
//! Boots a ROM, runs a number of frames, optionally typing queued text,
//! and writes a PNG screenshot of the final frame. Useful for smoke
//! testing ROMs and generating reference images without a windowed host.

use std::path::PathBuf;
use std::process;

use zx_spectrum::{Spectrum, SpectrumKey, capture};

struct CliArgs {
    rom_path: Option<PathBuf>,
    frames: u32,
    screenshot_path: Option<PathBuf>,
    record_dir: Option<PathBuf>,
    key: Option<String>,
    key_at: u64,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        rom_path: None,
        frames: 200,
        screenshot_path: None,
        record_dir: None,
        key: None,
        key_at: 100,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rom" => {
                i += 1;
                cli.rom_path = args.get(i).map(PathBuf::from);
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--screenshot" => {
                i += 1;
                cli.screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--record" => {
                i += 1;
                cli.record_dir = args.get(i).map(PathBuf::from);
            }
            "--key" => {
                i += 1;
                cli.key = args.get(i).cloned();
            }
            "--key-at" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.key_at = s.parse().unwrap_or(100);
                }
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn print_usage() {
    eprintln!("Usage: zx-spectrum --rom 48.rom [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --rom <path>         16K ROM image (required)");
    eprintln!("  --frames <n>         frames to run (default 200)");
    eprintln!("  --screenshot <path>  write a PNG of the final frame");
    eprintln!("  --record <dir>       write every frame as a numbered PNG");
    eprintln!("  --key <name>         press a key during the run (e.g. L, Enter, Space)");
    eprintln!("  --key-at <frame>     frame at which the key goes down (default 100)");
}

/// Map a key name from the command line to a Spectrum key.
fn parse_key(name: &str) -> Option<SpectrumKey> {
    let key = match name.to_ascii_uppercase().as_str() {
        "A" => SpectrumKey::A,
        "B" => SpectrumKey::B,
        "C" => SpectrumKey::C,
        "D" => SpectrumKey::D,
        "E" => SpectrumKey::E,
        "F" => SpectrumKey::F,
        "G" => SpectrumKey::G,
        "H" => SpectrumKey::H,
        "I" => SpectrumKey::I,
        "J" => SpectrumKey::J,
        "K" => SpectrumKey::K,
        "L" => SpectrumKey::L,
        "M" => SpectrumKey::M,
        "N" => SpectrumKey::N,
        "O" => SpectrumKey::O,
        "P" => SpectrumKey::P,
        "Q" => SpectrumKey::Q,
        "R" => SpectrumKey::R,
        "S" => SpectrumKey::S,
        "T" => SpectrumKey::T,
        "U" => SpectrumKey::U,
        "V" => SpectrumKey::V,
        "W" => SpectrumKey::W,
        "X" => SpectrumKey::X,
        "Y" => SpectrumKey::Y,
        "Z" => SpectrumKey::Z,
        "0" => SpectrumKey::N0,
        "1" => SpectrumKey::N1,
        "2" => SpectrumKey::N2,
        "3" => SpectrumKey::N3,
        "4" => SpectrumKey::N4,
        "5" => SpectrumKey::N5,
        "6" => SpectrumKey::N6,
        "7" => SpectrumKey::N7,
        "8" => SpectrumKey::N8,
        "9" => SpectrumKey::N9,
        "ENTER" => SpectrumKey::Enter,
        "SPACE" => SpectrumKey::Space,
        "CAPS" => SpectrumKey::CapsShift,
        "SYM" => SpectrumKey::SymShift,
        _ => return None,
    };
    Some(key)
}

fn main() {
    let cli = parse_args();

    let Some(rom_path) = cli.rom_path else {
        eprintln!("A ROM image is required.");
        print_usage();
        process::exit(1);
    };

    let rom = match std::fs::read(&rom_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {e}", rom_path.display());
            process::exit(1);
        }
    };

    let mut spectrum = match Spectrum::new(&rom) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to create machine: {e}");
            process::exit(1);
        }
    };

    if let Some(name) = &cli.key {
        match parse_key(name) {
            Some(key) => {
                spectrum.key_script().hold(key, cli.key_at, 3);
            }
            None => {
                eprintln!("Unknown key name: {name}");
                process::exit(1);
            }
        }
    }

    if let Some(dir) = &cli.record_dir {
        if let Err(e) = capture::save_frame_sequence(&mut spectrum, dir, cli.frames) {
            eprintln!("Recording failed: {e}");
            process::exit(1);
        }
        eprintln!("Recorded {} frames to {}", cli.frames, dir.display());
    } else {
        for _ in 0..cli.frames {
            spectrum.run_frame();
        }
    }

    if let Some(path) = &cli.screenshot_path {
        if let Err(e) = capture::save_screenshot(&spectrum, path) {
            eprintln!("Screenshot failed: {e}");
            process::exit(1);
        }
        eprintln!("Saved screenshot to {}", path.display());
    }

    eprintln!(
        "Ran {} frames, border colour {}",
        spectrum.frame_count(),
        spectrum.bus().ula.border_colour()
    );
}
