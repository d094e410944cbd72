use clap::Parser;
use ferroboy_core::cartridge::Cartridge;
use ferroboy_core::diagnostics::{self, Level, LogSink};
use ferroboy_core::gameboy::GameBoy;
use ferroboy_core::serial::NullLinkPort;
use log::info;
use std::fmt;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "ferroboy", about = "Headless Game Boy (DMG) emulator")]
struct Args {
    /// Path to ROM file
    rom: Option<std::path::PathBuf>,

    /// Enable periodic logging of CPU state
    #[arg(long)]
    debug: bool,

    /// Number of CPU cycles to run before exiting
    #[arg(long)]
    cycles: Option<u64>,

    /// Number of seconds to run before exiting
    #[arg(long)]
    seconds: Option<u64>,

    /// Echo serial transfers back instead of reading a dead link
    #[arg(long)]
    serial_loopback: bool,
}

/// Forwards core diagnostics into the `log` crate so env_logger handles
/// filtering and output.
struct FrontendLogSink;

impl LogSink for FrontendLogSink {
    fn log(&self, level: Level, target: &'static str, args: fmt::Arguments) {
        let level = match level {
            Level::Trace => log::Level::Trace,
            Level::Info => log::Level::Info,
            Level::Warn => log::Level::Warn,
        };
        log::log!(target: target, level, "{args}");
    }
}

// Print one debug line roughly per emulated frame's worth of work.
const DEBUG_DUMP_STEPS: u64 = 20_000;

fn main() -> ExitCode {
    env_logger::init();
    let _ = diagnostics::try_set_log_sink(Box::new(FrontendLogSink));
    let args = Args::parse();

    let rom_path = match args.rom {
        Some(p) => p,
        None => {
            eprintln!("No ROM supplied");
            return ExitCode::FAILURE;
        }
    };

    let cart = match Cartridge::from_file(&rom_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load ROM {}: {e}", rom_path.display());
            return ExitCode::FAILURE;
        }
    };

    info!("starting \"{}\"", cart.title);

    let mut gb = GameBoy::new();
    gb.load_cart(cart);
    if args.serial_loopback {
        gb.mmu.serial.connect(Box::new(NullLinkPort::new(true)));
    }

    let second_limit = args.seconds.map(Duration::from_secs);
    let start = Instant::now();
    let mut stdout = io::stdout();
    let mut steps = 0u64;

    loop {
        gb.step();
        steps += 1;

        let serial = gb.take_serial();
        if !serial.is_empty() {
            let _ = stdout.write_all(&serial);
            let _ = stdout.flush();
        }

        if args.debug && steps % DEBUG_DUMP_STEPS == 0 {
            println!("{}", gb.cpu.debug_state());
        }

        if let Some(max) = args.cycles {
            if gb.cpu.cycles >= max {
                break;
            }
        }
        if let Some(limit) = second_limit {
            if start.elapsed() >= limit {
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
