//! RISC-V debug core CLI.
//!
//! This binary runs a program image on the core and accepts debugger commands on stdin. It
//! performs:
//! 1. **Setup:** Reads the optional JSON configuration, builds the system and loads the image.
//! 2. **Execution:** Drives the step loop in batches while the core runs.
//! 3. **Console:** A reader thread forwards stdin lines through a channel; commands are
//!    executed between batches, or as soon as they arrive while the core is halted.
//! 4. **Reporting:** Prints UART output as it appears and the statistics on exit.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::{fs, process, thread};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rvdbg_core::Simulator;
use rvdbg_core::config::Config;
use rvdbg_core::debug::DsuMap;
use rvdbg_core::debug::console::parse_number;

/// Step-loop iterations between console polls while the core runs.
const BATCH_STEPS: u64 = 10_000;

#[derive(Parser, Debug)]
#[command(
    name = "rvdbg",
    author,
    version,
    about = "RISC-V functional core with a debug-port console",
    long_about = "Run a program image on a step-driven RISC-V core and control it with debugger commands on stdin.\n\nExamples:\n  rvdbg run program.elf\n  rvdbg run --halted --load-addr 0x80000000 program.bin\n  echo 'br add 0x80000010' | rvdbg run --halted program.elf"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load an image and run it under the console.
    Run(RunArgs),

    /// List the register names the console accepts.
    Regs,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// ELF or raw binary image.
    image: PathBuf,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Placement of a raw binary (hex with 0x, or decimal). Defaults to the RAM base.
    #[arg(long, value_parser = parse_addr)]
    load_addr: Option<u64>,

    /// Halt immediately after power-on.
    #[arg(long)]
    halted: bool,

    /// Stop after this many consumed instruction slots.
    #[arg(long)]
    max_steps: Option<u64>,

    /// Log every executed instruction.
    #[arg(long)]
    trace: bool,

    /// Write the final statistics as JSON to this file.
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

fn parse_addr(s: &str) -> Result<u64, String> {
    parse_number(s).map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Regs => {
            for name in DsuMap::names() {
                println!("{name}");
            }
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("[!] FATAL: could not read config '{}': {e}", path.display());
        process::exit(1);
    });
    Config::from_json(&text).unwrap_or_else(|e| {
        eprintln!("[!] FATAL: {e}");
        process::exit(1);
    })
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let _ = thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Runs one console line; returns `false` when the user asked to quit.
fn handle_line(sim: &mut Simulator, line: &str) -> bool {
    let line = line.trim();
    match line {
        "" => {}
        "quit" | "exit" | "q" => return false,
        _ => match sim.execute(line) {
            Ok(out) if out.is_empty() => {}
            Ok(out) => println!("{out}"),
            Err(e) => println!("error: {e}"),
        },
    }
    flush_uart(sim);
    true
}

fn flush_uart(sim: &mut Simulator) {
    let out = sim.take_uart_output();
    if !out.is_empty() {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(&out);
        let _ = stdout.flush();
    }
}

fn cmd_run(args: RunArgs) {
    let mut config = load_config(args.config.as_ref());
    config.general.trace_instructions |= args.trace;

    let mut sim = Simulator::new(&config);
    let entry = sim.load(&args.image, args.load_addr).unwrap_or_else(|e| {
        eprintln!("[!] FATAL: {e}");
        process::exit(1);
    });
    println!("[*] {} loaded, entry {entry:#x}", args.image.display());

    sim.power_on();
    if args.halted {
        if let Err(e) = sim.cpu.halt(Some("Halted at reset")) {
            eprintln!("[!] {e}");
        }
    }

    let commands = spawn_stdin_reader();
    let mut stdin_open = true;
    let max_steps = args.max_steps.unwrap_or(u64::MAX);

    'outer: loop {
        if sim.cpu.is_running() {
            let remaining = max_steps.saturating_sub(sim.cpu.stats().steps);
            if remaining == 0 {
                println!("[*] Step limit of {max_steps} reached");
                break;
            }
            let _ = sim.run_steps(remaining.min(BATCH_STEPS));
            flush_uart(&mut sim);

            while stdin_open {
                match commands.try_recv() {
                    Ok(line) => {
                        if !handle_line(&mut sim, &line) {
                            break 'outer;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => stdin_open = false,
                }
            }
        } else {
            if !stdin_open {
                break;
            }
            match commands.recv() {
                Ok(line) => {
                    if !handle_line(&mut sim, &line) {
                        break;
                    }
                }
                Err(_) => stdin_open = false,
            }
        }
    }

    flush_uart(&mut sim);
    sim.cpu.stats().print();

    if let Some(path) = args.stats_json {
        match serde_json::to_string_pretty(sim.cpu.stats()) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    eprintln!("[!] could not write '{}': {e}", path.display());
                }
            }
            Err(e) => eprintln!("[!] could not serialize statistics: {e}"),
        }
    }
}
