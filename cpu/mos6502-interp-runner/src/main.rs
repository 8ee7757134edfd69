mod replay;
mod single_step;

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use mos6502_interp::config::{
    DecimalMode, InterpreterConfig, RamInitPattern, RomWritePolicy, UnofficialOpcodes,
};
use std::fs;
use std::path::PathBuf;

const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Subcommand)]
enum Command {
    /// Run per-opcode JSON single-step tests (00.json through ff.json)
    SingleStep {
        /// Directory containing JSON tests
        #[arg(long, short = 'd')]
        dir: PathBuf,
    },
    /// Replay golden routine vectors against an iNES ROM
    Replay {
        /// iNES file to map at $8000
        #[arg(long, short = 'r')]
        rom: PathBuf,
        /// JSON file containing the vectors
        #[arg(long, short = 'v')]
        vectors: PathBuf,
    },
}

#[derive(Debug, Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// TOML file with interpreter settings; command-line flags take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    decimal_mode: Option<DecimalMode>,
    #[arg(long, global = true)]
    unofficial_opcodes: Option<UnofficialOpcodes>,
    #[arg(long, global = true)]
    rom_writes: Option<RomWritePolicy>,
    #[arg(long, global = true)]
    ram_init: Option<RamInitPattern>,
    /// Maximum instructions per routine call
    #[arg(long, global = true)]
    step_limit: Option<u64>,
    /// Wall-clock budget per routine call in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

impl Args {
    fn interpreter_config(&self) -> anyhow::Result<InterpreterConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Unable to read config file '{}'", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Invalid config file '{}'", path.display()))?
            }
            None => InterpreterConfig::default(),
        };

        if let Some(decimal_mode) = self.decimal_mode {
            config.decimal_mode = decimal_mode;
        }
        if let Some(unofficial_opcodes) = self.unofficial_opcodes {
            config.unofficial_opcodes = unofficial_opcodes;
        }
        if let Some(rom_writes) = self.rom_writes {
            config.rom_writes = rom_writes;
        }
        if let Some(ram_init) = self.ram_init {
            config.ram_init = ram_init;
        }
        if self.step_limit.is_some() {
            config.step_limit = self.step_limit;
        }
        if self.timeout_ms.is_some() {
            config.timeout_ms = self.timeout_ms;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = args.interpreter_config()?;
    if matches!(args.command, Command::Replay { .. }) {
        config.timeout_ms = config.timeout_ms.or(Some(DEFAULT_TIMEOUT_MS));
    }

    log::info!("Running with config:{config}");

    let failures = match &args.command {
        Command::SingleStep { dir } => single_step::run(dir, &config)?,
        Command::Replay { rom, vectors } => replay::run(rom, vectors, config)?,
    };

    if failures != 0 {
        anyhow::bail!("{failures} test(s) failed");
    }

    log::info!("All tests passed");

    Ok(())
}
