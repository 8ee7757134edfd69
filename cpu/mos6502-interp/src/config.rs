use bincode::{Decode, Encode};
use mos6502_interp_proc_macros::{ConfigDisplay, EnumAll, EnumDisplay};

/// How ADC/SBC treat the D flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay, EnumAll)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DecimalMode {
    /// The D flag can be set and cleared but arithmetic is always binary, as on the NES's 2A03
    #[default]
    Ignored,
    /// BCD arithmetic with NMOS 6502 flag behavior
    Nmos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay, EnumAll)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum UnofficialOpcodes {
    /// Fail with an unknown opcode error
    #[default]
    Reject,
    /// Execute the stable undocumented NMOS opcodes
    Execute,
}

/// What happens to CPU stores into $8000-$FFFF while a PRG ROM is mapped there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay, EnumAll)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum RomWritePolicy {
    /// Silently drop the write, as NROM hardware does
    #[default]
    Ignore,
    /// Treat the ROM window as RAM
    WriteThrough,
    /// Drop the write and stop execution with an error
    Fault,
}

/// Contents of the 2 KiB internal RAM at power on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, EnumDisplay, EnumAll)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum RamInitPattern {
    #[default]
    Zeroed,
    /// Alternating runs of four $00 bytes and four $FF bytes, matching FCEUX
    Fceux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, ConfigDisplay)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InterpreterConfig {
    pub decimal_mode: DecimalMode,
    pub unofficial_opcodes: UnofficialOpcodes,
    pub rom_writes: RomWritePolicy,
    pub ram_init: RamInitPattern,
    /// Maximum number of instructions a single routine call may execute
    pub step_limit: Option<u64>,
    /// Wall-clock budget for a single routine call, in milliseconds
    pub timeout_ms: Option<u64>,
}
