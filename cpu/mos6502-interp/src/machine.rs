//! A CPU paired with its own memory: the harness-facing entry point for calling ROM routines


use crate::config::InterpreterConfig;
use crate::memory::Memory;
use crate::rom::{PrgRom, RomLoadError};
use crate::routines::Routine;
use crate::{
    CallSummary, CancelToken, CpuError, CpuRegisters, Interrupt, Mos6502, RoutineArgs, RunLimits,
    StepInfo,
};
use bincode::config::{Fixint, LittleEndian};
use bincode::error::{DecodeError, EncodeError};
use std::io;
use std::io::{BufReader, BufWriter, Write};
use std::ops::{Index, IndexMut};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("error saving state: {source}")]
    Serialization {
        #[from]
        source: EncodeError,
    },
    #[error("error loading state: {source}")]
    Deserialization {
        #[from]
        source: DecodeError,
    },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("saved memory image is not 64 KiB")]
    InvalidMemoryLength,
}

const BINCODE_CONFIG: bincode::config::Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_little_endian().with_fixed_int_encoding();

/// One CPU and one 64 KiB memory. Machines share nothing, so separate tests can each own one
/// and run in parallel.
#[derive(Debug, Clone)]
pub struct Machine {
    cpu: Mos6502,
    memory: Memory,
    rom: Option<PrgRom>,
    config: InterpreterConfig,
    cancel: CancelToken,
}

impl Machine {
    #[must_use]
    pub fn new(config: InterpreterConfig) -> Self {
        let mut memory = Memory::new(config.rom_writes);
        memory.fill_power_on(config.ram_init);

        Self { cpu: Mos6502::new(&config), memory, rom: None, config, cancel: CancelToken::new() }
    }

    #[must_use]
    pub fn with_rom(config: InterpreterConfig, rom: PrgRom) -> Self {
        let mut machine = Self::new(config);
        machine.attach_rom(rom);
        machine
    }

    /// Map PRG ROM into $8000-$FFFF. It stays attached across [`Machine::clear_memory`].
    pub fn attach_rom(&mut self, rom: PrgRom) {
        self.memory.load_prg_rom(&rom);
        self.rom = Some(rom);
    }

    /// # Errors
    ///
    /// Propagates any error from [`PrgRom::from_file`]. The machine is unchanged on error.
    pub fn load_ines_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RomLoadError> {
        let rom = PrgRom::from_file(path)?;
        self.attach_rom(rom);
        Ok(())
    }

    #[must_use]
    pub fn rom(&self) -> Option<&PrgRom> {
        self.rom.as_ref()
    }

    /// Reset CPU registers. Memory is untouched.
    pub fn reset_cpu(&mut self) {
        self.cpu.reset();
    }

    /// Zero all 64 KiB, then map the attached ROM (if any) back in.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
        if let Some(rom) = &self.rom {
            self.memory.load_prg_rom(rom);
        }
    }

    /// Clear memory, apply the configured RAM power-on pattern, and reset the CPU through the
    /// RESET vector.
    pub fn power_on(&mut self) {
        self.clear_memory();
        self.memory.fill_power_on(self.config.ram_init);
        self.cpu.reset_from_vector(&mut self.memory);
    }

    #[must_use]
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn registers(&self) -> &CpuRegisters {
        self.cpu.registers()
    }

    pub fn set_registers(&mut self, registers: CpuRegisters) {
        self.cpu.set_registers(registers);
    }

    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Token that cancels any call in progress on this machine, from any thread. Cancellation
    /// sticks until [`CancelToken::reset`] is called.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn run_limits(&self) -> RunLimits {
        RunLimits {
            max_steps: self.config.step_limit,
            deadline: self
                .config
                .timeout_ms
                .map(|timeout_ms| Instant::now() + Duration::from_millis(timeout_ms)),
            cancel: Some(self.cancel.clone()),
        }
    }

    /// Call the routine at `entry` and run until it returns, subject to the configured step limit
    /// and timeout.
    ///
    /// # Errors
    ///
    /// See [`Mos6502::call`].
    pub fn call(&mut self, entry: u16, args: RoutineArgs) -> Result<CallSummary, CpuError> {
        let limits = self.run_limits();
        self.cpu.call(&mut self.memory, entry, args, &limits)
    }

    /// # Errors
    ///
    /// See [`Mos6502::call`].
    pub fn call_routine(
        &mut self,
        routine: &Routine,
        args: RoutineArgs,
    ) -> Result<CallSummary, CpuError> {
        log::debug!("Calling routine {} at ${:04X}", routine.name, routine.entry);
        self.call(routine.entry, args)
    }

    /// # Errors
    ///
    /// See [`Mos6502::run_until`].
    pub fn run_until(&mut self, stop_pc: u16) -> Result<CallSummary, CpuError> {
        let limits = self.run_limits();
        self.cpu.run_until(&mut self.memory, stop_pc, &limits)
    }

    /// # Errors
    ///
    /// See [`Mos6502::step`].
    pub fn step(&mut self) -> Result<StepInfo, CpuError> {
        self.cpu.step(&mut self.memory)
    }

    pub fn service_interrupt(&mut self, interrupt: Interrupt) -> bool {
        self.cpu.service_interrupt(&mut self.memory, interrupt)
    }

    /// Write CPU and memory state. The ROM image is not included.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save_state<W: io::Write>(&self, writer: W) -> Result<(), SnapshotError> {
        let mut writer = BufWriter::new(writer);

        bincode::encode_into_std_write(&self.cpu, &mut writer, BINCODE_CONFIG)?;
        bincode::encode_into_std_write(&self.memory, &mut writer, BINCODE_CONFIG)?;
        writer.flush()?;

        Ok(())
    }

    /// Restore state written by [`Machine::save_state`]. The attached ROM is kept, and the
    /// machine's own config replaces the policies stored in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the memory image has the wrong size. The machine
    /// is unchanged on error.
    pub fn load_state<R: io::Read>(&mut self, reader: R) -> Result<(), SnapshotError> {
        let mut reader = BufReader::new(reader);

        let mut cpu: Mos6502 = bincode::decode_from_std_read(&mut reader, BINCODE_CONFIG)?;
        let mut memory: Memory = bincode::decode_from_std_read(&mut reader, BINCODE_CONFIG)?;
        if !memory.has_valid_len() {
            return Err(SnapshotError::InvalidMemoryLength);
        }

        cpu.apply_config(&self.config);
        memory.set_rom_write_policy(self.config.rom_writes);

        self.cpu = cpu;
        self.memory = memory;

        Ok(())
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(InterpreterConfig::default())
    }
}

impl Index<u16> for Machine {
    type Output = u8;

    #[inline]
    fn index(&self, address: u16) -> &Self::Output {
        &self.memory[address]
    }
}

impl IndexMut<u16> for Machine {
    #[inline]
    fn index_mut(&mut self, address: u16) -> &mut Self::Output {
        &mut self.memory[address]
    }
}
