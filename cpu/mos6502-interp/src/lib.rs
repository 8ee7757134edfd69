pub mod bus;
pub mod config;
pub mod disasm;
mod instructions;
pub mod machine;
pub mod memory;
mod num;
pub mod opcodes;
pub mod rom;
pub mod routines;
mod run;

pub use machine::{Machine, SnapshotError};
pub use run::{CallSummary, CancelToken, RETURN_SENTINEL, RoutineArgs, RunLimits};

use crate::bus::{BusInterface, RejectedWrite};
use crate::config::{DecimalMode, InterpreterConfig, UnofficialOpcodes};
use crate::num::GetBit;
use crate::opcodes::Operation;
use bincode::{Decode, Encode};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum StatusReadContext {
    HardwareInterruptHandler,
    Brk,
    PushStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct StatusFlags {
    negative: bool,
    overflow: bool,
    decimal: bool,
    interrupt_disable: bool,
    zero: bool,
    carry: bool,
}

impl StatusFlags {
    #[must_use]
    pub fn new() -> Self {
        // I flag defaults to 1, others default to 0
        Self {
            negative: false,
            overflow: false,
            decimal: false,
            interrupt_disable: true,
            zero: false,
            carry: false,
        }
    }

    pub fn set_negative(&mut self, negative: bool) -> &mut Self {
        self.negative = negative;
        self
    }

    pub fn set_overflow(&mut self, overflow: bool) -> &mut Self {
        self.overflow = overflow;
        self
    }

    pub fn set_decimal(&mut self, decimal: bool) -> &mut Self {
        self.decimal = decimal;
        self
    }

    pub fn set_interrupt_disable(&mut self, interrupt_disable: bool) -> &mut Self {
        self.interrupt_disable = interrupt_disable;
        self
    }

    pub fn set_zero(&mut self, zero: bool) -> &mut Self {
        self.zero = zero;
        self
    }

    pub fn set_carry(&mut self, carry: bool) -> &mut Self {
        self.carry = carry;
        self
    }

    #[must_use]
    pub fn negative(self) -> bool {
        self.negative
    }

    #[must_use]
    pub fn overflow(self) -> bool {
        self.overflow
    }

    #[must_use]
    pub fn decimal(self) -> bool {
        self.decimal
    }

    #[must_use]
    pub fn interrupt_disable(self) -> bool {
        self.interrupt_disable
    }

    #[must_use]
    pub fn zero(self) -> bool {
        self.zero
    }

    #[must_use]
    pub fn carry(self) -> bool {
        self.carry
    }

    #[must_use]
    pub fn to_byte(self, read_ctx: StatusReadContext) -> u8 {
        // B flag is set during BRK and PHP, cleared during NMI & IRQ handlers
        let b_flag = match read_ctx {
            StatusReadContext::Brk | StatusReadContext::PushStack => 0x10,
            StatusReadContext::HardwareInterruptHandler => 0x00,
        };

        // Bit 5 is unused, always reads as 1
        (u8::from(self.negative) << 7)
            | (u8::from(self.overflow) << 6)
            | 0x20
            | b_flag
            | (u8::from(self.decimal) << 3)
            | (u8::from(self.interrupt_disable) << 2)
            | (u8::from(self.zero) << 1)
            | u8::from(self.carry)
    }

    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self {
            negative: byte.bit(7),
            overflow: byte.bit(6),
            decimal: byte.bit(3),
            interrupt_disable: byte.bit(2),
            zero: byte.bit(1),
            carry: byte.bit(0),
        }
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub x: u8,
    pub y: u8,
    pub status: StatusFlags,
    pub pc: u16,
    pub sp: u8,
}

impl CpuRegisters {
    /// Register state immediately after a reset, with PC zeroed rather than loaded from a vector.
    #[must_use]
    pub fn new() -> Self {
        Self { accumulator: 0, x: 0, y: 0, status: StatusFlags::new(), pc: 0x0000, sp: 0xFD }
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("unknown opcode ${opcode:02X} at ${pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },
    #[error("CPU halted by JAM opcode ${opcode:02X} at ${pc:04X}")]
    Jammed { opcode: u8, pc: u16 },
    #[error("instruction at ${pc:04X} wrote ${value:02X} to ROM address ${address:04X}")]
    RomWrite { address: u16, value: u8, pc: u16 },
    #[error("step limit of {limit} instructions exceeded at ${pc:04X}")]
    StepLimitExceeded { limit: u64, pc: u16 },
    #[error("execution cancelled at ${pc:04X} after {steps} instructions")]
    Cancelled { pc: u16, steps: u64 },
}

impl CpuError {
    /// Address of the instruction that was executing (or about to execute) when the error occurred.
    #[must_use]
    pub fn pc(self) -> u16 {
        match self {
            Self::UnknownOpcode { pc, .. }
            | Self::Jammed { pc, .. }
            | Self::RomWrite { pc, .. }
            | Self::StepLimitExceeded { pc, .. }
            | Self::Cancelled { pc, .. } => pc,
        }
    }
}

/// What a single call to [`Mos6502::step`] executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub pc: u16,
    pub opcode: u8,
    pub operation: Operation,
    pub cycles: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Nmi,
    Irq,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Mos6502 {
    registers: CpuRegisters,
    decimal_mode: DecimalMode,
    unofficial_opcodes: UnofficialOpcodes,
    total_cycles: u64,
}

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

impl Mos6502 {
    #[must_use]
    pub fn new(config: &InterpreterConfig) -> Self {
        Self {
            registers: CpuRegisters::new(),
            decimal_mode: config.decimal_mode,
            unofficial_opcodes: config.unofficial_opcodes,
            total_cycles: 0,
        }
    }

    pub(crate) fn apply_config(&mut self, config: &InterpreterConfig) {
        self.decimal_mode = config.decimal_mode;
        self.unofficial_opcodes = config.unofficial_opcodes;
    }

    /// Put the CPU into its documented post-reset state:
    /// * A, X, and Y are 0
    /// * SP is $FD
    /// * I is set and every other flag is clear
    /// * PC is $0000; callers inject an entry point afterwards
    ///
    /// Does not touch memory.
    pub fn reset(&mut self) {
        self.registers = CpuRegisters::new();
        self.total_cycles = 0;
    }

    /// Reset, then load PC from the RESET vector at $FFFC.
    pub fn reset_from_vector<B: BusInterface>(&mut self, bus: &mut B) {
        self.reset();
        self.registers.pc = bus.read_word(RESET_VECTOR);
    }

    /// Execute one complete instruction.
    ///
    /// # Errors
    ///
    /// Returns an error if the opcode is unknown or a JAM, or if the instruction wrote to ROM
    /// under [`RomWritePolicy::Fault`](config::RomWritePolicy::Fault). Any memory writes the
    /// instruction made before failing are kept.
    pub fn step<B: BusInterface>(&mut self, bus: &mut B) -> Result<StepInfo, CpuError> {
        let pc = self.registers.pc;

        if log::log_enabled!(log::Level::Trace) {
            let (text, _) = disasm::disassemble(&*bus, pc);
            log::trace!("${pc:04X}  {text}");
            log::trace!(
                "  A={:02X} X={:02X} Y={:02X} P={:02X} SP={:02X}",
                self.registers.accumulator,
                self.registers.x,
                self.registers.y,
                self.registers.status.to_byte(StatusReadContext::HardwareInterruptHandler),
                self.registers.sp
            );
        }

        let step = instructions::execute(self, bus)?;
        self.total_cycles += u64::from(step.cycles);

        if let Some(RejectedWrite { address, value }) = bus.take_rejected_write() {
            return Err(CpuError::RomWrite { address, value, pc });
        }

        Ok(step)
    }

    /// Push PC and P and jump through the NMI or IRQ vector. Returns false without doing anything
    /// if an IRQ is requested while interrupts are disabled.
    pub fn service_interrupt<B: BusInterface>(&mut self, bus: &mut B, interrupt: Interrupt) -> bool {
        let vector = match interrupt {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Irq if self.registers.status.interrupt_disable => return false,
            Interrupt::Irq => IRQ_VECTOR,
        };

        log::debug!("Servicing {interrupt:?} from PC ${:04X}", self.registers.pc);

        let return_address = self.registers.pc;
        instructions::enter_interrupt(
            self,
            bus,
            return_address,
            vector,
            StatusReadContext::HardwareInterruptHandler,
        );
        self.total_cycles += 7;

        true
    }

    #[inline]
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    #[must_use]
    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn set_registers(&mut self, registers: CpuRegisters) {
        self.registers = registers;
    }

    /// Cycles executed since the last reset.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn decimal_mode(&self) -> DecimalMode {
        self.decimal_mode
    }

    #[must_use]
    pub fn unofficial_opcodes(&self) -> UnofficialOpcodes {
        self.unofficial_opcodes
    }
}
