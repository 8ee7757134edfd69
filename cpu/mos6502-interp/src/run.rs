//! Multi-instruction execution: calling a routine until it returns, or running until PC reaches
//! an address

#[cfg(test)]
mod tests;

use crate::bus::BusInterface;
use crate::opcodes::Operation;
use crate::{CpuError, Mos6502, StatusFlags, instructions};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Return address planted on the stack by [`Mos6502::call`]. The routine's final RTS lands here.
pub const RETURN_SENTINEL: u16 = 0x0000;

// Deadline and cancellation are only checked every this many instructions
const POLL_INTERVAL: u64 = 256;

/// Cooperative cancellation flag that can be shared with another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear a previous cancellation so the token can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunLimits {
    pub max_steps: Option<u64>,
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelToken>,
}

impl RunLimits {
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_steps(max_steps: u64) -> Self {
        Self { max_steps: Some(max_steps), ..Self::default() }
    }

    fn interrupted(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Register presets applied just before a routine starts. Registers left as `None` keep
/// whatever value they had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutineArgs {
    pub a: Option<u8>,
    pub x: Option<u8>,
    pub y: Option<u8>,
    pub p: Option<u8>,
}

impl RoutineArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn a(self, a: u8) -> Self {
        Self { a: Some(a), ..self }
    }

    #[must_use]
    pub fn x(self, x: u8) -> Self {
        Self { x: Some(x), ..self }
    }

    #[must_use]
    pub fn y(self, y: u8) -> Self {
        Self { y: Some(y), ..self }
    }

    #[must_use]
    pub fn p(self, p: u8) -> Self {
        Self { p: Some(p), ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallSummary {
    /// Instructions executed
    pub steps: u64,
    pub cycles: u64,
}

impl Mos6502 {
    /// Call the routine at `entry` as if it had been reached by JSR, and run until it returns.
    ///
    /// A return address pointing at [`RETURN_SENTINEL`] is pushed onto the stack first; the call
    /// completes when an RTS pops that frame. The two stack bytes the frame occupied are then
    /// restored, so a routine that writes nothing leaves memory unchanged.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Mos6502::step`], or [`CpuError::StepLimitExceeded`] /
    /// [`CpuError::Cancelled`] if a limit trips first. Memory is left as it was at the point of
    /// failure.
    pub fn call<B: BusInterface>(
        &mut self,
        bus: &mut B,
        entry: u16,
        args: RoutineArgs,
        limits: &RunLimits,
    ) -> Result<CallSummary, CpuError> {
        let frame_sp = self.registers.sp;
        let frame_addresses = [
            u16::from_be_bytes([0x01, frame_sp]),
            u16::from_be_bytes([0x01, frame_sp.wrapping_sub(1)]),
        ];
        let saved_frame = frame_addresses.map(|address| bus.read(address));

        let [return_lsb, return_msb] = RETURN_SENTINEL.wrapping_sub(1).to_le_bytes();
        instructions::push(self, bus, return_msb);
        instructions::push(self, bus, return_lsb);

        if let Some(a) = args.a {
            self.registers.accumulator = a;
        }
        if let Some(x) = args.x {
            self.registers.x = x;
        }
        if let Some(y) = args.y {
            self.registers.y = y;
        }
        if let Some(p) = args.p {
            self.registers.status = StatusFlags::from_byte(p);
        }
        self.registers.pc = entry;

        log::debug!(
            "Calling ${entry:04X} with A={:02X} X={:02X} Y={:02X} SP={frame_sp:02X}",
            self.registers.accumulator,
            self.registers.x,
            self.registers.y
        );

        let summary = self.run_while(bus, limits, |cpu, operation| {
            !(operation == Operation::Rts
                && cpu.registers.pc == RETURN_SENTINEL
                && cpu.registers.sp == frame_sp)
        })?;

        for (address, value) in frame_addresses.into_iter().zip(saved_frame) {
            bus.write(address, value);
        }

        log::debug!(
            "Returned from ${entry:04X} after {} instructions ({} cycles)",
            summary.steps,
            summary.cycles
        );

        Ok(summary)
    }

    /// Run from the current PC until PC equals `stop_pc`. Does nothing if PC already equals it.
    ///
    /// # Errors
    ///
    /// Same as [`Mos6502::call`].
    pub fn run_until<B: BusInterface>(
        &mut self,
        bus: &mut B,
        stop_pc: u16,
        limits: &RunLimits,
    ) -> Result<CallSummary, CpuError> {
        if self.registers.pc == stop_pc {
            return Ok(CallSummary::default());
        }

        self.run_while(bus, limits, |cpu, _| cpu.registers.pc != stop_pc)
    }

    fn run_while<B: BusInterface>(
        &mut self,
        bus: &mut B,
        limits: &RunLimits,
        mut keep_going: impl FnMut(&Self, Operation) -> bool,
    ) -> Result<CallSummary, CpuError> {
        let mut summary = CallSummary::default();

        loop {
            if let Some(limit) = limits.max_steps
                && summary.steps >= limit
            {
                return Err(CpuError::StepLimitExceeded { limit, pc: self.registers.pc });
            }

            if summary.steps.is_multiple_of(POLL_INTERVAL) && limits.interrupted() {
                log::debug!("Execution interrupted after {} instructions", summary.steps);
                return Err(CpuError::Cancelled { pc: self.registers.pc, steps: summary.steps });
            }

            let step = self.step(bus)?;
            summary.steps += 1;
            summary.cycles += u64::from(step.cycles);

            if !keep_going(self, step.operation) {
                return Ok(summary);
            }
        }
    }
}
