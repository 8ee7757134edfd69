//! Per-opcode single-step tests in the `{name, initial, final, cycles}` JSON format

use anyhow::Context;
use mos6502_interp::config::InterpreterConfig;
use mos6502_interp::memory::Memory;
use mos6502_interp::{disasm, opcodes};
use mos6502_interp::{CpuError, CpuRegisters, Mos6502, StatusFlags, StatusReadContext};
use serde::Deserialize;
use serde::de::IgnoredAny;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
struct SystemState {
    pc: u16,
    s: u8,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    ram: Vec<(u16, u8)>,
}

#[derive(Debug, Clone, Deserialize)]
struct TestDescription {
    name: String,
    initial: SystemState,
    #[serde(rename = "final")]
    final_: SystemState,
    // Only the number of bus cycles is compared
    cycles: Vec<IgnoredAny>,
}

/// Returns the number of failed tests.
pub fn run(dir: &Path, config: &InterpreterConfig) -> anyhow::Result<usize> {
    let mut memory = Memory::new(config.rom_writes);
    let mut total_failures = 0;

    for opcode in 0x00..=0xFF_u8 {
        let file_path = dir.join(format!("{opcode:02x}.json"));
        if !file_path.exists() {
            log::debug!("No tests for opcode {opcode:02X}");
            continue;
        }

        let file = File::open(&file_path)
            .with_context(|| format!("Unable to open '{}'", file_path.display()))?;
        let tests: Vec<TestDescription> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Unable to parse '{}'", file_path.display()))?;

        let mut failures = 0;
        let mut skipped = 0;
        let test_count = tests.len();
        for test in tests {
            for &(address, value) in &test.initial.ram {
                memory[address] = value;
            }

            let mut cpu = Mos6502::new(config);
            cpu.set_registers(CpuRegisters {
                accumulator: test.initial.a,
                x: test.initial.x,
                y: test.initial.y,
                status: StatusFlags::from_byte(test.initial.p),
                pc: test.initial.pc,
                sp: test.initial.s,
            });

            let (instruction, _) = disasm::disassemble(&memory, test.initial.pc);
            match cpu.step(&mut memory) {
                Ok(step) => {
                    if check_state(&cpu, &memory, &test.final_, &test.cycles, step.cycles) {
                        failures += 1;
                        log::debug!("Above failures in '{}' ({instruction})", test.name);
                    }
                }
                Err(CpuError::Jammed { .. } | CpuError::UnknownOpcode { .. }) => {
                    // Don't bother testing JAM or rejected opcodes
                    skipped += 1;
                }
                Err(err) => {
                    failures += 1;
                    log::debug!("'{}' failed: {err}", test.name);
                }
            }

            for &(address, _) in test.initial.ram.iter().chain(&test.final_.ram) {
                memory[address] = 0;
            }
        }

        if failures != 0 {
            log::error!("Failed {failures} out of {test_count} tests for opcode {opcode:02X}");
        } else if skipped == test_count {
            log::debug!(
                "Skipped opcode {opcode:02X} ({})",
                opcodes::decode(opcode).operation.mnemonic()
            );
        }

        total_failures += failures;
    }

    Ok(total_failures)
}

fn check_state(
    cpu: &Mos6502,
    memory: &Memory,
    final_state: &SystemState,
    cycles: &[IgnoredAny],
    actual_cycles: u8,
) -> bool {
    let mut errors = false;

    for &(address, expected_value) in &final_state.ram {
        let actual_value = memory[address];
        if expected_value != actual_value {
            errors = true;
            log::debug!(
                "RAM[{address:04X}]: expected={expected_value:02X}, actual={actual_value:02X}"
            );
        }
    }

    let registers = cpu.registers();
    errors |= check_register("A", final_state.a, registers.accumulator);
    errors |= check_register("X", final_state.x, registers.x);
    errors |= check_register("Y", final_state.y, registers.y);
    errors |= check_register("S", final_state.s, registers.sp);
    errors |= check_register(
        "P",
        final_state.p | 0x10,
        registers.status.to_byte(StatusReadContext::Brk) | 0x10,
    );

    if final_state.pc != registers.pc {
        log::debug!("PC: expected={:04X} actual={:04X}", final_state.pc, registers.pc);
        errors = true;
    }

    if cycles.len() != usize::from(actual_cycles) {
        log::debug!(
            "Cycle count does not match: expected={}, actual={actual_cycles}",
            cycles.len()
        );
        errors = true;
    }

    errors
}

fn check_register(name: &str, expected: u8, actual: u8) -> bool {
    if expected != actual {
        log::debug!("{name}: expected={expected:02X}, actual={actual:02X}");
        true
    } else {
        false
    }
}
