//! Golden routine vectors: seed memory and registers, call a ROM routine, and compare what it
//! wrote

use anyhow::{Context, anyhow};
use mos6502_interp::config::InterpreterConfig;
use mos6502_interp::rom::PrgRom;
use mos6502_interp::routines::{Routine, RoutineTable};
use mos6502_interp::{Machine, RoutineArgs};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Registers {
    a: Option<u8>,
    x: Option<u8>,
    y: Option<u8>,
    p: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
struct RoutineVector {
    name: String,
    /// Routine name from the table, or an entry address written as `$8182` or `0x8182`
    routine: String,
    #[serde(default)]
    registers: Registers,
    #[serde(default)]
    memory: Vec<(u16, u8)>,
    /// Expected bytes after the call; empty means memory must be unchanged
    #[serde(default)]
    expected: Vec<(u16, u8)>,
    #[serde(default)]
    expected_registers: Registers,
}

fn resolve_routine(table: &RoutineTable, routine: &str) -> anyhow::Result<Routine> {
    if let Some(routine) = table.get(routine) {
        return Ok(routine);
    }

    let hex = routine
        .strip_prefix('$')
        .or_else(|| routine.strip_prefix("0x"))
        .ok_or_else(|| anyhow!("Unknown routine '{routine}'"))?;
    let entry = u16::from_str_radix(hex, 16)
        .with_context(|| format!("Invalid routine address '{routine}'"))?;

    Ok(Routine {
        name: table.name_of(entry).map_or_else(|| routine.to_owned(), str::to_owned).into(),
        entry,
    })
}

/// Returns the number of failed vectors.
pub fn run(
    rom_path: &Path,
    vectors_path: &Path,
    config: InterpreterConfig,
) -> anyhow::Result<usize> {
    let rom = PrgRom::from_file(rom_path)
        .with_context(|| format!("Unable to load ROM '{}'", rom_path.display()))?;

    let file = File::open(vectors_path)
        .with_context(|| format!("Unable to open '{}'", vectors_path.display()))?;
    let vectors: Vec<RoutineVector> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Unable to parse '{}'", vectors_path.display()))?;

    let table = RoutineTable::super_mario_bros();
    let mut machine = Machine::with_rom(config, rom);

    let mut failures = 0;
    for vector in &vectors {
        let routine = resolve_routine(&table, &vector.routine)?;
        if !replay_vector(&mut machine, &routine, vector) {
            failures += 1;
            log::error!("Failed '{}' ({} at ${:04X})", vector.name, routine.name, routine.entry);
        }
    }

    log::info!("Passed {} out of {} routine vectors", vectors.len() - failures, vectors.len());

    Ok(failures)
}

fn replay_vector(machine: &mut Machine, routine: &Routine, vector: &RoutineVector) -> bool {
    machine.clear_memory();
    machine.reset_cpu();
    for &(address, value) in &vector.memory {
        machine[address] = value;
    }
    let before = vector.expected.is_empty().then(|| machine.memory().clone());

    let args = RoutineArgs {
        a: vector.registers.a,
        x: vector.registers.x,
        y: vector.registers.y,
        p: vector.registers.p,
    };
    if let Err(err) = machine.call_routine(routine, args) {
        log::debug!("'{}': {err}", vector.name);
        return false;
    }

    let mut passed = true;

    if let Some(before) = before {
        for (address, (&expected, &actual)) in
            before.as_slice().iter().zip(machine.memory().as_slice()).enumerate()
        {
            if expected != actual {
                passed = false;
                log::debug!("Unexpected write to {address:04X}: {expected:02X} -> {actual:02X}");
            }
        }
    }

    for &(address, expected) in &vector.expected {
        let actual = machine[address];
        if expected != actual {
            passed = false;
            log::debug!("RAM[{address:04X}]: expected={expected:02X}, actual={actual:02X}");
        }
    }

    let registers = machine.registers();
    let expected_registers = &vector.expected_registers;
    for (name, expected, actual) in [
        ("A", expected_registers.a, registers.accumulator),
        ("X", expected_registers.x, registers.x),
        ("Y", expected_registers.y, registers.y),
    ] {
        if let Some(expected) = expected
            && expected != actual
        {
            passed = false;
            log::debug!("{name}: expected={expected:02X}, actual={actual:02X}");
        }
    }

    passed
}
