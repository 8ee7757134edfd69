use super::*;
use crate::config::{InterpreterConfig, RomWritePolicy, UnofficialOpcodes};
use crate::memory::Memory;
use crate::rom::PrgRom;
use std::thread;
use std::time::Duration;
use test_log::test;

fn new_cpu() -> Mos6502 {
    Mos6502::new(&InterpreterConfig::default())
}

fn call(cpu: &mut Mos6502, memory: &mut Memory, entry: u16) -> Result<CallSummary, CpuError> {
    cpu.call(memory, entry, RoutineArgs::new(), &RunLimits::unlimited())
}

fn memory_with(programs: &[(u16, &[u8])]) -> Memory {
    let mut memory = Memory::default();
    for &(start, program) in programs {
        memory.load_program(start, program);
    }
    memory
}

#[test]
fn call_returns_and_restores_stack_frame() {
    // LDA #$42; RTS
    let mut memory = memory_with(&[(0x8000, &[0xA9, 0x42, 0x60])]);
    memory[0x01FD] = 0xAA;
    memory[0x01FC] = 0xBB;
    let before = memory.clone();

    let mut cpu = new_cpu();
    let summary = call(&mut cpu, &mut memory, 0x8000).unwrap();

    assert_eq!(summary, CallSummary { steps: 2, cycles: 8 });
    assert_eq!(cpu.registers.accumulator, 0x42);
    assert_eq!(cpu.registers.sp, 0xFD);
    assert_eq!(cpu.registers.pc, RETURN_SENTINEL);
    assert_eq!(memory, before);
}

#[test]
fn presets_are_applied() {
    // STA $10; STX $11; STY $12; PHP; PLA; STA $13; RTS
    let program = [0x85, 0x10, 0x86, 0x11, 0x84, 0x12, 0x08, 0x68, 0x85, 0x13, 0x60];
    let mut memory = memory_with(&[(0x8000, &program)]);

    let mut cpu = new_cpu();
    let args = RoutineArgs::new().a(0x01).x(0x02).y(0x03).p(0xC3);
    cpu.call(&mut memory, 0x8000, args, &RunLimits::unlimited()).unwrap();

    assert_eq!(memory.dump(0x0010..=0x0013), &[0x01, 0x02, 0x03, 0xF3]);
}

#[test]
fn unset_presets_keep_register_values() {
    // RTS
    let mut memory = memory_with(&[(0x8000, &[0x60])]);

    let mut cpu = new_cpu();
    cpu.registers.x = 0x77;
    cpu.registers.status.set_carry(true);
    cpu.call(&mut memory, 0x8000, RoutineArgs::new().a(0x05), &RunLimits::unlimited()).unwrap();

    assert_eq!(cpu.registers.accumulator, 0x05);
    assert_eq!(cpu.registers.x, 0x77);
    assert!(cpu.registers.status.carry);
}

#[test]
fn nested_subroutines() {
    let mut memory = memory_with(&[
        // JSR $8010; RTS
        (0x8000, &[0x20, 0x10, 0x80, 0x60]),
        // INX; RTS
        (0x8010, &[0xE8, 0x60]),
    ]);

    let mut cpu = new_cpu();
    let summary = call(&mut cpu, &mut memory, 0x8000).unwrap();

    assert_eq!(summary.steps, 4);
    assert_eq!(cpu.registers.x, 1);
    assert_eq!(cpu.registers.sp, 0xFD);
}

#[test]
fn jump_table_dispatch_discards_return_address() {
    let mut memory = memory_with(&[
        // JSR $8010; RTS
        (0x8000, &[0x20, 0x10, 0x80, 0x60]),
        // PLA; PLA; JMP $8020
        (0x8010, &[0x68, 0x68, 0x4C, 0x20, 0x80]),
        // LDA #$07; RTS
        (0x8020, &[0xA9, 0x07, 0x60]),
    ]);

    let mut cpu = new_cpu();
    let summary = call(&mut cpu, &mut memory, 0x8000).unwrap();

    assert_eq!(summary.steps, 6);
    assert_eq!(cpu.registers.accumulator, 0x07);
    assert_eq!(cpu.registers.sp, 0xFD);
}

#[test]
fn deeper_return_to_sentinel_address_keeps_running() {
    let mut memory = memory_with(&[
        // LDA #$FF; PHA; PHA; RTS
        (0x8000, &[0xA9, 0xFF, 0x48, 0x48, 0x60]),
        // RTS
        (RETURN_SENTINEL, &[0x60]),
    ]);

    let mut cpu = new_cpu();
    let summary = call(&mut cpu, &mut memory, 0x8000).unwrap();

    assert_eq!(summary.steps, 5);
    assert_eq!(cpu.registers.sp, 0xFD);
}

#[test]
fn step_limit_stops_infinite_loop() {
    // JMP $8000
    let mut memory = memory_with(&[(0x8000, &[0x4C, 0x00, 0x80])]);

    let mut cpu = new_cpu();
    let limits = RunLimits::with_max_steps(100);
    let result = cpu.call(&mut memory, 0x8000, RoutineArgs::new(), &limits);

    assert_eq!(result, Err(CpuError::StepLimitExceeded { limit: 100, pc: 0x8000 }));
}

#[test]
fn cancelled_token_stops_before_first_step() {
    let mut memory = memory_with(&[(0x8000, &[0x4C, 0x00, 0x80])]);

    let cancel = CancelToken::new();
    cancel.cancel();
    let limits = RunLimits { cancel: Some(cancel.clone()), ..RunLimits::default() };

    let mut cpu = new_cpu();
    let result = cpu.call(&mut memory, 0x8000, RoutineArgs::new(), &limits);
    assert_eq!(result, Err(CpuError::Cancelled { pc: 0x8000, steps: 0 }));

    cancel.reset();
    assert!(!cancel.is_cancelled());
}

#[test]
fn expired_deadline_stops_execution() {
    let mut memory = memory_with(&[(0x8000, &[0x4C, 0x00, 0x80])]);

    let limits = RunLimits { deadline: Some(Instant::now()), ..RunLimits::default() };

    let mut cpu = new_cpu();
    let result = cpu.call(&mut memory, 0x8000, RoutineArgs::new(), &limits);
    assert!(matches!(result, Err(CpuError::Cancelled { .. })));
}

#[test]
fn cancel_from_another_thread() {
    let mut memory = memory_with(&[(0x8000, &[0x4C, 0x00, 0x80])]);

    let cancel = CancelToken::new();
    let limits = RunLimits { cancel: Some(cancel.clone()), ..RunLimits::default() };

    let mut cpu = new_cpu();
    let result = thread::scope(|scope| {
        scope.spawn(|| {
            thread::sleep(Duration::from_millis(20));
            cancel.cancel();
        });

        cpu.call(&mut memory, 0x8000, RoutineArgs::new(), &limits)
    });

    match result {
        Err(CpuError::Cancelled { steps, .. }) => assert!(steps.is_multiple_of(POLL_INTERVAL)),
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[test]
fn errors_propagate_from_call() {
    // NOP; JAM
    let mut memory = memory_with(&[(0x8000, &[0xEA, 0x02])]);

    let mut cpu = new_cpu();
    let result = call(&mut cpu, &mut memory, 0x8000);
    assert_eq!(result, Err(CpuError::UnknownOpcode { opcode: 0x02, pc: 0x8001 }));

    let config =
        InterpreterConfig { unofficial_opcodes: UnofficialOpcodes::Execute, ..Default::default() };
    let mut cpu = Mos6502::new(&config);
    let result = call(&mut cpu, &mut memory, 0x8000);
    assert_eq!(result, Err(CpuError::Jammed { opcode: 0x02, pc: 0x8001 }));
}

#[test]
fn rom_write_fault_fails_call() {
    let mut image = vec![0; 0x4000];
    // LDA #$99; STA $8000; RTS
    image[..6].copy_from_slice(&[0xA9, 0x99, 0x8D, 0x00, 0x80, 0x60]);
    let rom = PrgRom::from_raw(image).unwrap();

    let mut memory = Memory::new(RomWritePolicy::Fault);
    memory.load_prg_rom(&rom);

    let mut cpu = new_cpu();
    let result = call(&mut cpu, &mut memory, 0x8000);

    assert_eq!(result, Err(CpuError::RomWrite { address: 0x8000, value: 0x99, pc: 0x8002 }));
    assert_eq!(memory[0x8000], 0xA9);
}

#[test]
fn run_until_stops_at_address() {
    // LDX #$00
    // loop: INX; CPX #$05; BNE loop
    let mut memory = memory_with(&[(0x8000, &[0xA2, 0x00, 0xE8, 0xE0, 0x05, 0xD0, 0xFB])]);

    let mut cpu = new_cpu();
    cpu.registers.pc = 0x8000;
    let summary = cpu.run_until(&mut memory, 0x8007, &RunLimits::unlimited()).unwrap();

    assert_eq!(cpu.registers.x, 5);
    assert_eq!(summary.steps, 1 + 5 * 3);

    let summary = cpu.run_until(&mut memory, 0x8007, &RunLimits::unlimited()).unwrap();
    assert_eq!(summary, CallSummary::default());
}

#[test]
fn calls_are_deterministic() {
    // LDX #$00
    // loop: TXA; STA $0200,X; INX; BNE loop
    // RTS
    let program = [0xA2, 0x00, 0x8A, 0x9D, 0x00, 0x02, 0xE8, 0xD0, 0xF9, 0x60];
    let memory = memory_with(&[(0x8000, &program)]);
    let cpu = new_cpu();

    let run = || {
        let mut memory = memory.clone();
        let mut cpu = cpu.clone();
        let summary = call(&mut cpu, &mut memory, 0x8000).unwrap();
        (summary, *cpu.registers(), memory)
    };

    let (first_summary, first_registers, first_memory) = run();
    let (second_summary, second_registers, second_memory) = run();

    assert_eq!(first_summary, second_summary);
    assert_eq!(first_registers, second_registers);
    assert_eq!(first_memory, second_memory);
    assert_eq!(first_memory[0x02AB], 0xAB);
}
