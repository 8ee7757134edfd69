use crate::config::{DecimalMode, InterpreterConfig, UnofficialOpcodes};
use crate::memory::Memory;
use crate::{CpuError, CpuRegisters, Interrupt, Mos6502, StatusFlags, StatusReadContext};
use std::collections::HashMap;
use test_log::test;

const PROGRAM_START: u16 = 0x8000;

#[derive(Default)]
struct ExpectedState {
    a: Option<u8>,
    x: Option<u8>,
    y: Option<u8>,
    p: Option<u8>,
    s: Option<u8>,
    pc: Option<u16>,
    memory: HashMap<u16, u8>,
    cycles: Option<u32>,
}

macro_rules! assert_state_eq {
    ($(($name:literal, $expected:expr, $actual:expr)),+$(,)?) => {
        {
            let mut errors: Vec<String> = Vec::new();

            $(
                if let Some(expected) = $expected {
                    let actual = $actual;
                    if expected != actual {
                        errors.push(format!("[{} mismatch: expected = {:02X}, actual = {:02X}]", $name, expected, actual));
                    }
                }
            )*

            errors
        }
    }
}

impl ExpectedState {
    fn assert_eq(&self, registers: &CpuRegisters, memory: &Memory, cycles: u32) {
        let mut errors = assert_state_eq!(
            ("A", self.a, registers.accumulator),
            ("X", self.x, registers.x),
            ("Y", self.y, registers.y),
            ("P", self.p, registers.status.to_byte(StatusReadContext::PushStack)),
            ("S", self.s, registers.sp),
            ("PC", self.pc, registers.pc),
            ("Cycles", self.cycles, cycles),
        );

        for (&address, &value) in &self.memory {
            let actual_value = memory[address];
            if value != actual_value {
                errors.push(format!("[Mismatch at memory address {address:04X}: expected = {value:02X}, actual = {actual_value:02X}]"));
            }
        }

        if !errors.is_empty() {
            panic!("Expected state mismatch: {}", errors.join(", "));
        }
    }
}

fn parse_program(program: &str) -> Vec<u8> {
    let digits: Vec<u8> = program.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    digits
        .chunks_exact(2)
        .map(|chunk| {
            let hex = std::str::from_utf8(chunk).unwrap();
            u8::from_str_radix(hex, 16).unwrap()
        })
        .collect()
}

fn run_test_with(
    config: &InterpreterConfig,
    program: &str,
    setup: impl FnOnce(&mut Mos6502, &mut Memory),
    expected_state: ExpectedState,
) {
    let program = parse_program(program);

    let mut memory = Memory::default();
    memory.load_program(PROGRAM_START, &program);

    let mut cpu = Mos6502::new(config);
    setup(&mut cpu, &mut memory);
    cpu.registers.pc = PROGRAM_START;

    let program_end = PROGRAM_START + program.len() as u16;
    let mut cycle_count = 0;
    while (PROGRAM_START..program_end).contains(&cpu.registers.pc) {
        let step = cpu.step(&mut memory).unwrap();
        cycle_count += u32::from(step.cycles);
    }

    expected_state.assert_eq(&cpu.registers, &memory, cycle_count);
}

fn run_test(program: &str, expected_state: ExpectedState) {
    run_test_with(&InterpreterConfig::default(), program, |_, _| {}, expected_state);
}

fn run_test_with_memory(program: &str, initial: &[(u16, u8)], expected_state: ExpectedState) {
    run_test_with(
        &InterpreterConfig::default(),
        program,
        |_, memory| {
            for &(address, value) in initial {
                memory[address] = value;
            }
        },
        expected_state,
    );
}

fn unofficial_config() -> InterpreterConfig {
    InterpreterConfig { unofficial_opcodes: UnofficialOpcodes::Execute, ..InterpreterConfig::default() }
}

fn nmos_decimal_config() -> InterpreterConfig {
    InterpreterConfig { decimal_mode: DecimalMode::Nmos, ..InterpreterConfig::default() }
}

#[test]
fn lda_immediate() {
    run_test(
        // LDA #$78
        "A978",
        ExpectedState { a: Some(0x78), p: Some(0x34), cycles: Some(2), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$DD
        "A9DD",
        ExpectedState { a: Some(0xDD), p: Some(0xB4), cycles: Some(2), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$00
        "A900",
        ExpectedState { a: Some(0x00), p: Some(0x36), cycles: Some(2), ..ExpectedState::default() },
    );
}

#[test]
fn adc_truncates_and_sets_carry() {
    run_test(
        // CLC; LDA #$FF; ADC #$01
        "18 A9FF 6901",
        ExpectedState { a: Some(0x00), p: Some(0x37), cycles: Some(6), ..ExpectedState::default() },
    );
}

#[test]
fn adc_overflow() {
    run_test(
        // CLC; LDA #$7F; ADC #$01
        "18 A97F 6901",
        ExpectedState { a: Some(0x80), p: Some(0xF4), ..ExpectedState::default() },
    );

    run_test(
        // CLC; LDA #$80; ADC #$80
        "18 A980 6980",
        ExpectedState { a: Some(0x00), p: Some(0x77), ..ExpectedState::default() },
    );

    run_test(
        // SEC; LDA #$01; ADC #$01
        "38 A901 6901",
        ExpectedState { a: Some(0x03), p: Some(0x34), ..ExpectedState::default() },
    );
}

#[test]
fn sbc() {
    run_test(
        // SEC; LDA #$00; SBC #$01
        "38 A900 E901",
        ExpectedState { a: Some(0xFF), p: Some(0xB4), ..ExpectedState::default() },
    );

    run_test(
        // SEC; LDA #$50; SBC #$B0
        "38 A950 E9B0",
        ExpectedState { a: Some(0xA0), p: Some(0xF4), ..ExpectedState::default() },
    );

    run_test(
        // CLC; LDA #$05; SBC #$02 (borrow in)
        "18 A905 E902",
        ExpectedState { a: Some(0x02), p: Some(0x35), ..ExpectedState::default() },
    );
}

#[test]
fn decimal_flag_ignored_by_default() {
    run_test(
        // SED; CLC; LDA #$09; ADC #$01
        "F8 18 A909 6901",
        ExpectedState { a: Some(0x0A), p: Some(0x3C), ..ExpectedState::default() },
    );
}

fn run_decimal(program: &str) -> CpuRegisters {
    let program = parse_program(program);
    let mut memory = Memory::default();
    memory.load_program(PROGRAM_START, &program);

    let mut cpu = Mos6502::new(&nmos_decimal_config());
    cpu.registers.pc = PROGRAM_START;
    while cpu.registers.pc < PROGRAM_START + program.len() as u16 {
        cpu.step(&mut memory).unwrap();
    }

    cpu.registers
}

#[test]
fn nmos_decimal_add() {
    // SED; CLC; LDA #$09; ADC #$01
    let registers = run_decimal("F8 18 A909 6901");
    assert_eq!(registers.accumulator, 0x10);
    assert!(!registers.status.carry);

    // SED; CLC; LDA #$99; ADC #$01
    let registers = run_decimal("F8 18 A999 6901");
    assert_eq!(registers.accumulator, 0x00);
    assert!(registers.status.carry);

    // SED; CLC; LDA #$58; ADC #$46
    let registers = run_decimal("F8 18 A958 6946");
    assert_eq!(registers.accumulator, 0x04);
    assert!(registers.status.carry);

    // SED; SEC; LDA #$25; ADC #$34
    let registers = run_decimal("F8 38 A925 6934");
    assert_eq!(registers.accumulator, 0x60);
    assert!(!registers.status.carry);
}

#[test]
fn nmos_decimal_subtract() {
    // SED; SEC; LDA #$10; SBC #$01
    let registers = run_decimal("F8 38 A910 E901");
    assert_eq!(registers.accumulator, 0x09);
    assert!(registers.status.carry);

    // SED; SEC; LDA #$00; SBC #$01
    let registers = run_decimal("F8 38 A900 E901");
    assert_eq!(registers.accumulator, 0x99);
    assert!(!registers.status.carry);

    // SED; CLC; LDA #$50; SBC #$25
    let registers = run_decimal("F8 18 A950 E925");
    assert_eq!(registers.accumulator, 0x24);
    assert!(registers.status.carry);
}

#[test]
fn zero_page_x_wraps_within_page_zero() {
    run_test_with_memory(
        // LDX #$FF; LDA $80,X
        "A2FF B580",
        &[(0x007F, 0x42), (0x017F, 0x99)],
        ExpectedState { a: Some(0x42), cycles: Some(6), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$01; LDX #$10; STA $F8,X
        "A901 A210 95F8",
        ExpectedState {
            memory: HashMap::from([(0x0008, 0x01), (0x0108, 0x00)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn zero_page_y_wraps_within_page_zero() {
    run_test_with_memory(
        // LDY #$02; LDX $FF,Y
        "A002 B6FF",
        &[(0x0001, 0x5A), (0x0101, 0xA5)],
        ExpectedState { x: Some(0x5A), ..ExpectedState::default() },
    );
}

#[test]
fn indirect_x_pointer_wraps() {
    run_test_with_memory(
        // LDX #$01; LDA ($FE,X)
        "A201 A1FE",
        &[(0x00FF, 0x34), (0x0000, 0x12), (0x1234, 0x77), (0x0100, 0x99)],
        ExpectedState { a: Some(0x77), cycles: Some(8), ..ExpectedState::default() },
    );
}

#[test]
fn indirect_y_pointer_wraps() {
    run_test_with_memory(
        // LDY #$02; LDA ($FF),Y
        "A002 B1FF",
        &[(0x00FF, 0x00), (0x0000, 0x03), (0x0302, 0x55)],
        ExpectedState { a: Some(0x55), cycles: Some(7), ..ExpectedState::default() },
    );

    run_test_with_memory(
        // LDY #$FF; LDA ($10),Y, crossing from $03xx to $04xx
        "A0FF B110",
        &[(0x0010, 0x01), (0x0011, 0x03), (0x0400, 0x66)],
        ExpectedState { a: Some(0x66), cycles: Some(8), ..ExpectedState::default() },
    );
}

#[test]
fn absolute_indexed_page_cross_penalty() {
    run_test_with_memory(
        // LDX #$01; LDA $02FF,X
        "A201 BDFF02",
        &[(0x0300, 0x11)],
        ExpectedState { a: Some(0x11), cycles: Some(7), ..ExpectedState::default() },
    );

    run_test_with_memory(
        // LDX #$01; LDA $0200,X
        "A201 BD0002",
        &[(0x0201, 0x22)],
        ExpectedState { a: Some(0x22), cycles: Some(6), ..ExpectedState::default() },
    );

    // Stores always take the extra cycle
    run_test(
        // LDA #$33; LDX #$01; STA $0200,X
        "A933 A201 9D0002",
        ExpectedState {
            memory: HashMap::from([(0x0201, 0x33)]),
            cycles: Some(9),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn absolute_indexed_wraps_address_space() {
    run_test_with_memory(
        // LDY #$02; LDA $FFFF,Y
        "A002 B9FFFF",
        &[(0x0001, 0x44)],
        ExpectedState { a: Some(0x44), ..ExpectedState::default() },
    );
}

#[test]
fn jmp_indirect_page_bug() {
    run_test_with_memory(
        // JMP ($02FF)
        "6CFF02",
        &[(0x02FF, 0x00), (0x0200, 0x90), (0x0300, 0x70)],
        ExpectedState { pc: Some(0x9000), cycles: Some(5), ..ExpectedState::default() },
    );
}

#[test]
fn jsr_rts() {
    run_test(
        // $8000: JSR $8007
        // $8003: LDX #$01
        // $8005: BNE $800A
        // $8007: LDA #$42
        // $8009: RTS
        "200780 A201 D003 A942 60",
        ExpectedState {
            a: Some(0x42),
            x: Some(0x01),
            s: Some(0xFD),
            pc: Some(0x800A),
            memory: HashMap::from([(0x01FD, 0x80), (0x01FC, 0x02)]),
            cycles: Some(19),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn branch_offsets_are_sign_extended() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    // BNE -128 from $8010, Z is clear after reset
    memory.load_program(0x8010, &[0xD0, 0x80]);
    cpu.registers.pc = 0x8010;
    let step = cpu.step(&mut memory).unwrap();
    assert_eq!(cpu.registers.pc, 0x7F92);
    assert_eq!(step.cycles, 4);

    // BNE +127
    memory.load_program(0x8010, &[0xD0, 0x7F]);
    cpu.registers.pc = 0x8010;
    let step = cpu.step(&mut memory).unwrap();
    assert_eq!(cpu.registers.pc, 0x8091);
    assert_eq!(step.cycles, 3);

    // BEQ not taken
    memory.load_program(0x8010, &[0xF0, 0x80]);
    cpu.registers.pc = 0x8010;
    let step = cpu.step(&mut memory).unwrap();
    assert_eq!(cpu.registers.pc, 0x8012);
    assert_eq!(step.cycles, 2);
}

#[test]
fn stack_wraps_within_page_one() {
    run_test_with(
        &InterpreterConfig::default(),
        // LDA #$77; PHA
        "A977 48",
        |cpu, _| cpu.registers.sp = 0x00,
        ExpectedState {
            s: Some(0xFF),
            memory: HashMap::from([(0x0100, 0x77), (0x0000, 0x00)]),
            ..ExpectedState::default()
        },
    );

    run_test_with(
        &InterpreterConfig::default(),
        // PLA
        "68",
        |cpu, memory| {
            cpu.registers.sp = 0xFF;
            memory[0x0100] = 0x81;
        },
        ExpectedState { a: Some(0x81), s: Some(0x00), p: Some(0xB4), ..ExpectedState::default() },
    );
}

#[test]
fn stack_survives_more_than_256_pushes() {
    run_test(
        // LDX #$00
        // loop: PHA; DEX; BNE loop
        // PHA
        "A200 48 CA D0FC 48",
        ExpectedState { s: Some(0xFC), x: Some(0x00), ..ExpectedState::default() },
    );
}

#[test]
fn php_plp() {
    run_test(
        // PHP; PLA
        "08 68",
        ExpectedState { a: Some(0x34), s: Some(0xFD), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$FF; PHA; PLP
        "A9FF 48 28",
        ExpectedState { p: Some(0xFF), s: Some(0xFD), ..ExpectedState::default() },
    );
}

#[test]
fn txs_does_not_set_flags() {
    run_test(
        // LDX #$00; TXS
        "A200 9A",
        ExpectedState { s: Some(0x00), p: Some(0x36), ..ExpectedState::default() },
    );

    run_test(
        // LDX #$80; TXS; LDX #$01; TSX
        "A280 9A A201 BA",
        ExpectedState { x: Some(0x80), p: Some(0xB4), ..ExpectedState::default() },
    );
}

#[test]
fn bit_test() {
    run_test_with_memory(
        // LDA #$01; BIT $10
        "A901 2410",
        &[(0x0010, 0xC0)],
        ExpectedState { a: Some(0x01), p: Some(0xF6), ..ExpectedState::default() },
    );
}

#[test]
fn compare() {
    run_test(
        // LDA #$05; CMP #$05
        "A905 C905",
        ExpectedState { p: Some(0x37), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$05; CMP #$06
        "A905 C906",
        ExpectedState { p: Some(0xB4), ..ExpectedState::default() },
    );

    run_test(
        // LDY #$10; CPY #$01
        "A010 C001",
        ExpectedState { p: Some(0x35), ..ExpectedState::default() },
    );
}

#[test]
fn rotates_through_carry() {
    run_test(
        // SEC; LDA #$80; ROL A
        "38 A980 2A",
        ExpectedState { a: Some(0x01), p: Some(0x35), ..ExpectedState::default() },
    );

    run_test(
        // CLC; LDA #$01; ROR A
        "18 A901 6A",
        ExpectedState { a: Some(0x00), p: Some(0x37), ..ExpectedState::default() },
    );

    run_test_with_memory(
        // SEC; ROR $10
        "38 6610",
        &[(0x0010, 0x02)],
        ExpectedState {
            p: Some(0xB4),
            memory: HashMap::from([(0x0010, 0x81)]),
            cycles: Some(7),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn increment_memory_wraps() {
    run_test_with_memory(
        // INC $10
        "E610",
        &[(0x0010, 0xFF)],
        ExpectedState {
            p: Some(0x36),
            memory: HashMap::from([(0x0010, 0x00)]),
            cycles: Some(5),
            ..ExpectedState::default()
        },
    );

    run_test(
        // LDY #$00; DEY
        "A000 88",
        ExpectedState { y: Some(0xFF), p: Some(0xB4), ..ExpectedState::default() },
    );
}

#[test]
fn brk_and_rti() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    memory.load_program(0x8000, &[0x00, 0xEA]);
    memory.load_program(0x9000, &[0x40]);
    memory.load_program(0xFFFE, &[0x00, 0x90]);
    cpu.registers.pc = 0x8000;
    cpu.registers.status.set_carry(true).set_interrupt_disable(false);

    let step = cpu.step(&mut memory).unwrap();
    assert_eq!(step.cycles, 7);
    assert_eq!(cpu.registers.pc, 0x9000);
    assert!(cpu.registers.status.interrupt_disable);
    assert_eq!(memory.dump(0x01FB..=0x01FD), &[0x31, 0x02, 0x80]);

    cpu.step(&mut memory).unwrap();
    assert_eq!(cpu.registers.pc, 0x8002);
    assert_eq!(cpu.registers.sp, 0xFD);
    assert!(cpu.registers.status.carry);
    assert!(!cpu.registers.status.interrupt_disable);
}

#[test]
fn unknown_opcode_is_rejected_by_default() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    // LAX $10
    memory.load_program(0x8000, &[0xA7, 0x10]);
    cpu.registers.pc = 0x8000;

    assert_eq!(cpu.step(&mut memory), Err(CpuError::UnknownOpcode { opcode: 0xA7, pc: 0x8000 }));
    assert_eq!(cpu.registers.pc, 0x8000);
}

#[test]
fn nmi_pushes_pc_and_status_without_b() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    // NMI vector -> $9000
    memory.load_program(0xFFFA, &[0x00, 0x90]);
    cpu.registers.pc = 0x1234;
    cpu.registers.status = StatusFlags::from_byte(0x01);

    assert!(cpu.service_interrupt(&mut memory, Interrupt::Nmi));

    assert_eq!(cpu.registers.pc, 0x9000);
    assert_eq!(cpu.registers.sp, 0xFA);
    // Bit 5 set, B clear, I clear at the time of the push
    assert_eq!(memory.dump(0x01FB..=0x01FD), &[0x21, 0x34, 0x12]);
    assert!(cpu.registers.status.interrupt_disable);
    assert!(cpu.registers.status.carry);
    assert_eq!(cpu.total_cycles(), 7);
}

#[test]
fn nmi_ignores_interrupt_disable() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    memory.load_program(0xFFFA, &[0x00, 0x90]);
    cpu.registers.pc = 0x1234;

    assert!(cpu.service_interrupt(&mut memory, Interrupt::Nmi));

    assert_eq!(cpu.registers.pc, 0x9000);
    assert_eq!(memory.dump(0x01FB..=0x01FD), &[0x24, 0x34, 0x12]);
}

#[test]
fn irq_refused_while_interrupts_disabled() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    memory.load_program(0xFFFE, &[0x00, 0xA0]);
    cpu.registers.pc = 0x8000;
    let before = memory.clone();

    assert!(!cpu.service_interrupt(&mut memory, Interrupt::Irq));

    assert_eq!(cpu.registers.pc, 0x8000);
    assert_eq!(cpu.registers.sp, 0xFD);
    assert_eq!(cpu.total_cycles(), 0);
    assert_eq!(memory, before);
}

#[test]
fn irq_taken_after_cli_and_rti_returns() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    // CLI at $8000, RTI at the IRQ handler
    memory.load_program(0x8000, &[0x58, 0xEA]);
    memory.load_program(0xA000, &[0x40]);
    memory.load_program(0xFFFE, &[0x00, 0xA0]);
    cpu.registers.pc = 0x8000;

    cpu.step(&mut memory).unwrap();
    assert!(cpu.service_interrupt(&mut memory, Interrupt::Irq));

    assert_eq!(cpu.registers.pc, 0xA000);
    assert_eq!(memory.dump(0x01FB..=0x01FD), &[0x20, 0x01, 0x80]);
    assert!(cpu.registers.status.interrupt_disable);
    assert_eq!(cpu.total_cycles(), 2 + 7);

    cpu.step(&mut memory).unwrap();

    assert_eq!(cpu.registers.pc, 0x8001);
    assert_eq!(cpu.registers.sp, 0xFD);
    assert!(!cpu.registers.status.interrupt_disable);
}

#[test]
fn jam_is_unknown_under_reject_policy() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&InterpreterConfig::default());

    memory.load_program(0x0600, &[0x02]);
    cpu.registers.pc = 0x0600;

    assert_eq!(cpu.step(&mut memory), Err(CpuError::UnknownOpcode { opcode: 0x02, pc: 0x0600 }));
    assert_eq!(cpu.registers.pc, 0x0600);
}

#[test]
fn jam_halts_under_execute_policy() {
    let mut memory = Memory::default();
    let mut cpu = Mos6502::new(&unofficial_config());

    memory.load_program(0x8000, &[0xEA, 0x02, 0xF2]);
    cpu.registers.pc = 0x8000;

    cpu.step(&mut memory).unwrap();
    assert_eq!(cpu.step(&mut memory), Err(CpuError::Jammed { opcode: 0x02, pc: 0x8001 }));

    cpu.registers.pc = 0x8002;
    assert_eq!(cpu.step(&mut memory), Err(CpuError::Jammed { opcode: 0xF2, pc: 0x8002 }));
}

#[test]
fn unofficial_load_store() {
    run_test_with(
        &unofficial_config(),
        // LAX $10; SAX $11
        "A710 8711",
        |_, memory| memory[0x0010] = 0x8F,
        ExpectedState {
            a: Some(0x8F),
            x: Some(0x8F),
            p: Some(0xB4),
            memory: HashMap::from([(0x0011, 0x8F)]),
            ..ExpectedState::default()
        },
    );

    run_test_with(
        &unofficial_config(),
        // LDA #$F0; LDX #$3C; SAX $11
        "A9F0 A23C 8711",
        |_, _| {},
        ExpectedState { memory: HashMap::from([(0x0011, 0x30)]), ..ExpectedState::default() },
    );
}

#[test]
fn unofficial_read_modify_write() {
    run_test_with(
        &unofficial_config(),
        // LDA #$01; SLO $10
        "A901 0710",
        |_, memory| memory[0x0010] = 0x81,
        ExpectedState {
            a: Some(0x03),
            p: Some(0x35),
            memory: HashMap::from([(0x0010, 0x02)]),
            cycles: Some(7),
            ..ExpectedState::default()
        },
    );

    run_test_with(
        &unofficial_config(),
        // LDA #$40; DCP $10
        "A940 C710",
        |_, memory| memory[0x0010] = 0x41,
        ExpectedState {
            a: Some(0x40),
            p: Some(0x37),
            memory: HashMap::from([(0x0010, 0x40)]),
            ..ExpectedState::default()
        },
    );

    run_test_with(
        &unofficial_config(),
        // SEC; LDA #$10; ISC $10
        "38 A910 E710",
        |_, memory| memory[0x0010] = 0x0F,
        ExpectedState {
            a: Some(0x00),
            p: Some(0x37),
            memory: HashMap::from([(0x0010, 0x10)]),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn unofficial_immediates() {
    run_test_with(
        &unofficial_config(),
        // LDA #$FF; ANC #$80
        "A9FF 0B80",
        |_, _| {},
        ExpectedState { a: Some(0x80), p: Some(0xB5), ..ExpectedState::default() },
    );

    run_test_with(
        &unofficial_config(),
        // LDA #$FF; ALR #$03
        "A9FF 4B03",
        |_, _| {},
        ExpectedState { a: Some(0x01), p: Some(0x35), ..ExpectedState::default() },
    );

    run_test_with(
        &unofficial_config(),
        // LDA #$0F; LDX #$FC; AXS #$02
        "A90F A2FC CB02",
        |_, _| {},
        ExpectedState { x: Some(0x0A), p: Some(0x35), ..ExpectedState::default() },
    );

    run_test_with(
        &unofficial_config(),
        // SBC #$01 with the undocumented $EB encoding
        "38 A905 EB01",
        |_, _| {},
        ExpectedState { a: Some(0x04), p: Some(0x35), ..ExpectedState::default() },
    );
}

#[test]
fn unofficial_nops_consume_operands() {
    run_test_with(
        &unofficial_config(),
        // NOP $1234,X; NOP #$FF; NOP $10; LDA #$01
        "1C3412 80FF 0410 A901",
        |_, _| {},
        ExpectedState { a: Some(0x01), pc: Some(0x8009), cycles: Some(11), ..ExpectedState::default() },
    );
}
