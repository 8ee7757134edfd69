#[cfg(test)]
mod tests;

use crate::bus::BusInterface;
use crate::config::{DecimalMode, UnofficialOpcodes};
use crate::num::GetBit;
use crate::opcodes::{AddressingMode, Operation};
use crate::{
    CpuError, CpuRegisters, IRQ_VECTOR, Mos6502, StatusFlags, StatusReadContext, StepInfo, opcodes,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    Memory { address: u16, base: u16, page_crossed: bool },
    Branch(i8),
}

impl Operand {
    fn memory(address: u16) -> Self {
        Self::Memory { address, base: address, page_crossed: false }
    }

    fn indexed(base: u16, index: u8) -> Self {
        let address = base.wrapping_add(index.into());
        Self::Memory { address, base, page_crossed: base & 0xFF00 != address & 0xFF00 }
    }

    fn page_crossed(self) -> bool {
        matches!(self, Self::Memory { page_crossed: true, .. })
    }
}

macro_rules! invalid_operand {
    ($operation:expr, $operand:expr) => {
        panic!("Invalid operand for {:?}: {:?}", $operation, $operand)
    };
}

#[inline]
fn fetch_operand<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    let operand = bus.read(cpu.registers.pc);
    cpu.registers.pc = cpu.registers.pc.wrapping_add(1);
    operand
}

#[inline]
fn fetch_operand_word<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u16 {
    let lsb = fetch_operand(cpu, bus);
    let msb = fetch_operand(cpu, bus);
    u16::from_le_bytes([lsb, msb])
}

// Reads a 16-bit pointer whose high byte comes from the same page as the low byte
fn read_pointer_in_page<B: BusInterface>(bus: &mut B, pointer: u16) -> u16 {
    let [pointer_lsb, pointer_msb] = pointer.to_le_bytes();
    let lsb = bus.read(pointer);
    let msb = bus.read(u16::from_le_bytes([pointer_lsb.wrapping_add(1), pointer_msb]));
    u16::from_le_bytes([lsb, msb])
}

fn resolve_operand<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    mode: AddressingMode,
) -> Operand {
    match mode {
        AddressingMode::Implied => Operand::None,
        AddressingMode::Accumulator => Operand::Accumulator,
        AddressingMode::Immediate => Operand::Immediate(fetch_operand(cpu, bus)),
        AddressingMode::ZeroPage => Operand::memory(fetch_operand(cpu, bus).into()),
        AddressingMode::ZeroPageX => {
            // Indexing never leaves page 0
            let address = fetch_operand(cpu, bus).wrapping_add(cpu.registers.x);
            Operand::memory(address.into())
        }
        AddressingMode::ZeroPageY => {
            let address = fetch_operand(cpu, bus).wrapping_add(cpu.registers.y);
            Operand::memory(address.into())
        }
        AddressingMode::Absolute => Operand::memory(fetch_operand_word(cpu, bus)),
        AddressingMode::AbsoluteX => {
            Operand::indexed(fetch_operand_word(cpu, bus), cpu.registers.x)
        }
        AddressingMode::AbsoluteY => {
            Operand::indexed(fetch_operand_word(cpu, bus), cpu.registers.y)
        }
        AddressingMode::Indirect => {
            // JMP ($xxFF) reads the high byte from $xx00, not from the next page
            let pointer = fetch_operand_word(cpu, bus);
            Operand::memory(read_pointer_in_page(bus, pointer))
        }
        AddressingMode::IndirectX => {
            let pointer = fetch_operand(cpu, bus).wrapping_add(cpu.registers.x);
            Operand::memory(read_pointer_in_page(bus, pointer.into()))
        }
        AddressingMode::IndirectY => {
            let pointer = fetch_operand(cpu, bus);
            let base = read_pointer_in_page(bus, pointer.into());
            Operand::indexed(base, cpu.registers.y)
        }
        AddressingMode::Relative => Operand::Branch(fetch_operand(cpu, bus) as i8),
    }
}

fn read_operand<B: BusInterface>(
    cpu: &Mos6502,
    bus: &mut B,
    operation: Operation,
    operand: Operand,
) -> u8 {
    match operand {
        Operand::Immediate(value) => value,
        Operand::Memory { address, .. } => bus.read(address),
        Operand::Accumulator => cpu.registers.accumulator,
        Operand::None | Operand::Branch(_) => invalid_operand!(operation, operand),
    }
}

fn store<B: BusInterface>(bus: &mut B, operation: Operation, operand: Operand, value: u8) {
    let Operand::Memory { address, .. } = operand else { invalid_operand!(operation, operand) };
    bus.write(address, value);
}

fn modify<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    operation: Operation,
    operand: Operand,
    op: impl FnOnce(u8, &mut CpuRegisters) -> u8,
) {
    match operand {
        Operand::Accumulator => {
            let value = cpu.registers.accumulator;
            cpu.registers.accumulator = op(value, &mut cpu.registers);
        }
        Operand::Memory { address, .. } => {
            let value = bus.read(address);
            let modified = op(value, &mut cpu.registers);
            bus.write(address, modified);
        }
        Operand::None | Operand::Immediate(_) | Operand::Branch(_) => {
            invalid_operand!(operation, operand)
        }
    }
}

fn operand_address(operation: Operation, operand: Operand) -> u16 {
    match operand {
        Operand::Memory { address, .. } => address,
        _ => invalid_operand!(operation, operand),
    }
}

pub(crate) fn push<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, value: u8) {
    // Stack always lives in page 1; SP wraps within it
    bus.write(u16::from_be_bytes([0x01, cpu.registers.sp]), value);
    cpu.registers.sp = cpu.registers.sp.wrapping_sub(1);
}

pub(crate) fn pull<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u8 {
    cpu.registers.sp = cpu.registers.sp.wrapping_add(1);
    bus.read(u16::from_be_bytes([0x01, cpu.registers.sp]))
}

fn push_word<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B, value: u16) {
    let [lsb, msb] = value.to_le_bytes();
    push(cpu, bus, msb);
    push(cpu, bus, lsb);
}

fn pull_word<B: BusInterface>(cpu: &mut Mos6502, bus: &mut B) -> u16 {
    let lsb = pull(cpu, bus);
    let msb = pull(cpu, bus);
    u16::from_le_bytes([lsb, msb])
}

pub(crate) fn enter_interrupt<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    return_address: u16,
    vector: u16,
    read_ctx: StatusReadContext,
) {
    push_word(cpu, bus, return_address);
    let status = cpu.registers.status.to_byte(read_ctx);
    push(cpu, bus, status);
    cpu.registers.status.interrupt_disable = true;
    cpu.registers.pc = bus.read_word(vector);
}

fn add(accumulator: u8, value: u8, flags: &mut StatusFlags) -> u8 {
    let existing_carry = flags.carry;

    let (result, carry1) = accumulator.overflowing_add(value);
    let (result, carry2) = result.overflowing_add(existing_carry.into());
    let new_carry = carry1 || carry2;

    let bit_6_carry = (accumulator & 0x7F) + (value & 0x7F) + u8::from(existing_carry) >= 0x80;
    let overflow = new_carry ^ bit_6_carry;

    flags
        .set_negative(result.bit(7))
        .set_overflow(overflow)
        .set_zero(result == 0)
        .set_carry(new_carry);

    result
}

// NMOS BCD addition: Z comes from the binary sum, N and V from the sum after the low nibble
// adjustment but before the high nibble adjustment
fn decimal_add(accumulator: u8, value: u8, flags: &mut StatusFlags) -> u8 {
    let carry = u16::from(flags.carry);
    let binary_result = accumulator.wrapping_add(value).wrapping_add(flags.carry.into());

    let mut low = u16::from(accumulator & 0x0F) + u16::from(value & 0x0F) + carry;
    if low > 0x09 {
        low += 0x06;
    }
    let mut high = u16::from(accumulator >> 4) + u16::from(value >> 4) + u16::from(low > 0x0F);

    let intermediate = ((high << 4) | (low & 0x0F)) as u8;
    let overflow = (!(accumulator ^ value) & (accumulator ^ intermediate)).bit(7);

    if high > 0x09 {
        high += 0x06;
    }

    flags
        .set_negative(intermediate.bit(7))
        .set_overflow(overflow)
        .set_zero(binary_result == 0)
        .set_carry(high > 0x0F);

    ((high << 4) | (low & 0x0F)) as u8
}

fn subtract(accumulator: u8, value: u8, flags: &mut StatusFlags) -> u8 {
    // Carry flag is inverted in subtraction
    let existing_borrow = u8::from(!flags.carry);

    let (result, borrowed1) = accumulator.overflowing_sub(value);
    let (result, borrowed2) = result.overflowing_sub(existing_borrow);
    let borrowed = borrowed1 || borrowed2;

    let bit_6_borrowed = accumulator & 0x7F < (value & 0x7F) + existing_borrow;
    let overflow = borrowed ^ bit_6_borrowed;

    flags
        .set_negative(result.bit(7))
        .set_overflow(overflow)
        .set_zero(result == 0)
        .set_carry(!borrowed);

    result
}

// NMOS BCD subtraction: all flags come from the binary difference
fn decimal_subtract(accumulator: u8, value: u8, flags: &mut StatusFlags) -> u8 {
    let borrow = i16::from(!flags.carry);
    subtract(accumulator, value, flags);

    let mut low = i16::from(accumulator & 0x0F) - i16::from(value & 0x0F) - borrow;
    let mut high = i16::from(accumulator >> 4) - i16::from(value >> 4);
    if low < 0 {
        low -= 0x06;
        high -= 1;
    }
    if high < 0 {
        high -= 0x06;
    }

    ((high << 4) | (low & 0x0F)) as u8
}

fn add_with_carry(registers: &mut CpuRegisters, value: u8, decimal_mode: DecimalMode) {
    let decimal = decimal_mode == DecimalMode::Nmos && registers.status.decimal;
    registers.accumulator = if decimal {
        decimal_add(registers.accumulator, value, &mut registers.status)
    } else {
        add(registers.accumulator, value, &mut registers.status)
    };
}

fn subtract_with_carry(registers: &mut CpuRegisters, value: u8, decimal_mode: DecimalMode) {
    let decimal = decimal_mode == DecimalMode::Nmos && registers.status.decimal;
    registers.accumulator = if decimal {
        decimal_subtract(registers.accumulator, value, &mut registers.status)
    } else {
        subtract(registers.accumulator, value, &mut registers.status)
    };
}

fn and(accumulator: u8, value: u8, flags: &mut StatusFlags) -> u8 {
    let result = accumulator & value;
    flags.set_negative(result.bit(7)).set_zero(result == 0);
    result
}

fn or(accumulator: u8, value: u8, flags: &mut StatusFlags) -> u8 {
    let result = accumulator | value;
    flags.set_negative(result.bit(7)).set_zero(result == 0);
    result
}

fn xor(accumulator: u8, value: u8, flags: &mut StatusFlags) -> u8 {
    let result = accumulator ^ value;
    flags.set_negative(result.bit(7)).set_zero(result == 0);
    result
}

fn bit_test(accumulator: u8, value: u8, flags: &mut StatusFlags) {
    flags.set_negative(value.bit(7)).set_overflow(value.bit(6)).set_zero(accumulator & value == 0);
}

fn compare(register: u8, value: u8, flags: &mut StatusFlags) {
    flags
        .set_negative(register.wrapping_sub(value).bit(7))
        .set_zero(register == value)
        .set_carry(register >= value);
}

fn shift_left(value: u8, flags: &mut StatusFlags) -> u8 {
    let shifted = value << 1;
    flags.set_carry(value.bit(7)).set_negative(shifted.bit(7)).set_zero(shifted == 0);
    shifted
}

fn logical_shift_right(value: u8, flags: &mut StatusFlags) -> u8 {
    let shifted = value >> 1;
    flags.set_carry(value.bit(0)).set_negative(false).set_zero(shifted == 0);
    shifted
}

fn rotate_left(value: u8, flags: &mut StatusFlags) -> u8 {
    let rotated = (value << 1) | u8::from(flags.carry);
    flags.set_carry(value.bit(7)).set_negative(rotated.bit(7)).set_zero(rotated == 0);
    rotated
}

fn rotate_right(value: u8, flags: &mut StatusFlags) -> u8 {
    let rotated = (value >> 1) | (u8::from(flags.carry) << 7);
    flags.set_carry(value.bit(0)).set_negative(rotated.bit(7)).set_zero(rotated == 0);
    rotated
}

fn increment(value: u8, flags: &mut StatusFlags) -> u8 {
    let incremented = value.wrapping_add(1);
    flags.set_negative(incremented.bit(7)).set_zero(incremented == 0);
    incremented
}

fn decrement(value: u8, flags: &mut StatusFlags) -> u8 {
    let decremented = value.wrapping_sub(1);
    flags.set_negative(decremented.bit(7)).set_zero(decremented == 0);
    decremented
}

fn load(value: u8, flags: &mut StatusFlags) -> u8 {
    flags.set_negative(value.bit(7)).set_zero(value == 0);
    value
}

fn and_with_rotate_right(registers: &mut CpuRegisters, operand: u8) {
    // ARR sets A to (A & #imm) rotated right, but sets C and V from bits 6 and 5 of the result
    // rather than the way ROR would
    let and_value = registers.accumulator & operand;
    registers.accumulator = (and_value >> 1) | (u8::from(registers.status.carry) << 7);

    let overflow = registers.accumulator.bit(6) ^ registers.accumulator.bit(5);
    registers
        .status
        .set_negative(registers.accumulator.bit(7))
        .set_overflow(overflow)
        .set_carry(registers.accumulator.bit(6))
        .set_zero(registers.accumulator == 0);
}

// SHX/SHY/AHX/TAS store the register ANDed with the high byte of the base address plus 1.
// When indexing crosses a page the real chip corrupts the target address; this implementation
// skips the write in that case
fn unstable_store<B: BusInterface>(
    bus: &mut B,
    operation: Operation,
    operand: Operand,
    register_value: u8,
) {
    let Operand::Memory { address, base, page_crossed } = operand else {
        invalid_operand!(operation, operand)
    };

    let base_msb = (base >> 8) as u8;
    if !page_crossed {
        bus.write(address, register_value & base_msb.wrapping_add(1));
    }
}

fn branch(cpu: &mut Mos6502, operation: Operation, operand: Operand, condition: bool) -> u8 {
    let Operand::Branch(offset) = operand else { invalid_operand!(operation, operand) };

    if !condition {
        return 0;
    }

    // Offset is relative to the address of the next instruction
    let target = cpu.registers.pc.wrapping_add_signed(offset.into());
    let page_crossed = cpu.registers.pc & 0xFF00 != target & 0xFF00;
    cpu.registers.pc = target;

    1 + u8::from(page_crossed)
}

// Returns extra cycles beyond the opcode's base count, other than the page crossing penalty for
// indexed reads
fn execute_operation<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
    operation: Operation,
    operand: Operand,
) -> u8 {
    let decimal_mode = cpu.decimal_mode;

    match operation {
        Operation::Adc => {
            let value = read_operand(cpu, bus, operation, operand);
            add_with_carry(&mut cpu.registers, value, decimal_mode);
        }
        Operation::Sbc => {
            let value = read_operand(cpu, bus, operation, operand);
            subtract_with_carry(&mut cpu.registers, value, decimal_mode);
        }
        Operation::And => {
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            registers.accumulator = and(registers.accumulator, value, &mut registers.status);
        }
        Operation::Ora => {
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            registers.accumulator = or(registers.accumulator, value, &mut registers.status);
        }
        Operation::Eor => {
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            registers.accumulator = xor(registers.accumulator, value, &mut registers.status);
        }
        Operation::Bit => {
            let value = read_operand(cpu, bus, operation, operand);
            bit_test(cpu.registers.accumulator, value, &mut cpu.registers.status);
        }
        Operation::Cmp | Operation::Cpx | Operation::Cpy => {
            let value = read_operand(cpu, bus, operation, operand);
            let register = match operation {
                Operation::Cmp => cpu.registers.accumulator,
                Operation::Cpx => cpu.registers.x,
                _ => cpu.registers.y,
            };
            compare(register, value, &mut cpu.registers.status);
        }
        Operation::Lda => {
            let value = read_operand(cpu, bus, operation, operand);
            cpu.registers.accumulator = load(value, &mut cpu.registers.status);
        }
        Operation::Ldx => {
            let value = read_operand(cpu, bus, operation, operand);
            cpu.registers.x = load(value, &mut cpu.registers.status);
        }
        Operation::Ldy => {
            let value = read_operand(cpu, bus, operation, operand);
            cpu.registers.y = load(value, &mut cpu.registers.status);
        }
        Operation::Sta => store(bus, operation, operand, cpu.registers.accumulator),
        Operation::Stx => store(bus, operation, operand, cpu.registers.x),
        Operation::Sty => store(bus, operation, operand, cpu.registers.y),
        Operation::Asl => {
            modify(cpu, bus, operation, operand, |value, registers| {
                shift_left(value, &mut registers.status)
            });
        }
        Operation::Lsr => {
            modify(cpu, bus, operation, operand, |value, registers| {
                logical_shift_right(value, &mut registers.status)
            });
        }
        Operation::Rol => {
            modify(cpu, bus, operation, operand, |value, registers| {
                rotate_left(value, &mut registers.status)
            });
        }
        Operation::Ror => {
            modify(cpu, bus, operation, operand, |value, registers| {
                rotate_right(value, &mut registers.status)
            });
        }
        Operation::Inc => {
            modify(cpu, bus, operation, operand, |value, registers| {
                increment(value, &mut registers.status)
            });
        }
        Operation::Dec => {
            modify(cpu, bus, operation, operand, |value, registers| {
                decrement(value, &mut registers.status)
            });
        }
        Operation::Inx => {
            let registers = &mut cpu.registers;
            registers.x = increment(registers.x, &mut registers.status);
        }
        Operation::Iny => {
            let registers = &mut cpu.registers;
            registers.y = increment(registers.y, &mut registers.status);
        }
        Operation::Dex => {
            let registers = &mut cpu.registers;
            registers.x = decrement(registers.x, &mut registers.status);
        }
        Operation::Dey => {
            let registers = &mut cpu.registers;
            registers.y = decrement(registers.y, &mut registers.status);
        }
        Operation::Tax => {
            let registers = &mut cpu.registers;
            registers.x = load(registers.accumulator, &mut registers.status);
        }
        Operation::Tay => {
            let registers = &mut cpu.registers;
            registers.y = load(registers.accumulator, &mut registers.status);
        }
        Operation::Tsx => {
            let registers = &mut cpu.registers;
            registers.x = load(registers.sp, &mut registers.status);
        }
        Operation::Txa => {
            let registers = &mut cpu.registers;
            registers.accumulator = load(registers.x, &mut registers.status);
        }
        Operation::Tya => {
            let registers = &mut cpu.registers;
            registers.accumulator = load(registers.y, &mut registers.status);
        }
        // TXS is the only transfer that does not set flags
        Operation::Txs => cpu.registers.sp = cpu.registers.x,
        Operation::Clc => cpu.registers.status.carry = false,
        Operation::Cld => cpu.registers.status.decimal = false,
        Operation::Cli => cpu.registers.status.interrupt_disable = false,
        Operation::Clv => cpu.registers.status.overflow = false,
        Operation::Sec => cpu.registers.status.carry = true,
        Operation::Sed => cpu.registers.status.decimal = true,
        Operation::Sei => cpu.registers.status.interrupt_disable = true,
        Operation::Bcc | Operation::Bcs | Operation::Beq | Operation::Bne | Operation::Bmi
        | Operation::Bpl | Operation::Bvs | Operation::Bvc => {
            let status = cpu.registers.status;
            let condition = match operation {
                Operation::Bcc => !status.carry,
                Operation::Bcs => status.carry,
                Operation::Beq => status.zero,
                Operation::Bne => !status.zero,
                Operation::Bmi => status.negative,
                Operation::Bpl => !status.negative,
                Operation::Bvs => status.overflow,
                _ => !status.overflow,
            };
            return branch(cpu, operation, operand, condition);
        }
        Operation::Jmp => cpu.registers.pc = operand_address(operation, operand),
        Operation::Jsr => {
            // Return address pushed is the address of the last byte of the JSR instruction
            let target = operand_address(operation, operand);
            let return_address = cpu.registers.pc.wrapping_sub(1);
            push_word(cpu, bus, return_address);
            cpu.registers.pc = target;
        }
        Operation::Rts => {
            cpu.registers.pc = pull_word(cpu, bus).wrapping_add(1);
        }
        Operation::Rti => {
            cpu.registers.status = StatusFlags::from_byte(pull(cpu, bus));
            cpu.registers.pc = pull_word(cpu, bus);
        }
        Operation::Brk => {
            // Skip the padding byte after the opcode
            let return_address = cpu.registers.pc.wrapping_add(1);
            enter_interrupt(cpu, bus, return_address, IRQ_VECTOR, StatusReadContext::Brk);
        }
        Operation::Pha => {
            let accumulator = cpu.registers.accumulator;
            push(cpu, bus, accumulator);
        }
        Operation::Php => {
            let status = cpu.registers.status.to_byte(StatusReadContext::PushStack);
            push(cpu, bus, status);
        }
        Operation::Pla => {
            let value = pull(cpu, bus);
            cpu.registers.accumulator = load(value, &mut cpu.registers.status);
        }
        Operation::Plp => {
            cpu.registers.status = StatusFlags::from_byte(pull(cpu, bus));
        }
        Operation::Nop => {}
        Operation::Slo => {
            modify(cpu, bus, operation, operand, |value, registers| {
                let shifted = shift_left(value, &mut registers.status);
                registers.accumulator = or(registers.accumulator, shifted, &mut registers.status);
                shifted
            });
        }
        Operation::Rla => {
            modify(cpu, bus, operation, operand, |value, registers| {
                let rotated = rotate_left(value, &mut registers.status);
                registers.accumulator = and(registers.accumulator, rotated, &mut registers.status);
                rotated
            });
        }
        Operation::Sre => {
            modify(cpu, bus, operation, operand, |value, registers| {
                let shifted = logical_shift_right(value, &mut registers.status);
                registers.accumulator = xor(registers.accumulator, shifted, &mut registers.status);
                shifted
            });
        }
        Operation::Rra => {
            modify(cpu, bus, operation, operand, |value, registers| {
                let rotated = rotate_right(value, &mut registers.status);
                add_with_carry(registers, rotated, decimal_mode);
                rotated
            });
        }
        Operation::Dcp => {
            modify(cpu, bus, operation, operand, |value, registers| {
                let decremented = value.wrapping_sub(1);
                compare(registers.accumulator, decremented, &mut registers.status);
                decremented
            });
        }
        Operation::Isc => {
            modify(cpu, bus, operation, operand, |value, registers| {
                let incremented = value.wrapping_add(1);
                subtract_with_carry(registers, incremented, decimal_mode);
                incremented
            });
        }
        Operation::Sax => {
            store(bus, operation, operand, cpu.registers.accumulator & cpu.registers.x);
        }
        Operation::Lax => {
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            registers.accumulator = load(value, &mut registers.status);
            registers.x = value;
        }
        Operation::Anc => {
            // AND, then C is set from bit 7 the way ASL would set it
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            registers.accumulator = and(registers.accumulator, value, &mut registers.status);
            registers.status.carry = registers.accumulator.bit(7);
        }
        Operation::Alr => {
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            let and_value = and(registers.accumulator, value, &mut registers.status);
            registers.accumulator = logical_shift_right(and_value, &mut registers.status);
        }
        Operation::Arr => {
            let value = read_operand(cpu, bus, operation, operand);
            and_with_rotate_right(&mut cpu.registers, value);
        }
        Operation::Xaa => {
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            registers.accumulator = load(registers.x & value, &mut registers.status);
        }
        Operation::Axs => {
            // X = (A & X) - #imm ignoring carry; flags are set as if by CMP
            let value = read_operand(cpu, bus, operation, operand);
            let registers = &mut cpu.registers;
            let ax = registers.accumulator & registers.x;
            registers.x = ax.wrapping_sub(value);
            compare(ax, value, &mut registers.status);
        }
        Operation::Las => {
            let value = read_operand(cpu, bus, operation, operand) & cpu.registers.sp;
            let registers = &mut cpu.registers;
            registers.accumulator = load(value, &mut registers.status);
            registers.x = value;
            registers.sp = value;
        }
        Operation::Shx => unstable_store(bus, operation, operand, cpu.registers.x),
        Operation::Shy => unstable_store(bus, operation, operand, cpu.registers.y),
        Operation::Ahx => {
            unstable_store(bus, operation, operand, cpu.registers.accumulator & cpu.registers.x);
        }
        Operation::Tas => {
            cpu.registers.sp = cpu.registers.accumulator & cpu.registers.x;
            unstable_store(bus, operation, operand, cpu.registers.sp);
        }
        // Rejected before the operand is fetched
        Operation::Jam => {}
    }

    0
}

pub(crate) fn execute<B: BusInterface>(
    cpu: &mut Mos6502,
    bus: &mut B,
) -> Result<StepInfo, CpuError> {
    let pc = cpu.registers.pc;
    let opcode = bus.read(pc);
    let decoded = opcodes::decode(opcode);

    // JAM bytes are undocumented too, so the reject policy reports them as unknown
    if !decoded.official && cpu.unofficial_opcodes == UnofficialOpcodes::Reject {
        return Err(CpuError::UnknownOpcode { opcode, pc });
    }

    if decoded.operation == Operation::Jam {
        return Err(CpuError::Jammed { opcode, pc });
    }

    cpu.registers.pc = pc.wrapping_add(1);
    let operand = resolve_operand(cpu, bus, decoded.mode);

    let mut cycles = decoded.cycles;
    if decoded.page_cross_penalty && operand.page_crossed() {
        cycles += 1;
    }
    cycles += execute_operation(cpu, bus, decoded.operation, operand);

    Ok(StepInfo { pc, opcode, operation: decoded.operation, cycles })
}
