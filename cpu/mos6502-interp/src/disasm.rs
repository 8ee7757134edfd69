use crate::bus::BusInterface;
use crate::opcodes::{self, AddressingMode};

/// Format the instruction at `pc` in conventional assembler syntax (e.g. `LDA $0770,X`).
/// Returns the text and the instruction length in bytes.
///
/// Reads through [`BusInterface::peek`], so disassembling has no side effects.
pub fn disassemble<B: BusInterface + ?Sized>(bus: &B, pc: u16) -> (String, u16) {
    let opcode = opcodes::decode(bus.peek(pc));
    let mnemonic = opcode.operation.mnemonic();

    let byte = bus.peek(pc.wrapping_add(1));
    let word = u16::from_le_bytes([byte, bus.peek(pc.wrapping_add(2))]);

    let text = match opcode.mode {
        AddressingMode::Implied => mnemonic.into(),
        AddressingMode::Accumulator => format!("{mnemonic} A"),
        AddressingMode::Immediate => format!("{mnemonic} #${byte:02X}"),
        AddressingMode::ZeroPage => format!("{mnemonic} ${byte:02X}"),
        AddressingMode::ZeroPageX => format!("{mnemonic} ${byte:02X},X"),
        AddressingMode::ZeroPageY => format!("{mnemonic} ${byte:02X},Y"),
        AddressingMode::Absolute => format!("{mnemonic} ${word:04X}"),
        AddressingMode::AbsoluteX => format!("{mnemonic} ${word:04X},X"),
        AddressingMode::AbsoluteY => format!("{mnemonic} ${word:04X},Y"),
        AddressingMode::Indirect => format!("{mnemonic} (${word:04X})"),
        AddressingMode::IndirectX => format!("{mnemonic} (${byte:02X},X)"),
        AddressingMode::IndirectY => format!("{mnemonic} (${byte:02X}),Y"),
        AddressingMode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add_signed((byte as i8).into());
            format!("{mnemonic} ${target:04X}")
        }
    };

    let text = if opcode.official { text } else { format!("*{text}") };

    (text, opcode.instruction_len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn disassemble_bytes(pc: u16, bytes: &[u8]) -> (String, u16) {
        let mut memory = Memory::default();
        memory.load_program(pc, bytes);
        disassemble(&memory, pc)
    }

    #[test]
    fn formats_addressing_modes() {
        assert_eq!(disassemble_bytes(0x8000, &[0xBD, 0x70, 0x07]), ("LDA $0770,X".into(), 3));
        assert_eq!(disassemble_bytes(0x8000, &[0xA9, 0x07]), ("LDA #$07".into(), 2));
        assert_eq!(disassemble_bytes(0x8000, &[0x6C, 0xFF, 0x02]), ("JMP ($02FF)".into(), 3));
        assert_eq!(disassemble_bytes(0x8000, &[0xB1, 0x06]), ("LDA ($06),Y".into(), 2));
        assert_eq!(disassemble_bytes(0x8000, &[0x0A]), ("ASL A".into(), 1));
        assert_eq!(disassemble_bytes(0x8000, &[0x60]), ("RTS".into(), 1));
        assert_eq!(disassemble_bytes(0x8000, &[0x00, 0xEA]), ("BRK".into(), 2));
    }

    #[test]
    fn branch_targets_are_absolute() {
        // BNE -2 branches back to itself
        assert_eq!(disassemble_bytes(0x8010, &[0xD0, 0xFE]), ("BNE $8010".into(), 2));
        assert_eq!(disassemble_bytes(0x80F0, &[0x10, 0x20]), ("BPL $8112".into(), 2));
    }

    #[test]
    fn marks_undocumented_opcodes() {
        assert_eq!(disassemble_bytes(0x0600, &[0xA7, 0x10]), ("*LAX $10".into(), 2));
        assert_eq!(disassemble_bytes(0x0600, &[0x02]), ("*JAM".into(), 1));
    }
}
