//! Flat 64 KiB address space with an optional PRG ROM window at $8000-$FFFF


use crate::bus::{BusInterface, RejectedWrite};
use crate::config::{RamInitPattern, RomWritePolicy};
use crate::rom::PrgRom;
use bincode::{Decode, Encode};
use std::ops::{Index, IndexMut, RangeInclusive};

pub const ADDRESS_SPACE_LEN: usize = 0x10000;
pub const INTERNAL_RAM_LEN: usize = 0x0800;
pub const PRG_ROM_START: u16 = 0x8000;

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Memory {
    bytes: Vec<u8>,
    rom_mapped: bool,
    rom_writes: RomWritePolicy,
    rejected_write: Option<RejectedWrite>,
}

impl Memory {
    #[must_use]
    pub fn new(rom_writes: RomWritePolicy) -> Self {
        Self {
            bytes: vec![0; ADDRESS_SPACE_LEN],
            rom_mapped: false,
            rom_writes,
            rejected_write: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        self.bytes[usize::from(address)]
    }

    /// Zero every byte. Also unmaps the ROM window, since its contents are gone.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.rom_mapped = false;
        self.rejected_write = None;
    }

    /// Apply a power-on pattern to internal RAM ($0000-$07FF). Everything else is left as is.
    pub fn fill_power_on(&mut self, pattern: RamInitPattern) {
        let ram = &mut self.bytes[..INTERNAL_RAM_LEN];
        match pattern {
            RamInitPattern::Zeroed => ram.fill(0),
            RamInitPattern::Fceux => {
                for (i, byte) in ram.iter_mut().enumerate() {
                    *byte = if i & 0x04 != 0 { 0xFF } else { 0x00 };
                }
            }
        }
    }

    /// Copy a PRG ROM image into $8000-$FFFF. A 16 KiB image is mirrored at $C000.
    pub fn load_prg_rom(&mut self, rom: &PrgRom) {
        let window = &mut self.bytes[usize::from(PRG_ROM_START)..];
        for chunk in window.chunks_exact_mut(rom.len()) {
            chunk.copy_from_slice(rom.as_bytes());
        }
        self.rom_mapped = true;

        log::debug!("Mapped {} KiB PRG ROM at ${PRG_ROM_START:04X}", rom.len() / 1024);
    }

    /// Raw copy of `program` starting at `start`, wrapping at the end of the address space.
    /// Bypasses the ROM write policy.
    pub fn load_program(&mut self, start: u16, program: &[u8]) {
        let mut address = start;
        for &byte in program {
            self.bytes[usize::from(address)] = byte;
            address = address.wrapping_add(1);
        }
    }

    #[inline]
    #[must_use]
    pub fn read_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.read(address), self.read(address.wrapping_add(1))])
    }

    /// Bytes in `range`; empty if the range is reversed.
    #[must_use]
    pub fn dump(&self, range: RangeInclusive<u16>) -> &[u8] {
        let (start, end) = range.into_inner();
        if start > end {
            return &[];
        }
        &self.bytes[usize::from(start)..=usize::from(end)]
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn is_rom_mapped(&self) -> bool {
        self.rom_mapped
    }

    #[must_use]
    pub fn rom_write_policy(&self) -> RomWritePolicy {
        self.rom_writes
    }

    pub fn set_rom_write_policy(&mut self, rom_writes: RomWritePolicy) {
        self.rom_writes = rom_writes;
    }

    pub(crate) fn has_valid_len(&self) -> bool {
        self.bytes.len() == ADDRESS_SPACE_LEN
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(RomWritePolicy::default())
    }
}

impl Index<u16> for Memory {
    type Output = u8;

    #[inline]
    fn index(&self, address: u16) -> &Self::Output {
        &self.bytes[usize::from(address)]
    }
}

impl IndexMut<u16> for Memory {
    #[inline]
    fn index_mut(&mut self, address: u16) -> &mut Self::Output {
        &mut self.bytes[usize::from(address)]
    }
}

impl BusInterface for Memory {
    #[inline]
    fn read(&mut self, address: u16) -> u8 {
        self.bytes[usize::from(address)]
    }

    #[inline]
    fn write(&mut self, address: u16, value: u8) {
        if !self.rom_mapped || address < PRG_ROM_START {
            self.bytes[usize::from(address)] = value;
            return;
        }

        match self.rom_writes {
            RomWritePolicy::Ignore => {
                log::trace!("Ignoring ROM write: [{address:04X}] = {value:02X}");
            }
            RomWritePolicy::WriteThrough => {
                self.bytes[usize::from(address)] = value;
            }
            RomWritePolicy::Fault => {
                log::warn!("Rejected ROM write: [{address:04X}] = {value:02X}");
                self.rejected_write.get_or_insert(RejectedWrite { address, value });
            }
        }
    }

    #[inline]
    fn peek(&self, address: u16) -> u8 {
        self.bytes[usize::from(address)]
    }

    fn take_rejected_write(&mut self) -> Option<RejectedWrite> {
        self.rejected_write.take()
    }
}
