//! iNES parsing, restricted to what's needed to map NROM PRG ROM into the CPU address space


use std::path::Path;
use std::{fs, io};
use thiserror::Error;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("invalid or unsupported file format")]
    Format,
    #[error("file is truncated; header declares {expected} bytes, file has {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("unsupported mapper: {mapper_number}")]
    UnsupportedMapper { mapper_number: u16 },
    #[error("unsupported PRG ROM size for NROM: {size} bytes")]
    UnsupportedPrgSize { size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    INes,
    Nes2Point0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NametableMirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct INesHeader {
    pub format: FileFormat,
    pub mapper_number: u16,
    pub prg_rom_size: usize,
    pub chr_rom_size: usize,
    pub nametable_mirroring: NametableMirroring,
    pub has_trainer: bool,
    pub has_battery: bool,
}

impl INesHeader {
    /// Parse the 16-byte header at the start of an iNES or NES 2.0 file.
    ///
    /// # Errors
    ///
    /// Returns [`RomLoadError::Format`] if the file is too short or does not begin with the
    /// `NES<EOF>` magic bytes.
    pub fn parse(file_bytes: &[u8]) -> Result<Self, RomLoadError> {
        let Some(header) = file_bytes.get(..HEADER_LEN) else {
            return Err(RomLoadError::Format);
        };

        // "NES" followed by the MS-DOS EOF character
        if header[..4] != [0x4E, 0x45, 0x53, 0x1A] {
            return Err(RomLoadError::Format);
        }

        let format =
            if header[7] & 0x0C == 0x08 { FileFormat::Nes2Point0 } else { FileFormat::INes };

        // Size MSB nibbles only exist in NES 2.0 headers
        let (prg_msb, chr_msb) = match format {
            FileFormat::Nes2Point0 => (header[9] & 0x0F, header[9] >> 4),
            FileFormat::INes => (0, 0),
        };
        let prg_rom_size = PRG_BANK_LEN * ((usize::from(prg_msb) << 8) | usize::from(header[4]));
        let chr_rom_size = CHR_BANK_LEN * ((usize::from(chr_msb) << 8) | usize::from(header[5]));

        let mapper_number = u16::from((header[7] & 0xF0) | (header[6] >> 4));

        let nametable_mirroring = if header[6] & 0x08 != 0 {
            NametableMirroring::FourScreen
        } else if header[6] & 0x01 != 0 {
            NametableMirroring::Vertical
        } else {
            NametableMirroring::Horizontal
        };

        Ok(Self {
            format,
            mapper_number,
            prg_rom_size,
            chr_rom_size,
            nametable_mirroring,
            has_trainer: header[6] & 0x04 != 0,
            has_battery: header[6] & 0x02 != 0,
        })
    }

    fn prg_rom_start(&self) -> usize {
        if self.has_trainer { HEADER_LEN + TRAINER_LEN } else { HEADER_LEN }
    }
}

/// PRG ROM contents of an NROM cartridge, either 16 KiB or 32 KiB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrgRom(Vec<u8>);

impl PrgRom {
    /// Extract PRG ROM from the contents of an iNES file, skipping the header and the trainer if
    /// there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid, the file is shorter than the header says it
    /// is, or the cartridge is anything other than NROM with 16 or 32 KiB of PRG ROM.
    pub fn from_ines(file_bytes: &[u8]) -> Result<Self, RomLoadError> {
        let header = INesHeader::parse(file_bytes)?;

        log::info!(
            "iNES header: format={:?}, mapper={}, PRG ROM={} KiB, CHR ROM={} KiB, mirroring={:?}, trainer={}, battery={}",
            header.format,
            header.mapper_number,
            header.prg_rom_size / 1024,
            header.chr_rom_size / 1024,
            header.nametable_mirroring,
            header.has_trainer,
            header.has_battery
        );

        if header.mapper_number != 0 {
            return Err(RomLoadError::UnsupportedMapper { mapper_number: header.mapper_number });
        }

        if header.prg_rom_size != PRG_BANK_LEN && header.prg_rom_size != 2 * PRG_BANK_LEN {
            return Err(RomLoadError::UnsupportedPrgSize { size: header.prg_rom_size });
        }

        let prg_rom_start = header.prg_rom_start();
        let prg_rom_end = prg_rom_start + header.prg_rom_size;
        let expected_len = prg_rom_end + header.chr_rom_size;
        if file_bytes.len() < expected_len {
            return Err(RomLoadError::Truncated {
                expected: expected_len,
                actual: file_bytes.len(),
            });
        }

        Ok(Self(file_bytes[prg_rom_start..prg_rom_end].to_vec()))
    }

    /// # Errors
    ///
    /// Propagates I/O errors and any error from [`PrgRom::from_ines`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RomLoadError> {
        let path = path.as_ref();
        let file_bytes = fs::read(path)?;

        log::info!("Loading iNES file from '{}'", path.display());

        Self::from_ines(&file_bytes)
    }

    /// Wrap a raw PRG image.
    ///
    /// # Errors
    ///
    /// Returns [`RomLoadError::UnsupportedPrgSize`] unless the image is exactly 16 or 32 KiB.
    pub fn from_raw(bytes: Vec<u8>) -> Result<Self, RomLoadError> {
        match bytes.len() {
            PRG_BANK_LEN | 0x8000 => Ok(Self(bytes)),
            size => Err(RomLoadError::UnsupportedPrgSize { size }),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
