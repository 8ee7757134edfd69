/// A store that the bus refused to perform, reported back to the interpreter after the
/// instruction that attempted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RejectedWrite {
    pub address: u16,
    pub value: u8,
}

pub trait BusInterface {
    fn read(&mut self, address: u16) -> u8;

    fn write(&mut self, address: u16, value: u8);

    /// Read without side effects. Used for disassembly in trace logs.
    fn peek(&self, address: u16) -> u8;

    /// Return and clear the first write rejected since the last call, if any.
    #[inline]
    fn take_rejected_write(&mut self) -> Option<RejectedWrite> {
        None
    }

    #[inline]
    fn read_word(&mut self, address: u16) -> u16 {
        let lsb = self.read(address);
        let msb = self.read(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }
}
