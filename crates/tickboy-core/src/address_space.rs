/// A device that owns part of the 16-bit address space.
///
/// The bus asks every candidate device whether it `accepts` an address and
/// routes the access to exactly one of them. Reads never have side effects.
pub trait AddressSpace {
    fn accepts(&self, addr: u16) -> bool;
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
}

/// Fallback for unmapped addresses: reads 0xFF, ignores writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoidSpace;

impl AddressSpace for VoidSpace {
    fn accepts(&self, _addr: u16) -> bool {
        true
    }

    fn read(&self, _addr: u16) -> u8 {
        0xFF
    }

    fn write(&mut self, _addr: u16, _value: u8) {}
}

/// Plain read/write memory covering `offset..offset + len`.
#[derive(Clone, Debug)]
pub struct Ram {
    offset: u16,
    data: Vec<u8>,
}

impl Ram {
    pub fn new(offset: u16, len: usize) -> Self {
        Self {
            offset,
            data: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AddressSpace for Ram {
    fn accepts(&self, addr: u16) -> bool {
        addr >= self.offset && usize::from(addr - self.offset) < self.data.len()
    }

    fn read(&self, addr: u16) -> u8 {
        self.data[usize::from(addr - self.offset)]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.data[usize::from(addr - self.offset)] = value;
    }
}

/// Echo window that mirrors another region of the bus.
#[derive(Clone, Copy, Debug)]
pub struct ShadowSpace {
    echo_start: u16,
    target_start: u16,
    len: u16,
}

impl ShadowSpace {
    pub const fn new(echo_start: u16, target_start: u16, len: u16) -> Self {
        Self {
            echo_start,
            target_start,
            len,
        }
    }

    pub const fn contains(&self, addr: u16) -> bool {
        addr >= self.echo_start && addr - self.echo_start < self.len
    }

    /// Maps an echo address onto the mirrored region.
    ///
    /// Panics if `addr` lies outside the echo window.
    pub fn translate(&self, addr: u16) -> u16 {
        assert!(
            self.contains(addr),
            "{addr:#06x} is outside the echo window at {:#06x}",
            self.echo_start
        );
        addr - self.echo_start + self.target_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_bounds() {
        let mut hram = Ram::new(0xFF80, 0x7F);
        assert!(hram.accepts(0xFF80));
        assert!(hram.accepts(0xFFFE));
        assert!(!hram.accepts(0xFFFF));
        assert!(!hram.accepts(0xFF7F));
        hram.write(0xFFFE, 0x42);
        assert_eq!(hram.read(0xFFFE), 0x42);
    }

    #[test]
    fn shadow_translation() {
        let echo = ShadowSpace::new(0xE000, 0xC000, 0x1E00);
        assert_eq!(echo.translate(0xE000), 0xC000);
        assert_eq!(echo.translate(0xFDFF), 0xDDFF);
        assert!(!echo.contains(0xFE00));
    }

    #[test]
    #[should_panic]
    fn shadow_rejects_foreign_address() {
        ShadowSpace::new(0xE000, 0xC000, 0x1E00).translate(0xC000);
    }
}
