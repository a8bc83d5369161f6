use log::debug;

use crate::address_space::AddressSpace;

pub const KEY1_ADDR: u16 = 0xFF4D;

/// CGB double-speed switch (KEY1).
///
/// Writing bit 0 arms the switch; the next STOP performs it.
#[derive(Debug)]
pub struct SpeedMode {
    double: bool,
    prepare: bool,
}

impl SpeedMode {
    pub fn new() -> Self {
        Self {
            double: false,
            prepare: false,
        }
    }

    /// Clock divisor applied to CPU, timer and DMA: 1 or 2.
    #[inline]
    pub fn speed(&self) -> u32 {
        if self.double { 2 } else { 1 }
    }

    /// Called when STOP executes. Returns whether a speed switch happened.
    pub fn on_cpu_stopped(&mut self) -> bool {
        if !self.prepare {
            return false;
        }
        self.double = !self.double;
        self.prepare = false;
        debug!("switched to {} speed", if self.double { "double" } else { "normal" });
        true
    }
}

impl Default for SpeedMode {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace for SpeedMode {
    fn accepts(&self, addr: u16) -> bool {
        addr == KEY1_ADDR
    }

    fn read(&self, _addr: u16) -> u8 {
        (u8::from(self.double) << 7) | u8::from(self.prepare) | 0x7E
    }

    fn write(&mut self, _addr: u16, value: u8) {
        self.prepare = value & 0x01 != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_switches_only_when_armed() {
        let mut key1 = SpeedMode::new();
        assert_eq!(key1.read(KEY1_ADDR), 0x7E);
        assert!(!key1.on_cpu_stopped());

        key1.write(KEY1_ADDR, 0x01);
        assert_eq!(key1.read(KEY1_ADDR), 0x7F);
        assert!(key1.on_cpu_stopped());
        assert_eq!(key1.speed(), 2);
        assert_eq!(key1.read(KEY1_ADDR), 0xFE);
    }
}
