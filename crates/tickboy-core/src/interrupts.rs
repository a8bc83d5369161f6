use crate::address_space::AddressSpace;
use crate::hardware::Model;

pub const IF_ADDR: u16 = 0xFF0F;
pub const IE_ADDR: u16 = 0xFFFF;

// Unused IF bits read back as 1.
const IF_UNUSED_BITS: u8 = 0xE0;
const IF_POWER_ON: u8 = 0xE1;

/// Interrupt sources in priority order (gbdev.io/pandocs/Interrupts.html).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interrupt {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn mask(self) -> u8 {
        1 << self.ordinal()
    }

    #[inline]
    pub const fn vector(self) -> u16 {
        0x40 + 8 * self.ordinal() as u16
    }

    /// Highest-priority source set in `pending`.
    pub fn highest_priority(pending: u8) -> Option<Interrupt> {
        Interrupt::ALL
            .into_iter()
            .find(|irq| pending & irq.mask() != 0)
    }
}

/// IF/IE registers plus the master enable (IME).
///
/// `EI` and (on CGB) `DI` take effect only after the instruction following
/// them has finished.
#[derive(Debug)]
pub struct Interrupts {
    model: Model,
    ime: bool,
    /// Pending interrupt flags (IF)
    flags: u8,
    /// Enabled interrupts (IE)
    enabled: u8,
    /// Instructions left before IME is set
    pending_enable: Option<u8>,
    /// Instructions left before IME is cleared
    pending_disable: Option<u8>,
}

impl Interrupts {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            ime: false,
            flags: IF_POWER_ON,
            enabled: 0,
            pending_enable: None,
            pending_disable: None,
        }
    }

    pub fn enable_interrupts(&mut self, with_delay: bool) {
        self.pending_disable = None;
        if with_delay {
            self.pending_enable.get_or_insert(1);
        } else {
            self.pending_enable = None;
            self.ime = true;
        }
    }

    pub fn disable_interrupts(&mut self, with_delay: bool) {
        self.pending_enable = None;
        if with_delay && self.model.is_cgb() {
            self.pending_disable.get_or_insert(1);
        } else {
            self.pending_disable = None;
            self.ime = false;
        }
    }

    #[inline]
    pub fn request(&mut self, irq: Interrupt) {
        self.flags |= irq.mask();
    }

    #[inline]
    pub fn clear(&mut self, irq: Interrupt) {
        self.flags &= !irq.mask();
    }

    pub fn on_instruction_finished(&mut self) {
        match self.pending_enable {
            Some(0) => self.enable_interrupts(false),
            Some(n) => self.pending_enable = Some(n - 1),
            None => {}
        }
        match self.pending_disable {
            Some(0) => self.disable_interrupts(false),
            Some(n) => self.pending_disable = Some(n - 1),
            None => {}
        }
    }

    #[inline]
    pub fn ime(&self) -> bool {
        self.ime
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.flags & self.enabled != 0
    }

    /// HALT with a pending, enabled interrupt and IME clear fails to advance PC.
    #[inline]
    pub fn has_halt_bug_condition(&self) -> bool {
        self.flags & self.enabled & 0x1F != 0 && !self.ime
    }
}

impl AddressSpace for Interrupts {
    fn accepts(&self, addr: u16) -> bool {
        addr == IF_ADDR || addr == IE_ADDR
    }

    fn read(&self, addr: u16) -> u8 {
        match addr {
            IF_ADDR => self.flags,
            IE_ADDR => self.enabled,
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            IF_ADDR => self.flags = value | IF_UNUSED_BITS,
            IE_ADDR => self.enabled = value,
            _ => {}
        }
    }
}
