use std::io;

use log::{trace, warn};

use crate::address_space::AddressSpace;
use crate::hardware::TICKS_PER_SEC;
use crate::interrupts::{Interrupt, Interrupts};

pub const SB_ADDR: u16 = 0xFF01;
pub const SC_ADDR: u16 = 0xFF02;

const SC_TRANSFER: u8 = 0x80;
const SC_INTERNAL_CLOCK: u8 = 0x01;
const INTERNAL_CLOCK_HZ: u32 = 8192;
const BITS_PER_TRANSFER: u32 = 8;

/// The other end of the link cable.
pub trait SerialEndpoint: Send {
    /// Reports one external clock pulse since the last call.
    fn external_clock_pulsed(&mut self) -> bool;
    /// Exchanges a byte. Returns the partner's byte.
    fn transfer(&mut self, outgoing: u8) -> io::Result<u8>;
}

/// No cable attached. Never clocks and shifts the outgoing byte.
#[derive(Debug, Default)]
pub struct NullSerialEndpoint;

impl SerialEndpoint for NullSerialEndpoint {
    fn external_clock_pulsed(&mut self) -> bool {
        false
    }

    fn transfer(&mut self, outgoing: u8) -> io::Result<u8> {
        Ok(outgoing << 1)
    }
}

/// SB/SC registers and transfer timing.
pub struct SerialPort {
    sb: u8,
    sc: u8,
    endpoint: Box<dyn SerialEndpoint>,
    transfer_in_progress: bool,
    divider: u32,
}

impl SerialPort {
    pub fn new(endpoint: Box<dyn SerialEndpoint>) -> Self {
        Self {
            sb: 0,
            sc: 0,
            endpoint,
            transfer_in_progress: false,
            divider: 0,
        }
    }

    pub fn is_transfer_in_progress(&self) -> bool {
        self.transfer_in_progress
    }

    pub fn tick(&mut self, speed: u32, interrupts: &mut Interrupts) {
        if !self.transfer_in_progress {
            return;
        }
        let done = if self.sc & SC_INTERNAL_CLOCK != 0 {
            self.divider += 1;
            self.divider >= TICKS_PER_SEC / INTERNAL_CLOCK_HZ / speed
        } else {
            if self.endpoint.external_clock_pulsed() {
                self.divider += 1;
            }
            self.divider >= BITS_PER_TRANSFER
        };
        if done {
            self.complete(interrupts);
        }
    }

    fn complete(&mut self, interrupts: &mut Interrupts) {
        self.transfer_in_progress = false;
        self.divider = 0;
        self.sb = match self.endpoint.transfer(self.sb) {
            Ok(incoming) => incoming,
            Err(e) => {
                warn!("serial transfer failed: {e}");
                0
            }
        };
        trace!("serial transfer done, SB={:02X}", self.sb);
        self.sc &= !SC_TRANSFER;
        interrupts.request(Interrupt::Serial);
    }
}

impl AddressSpace for SerialPort {
    fn accepts(&self, addr: u16) -> bool {
        addr == SB_ADDR || addr == SC_ADDR
    }

    fn read(&self, addr: u16) -> u8 {
        if addr == SB_ADDR {
            self.sb
        } else {
            self.sc | 0x7E
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr == SB_ADDR {
            self.sb = value;
            return;
        }
        self.sc = value;
        if value & SC_TRANSFER != 0 {
            self.transfer_in_progress = true;
            self.divider = 0;
        }
    }
}
