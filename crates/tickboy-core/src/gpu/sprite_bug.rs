//! DMG OAM corruption triggered by 16-bit register arithmetic and stack
//! accesses while the PPU is scanning OAM.

use log::trace;

use crate::address_space::AddressSpace;

use super::oam_search::OAM_START;

/// Which CPU access pattern hit OAM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OamCorruption {
    /// INC/DEC of a 16-bit register pointing into OAM
    IncDec,
    /// First read of POP
    Pop1,
    /// Second read of POP
    Pop2,
    /// First write of PUSH
    Push1,
    /// Second write of PUSH
    Push2,
    /// LD A,(HL+) / LD A,(HL-)
    LdHl,
}

/// Scrambles OAM rows according to `kind`, given how far the line has got.
///
/// The row being scanned is derived from `ticks_in_line`; patterns that
/// would reach before the first row do nothing.
pub fn corrupt_oam<B: AddressSpace + ?Sized>(bus: &mut B, kind: OamCorruption, ticks_in_line: u32) {
    let cpu_cycle = ((ticks_in_line + 1) / 4 + 1) as i32;
    trace!("OAM corruption {kind:?} at cycle {cpu_cycle}");
    let c = cpu_cycle;
    match kind {
        OamCorruption::IncDec => {
            if c >= 2 {
                copy_values(bus, (c - 2) * 8 + 2, (c - 1) * 8 + 2, 6);
            }
        }
        OamCorruption::Pop1 | OamCorruption::LdHl => {
            if c >= 4 {
                copy_values(bus, (c - 3) * 8 + 2, (c - 4) * 8 + 2, 8);
                copy_values(bus, (c - 3) * 8 + 8, (c - 4) * 8, 2);
                copy_values(bus, (c - 4) * 8 + 2, (c - 2) * 8 + 2, 6);
            }
        }
        OamCorruption::Pop2 => {
            if c >= 5 {
                copy_values(bus, (c - 5) * 8, (c - 2) * 8, 8);
            }
        }
        OamCorruption::Push1 => {
            if c >= 4 {
                copy_values(bus, (c - 4) * 8 + 2, (c - 3) * 8 + 2, 8);
                copy_values(bus, (c - 3) * 8 + 2, (c - 1) * 8 + 2, 6);
            }
        }
        OamCorruption::Push2 => {
            if c >= 5 {
                copy_values(bus, (c - 4) * 8 + 2, (c - 3) * 8 + 2, 8);
            }
        }
    }
}

fn copy_values<B: AddressSpace + ?Sized>(bus: &mut B, from: i32, to: i32, len: i32) {
    for i in (0..len).rev() {
        let src = OAM_START.wrapping_add((from + i) as u16);
        let dst = OAM_START.wrapping_add((to + i) as u16);
        let value = bus.read(src) % 0xFF;
        bus.write(dst, value);
    }
}
