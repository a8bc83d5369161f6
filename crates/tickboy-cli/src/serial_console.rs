use std::io;

use crossbeam_channel as cb;
use tickboy_core::serial::SerialEndpoint;

/// Link cable with nobody on the other end. Every byte the game sends is
/// forwarded to the host; the game reads back 0xFF.
pub struct ConsoleSerial {
    tx: cb::Sender<u8>,
}

impl ConsoleSerial {
    pub fn new() -> (Self, cb::Receiver<u8>) {
        let (tx, rx) = cb::unbounded();
        (Self { tx }, rx)
    }
}

impl SerialEndpoint for ConsoleSerial {
    fn external_clock_pulsed(&mut self) -> bool {
        false
    }

    fn transfer(&mut self, outgoing: u8) -> io::Result<u8> {
        // a closed receiver just means nobody is printing
        let _ = self.tx.send(outgoing);
        Ok(0xFF)
    }
}

/// Renders serial output the way test ROMs expect to be read.
pub fn printable(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_graphic() || b == b' ' || b == b'\n' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{b:02X}"));
        }
    }
    out
}
