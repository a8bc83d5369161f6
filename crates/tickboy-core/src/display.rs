//! Pixel sinks driven by the GPU.

use crossbeam_channel as cb;
use log::debug;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// 0x00RRGGBB shades for DMG colors 0-3.
pub const DMG_PALETTE: [u32; 4] = [0x009BBC0F, 0x008BAC0F, 0x00306230, 0x000F380F];

/// Receives the picture one pixel at a time in scan order.
pub trait Display: Send {
    /// `shade` is 0 (lightest) to 3.
    fn put_dmg_pixel(&mut self, shade: u8);
    /// `rgb555` is a CGB palette entry, red in the low bits.
    fn put_color_pixel(&mut self, rgb555: u16);
    /// A full frame is ready.
    fn request_refresh(&mut self);
    /// Blocks until the last frame has been consumed.
    fn wait_for_refresh(&mut self);
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullDisplay {
    enabled: bool,
}

impl Display for NullDisplay {
    fn put_dmg_pixel(&mut self, _shade: u8) {}

    fn put_color_pixel(&mut self, _rgb555: u16) {}

    fn request_refresh(&mut self) {}

    fn wait_for_refresh(&mut self) {}

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Expands a 15-bit CGB color to 0x00RRGGBB.
pub fn decode_cgb_color(raw: u16) -> u32 {
    let r = ((raw & 0x1F) as u8) << 3 | ((raw & 0x1F) as u8 >> 2);
    let g = (((raw >> 5) & 0x1F) as u8) << 3 | (((raw >> 5) & 0x1F) as u8 >> 2);
    let b = (((raw >> 10) & 0x1F) as u8) << 3 | (((raw >> 10) & 0x1F) as u8 >> 2);
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Collects pixels into a 160x144 buffer and hands finished frames to
/// another thread.
///
/// `request_refresh` sends a copy of the buffer; `wait_for_refresh` blocks
/// until the receiver has acknowledged every sent frame. A dropped receiver
/// turns both into no-ops.
pub struct FrameBufferDisplay {
    buffer: Vec<u32>,
    pos: usize,
    enabled: bool,
    pending: usize,
    frame_tx: cb::Sender<Vec<u32>>,
    ack_rx: cb::Receiver<()>,
}

/// Consumer side of a [`FrameBufferDisplay`].
pub struct FrameReceiver {
    frame_rx: cb::Receiver<Vec<u32>>,
    ack_tx: cb::Sender<()>,
}

impl FrameBufferDisplay {
    pub fn new() -> (Self, FrameReceiver) {
        let (frame_tx, frame_rx) = cb::bounded(1);
        let (ack_tx, ack_rx) = cb::unbounded();
        (
            Self {
                buffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
                pos: 0,
                enabled: false,
                pending: 0,
                frame_tx,
                ack_rx,
            },
            FrameReceiver { frame_rx, ack_tx },
        )
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    fn put(&mut self, rgb: u32) {
        if let Some(slot) = self.buffer.get_mut(self.pos) {
            *slot = rgb;
        }
        self.pos += 1;
    }
}

impl Display for FrameBufferDisplay {
    fn put_dmg_pixel(&mut self, shade: u8) {
        self.put(DMG_PALETTE[usize::from(shade & 0x03)]);
    }

    fn put_color_pixel(&mut self, rgb555: u16) {
        self.put(decode_cgb_color(rgb555));
    }

    fn request_refresh(&mut self) {
        if !self.enabled {
            self.buffer.fill(DMG_PALETTE[0]);
        }
        if self.frame_tx.send(self.buffer.clone()).is_ok() {
            self.pending += 1;
        } else {
            debug!("frame receiver dropped");
        }
        self.pos = 0;
    }

    fn wait_for_refresh(&mut self) {
        while self.pending > 0 {
            if self.ack_rx.recv().is_err() {
                self.pending = 0;
                break;
            }
            self.pending -= 1;
        }
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl FrameReceiver {
    /// Waits for the next frame and acknowledges it. Returns `None` once the
    /// display is gone.
    pub fn recv(&self) -> Option<Vec<u32>> {
        let frame = self.frame_rx.recv().ok()?;
        self.acknowledge();
        Some(frame)
    }

    pub fn try_recv(&self) -> Option<Vec<u32>> {
        let frame = self.frame_rx.try_recv().ok()?;
        self.acknowledge();
        Some(frame)
    }

    fn acknowledge(&self) {
        if self.ack_tx.send(()).is_err() {
            debug!("frame display dropped before acknowledgement");
        }
    }
}
