//! Pixel FIFO shared by the background fetcher and the sprite overlay.

use super::tile_attributes::TileAttributes;

pub const FIFO_CAPACITY: usize = 16;

/// Who produced a pixel, which decides what may draw over it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelTag {
    Background { priority: bool },
    /// Slot of the sprite in the line's sprite list; lower wins.
    Sprite(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FifoPixel {
    /// 2-bit color index
    pub color: u8,
    /// CGB palette number, or the raw BGP/OBPx value on DMG
    pub palette: u8,
    pub tag: PixelTag,
}

impl FifoPixel {
    const BLANK: FifoPixel = FifoPixel {
        color: 0,
        palette: 0,
        tag: PixelTag::Background { priority: false },
    };
}

/// Fixed-capacity ring buffer of pending pixels.
#[derive(Clone, Debug)]
pub struct PixelFifo {
    slots: [FifoPixel; FIFO_CAPACITY],
    head: usize,
    len: usize,
}

impl PixelFifo {
    pub fn new() -> Self {
        Self {
            slots: [FifoPixel::BLANK; FIFO_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn push(&mut self, pixel: FifoPixel) {
        assert!(self.len < FIFO_CAPACITY, "pixel FIFO overflow");
        self.slots[(self.head + self.len) % FIFO_CAPACITY] = pixel;
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<FifoPixel> {
        if self.len == 0 {
            return None;
        }
        let pixel = self.slots[self.head];
        self.head = (self.head + 1) % FIFO_CAPACITY;
        self.len -= 1;
        Some(pixel)
    }

    pub fn get(&self, i: usize) -> Option<&FifoPixel> {
        (i < self.len).then(|| &self.slots[(self.head + i) % FIFO_CAPACITY])
    }

    fn get_mut(&mut self, i: usize) -> Option<&mut FifoPixel> {
        if i < self.len {
            Some(&mut self.slots[(self.head + i) % FIFO_CAPACITY])
        } else {
            None
        }
    }

    /// Appends one background/window tile row.
    pub fn enqueue_line(&mut self, line: &[u8; 8], palette: u8, priority: bool) {
        for &color in line {
            self.push(FifoPixel {
                color,
                palette,
                tag: PixelTag::Background { priority },
            });
        }
    }

    /// Merges a CGB sprite row over the head of the queue, skipping the
    /// first `offset` pixels of the row.
    pub fn overlay_color(
        &mut self,
        line: &[u8; 8],
        offset: usize,
        attrs: TileAttributes,
        slot: u8,
        bg_enabled: bool,
    ) {
        for (i, &color) in line.iter().enumerate().skip(offset) {
            // color 0 is always transparent
            if color == 0 {
                continue;
            }
            let Some(old) = self.get_mut(i - offset) else {
                break;
            };
            let put = match old.tag {
                PixelTag::Background { .. } if !bg_enabled => true,
                PixelTag::Background { priority: true } => old.color == 0,
                PixelTag::Background { priority: false } => {
                    !attrs.is_priority() || old.color == 0
                }
                PixelTag::Sprite(other) => other > slot,
            };
            if put {
                *old = FifoPixel {
                    color,
                    palette: attrs.color_palette_index(),
                    tag: PixelTag::Sprite(slot),
                };
            }
        }
    }

    /// Merges a DMG sprite row: sprites already in the queue win, and a
    /// priority sprite only shows over background color 0.
    pub fn overlay_dmg(
        &mut self,
        line: &[u8; 8],
        offset: usize,
        attrs: TileAttributes,
        slot: u8,
        palette: u8,
    ) {
        for (i, &color) in line.iter().enumerate().skip(offset) {
            if color == 0 {
                continue;
            }
            let Some(old) = self.get_mut(i - offset) else {
                break;
            };
            if matches!(old.tag, PixelTag::Sprite(_)) {
                continue;
            }
            if !attrs.is_priority() || old.color == 0 {
                *old = FifoPixel {
                    color,
                    palette,
                    tag: PixelTag::Sprite(slot),
                };
            }
        }
    }
}

impl Default for PixelFifo {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a DMG color index through a BGP/OBPx register to a shade 0-3.
pub fn dmg_shade(palette: u8, color: u8) -> u8 {
    (palette >> (color * 2)) & 0x03
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fifo_with(colors: [u8; 8], priority: bool) -> PixelFifo {
        let mut fifo = PixelFifo::new();
        fifo.enqueue_line(&colors, 0, priority);
        fifo
    }

    #[test]
    fn ring_buffer_wraps() {
        let mut fifo = PixelFifo::new();
        fifo.enqueue_line(&[0; 8], 0, false);
        for round in 1..5u8 {
            fifo.enqueue_line(&[round; 8], 0, false);
            assert_eq!(fifo.len(), FIFO_CAPACITY);
            for _ in 0..8 {
                assert_eq!(fifo.pop().map(|p| p.color), Some(round - 1));
            }
        }
        assert_eq!(fifo.len(), 8);
        fifo.clear();
        assert!(fifo.is_empty());
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn cgb_sprite_behind_priority_background() {
        let mut fifo = fifo_with([0, 1, 0, 1, 0, 1, 0, 1], true);
        fifo.overlay_color(&[3; 8], 0, TileAttributes::EMPTY, 0, true);
        let colors: Vec<u8> = (0..8).map(|i| fifo.get(i).map_or(9, |p| p.color)).collect();
        assert_eq!(colors, [3, 1, 3, 1, 3, 1, 3, 1]);
    }

    #[test]
    fn cgb_bg_disabled_lets_sprites_win() {
        let mut fifo = fifo_with([2; 8], true);
        fifo.overlay_color(&[1; 8], 0, TileAttributes::new(0x80), 0, false);
        assert!((0..8).all(|i| fifo.get(i).is_some_and(|p| p.color == 1)));
    }

    #[test]
    fn cgb_lower_sprite_slot_wins() {
        let mut fifo = fifo_with([0; 8], false);
        fifo.overlay_color(&[1; 8], 0, TileAttributes::new(0x02), 4, true);
        fifo.overlay_color(&[2; 8], 4, TileAttributes::new(0x05), 1, true);
        fifo.overlay_color(&[3; 8], 0, TileAttributes::EMPTY, 7, true);
        let first = fifo.get(0).copied();
        assert_eq!(
            first,
            Some(FifoPixel {
                color: 2,
                palette: 5,
                tag: PixelTag::Sprite(1)
            })
        );
        assert_eq!(fifo.get(4).map(|p| p.tag), Some(PixelTag::Sprite(4)));
    }

    #[test]
    fn dmg_priority_sprite_only_over_color_zero() {
        let mut fifo = fifo_with([0, 3, 0, 3, 0, 0, 0, 0], false);
        fifo.overlay_dmg(&[0, 2, 2, 2, 2, 2, 2, 2], 0, TileAttributes::new(0x80), 0, 0xE4);
        let colors: Vec<u8> = (0..8).map(|i| fifo.get(i).map_or(9, |p| p.color)).collect();
        assert_eq!(colors, [0, 3, 2, 3, 2, 2, 2, 2]);
        assert!(matches!(fifo.get(0).map(|p| p.tag), Some(PixelTag::Background { .. })));
    }

    #[test]
    fn shades_follow_palette_register() {
        assert_eq!(dmg_shade(0xE4, 0), 0);
        assert_eq!(dmg_shade(0xE4, 3), 3);
        assert_eq!(dmg_shade(0x1B, 0), 3);
    }
}
