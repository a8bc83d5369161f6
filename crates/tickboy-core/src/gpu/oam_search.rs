use crate::address_space::{AddressSpace, Ram};

pub const OAM_START: u16 = 0xFE00;
pub const OAM_ENTRIES: usize = 40;
pub const MAX_SPRITES_PER_LINE: usize = 10;

/// A sprite found on the current line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpritePosition {
    pub x: u8,
    pub y: u8,
    /// OAM address of the entry's Y byte.
    pub address: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    ReadY,
    ReadX,
}

/// Mode 2: scans the 40 OAM entries, two dots per entry.
#[derive(Debug)]
pub struct OamSearch {
    sprites: [Option<SpritePosition>; MAX_SPRITES_PER_LINE],
    count: usize,
    index: usize,
    step: Step,
    y: u8,
}

impl OamSearch {
    pub fn new() -> Self {
        Self {
            sprites: [None; MAX_SPRITES_PER_LINE],
            count: 0,
            index: 0,
            step: Step::ReadY,
            y: 0,
        }
    }

    pub fn start(&mut self) {
        self.sprites = [None; MAX_SPRITES_PER_LINE];
        self.count = 0;
        self.index = 0;
        self.step = Step::ReadY;
    }

    /// Returns false once every entry has been examined.
    pub fn tick(&mut self, oam: &Ram, ly: u8, sprite_height: u8) -> bool {
        let address = OAM_START + (self.index as u16) * 4;
        match self.step {
            Step::ReadY => {
                self.y = oam.read(address);
                self.step = Step::ReadX;
            }
            Step::ReadX => {
                let x = oam.read(address + 1);
                let line = u16::from(ly) + 16;
                let top = u16::from(self.y);
                if self.count < MAX_SPRITES_PER_LINE
                    && top <= line
                    && line < top + u16::from(sprite_height)
                {
                    self.sprites[self.count] = Some(SpritePosition {
                        x,
                        y: self.y,
                        address,
                    });
                    self.count += 1;
                }
                self.index += 1;
                self.step = Step::ReadY;
            }
        }
        self.index < OAM_ENTRIES
    }

    pub fn sprites(&self) -> [Option<SpritePosition>; MAX_SPRITES_PER_LINE] {
        self.sprites
    }
}

impl Default for OamSearch {
    fn default() -> Self {
        Self::new()
    }
}
