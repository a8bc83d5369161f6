//! Mode 3: the tile fetcher feeding the pixel FIFO and the LCD.

use crate::address_space::{AddressSpace, Ram};
use crate::display::Display;
use crate::hardware::Model;

use super::fifo::{PixelFifo, PixelTag, dmg_shade};
use super::lcdc::Lcdc;
use super::oam_search::{MAX_SPRITES_PER_LINE, SpritePosition};
use super::palette::ColorPalette;
use super::registers::{GpuRegister, GpuRegisters};
use super::tile_attributes::TileAttributes;

const SPRITE_TILE_DATA: u16 = 0x8000;
// Fetcher steps run on every other dot.
const FETCH_DIVIDER: u8 = 2;

/// Read-only view of everything the fetcher and the pixel output consult.
pub struct VideoMemory<'a> {
    pub vram0: &'a Ram,
    pub vram1: &'a Ram,
    pub oam: &'a Ram,
    pub lcdc: Lcdc,
    pub regs: &'a GpuRegisters,
    pub bg_palette: &'a ColorPalette,
    pub obj_palette: &'a ColorPalette,
    pub model: Model,
}

impl VideoMemory<'_> {
    fn is_cgb(&self) -> bool {
        self.model.is_cgb()
    }

    fn vram(&self, bank: usize) -> &Ram {
        if bank == 1 && self.is_cgb() {
            self.vram1
        } else {
            self.vram0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum FetchState {
    ReadTileId,
    ReadData1,
    ReadData2,
    Push,
    ReadSpriteTileId,
    ReadSpriteFlags,
    ReadSpriteData1,
    ReadSpriteData2,
    PushSprite,
}

#[derive(Clone, Copy, Debug)]
struct SpriteFetch {
    sprite: SpritePosition,
    offset: usize,
    slot: u8,
    tile_line: u8,
}

/// Background/window tile fetcher with sprite fetches spliced in.
pub struct Fetcher {
    fifo: PixelFifo,
    state: FetchState,
    divider: u8,
    fetching_disabled: bool,
    map_address: u16,
    x_offset: u16,
    tile_data_address: u16,
    tile_id_signed: bool,
    tile_line: u8,
    tile_id: u8,
    attrs: TileAttributes,
    data: [u8; 2],
    sprite: Option<SpriteFetch>,
    sprite_attrs: TileAttributes,
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            fifo: PixelFifo::new(),
            state: FetchState::ReadTileId,
            divider: FETCH_DIVIDER,
            fetching_disabled: false,
            map_address: 0,
            x_offset: 0,
            tile_data_address: 0,
            tile_id_signed: false,
            tile_line: 0,
            tile_id: 0,
            attrs: TileAttributes::EMPTY,
            data: [0; 2],
            sprite: None,
            sprite_attrs: TileAttributes::EMPTY,
        }
    }

    pub fn init(&mut self) {
        self.state = FetchState::ReadTileId;
        self.tile_id = 0;
        self.data = [0; 2];
        self.divider = FETCH_DIVIDER;
        self.fetching_disabled = false;
        self.sprite = None;
    }

    /// Restarts background fetching from a tile map row.
    pub fn start_fetching(
        &mut self,
        map_address: u16,
        tile_data_address: u16,
        x_offset: u16,
        tile_id_signed: bool,
        tile_line: u8,
    ) {
        self.map_address = map_address;
        self.tile_data_address = tile_data_address;
        self.x_offset = x_offset;
        self.tile_id_signed = tile_id_signed;
        self.tile_line = tile_line;
        self.fifo.clear();
        self.state = FetchState::ReadTileId;
        self.tile_id = 0;
        self.data = [0; 2];
        self.divider = FETCH_DIVIDER;
    }

    /// With the background off (DMG), the queue is fed blank pixels.
    pub fn fetching_disabled(&mut self) {
        self.fetching_disabled = true;
    }

    pub fn fifo(&self) -> &PixelFifo {
        &self.fifo
    }

    pub fn fifo_mut(&mut self) -> &mut PixelFifo {
        &mut self.fifo
    }

    pub fn sprite_in_progress(&self) -> bool {
        self.state >= FetchState::ReadSpriteTileId
    }

    pub fn add_sprite(&mut self, sprite: SpritePosition, offset: usize, slot: u8, ly: u8) {
        self.sprite = Some(SpriteFetch {
            sprite,
            offset,
            slot,
            tile_line: ly.wrapping_add(16).wrapping_sub(sprite.y),
        });
        self.state = FetchState::ReadSpriteTileId;
    }

    fn bg_palette(&self, mem: &VideoMemory) -> u8 {
        if mem.is_cgb() {
            self.attrs.color_palette_index()
        } else {
            mem.regs.get(GpuRegister::Bgp)
        }
    }

    pub fn tick(&mut self, mem: &VideoMemory) {
        if self.fetching_disabled && self.state == FetchState::ReadTileId {
            if self.fifo.len() <= 8 {
                self.attrs = TileAttributes::EMPTY;
                let palette = self.bg_palette(mem);
                self.fifo.enqueue_line(&[0; 8], palette, false);
            }
            return;
        }

        self.divider -= 1;
        if self.divider > 0 {
            return;
        }
        self.divider = FETCH_DIVIDER;

        match self.state {
            FetchState::ReadTileId => {
                let addr = self.map_address + self.x_offset;
                self.tile_id = mem.vram0.read(addr);
                self.attrs = if mem.is_cgb() {
                    TileAttributes::new(mem.vram1.read(addr))
                } else {
                    TileAttributes::EMPTY
                };
                self.state = FetchState::ReadData1;
            }
            FetchState::ReadData1 => {
                self.data[0] = self.bg_tile_data(mem, 0);
                self.state = FetchState::ReadData2;
            }
            FetchState::ReadData2 => {
                self.data[1] = self.bg_tile_data(mem, 1);
                self.state = FetchState::Push;
                self.push_bg(mem);
            }
            FetchState::Push => self.push_bg(mem),
            FetchState::ReadSpriteTileId => {
                if let Some(fetch) = self.sprite {
                    self.tile_id = mem.oam.read(fetch.sprite.address + 2);
                }
                self.state = FetchState::ReadSpriteFlags;
            }
            FetchState::ReadSpriteFlags => {
                if let Some(fetch) = self.sprite {
                    self.sprite_attrs = TileAttributes::new(mem.oam.read(fetch.sprite.address + 3));
                }
                self.state = FetchState::ReadSpriteData1;
            }
            FetchState::ReadSpriteData1 => {
                if mem.lcdc.sprite_height() == 16 {
                    self.tile_id &= 0xFE;
                }
                self.data[0] = self.sprite_tile_data(mem, 0);
                self.state = FetchState::ReadSpriteData2;
            }
            FetchState::ReadSpriteData2 => {
                self.data[1] = self.sprite_tile_data(mem, 1);
                self.state = FetchState::PushSprite;
                self.push_sprite(mem);
            }
            FetchState::PushSprite => self.push_sprite(mem),
        }
    }

    fn push_bg(&mut self, mem: &VideoMemory) {
        if self.fifo.len() > 8 {
            return;
        }
        let line = zip(self.data[0], self.data[1], self.attrs.is_x_flip());
        let palette = self.bg_palette(mem);
        let priority = mem.is_cgb() && self.attrs.is_priority();
        self.fifo.enqueue_line(&line, palette, priority);
        self.x_offset = (self.x_offset + 1) % 0x20;
        self.state = FetchState::ReadTileId;
    }

    fn push_sprite(&mut self, mem: &VideoMemory) {
        if let Some(fetch) = self.sprite.take() {
            let attrs = self.sprite_attrs;
            let line = zip(self.data[0], self.data[1], attrs.is_x_flip());
            if mem.is_cgb() {
                self.fifo.overlay_color(
                    &line,
                    fetch.offset,
                    attrs,
                    fetch.slot,
                    mem.lcdc.is_bg_and_window_display(),
                );
            } else {
                let palette = mem.regs.get(attrs.dmg_palette());
                self.fifo
                    .overlay_dmg(&line, fetch.offset, attrs, fetch.slot, palette);
            }
        }
        self.state = FetchState::ReadTileId;
    }

    fn bg_tile_data(&self, mem: &VideoMemory, byte: u16) -> u8 {
        tile_data(
            mem,
            self.tile_id,
            self.tile_line,
            byte,
            self.tile_data_address,
            self.tile_id_signed,
            self.attrs,
            8,
        )
    }

    fn sprite_tile_data(&self, mem: &VideoMemory, byte: u16) -> u8 {
        let line = self.sprite.map_or(0, |fetch| fetch.tile_line);
        tile_data(
            mem,
            self.tile_id,
            line,
            byte,
            SPRITE_TILE_DATA,
            false,
            self.sprite_attrs,
            mem.lcdc.sprite_height(),
        )
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn tile_data(
    mem: &VideoMemory,
    tile_id: u8,
    line: u8,
    byte: u16,
    base: u16,
    signed: bool,
    attrs: TileAttributes,
    height: u8,
) -> u8 {
    let line = if attrs.is_y_flip() {
        height.wrapping_sub(1).wrapping_sub(line)
    } else {
        line
    };
    let id = if signed {
        i32::from(tile_id as i8)
    } else {
        i32::from(tile_id)
    };
    let addr = i32::from(base) + id * 16 + i32::from(line) * 2 + i32::from(byte);
    mem.vram(attrs.bank()).read(addr as u16)
}

/// Interleaves two bitplanes into eight 2-bit color indices, leftmost
/// pixel first.
pub fn zip(data1: u8, data2: u8, reverse: bool) -> [u8; 8] {
    let mut line = [0; 8];
    for i in (0..8).rev() {
        let color = ((data2 >> i) & 1) << 1 | ((data1 >> i) & 1);
        let index = if reverse { i } else { 7 - i };
        line[index] = color;
    }
    line
}

/// Drives one visible line of mode 3.
pub struct PixelTransfer {
    fetcher: Fetcher,
    sprites: [Option<SpritePosition>; MAX_SPRITES_PER_LINE],
    dropped_pixels: u8,
    x: i32,
    window: bool,
}

impl PixelTransfer {
    pub fn new() -> Self {
        Self {
            fetcher: Fetcher::new(),
            sprites: [None; MAX_SPRITES_PER_LINE],
            dropped_pixels: 0,
            x: 0,
            window: false,
        }
    }

    pub fn start(
        &mut self,
        mem: &VideoMemory,
        sprites: [Option<SpritePosition>; MAX_SPRITES_PER_LINE],
    ) {
        self.sprites = sprites;
        self.dropped_pixels = 0;
        self.x = 0;
        self.window = false;

        self.fetcher.init();
        if mem.is_cgb() || mem.lcdc.is_bg_and_window_display() {
            let bg_y = mem
                .regs
                .get(GpuRegister::Scy)
                .wrapping_add(mem.regs.get(GpuRegister::Ly));
            self.fetcher.start_fetching(
                mem.lcdc.bg_tile_map() + u16::from(bg_y / 8) * 0x20,
                mem.lcdc.bg_window_tile_data(),
                u16::from(mem.regs.get(GpuRegister::Scx) / 8),
                mem.lcdc.is_bg_window_tile_data_signed(),
                bg_y % 8,
            );
        } else {
            self.fetcher.fetching_disabled();
        }
    }

    /// Advances one dot. Returns false once the line's 160 pixels are out.
    pub fn tick(&mut self, mem: &VideoMemory, display: &mut dyn Display) -> bool {
        self.fetcher.tick(mem);

        if mem.is_cgb() || mem.lcdc.is_bg_and_window_display() {
            if self.fetcher.fifo().len() <= 8 {
                return true;
            }
            if self.dropped_pixels < mem.regs.get(GpuRegister::Scx) % 8 {
                self.fetcher.fifo_mut().pop();
                self.dropped_pixels += 1;
                return true;
            }
            let ly = mem.regs.get(GpuRegister::Ly);
            let wy = mem.regs.get(GpuRegister::Wy);
            let wx = i32::from(mem.regs.get(GpuRegister::Wx));
            if !self.window && mem.lcdc.is_window_display() && ly >= wy && self.x == wx - 7 {
                self.window = true;
                let win_y = ly - wy;
                self.fetcher.start_fetching(
                    mem.lcdc.window_tile_map() + u16::from(win_y / 8) * 0x20,
                    mem.lcdc.bg_window_tile_data(),
                    ((self.x - wx + 7) / 8) as u16,
                    mem.lcdc.is_bg_window_tile_data_signed(),
                    win_y % 8,
                );
                return true;
            }
        }

        if mem.lcdc.is_obj_display() {
            if self.fetcher.sprite_in_progress() {
                return true;
            }
            let ly = mem.regs.get(GpuRegister::Ly);
            for (slot, entry) in self.sprites.iter_mut().enumerate() {
                let Some(sprite) = *entry else {
                    continue;
                };
                let offset = if self.x == 0 && sprite.x < 8 {
                    Some(usize::from(8 - sprite.x))
                } else if i32::from(sprite.x) - 8 == self.x {
                    Some(0)
                } else {
                    None
                };
                if let Some(offset) = offset {
                    self.fetcher.add_sprite(sprite, offset, slot as u8, ly);
                    *entry = None;
                    return true;
                }
            }
        }

        let Some(pixel) = self.fetcher.fifo_mut().pop() else {
            return true;
        };
        if mem.is_cgb() {
            let palette = match pixel.tag {
                PixelTag::Sprite(_) => mem.obj_palette,
                PixelTag::Background { .. } => mem.bg_palette,
            };
            display.put_color_pixel(palette.color(pixel.palette, pixel.color));
        } else {
            display.put_dmg_pixel(dmg_shade(pixel.palette, pixel.color));
        }

        self.x += 1;
        self.x < 160
    }
}

impl Default for PixelTransfer {
    fn default() -> Self {
        Self::new()
    }
}
