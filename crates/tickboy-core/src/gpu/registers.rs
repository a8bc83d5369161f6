/// Plain LCD registers living next to LCDC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuRegister {
    Stat,
    Scy,
    Scx,
    /// Read-only
    Ly,
    Lyc,
    Bgp,
    Obp0,
    Obp1,
    Wy,
    Wx,
    /// CGB VRAM bank select
    Vbk,
}

impl GpuRegister {
    pub const ALL: [GpuRegister; 11] = [
        GpuRegister::Stat,
        GpuRegister::Scy,
        GpuRegister::Scx,
        GpuRegister::Ly,
        GpuRegister::Lyc,
        GpuRegister::Bgp,
        GpuRegister::Obp0,
        GpuRegister::Obp1,
        GpuRegister::Wy,
        GpuRegister::Wx,
        GpuRegister::Vbk,
    ];

    pub const fn address(self) -> u16 {
        match self {
            GpuRegister::Stat => 0xFF41,
            GpuRegister::Scy => 0xFF42,
            GpuRegister::Scx => 0xFF43,
            GpuRegister::Ly => 0xFF44,
            GpuRegister::Lyc => 0xFF45,
            GpuRegister::Bgp => 0xFF47,
            GpuRegister::Obp0 => 0xFF48,
            GpuRegister::Obp1 => 0xFF49,
            GpuRegister::Wy => 0xFF4A,
            GpuRegister::Wx => 0xFF4B,
            GpuRegister::Vbk => 0xFF4F,
        }
    }

    pub fn from_address(addr: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|reg| reg.address() == addr)
    }

    pub const fn is_writable(self) -> bool {
        !matches!(self, GpuRegister::Ly)
    }
}

#[derive(Clone, Debug, Default)]
pub struct GpuRegisters {
    values: [u8; GpuRegister::ALL.len()],
}

impl GpuRegisters {
    #[inline]
    pub fn get(&self, reg: GpuRegister) -> u8 {
        self.values[reg as usize]
    }

    #[inline]
    pub fn put(&mut self, reg: GpuRegister, value: u8) {
        self.values[reg as usize] = value;
    }

    pub fn pre_increment(&mut self, reg: GpuRegister) -> u8 {
        let value = self.get(reg).wrapping_add(1);
        self.put(reg, value);
        value
    }
}
