//! Clock-accurate Game Boy / Game Boy Color emulation core.
//!
//! Every component advances one clock per [`gameboy::GameBoy::tick`]; pixels,
//! samples and serial bytes leave through the sink traits in [`display`],
//! [`sound`] and [`serial`]. Frontends drive the core via the [`gameboy`]
//! facade.

/// The `AddressSpace` bus trait and plain memory blocks.
pub mod address_space;

/// Cartridge slot with the boot ROM overlay.
pub mod cartridge;

/// SM83 CPU core and its instruction table.
pub mod cpu;

/// Pixel sinks.
pub mod display;

/// OAM DMA.
pub mod dma;

pub mod error;

/// High-level facade that wires the CPU and MMU into a single machine.
pub mod gameboy;

/// CGB work RAM banks and undocumented registers.
pub mod gbc_ram;

/// Picture processing unit.
pub mod gpu;

/// Clock constants and console models.
pub mod hardware;

/// CGB VRAM DMA.
pub mod hdma;

/// Interrupt controller.
pub mod interrupts;

/// Joypad register and host button handle.
pub mod joypad;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Serial port and link cable endpoints.
pub mod serial;

/// Sound registers and audio sink.
pub mod sound;

/// CGB double-speed switch.
pub mod speed_mode;

/// Divider/timer unit.
pub mod timer;

pub use cartridge::Cartridge;
pub use error::{CartridgeError, CoreError};
pub use gameboy::{Config, GameBoy, Sinks};
pub use hardware::Model;
