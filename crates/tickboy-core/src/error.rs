use thiserror::Error;

/// Faults that stop the machine.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("no instruction decodes opcode {opcode:#04x} at {pc:#06x}")]
    InvalidOpcode { opcode: u8, pc: u16 },
}

#[derive(Error, Debug)]
pub enum CartridgeError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("image is empty")]
    Empty,
}
