use crate::hardware::TICKS_PER_LINE;

/// Pads the rest of a visible line after pixel transfer.
#[derive(Debug, Default)]
pub struct HBlankPhase {
    ticks: u32,
}

impl HBlankPhase {
    /// Starts counting from the dots the line has already used.
    pub fn start(&mut self, ticks_in_line: u32) {
        self.ticks = ticks_in_line;
    }

    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        self.ticks < TICKS_PER_LINE
    }
}

/// One line of vertical blank.
#[derive(Debug, Default)]
pub struct VBlankPhase {
    ticks: u32,
}

impl VBlankPhase {
    pub fn start(&mut self) {
        self.ticks = 0;
    }

    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        self.ticks < TICKS_PER_LINE
    }
}
