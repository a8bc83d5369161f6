use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::address_space::AddressSpace;

pub const P1_ADDR: u16 = 0xFF00;

const LINE_DIRECTIONS: u8 = 0x10;
const LINE_BUTTONS: u8 = 0x20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::Right,
        Button::Left,
        Button::Up,
        Button::Down,
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
    ];

    /// Bit cleared in P1 while held.
    pub const fn mask(self) -> u8 {
        match self {
            Button::Right | Button::A => 0x01,
            Button::Left | Button::B => 0x02,
            Button::Up | Button::Select => 0x04,
            Button::Down | Button::Start => 0x08,
        }
    }

    /// P1 select bit that exposes this button (active low).
    pub const fn line(self) -> u8 {
        match self {
            Button::Right | Button::Left | Button::Up | Button::Down => LINE_DIRECTIONS,
            Button::A | Button::B | Button::Select | Button::Start => LINE_BUTTONS,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    held: Mutex<HashSet<Button>>,
    pressed: AtomicBool,
}

impl Shared {
    fn held(&self) -> MutexGuard<'_, HashSet<Button>> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Host-side button controller. Clones share the same state.
#[derive(Clone, Debug)]
pub struct JoypadHandle {
    shared: Arc<Shared>,
}

impl JoypadHandle {
    pub fn press(&self, button: Button) {
        self.shared.held().insert(button);
        self.shared.pressed.store(true, Ordering::Release);
    }

    pub fn release(&self, button: Button) {
        self.shared.held().remove(&button);
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.shared.held().contains(&button)
    }
}

/// P1 register.
#[derive(Debug)]
pub struct Joypad {
    p1: u8,
    shared: Arc<Shared>,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            p1: 0,
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn handle(&self) -> JoypadHandle {
        JoypadHandle {
            shared: self.shared.clone(),
        }
    }

    /// Consumes the press latch; true if any button went down since the
    /// last call.
    pub fn take_press(&self) -> bool {
        self.shared.pressed.swap(false, Ordering::AcqRel)
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace for Joypad {
    fn accepts(&self, addr: u16) -> bool {
        addr == P1_ADDR
    }

    fn read(&self, _addr: u16) -> u8 {
        let mut value = self.p1 | 0xCF;
        for button in self.shared.held().iter() {
            if button.line() & self.p1 == 0 {
                value &= !button.mask();
            }
        }
        value
    }

    fn write(&mut self, _addr: u16, value: u8) {
        self.p1 = value & (LINE_DIRECTIONS | LINE_BUTTONS);
    }
}
