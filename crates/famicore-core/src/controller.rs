//! Controller collaborator interface and the standard joypad.
//!
//! The core only knows the strobe/serial-read protocol exposed at
//! $4016/$4017; input *sources* (keyboards, gamepads, replay files) live
//! outside and feed a [`JoypadHandle`].

use std::cell::Cell;
use std::rc::Rc;

/// Controller capability wired to $4016/$4017.
pub trait Controller {
    /// Strobe line ($4016 writes, bit 0). While high the shift register
    /// continuously reloads; on the falling edge the state is latched.
    fn strobe(&mut self, on: bool);

    /// Serial read ($4016/$4017 reads): the next button bit in bit 0.
    fn read(&mut self) -> u8;
}

/// Standard NES joypad: eight buttons shifted out A first.
///
/// After all eight buttons are read, further reads return 1, as the
/// hardware does.
pub struct Joypad {
    buttons: Rc<Cell<u8>>,
    shift: u8,
    strobe: bool,
}

/// Shared handle for updating a [`Joypad`]'s button state from outside
/// the core.
#[derive(Clone)]
pub struct JoypadHandle(Rc<Cell<u8>>);

impl JoypadHandle {
    /// Replace the full button byte (see the `Joypad` button masks).
    pub fn set_buttons(&self, buttons: u8) {
        self.0.set(buttons);
    }
}

impl Joypad {
    /// A button mask.
    pub const A: u8 = 0x01;
    /// B button mask.
    pub const B: u8 = 0x02;
    /// Select button mask.
    pub const SELECT: u8 = 0x04;
    /// Start button mask.
    pub const START: u8 = 0x08;
    /// Up button mask.
    pub const UP: u8 = 0x10;
    /// Down button mask.
    pub const DOWN: u8 = 0x20;
    /// Left button mask.
    pub const LEFT: u8 = 0x40;
    /// Right button mask.
    pub const RIGHT: u8 = 0x80;

    /// Create a joypad with no buttons held.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buttons: Rc::new(Cell::new(0)),
            shift: 0,
            strobe: false,
        }
    }

    /// Handle for feeding button state in.
    #[must_use]
    pub fn handle(&self) -> JoypadHandle {
        JoypadHandle(Rc::clone(&self.buttons))
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for Joypad {
    fn strobe(&mut self, on: bool) {
        if self.strobe && !on {
            // Falling edge latches the buttons.
            self.shift = self.buttons.get();
        }
        self.strobe = on;
        if on {
            self.shift = self.buttons.get();
        }
    }

    fn read(&mut self) -> u8 {
        if self.strobe {
            // While strobing, reads always return the A button.
            return self.buttons.get() & 1;
        }
        let bit = self.shift & 1;
        // Ones shift in after the real buttons are exhausted.
        self.shift = (self.shift >> 1) | 0x80;
        bit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_shift_out_a_first() {
        let mut joypad = Joypad::new();
        let handle = joypad.handle();
        handle.set_buttons(Joypad::A | Joypad::SELECT | Joypad::DOWN | Joypad::RIGHT);

        joypad.strobe(true);
        joypad.strobe(false);

        let expected = [1, 0, 1, 0, 0, 1, 0, 1]; // A B Sel Start U D L R
        for (i, &bit) in expected.iter().enumerate() {
            assert_eq!(joypad.read(), bit, "button {i}");
        }
    }

    #[test]
    fn reads_after_exhaustion_return_one() {
        let mut joypad = Joypad::new();
        joypad.strobe(true);
        joypad.strobe(false);
        for _ in 0..8 {
            joypad.read();
        }
        assert_eq!(joypad.read(), 1);
        assert_eq!(joypad.read(), 1);
    }

    #[test]
    fn strobe_high_pins_reads_to_a() {
        let mut joypad = Joypad::new();
        let handle = joypad.handle();
        handle.set_buttons(Joypad::A | Joypad::B);

        joypad.strobe(true);
        assert_eq!(joypad.read(), 1);
        assert_eq!(joypad.read(), 1); // no shifting while strobed
    }
}
