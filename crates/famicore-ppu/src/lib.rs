//! Dot-accurate NES 2C02 PPU emulation.
//!
//! The PPU advances one dot per [`Ppu::tick`]; the system bus calls it
//! three times per CPU cycle (NTSC). The frame grid is 262 scanlines of
//! 341 dots, with the odd-frame skip removing one pre-render dot when
//! rendering is enabled:
//!
//! - scanlines 0-239: visible (background fetch pipeline, sprite
//!   evaluation, pixel output)
//! - scanline 240: post-render idle
//! - scanlines 241-260: VBlank (flag set at dot 1 of 241, NMI line raised
//!   when enabled)
//! - scanline 261: pre-render (flags cleared at dot 1, vertical scroll
//!   copy at dots 280-304)
//!
//! Pattern tables and nametables are reached through [`PpuBus`]; palette
//! RAM, OAM and the 256x240 `0xAARRGGBB` framebuffer live inside the PPU.
//!
//! # Usage
//!
//! ```no_run
//! use famicore_ppu::{Ppu, PpuBus};
//!
//! struct FlatVram {
//!     memory: [u8; 0x4000],
//! }
//!
//! impl PpuBus for FlatVram {
//!     fn read(&mut self, addr: u16) -> u8 {
//!         self.memory[(addr & 0x3FFF) as usize]
//!     }
//!
//!     fn write(&mut self, addr: u16, value: u8) {
//!         self.memory[(addr & 0x3FFF) as usize] = value;
//!     }
//! }
//!
//! let mut ppu = Ppu::new();
//! let mut vram = FlatVram { memory: [0; 0x4000] };
//!
//! // Three dots per CPU cycle.
//! for _ in 0..3 {
//!     ppu.tick(&mut vram);
//! }
//! if ppu.nmi_line() {
//!     // latch an NMI edge into the CPU
//! }
//! ```

#![warn(missing_docs)]

mod background;
mod oam;
pub mod palette;
mod ppu;
mod registers;
mod scroll;
mod sprites;
mod timing;

pub use oam::{
    Oam, SecondaryOam, Sprite, SpriteAttributes, MAX_SPRITES_PER_LINE, OAM_SIZE,
    SECONDARY_OAM_SIZE,
};
pub use ppu::{Ppu, PpuBus, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
pub use scroll::Scroll;
pub use timing::{
    Timing, DOTS_PER_SCANLINE, PRE_RENDER_SCANLINE, SCANLINES_PER_FRAME, VBLANK_SCANLINE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct NullBus;

    impl PpuBus for NullBus {
        fn read(&mut self, _addr: u16) -> u8 {
            0
        }
        fn write(&mut self, _addr: u16, _value: u8) {}
    }

    #[test]
    fn frame_grid_constants() {
        assert_eq!(DOTS_PER_SCANLINE, 341);
        assert_eq!(SCANLINES_PER_FRAME, 262);
        assert_eq!(u32::from(DOTS_PER_SCANLINE) * u32::from(SCANLINES_PER_FRAME), 89_342);
    }

    #[test]
    fn frame_completion_without_rendering() {
        let mut ppu = Ppu::new();
        let mut bus = NullBus;
        for _ in 0..89_342 {
            ppu.tick(&mut bus);
        }
        assert_eq!(ppu.frame(), 1);
        assert_eq!(ppu.dots(), 89_342);
    }

    proptest! {
        /// Palette aliasing: $3F10/$3F14/$3F18/$3F1C fold onto the
        /// background column on both read and write, for every value.
        #[test]
        fn palette_aliasing_holds(slot in 0u8..4, value in 0u8..=0x3F) {
            let mut ppu = Ppu::new();
            let mut bus = NullBus;
            let alias = 0x10 + slot * 4;
            let target = slot * 4;

            // Write through the alias, read through the target.
            ppu.write_register(0x2006, 0x3F, &mut bus);
            ppu.write_register(0x2006, alias, &mut bus);
            ppu.write_register(0x2007, value, &mut bus);

            ppu.write_register(0x2006, 0x3F, &mut bus);
            ppu.write_register(0x2006, target, &mut bus);
            prop_assert_eq!(ppu.read_register(0x2007, &mut bus) & 0x3F, value);

            // And the other direction.
            ppu.write_register(0x2006, 0x3F, &mut bus);
            ppu.write_register(0x2006, target, &mut bus);
            ppu.write_register(0x2007, value ^ 0x3F, &mut bus);

            ppu.write_register(0x2006, 0x3F, &mut bus);
            ppu.write_register(0x2006, alias, &mut bus);
            prop_assert_eq!(ppu.read_register(0x2007, &mut bus) & 0x3F, value ^ 0x3F);
        }

        /// Non-backdrop palette entries never alias.
        #[test]
        fn sprite_palette_colors_do_not_alias(offset in prop::sample::select(vec![1u8, 2, 3])) {
            let mut ppu = Ppu::new();
            let mut bus = NullBus;
            let sprite_addr = 0x11 + (offset - 1);
            let bg_addr = sprite_addr - 0x10;

            ppu.write_register(0x2006, 0x3F, &mut bus);
            ppu.write_register(0x2006, sprite_addr, &mut bus);
            ppu.write_register(0x2007, 0x2A, &mut bus);

            ppu.write_register(0x2006, 0x3F, &mut bus);
            ppu.write_register(0x2006, bg_addr, &mut bus);
            prop_assert_ne!(ppu.read_register(0x2007, &mut bus) & 0x3F, 0x2A);
        }
    }
}
