//! Sprite evaluation and the eight per-scanline output units.
//!
//! During dots 65-256 of each visible scanline the evaluator scans primary
//! OAM for sprites in range of the *next* scanline and copies up to eight
//! into secondary OAM, raising the overflow flag on the ninth. During dots
//! 257-320 the pattern bytes are fetched and loaded into the output units,
//! which count down their X positions and shift out pixels on the following
//! scanline.

use crate::oam::{SecondaryOam, SpriteAttributes, MAX_SPRITES_PER_LINE, OAM_SIZE};

/// Scans primary OAM for the sprites visible on the next scanline.
#[derive(Debug, Default)]
pub struct SpriteEvaluator {
    /// Next sprite index to examine (0-63).
    current: u8,
    /// Evaluation finished for this line.
    done: bool,
    overflow: bool,
    sprite_zero_selected: bool,
}

impl SpriteEvaluator {
    /// Create an idle evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin evaluation for a new scanline (dot 65).
    pub fn begin(&mut self) {
        self.current = 0;
        self.done = false;
        self.overflow = false;
        self.sprite_zero_selected = false;
    }

    /// Examine one OAM entry; called once per dot in the evaluation window.
    ///
    /// `scanline` is the line being rendered now; selected sprites appear
    /// on `scanline + 1`. A sprite is in range when
    /// `scanline - y < sprite_height`.
    pub fn step(
        &mut self,
        oam: &[u8; OAM_SIZE],
        scanline: u16,
        sprite_height: u8,
        secondary: &mut SecondaryOam,
    ) {
        if self.done || self.current >= 64 {
            self.done = true;
            return;
        }

        let index = usize::from(self.current) * 4;
        let y = u16::from(oam[index]);
        let in_range = scanline >= y && scanline < y + u16::from(sprite_height);

        if in_range {
            let bytes = [oam[index], oam[index + 1], oam[index + 2], oam[index + 3]];
            if secondary.push(bytes) {
                if self.current == 0 {
                    self.sprite_zero_selected = true;
                }
            } else {
                // Ninth in-range sprite. The hardware's buggy diagonal
                // scan is not modelled; the flag itself is.
                self.overflow = true;
                self.done = true;
            }
        }

        self.current += 1;
        if self.current >= 64 {
            self.done = true;
        }
    }

    /// Whether a ninth in-range sprite was found.
    #[inline]
    #[must_use]
    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Whether sprite 0 was copied into secondary OAM.
    #[inline]
    #[must_use]
    pub fn sprite_zero_selected(&self) -> bool {
        self.sprite_zero_selected
    }
}

/// One loaded sprite output unit.
#[derive(Debug, Clone, Copy, Default)]
struct SpriteUnit {
    pattern_low: u8,
    pattern_high: u8,
    attributes: SpriteAttributes,
    /// Dots until the sprite becomes active.
    x_counter: u8,
    loaded: bool,
}

/// The eight sprite output units for the current scanline.
#[derive(Debug, Default)]
pub struct SpriteUnits {
    units: [SpriteUnit; MAX_SPRITES_PER_LINE],
    count: u8,
    sprite_zero_on_line: bool,
}

impl SpriteUnits {
    /// Create empty output units.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load sprite positions/attributes from secondary OAM (dot 257).
    /// Pattern bytes arrive separately as they are fetched.
    pub fn load_line(&mut self, secondary: &SecondaryOam, sprite_zero_selected: bool) {
        self.count = secondary.count();
        self.sprite_zero_on_line = sprite_zero_selected;
        for (i, unit) in self.units.iter_mut().enumerate() {
            if let Some(sprite) = secondary.sprite(i as u8) {
                *unit = SpriteUnit {
                    pattern_low: 0,
                    pattern_high: 0,
                    attributes: sprite.attributes,
                    x_counter: sprite.x,
                    loaded: true,
                };
            } else {
                *unit = SpriteUnit::default();
            }
        }
    }

    /// Install the fetched pattern bitplanes for one unit (dots 257-320).
    pub fn set_pattern(&mut self, index: u8, low: u8, high: u8) {
        if let Some(unit) = self.units.get_mut(usize::from(index)) {
            unit.pattern_low = low;
            unit.pattern_high = high;
        }
    }

    /// Advance one dot: active units shift, waiting units count down.
    pub fn tick(&mut self) {
        for unit in &mut self.units {
            if !unit.loaded {
                continue;
            }
            if unit.x_counter == 0 {
                unit.pattern_low <<= 1;
                unit.pattern_high <<= 1;
            } else {
                unit.x_counter -= 1;
            }
        }
    }

    /// First opaque sprite pixel at the current dot, in priority order.
    ///
    /// Returns `(pixel, palette, behind_background, is_sprite_zero)`.
    #[must_use]
    pub fn pixel(&self) -> Option<(u8, u8, bool, bool)> {
        for (i, unit) in self.units.iter().take(usize::from(self.count)).enumerate() {
            if !unit.loaded || unit.x_counter != 0 {
                continue;
            }
            let p0 = u8::from(unit.pattern_low & 0x80 != 0);
            let p1 = u8::from(unit.pattern_high & 0x80 != 0);
            let pixel = p0 | (p1 << 1);
            if pixel == 0 {
                continue;
            }
            return Some((
                pixel,
                unit.attributes.palette(),
                unit.attributes.behind_background(),
                i == 0 && self.sprite_zero_on_line,
            ));
        }
        None
    }

    /// Drop all loaded sprites (new line with empty secondary OAM).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oam::Oam;

    fn oam_with_sprites(sprites: &[[u8; 4]]) -> Oam {
        let mut oam = Oam::new();
        oam.set_addr(0);
        for sprite in sprites {
            for &byte in sprite {
                oam.write(byte);
            }
        }
        // Park remaining sprites off-screen.
        for _ in sprites.len() * 4..OAM_SIZE {
            oam.write(0xFF);
        }
        oam
    }

    fn run_evaluation(oam: &Oam, scanline: u16, height: u8) -> (SpriteEvaluator, SecondaryOam) {
        let mut evaluator = SpriteEvaluator::new();
        let mut secondary = SecondaryOam::new();
        evaluator.begin();
        for _ in 0..64 {
            evaluator.step(oam.raw(), scanline, height, &mut secondary);
        }
        (evaluator, secondary)
    }

    #[test]
    fn selects_in_range_sprites() {
        let oam = oam_with_sprites(&[
            [0x10, 0x01, 0x00, 0x20], // in range of lines 0x10-0x17
            [0x50, 0x02, 0x00, 0x30], // not in range
        ]);
        let (evaluator, secondary) = run_evaluation(&oam, 0x12, 8);
        assert_eq!(secondary.count(), 1);
        assert!(evaluator.sprite_zero_selected());
        assert!(!evaluator.overflow());
        assert_eq!(secondary.sprite(0).unwrap().tile, 0x01);
    }

    #[test]
    fn sixteen_pixel_sprites_extend_range() {
        let oam = oam_with_sprites(&[[0x10, 0x01, 0x00, 0x20]]);
        let (_, secondary) = run_evaluation(&oam, 0x1E, 16);
        assert_eq!(secondary.count(), 1);
        let (_, secondary) = run_evaluation(&oam, 0x20, 16);
        assert_eq!(secondary.count(), 0);
    }

    #[test]
    fn ninth_sprite_sets_overflow() {
        let sprites: Vec<[u8; 4]> = (0..9).map(|i| [0x40, i, 0x00, i * 8]).collect();
        let oam = oam_with_sprites(&sprites);
        let (evaluator, secondary) = run_evaluation(&oam, 0x42, 8);
        assert_eq!(secondary.count(), 8);
        assert!(evaluator.overflow());
    }

    #[test]
    fn sprite_zero_only_flagged_when_first_entry_selected() {
        let oam = oam_with_sprites(&[
            [0xF0, 0x01, 0x00, 0x00], // sprite 0 off-screen
            [0x10, 0x02, 0x00, 0x00],
        ]);
        let (evaluator, secondary) = run_evaluation(&oam, 0x12, 8);
        assert_eq!(secondary.count(), 1);
        assert!(!evaluator.sprite_zero_selected());
    }

    #[test]
    fn units_wait_for_x_then_shift() {
        let mut secondary = SecondaryOam::new();
        secondary.push([0x10, 0x00, 0x00, 3]); // x = 3
        let mut units = SpriteUnits::new();
        units.load_line(&secondary, true);
        units.set_pattern(0, 0b1000_0000, 0b0000_0000);

        // Not active for the first three dots.
        for _ in 0..3 {
            assert!(units.pixel().is_none());
            units.tick();
        }
        // Active now: first pattern bit is opaque.
        let (pixel, palette, behind, zero) = units.pixel().unwrap();
        assert_eq!(pixel, 1);
        assert_eq!(palette, 0);
        assert!(!behind);
        assert!(zero);

        // Shifted out: transparent afterwards.
        units.tick();
        assert!(units.pixel().is_none());
    }

    #[test]
    fn lower_index_wins_between_overlapping_sprites() {
        let mut secondary = SecondaryOam::new();
        secondary.push([0x10, 0x00, 0x01, 0]); // palette 1
        secondary.push([0x10, 0x00, 0x02, 0]); // palette 2
        let mut units = SpriteUnits::new();
        units.load_line(&secondary, false);
        units.set_pattern(0, 0x80, 0x00);
        units.set_pattern(1, 0x80, 0x00);

        let (_, palette, _, zero) = units.pixel().unwrap();
        assert_eq!(palette, 1);
        assert!(!zero);
    }
}
