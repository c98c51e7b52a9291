//! The memory-mapped register file and internal scroll/address latches

use crate::num::GetBit;
use bincode::{Decode, Encode};

pub(crate) const VBLANK_FLAG: u8 = 1 << 7;
pub(crate) const SPRITE_ZERO_HIT_FLAG: u8 = 1 << 6;
pub(crate) const SPRITE_OVERFLOW_FLAG: u8 = 1 << 5;

/// Which half of a two-write register the next write lands in.
///
/// The scroll and address registers share this latch; a status read resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub(crate) enum WriteToggle {
    First,
    Second,
}

impl WriteToggle {
    fn toggle(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Register state shared between the timing core and the rendering backend.
///
/// `vram_address` / `temp_vram_address` are the chip's 15-bit v/t scroll registers;
/// the backend advances `vram_address` while drawing, and the core saves/restores it
/// around sprite-probe rendering.
#[derive(Debug, Clone, Encode, Decode)]
pub struct Registers {
    pub(crate) control: u8,
    pub(crate) mask: u8,
    pub(crate) status: u8,
    pub(crate) oam_addr: u8,
    pub(crate) fine_x_scroll: u8,
    pub(crate) vram_address: u16,
    pub(crate) temp_vram_address: u16,
    pub(crate) write_toggle: WriteToggle,
}

impl Registers {
    pub(crate) fn new() -> Self {
        Self {
            control: 0,
            mask: 0,
            // The VBlank flag reads as set at power-up
            status: VBLANK_FLAG,
            oam_addr: 0,
            fine_x_scroll: 0,
            vram_address: 0,
            temp_vram_address: 0,
            write_toggle: WriteToggle::First,
        }
    }

    /// Returns the latch half the next two-write register write lands in, and flips it.
    pub(crate) fn advance_write_toggle(&mut self) -> WriteToggle {
        let current = self.write_toggle;
        self.write_toggle = current.toggle();
        current
    }

    #[must_use]
    pub fn control(&self) -> u8 {
        self.control
    }

    #[must_use]
    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn nmi_enabled(&self) -> bool {
        self.control.bit(7)
    }

    /// 8 or 16 depending on the control register's sprite size bit.
    pub fn sprite_height(&self) -> u16 {
        if self.control.bit(5) { 16 } else { 8 }
    }

    pub(crate) fn vram_address_increment(&self) -> u16 {
        if self.control.bit(2) { 32 } else { 1 }
    }

    pub fn sprites_enabled(&self) -> bool {
        self.mask.bit(4)
    }

    pub fn bg_enabled(&self) -> bool {
        self.mask.bit(3)
    }

    /// True when either rendering layer is enabled.
    pub fn rendering_enabled(&self) -> bool {
        self.mask & 0x18 != 0
    }

    pub fn emphasize_blue(&self) -> bool {
        self.mask.bit(7)
    }

    pub fn emphasize_green(&self) -> bool {
        self.mask.bit(6)
    }

    pub fn emphasize_red(&self) -> bool {
        self.mask.bit(5)
    }

    pub fn greyscale(&self) -> bool {
        self.mask.bit(0)
    }

    #[must_use]
    pub fn vram_address(&self) -> u16 {
        self.vram_address
    }

    pub fn set_vram_address(&mut self, address: u16) {
        self.vram_address = address & 0x7FFF;
    }

    #[must_use]
    pub fn temp_vram_address(&self) -> u16 {
        self.temp_vram_address
    }

    #[must_use]
    pub fn fine_x_scroll(&self) -> u8 {
        self.fine_x_scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn control_accessors_decode_bits() {
        let mut regs = Registers::new();

        regs.control = 0x80;
        assert!(regs.nmi_enabled());
        assert_eq!(regs.sprite_height(), 8);
        assert_eq!(regs.vram_address_increment(), 1);

        regs.control = 0x24;
        assert!(!regs.nmi_enabled());
        assert_eq!(regs.sprite_height(), 16);
        assert_eq!(regs.vram_address_increment(), 32);
    }

    #[test]
    fn mask_accessors_decode_bits() {
        let mut regs = Registers::new();
        assert!(!regs.rendering_enabled());

        regs.mask = 0x08;
        assert!(regs.bg_enabled());
        assert!(!regs.sprites_enabled());
        assert!(regs.rendering_enabled());

        regs.mask = 0x10;
        assert!(!regs.bg_enabled());
        assert!(regs.sprites_enabled());
        assert!(regs.rendering_enabled());

        regs.mask = 0xE1;
        assert!(regs.greyscale());
        assert!(regs.emphasize_red());
        assert!(regs.emphasize_green());
        assert!(regs.emphasize_blue());
    }

    #[test]
    fn write_toggle_alternates() {
        let mut regs = Registers::new();

        assert_eq!(regs.advance_write_toggle(), WriteToggle::First);
        assert_eq!(regs.advance_write_toggle(), WriteToggle::Second);
        assert_eq!(regs.advance_write_toggle(), WriteToggle::First);

        regs.write_toggle = WriteToggle::First;
        assert_eq!(regs.advance_write_toggle(), WriteToggle::First);
    }

    #[test]
    fn vram_address_is_masked_to_15_bits() {
        let mut regs = Registers::new();
        regs.set_vram_address(0xFFFF);
        assert_eq!(regs.vram_address(), 0x7FFF);
    }
}
