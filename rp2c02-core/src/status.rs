//! VBlank/NMI scheduling and status register reads

use crate::Ppu;
use crate::bus::PpuBackend;
use crate::registers::{SPRITE_OVERFLOW_FLAG, VBLANK_FLAG, WriteToggle};
use crate::timing::{CpuTime, DOTS_PER_SCANLINE, PPU_TICKS_PER_CPU_CYCLE};
use bincode::{Decode, Encode};

// Roughly 20 scanlines in CPU cycles; status queries observe nothing earlier
const STATUS_HOLDOFF: CpuTime = 2272;

// Sprite overflow is approximated: the flag always reads as set once rendering is
// past this point, rather than counting sprites per scanline
const SPRITE_OVERFLOW_TIME: CpuTime =
    ((21 + 164) * DOTS_PER_SCANLINE + 100) / PPU_TICKS_PER_CPU_CYCLE;

/// A few cycles before the shortest possible frame length; end-of-frame bookkeeping
/// starts here.
pub(crate) const NEAR_FRAME_END: CpuTime = 29770;

/// One-way progress of the status flags through a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode)]
pub(crate) enum StatusPhase {
    Idle,
    SpriteZeroResolved,
    VblankSet,
}

#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct StatusSchedule {
    pub(crate) phase: StatusPhase,
    /// Applied to the status byte on the first query past the holdoff, then opened.
    pub(crate) clear_mask: u8,
    pub(crate) nmi_pending: bool,
}

impl StatusSchedule {
    pub(crate) fn new() -> Self {
        Self { phase: StatusPhase::Idle, clear_mask: 0xFF, nmi_pending: false }
    }
}

impl Ppu {
    /// Runs status flag and interrupt bookkeeping up to `time`.
    pub fn advance_status<B: PpuBackend>(&mut self, time: CpuTime, backend: &mut B) {
        if time <= STATUS_HOLDOFF + CpuTime::from(self.clock.correction >> 1) {
            return;
        }

        // Clear last frame's VBlank, sprite hit, and overflow flags the first time past
        // the holdoff
        self.regs.status &= self.schedule.clear_mask;
        self.schedule.clear_mask = 0xFF;

        if self.schedule.phase < StatusPhase::SpriteZeroResolved
            && self.sprite_zero_resolved(time, backend)
        {
            self.schedule.phase = StatusPhase::SpriteZeroResolved;
        }

        if time >= SPRITE_OVERFLOW_TIME {
            self.regs.status |= SPRITE_OVERFLOW_FLAG;

            if time >= NEAR_FRAME_END && self.schedule.phase < StatusPhase::VblankSet {
                // The odd/even decision must be final before frame_length is compared
                self.render_until(time, backend);

                if time >= self.clock.frame_length {
                    self.regs.status |= VBLANK_FLAG;
                    self.schedule.phase = StatusPhase::VblankSet;
                    self.schedule.nmi_pending = self.regs.nmi_enabled();
                }
            }
        }
    }

    pub(crate) fn read_status<B: PpuBackend>(&mut self, time: CpuTime, backend: &mut B) -> u8 {
        self.advance_status(time, backend);
        self.regs.write_toggle = WriteToggle::First;

        // A read exactly at the cycle the VBlank flag gets set suppresses the NMI;
        // with the maximum correction the boundary sits one cycle earlier and the
        // read also kills the flag itself
        if self.clock.correction != 2 {
            if time == self.clock.frame_length {
                self.schedule.nmi_pending = false;
            }
        } else if time == self.clock.frame_length - 1 {
            self.regs.status &= !VBLANK_FLAG;
            self.schedule.phase = StatusPhase::VblankSet;
            self.schedule.nmi_pending = false;
        }

        let result = self.regs.status;
        self.regs.status &= !VBLANK_FLAG;
        result
    }
}
