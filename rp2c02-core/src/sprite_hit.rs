//! Lazy sprite 0 hit evaluation

use crate::Ppu;
use crate::bus::PpuBackend;
use crate::registers::SPRITE_ZERO_HIT_FLAG;
use crate::timing::{CpuTime, DOTS_PER_SCANLINE, EARLIEST_SPRITE_HIT_TIME};

impl Ppu {
    /// Returns true once the sprite 0 flag's state is final for the frame, setting the
    /// flag if the renderer-reported hit point has been reached by `time`.
    ///
    /// Forces only as much rendering as the answer requires, in batched scanline runs.
    pub(crate) fn sprite_zero_resolved<B: PpuBackend>(
        &mut self,
        time: CpuTime,
        backend: &mut B,
    ) -> bool {
        let sprite_y = u64::from(self.oam[0]);
        if sprite_y >= 239 {
            // Entirely below the visible picture; nothing to render or check
            return true;
        }

        let Some(elapsed) = self.clock.ppu_time(time).checked_sub(EARLIEST_SPRITE_HIT_TIME)
        else {
            return false;
        };
        let earliest = sprite_y * DOTS_PER_SCANLINE + u64::from(self.oam[3]);
        if elapsed < earliest {
            return false;
        }

        // Catch up to the scanlines that can decide the answer
        let scanlines_needed = (elapsed / DOTS_PER_SCANLINE + 2).min(240) as u16;
        self.render_until(time, backend);
        while self.clock.scanline_count < scanlines_needed {
            self.render_until(self.clock.next_wake, backend);
        }

        match self.sprite_hit {
            // A sprite is at most 16 scanlines tall; past that window no hit can appear
            None => elapsed >= earliest + 16 * DOTS_PER_SCANLINE,
            Some(hit) => {
                let hit_time = u64::from(hit.scanline) * DOTS_PER_SCANLINE + u64::from(hit.pixel);
                if elapsed < hit_time {
                    return false;
                }

                self.regs.status |= SPRITE_ZERO_HIT_FLAG;
                true
            }
        }
    }
}
