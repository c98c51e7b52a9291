//! Demand-driven rendering: the catch-up loop and batched scanline dispatch

use crate::Ppu;
use crate::bus::{PpuBackend, RenderArgs, SpriteZeroHit};
use crate::timing::{
    CpuTime, DOTS_PER_SCANLINE, FRAME_PARITY_TIME, FramePhase, PPU_TICKS_PER_CPU_CYCLE,
    RENDER_END_TIME,
};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

/// Row stride of the frame buffer: 8 pixels of sprite overdraw padding on each side.
pub const FRAME_BUFFER_WIDTH: usize = SCREEN_WIDTH + 16;

// Tall enough for one sprite of either size
pub(crate) const PROBE_STRIP_HEIGHT: usize = 16;

/// Pixel output and per-frame palette bookkeeping. Not part of snapshots.
#[derive(Debug, Clone)]
pub(crate) struct RenderBuffers {
    pub(crate) frame: Box<[u8]>,
    pub(crate) probe_strip: Box<[u8]>,
    pub(crate) frame_output_enabled: bool,
    pub(crate) palette_dirty: bool,
    pub(crate) palette_captured: bool,
}

impl RenderBuffers {
    pub(crate) fn new() -> Self {
        Self {
            frame: vec![0; SCREEN_HEIGHT * FRAME_BUFFER_WIDTH].into_boxed_slice(),
            probe_strip: vec![0; PROBE_STRIP_HEIGHT * FRAME_BUFFER_WIDTH].into_boxed_slice(),
            frame_output_enabled: true,
            palette_dirty: true,
            palette_captured: false,
        }
    }
}

impl Ppu {
    /// Runs rendering activity up to `time`. Cheap no-op when nothing is due before
    /// then; repeated calls with the same time do no additional work.
    pub fn render_until<B: PpuBackend>(&mut self, time: CpuTime, backend: &mut B) {
        if time >= self.clock.next_wake {
            self.catch_up(time, backend);
        }
    }

    fn catch_up<B: PpuBackend>(&mut self, cpu_time: CpuTime, backend: &mut B) {
        let time = self.clock.ppu_time(cpu_time).min(RENDER_END_TIME);

        if self.clock.phase == FramePhase::Start {
            self.clock.phase = FramePhase::ParityPending;

            // Hardware reloads the scroll address from temp at the start of rendering
            if self.regs.bg_enabled() {
                self.regs.vram_address = self.regs.temp_vram_address;
            }
        }

        if self.clock.phase == FramePhase::ParityPending {
            if time <= FRAME_PARITY_TIME {
                self.clock.next_wake = FRAME_PARITY_TIME / PPU_TICKS_PER_CPU_CYCLE + 1;
                return;
            }

            self.clock.phase = FramePhase::Steady;

            // Only even frames with background rendering enabled keep the short frame
            // length; every other frame gets the skipped tick back.
            if !self.regs.bg_enabled() || self.clock.odd_frame {
                self.clock.consume_extra_tick();
            }
        }

        // Hblank left pending by the previous batch
        if self.clock.hblank_time < self.clock.scanline_time && self.clock.hblank_time < time {
            self.clock.hblank_time += DOTS_PER_SCANLINE;
            backend.run_hblank(&mut self.regs, 1);
        }

        let mut count: u16 = 0;
        while self.clock.scanline_time < time {
            self.clock.scanline_time += DOTS_PER_SCANLINE;
            count += 1;
        }
        if count > 0 {
            self.run_scanlines(count, backend);
        }

        // Hblank of the last scanline, if already due
        if self.clock.hblank_time < time {
            self.clock.hblank_time += DOTS_PER_SCANLINE;
            backend.run_hblank(&mut self.regs, 1);
        }
        debug_assert!(time <= self.clock.hblank_time);

        self.clock.next_wake =
            self.clock.scanline_time.min(self.clock.hblank_time) / PPU_TICKS_PER_CPU_CYCLE + 1;
    }

    fn run_scanlines<B: PpuBackend>(&mut self, count: u16, backend: &mut B) {
        // Hblanks between batched scanlines are serviced here; only the last
        // scanline's hblank stays with the catch-up loop
        self.clock.hblank_time += DOTS_PER_SCANLINE * u64::from(count - 1);

        if self.render.palette_dirty && self.regs.rendering_enabled() {
            self.render.palette_dirty = false;
            self.render.palette_captured = true;
            backend.capture_palette(&self.regs);
        }

        let saved_vram_address = self.regs.vram_address;

        let begin = self.clock.scanline_count;
        self.clock.scanline_count = begin + count;
        debug_assert!(usize::from(begin + count) <= SCREEN_HEIGHT);

        // A frame that never enables rendering still needs host palette data
        if self.clock.scanline_count >= SCREEN_HEIGHT as u16 && !self.render.palette_captured {
            self.render.palette_captured = true;
            self.render.palette_dirty = false;
            backend.capture_palette(&self.regs);
        }

        log::trace!("Dispatching scanlines {begin}..{}", begin + count);

        if self.render.frame_output_enabled {
            let offset = usize::from(begin) * FRAME_BUFFER_WIDTH;
            let len = usize::from(count) * FRAME_BUFFER_WIDTH;
            let hit = backend.render_scanlines(
                &mut self.regs,
                &self.oam,
                RenderArgs {
                    scanline: begin,
                    count,
                    pixels: &mut self.render.frame[offset..offset + len],
                    pitch: FRAME_BUFFER_WIDTH,
                },
            );
            self.latch_sprite_hit(hit);
        } else if self.regs.bg_enabled() && self.regs.sprites_enabled() {
            // Frame output is skipped, but sprite 0 hits must still be observable:
            // render only the scanlines sprite 0 can occupy, into the probe strip
            let sprite_row = u16::from(self.oam[0]) + 1;
            let skip = count.min(sprite_row.saturating_sub(begin));
            backend.run_hblank(&mut self.regs, skip);

            let visible = (count - skip).min(self.regs.sprite_height());
            debug_assert!(skip + visible <= count);
            debug_assert!(usize::from(visible) <= PROBE_STRIP_HEIGHT);

            if visible > 0 {
                let len = usize::from(visible) * FRAME_BUFFER_WIDTH;
                let hit = backend.render_scanlines(
                    &mut self.regs,
                    &self.oam,
                    RenderArgs {
                        scanline: begin + skip,
                        count: visible,
                        pixels: &mut self.render.probe_strip[..len],
                        pitch: FRAME_BUFFER_WIDTH,
                    },
                );
                self.latch_sprite_hit(hit);
            }
        }

        // Sprite probing must not perturb the address used for background fetches
        self.regs.vram_address = saved_vram_address;

        backend.run_hblank(&mut self.regs, count - 1);
    }

    fn latch_sprite_hit(&mut self, hit: Option<SpriteZeroHit>) {
        if self.sprite_hit.is_none() {
            self.sprite_hit = hit;
        }
    }
}
