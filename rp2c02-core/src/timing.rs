//! Frame timing: CPU-to-PPU clock conversion and the variable-length frame counters

use bincode::{Decode, Encode};

/// Absolute time in CPU cycles, as supplied by the caller. Restarts at 0 every frame.
pub type CpuTime = u64;

/// Time in PPU ticks within the current frame.
pub type PpuTime = u64;

pub const PPU_TICKS_PER_CPU_CYCLE: u64 = 3;
pub const DOTS_PER_SCANLINE: u64 = 341;
pub const SCANLINES_PER_FRAME: u64 = 262;

/// Sentinel for "no event scheduled"; far beyond any time reachable in a frame.
pub const TIME_NEVER: CpuTime = u64::MAX / 2;

// A frame nominally lasts one tick less than 341*262; the odd/even decision in the
// catch-up loop puts the tick back on frames where the hardware doesn't skip it.
pub(crate) const FRAME_DURATION_TICKS: PpuTime = DOTS_PER_SCANLINE * SCANLINES_PER_FRAME - 1;

// PPU times of the fixed per-frame events, all inside the 21-scanline pre-render region
pub(crate) const SCROLL_RELOAD_TIME: PpuTime = 20 * DOTS_PER_SCANLINE + 302;
pub(crate) const FRAME_PARITY_TIME: PpuTime = 20 * DOTS_PER_SCANLINE + 328;
pub(crate) const FIRST_SCANLINE_TIME: PpuTime = 21 * DOTS_PER_SCANLINE + 60;
pub(crate) const FIRST_HBLANK_TIME: PpuTime = 21 * DOTS_PER_SCANLINE + 251;

/// Earliest PPU time at which a sprite 0 hit can register (scanline 0, pixel 0).
pub(crate) const EARLIEST_SPRITE_HIT_TIME: PpuTime = 21 * DOTS_PER_SCANLINE + 339;

/// PPU time at which rendering activity stops for the frame.
pub(crate) const RENDER_END_TIME: PpuTime = 261 * DOTS_PER_SCANLINE;

/// Progress of the current frame through its fixed one-shot events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub(crate) enum FramePhase {
    /// Nothing run yet; the scroll reload is still pending.
    Start,
    /// Scroll reloaded; the odd/even clock-skip decision is still pending.
    ParityPending,
    /// All one-shot events done; only scanline/hblank dispatch remains.
    Steady,
}

/// Per-frame clock state tying the caller's CPU-cycle times to PPU ticks.
///
/// A frame is 341*262 - 1 = 89341 PPU ticks, which is not a multiple of the 3 ticks
/// per CPU cycle; the sub-cycle remainder rolls between frames as a 0-2 tick
/// correction term. `3 * frame_length - correction` equals the frame's raw tick count
/// at all times.
#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct FrameClock {
    pub(crate) frame_length: CpuTime,
    pub(crate) correction: u8,
    pub(crate) phase: FramePhase,
    pub(crate) scanline_time: PpuTime,
    pub(crate) hblank_time: PpuTime,
    pub(crate) scanline_count: u16,
    pub(crate) odd_frame: bool,
    pub(crate) next_wake: CpuTime,
}

impl FrameClock {
    pub(crate) fn new() -> Self {
        Self {
            frame_length: 0,
            correction: 0,
            phase: FramePhase::Steady,
            scanline_time: 0,
            hblank_time: 0,
            scanline_count: 0,
            odd_frame: false,
            next_wake: TIME_NEVER,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn ppu_time(&self, cpu_time: CpuTime) -> PpuTime {
        // Saturating so the TIME_NEVER sentinel converts without wrapping
        cpu_time.saturating_mul(PPU_TICKS_PER_CPU_CYCLE).saturating_add(u64::from(self.correction))
    }

    /// Recomputes the frame length for a new frame and rewinds all per-frame cursors.
    pub(crate) fn begin_frame(&mut self) {
        let raw_ticks = FRAME_DURATION_TICKS - u64::from(self.correction);
        self.frame_length = raw_ticks.div_ceil(PPU_TICKS_PER_CPU_CYCLE);
        self.correction = (PPU_TICKS_PER_CPU_CYCLE * self.frame_length - raw_ticks) as u8;
        debug_assert!(self.correction < 3);

        self.phase = FramePhase::Start;
        self.scanline_time = FIRST_SCANLINE_TIME;
        self.hblank_time = FIRST_HBLANK_TIME;
        self.scanline_count = 0;
        self.next_wake = SCROLL_RELOAD_TIME / PPU_TICKS_PER_CPU_CYCLE;
    }

    /// Consumes one correction tick when the hardware skips a PPU clock this frame.
    /// Underflow wraps the term and lengthens the frame by one CPU cycle.
    pub(crate) fn consume_extra_tick(&mut self) {
        if self.correction == 0 {
            self.correction = 2;
            self.frame_length += 1;
        } else {
            self.correction -= 1;
        }
    }

    #[inline]
    pub(crate) fn suspend(&mut self) {
        self.next_wake = TIME_NEVER;
    }
}
