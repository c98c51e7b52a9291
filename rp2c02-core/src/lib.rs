//! Cycle-accurate timing and register core for the Ricoh RP2C02, the NTSC NES PPU.
//!
//! This crate emulates when things happen, not what gets drawn: register read/write
//! side effects, VBlank/NMI scheduling (including the one-cycle status read race), the
//! variable NTSC frame length, and lazy catch-up rendering driven by absolute CPU-cycle
//! times. Pixel generation, VRAM, and palette RAM live behind the [`PpuBackend`] trait.
//!
//! The driving CPU emulator calls [`Ppu::begin_frame`] / [`Ppu::end_frame`] at frame
//! boundaries and [`Ppu::read`] / [`Ppu::write`] for the `$2000-$2007` registers, always
//! with non-decreasing times within a frame.

mod bus;
mod num;
mod registers;
mod render;
mod sprite_hit;
mod status;
mod timing;

pub use bus::{OAM_LEN, PpuBackend, RenderArgs, SpriteZeroHit};
pub use registers::Registers;
pub use render::{FRAME_BUFFER_WIDTH, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use timing::{CpuTime, PpuTime, TIME_NEVER};

use crate::registers::WriteToggle;
use crate::render::RenderBuffers;
use crate::status::{NEAR_FRAME_END, StatusPhase, StatusSchedule};
use crate::timing::FrameClock;
use bincode::{Decode, Encode};

/// Serializable PPU state. Pixel buffers, frame-output enable, and the cached
/// rendering wake time are host/derived state and are not captured; loading a
/// snapshot leaves rendering suspended until the next `begin_frame`.
#[derive(Debug, Clone, Encode, Decode)]
pub struct Snapshot {
    clock: FrameClock,
    registers: Registers,
    oam: [u8; OAM_LEN],
    schedule: StatusSchedule,
    sprite_hit: Option<SpriteZeroHit>,
    palette_dirty: bool,
}

#[derive(Debug, Clone)]
pub struct Ppu {
    pub(crate) clock: FrameClock,
    pub(crate) regs: Registers,
    pub(crate) oam: [u8; OAM_LEN],
    pub(crate) schedule: StatusSchedule,
    pub(crate) render: RenderBuffers,
    pub(crate) sprite_hit: Option<SpriteZeroHit>,
}

impl Ppu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: FrameClock::new(),
            regs: Registers::new(),
            oam: [0; OAM_LEN],
            schedule: StatusSchedule::new(),
            render: RenderBuffers::new(),
            sprite_hit: None,
        }
    }

    /// Resets register and latch state to power-up defaults. A full reset also clears
    /// OAM and the pixel buffers; a partial reset models the console's reset button,
    /// which leaves sprite memory alone.
    pub fn reset(&mut self, full_reset: bool) {
        self.suspend_rendering();

        if full_reset {
            self.oam = [0; OAM_LEN];
            self.render.frame.fill(0);
            self.render.probe_strip.fill(0);
        }

        // Registers::new() leaves the VBlank flag set, as the hardware does at power-up
        self.regs = Registers::new();
        self.clock.odd_frame = false;
        self.clock.correction = 0;
        self.schedule = StatusSchedule::new();
        self.sprite_hit = None;
    }

    /// Starts a new frame: recomputes the frame length, rewinds every per-frame
    /// cursor, and arms the one-shot status flag clear.
    ///
    /// Returns the CPU time within the new frame at which the NMI raised by the
    /// previous frame's VBlank fires, or [`TIME_NEVER`] if none is due.
    pub fn begin_frame(&mut self) -> CpuTime {
        let nmi_time = if self.schedule.nmi_pending {
            if self.clock.correction == 2 { 1 } else { 2 }
        } else {
            TIME_NEVER
        };
        self.schedule.nmi_pending = false;

        self.clock.begin_frame();

        self.schedule.phase = StatusPhase::Idle;
        self.schedule.clear_mask = !0xE0;
        self.render.palette_dirty = true;
        self.render.palette_captured = false;
        self.sprite_hit = None;

        // Rendering resets the OAM pointer during the pre-render line
        self.regs.oam_addr = 0;

        nmi_time
    }

    /// Finishes the frame at `time`: runs rendering and status bookkeeping to the end,
    /// flips the frame parity, and applies the end-of-frame VRAM address adjustment
    /// the hardware performs when background rendering is enabled.
    pub fn end_frame<B: PpuBackend>(&mut self, time: CpuTime, backend: &mut B) {
        self.render_until(time, backend);
        self.advance_status(time, backend);
        self.clock.odd_frame = !self.clock.odd_frame;

        if self.regs.bg_enabled() {
            let address = self.regs.vram_address;
            self.regs.vram_address = if address & 0xFF < 0xFE {
                address + 2
            } else {
                (address ^ 0x400) - 0x1E
            };
        }
    }

    /// Reads one of the eight memory-mapped registers at `time`.
    ///
    /// Status reads never advance rendering (status is polled in tight loops); data
    /// register reads force a catch-up first since the working VRAM address affects
    /// what is being fetched.
    pub fn read<B: PpuBackend>(&mut self, time: CpuTime, address: u16, backend: &mut B) -> u8 {
        if address > 0x2007 {
            log::debug!("Read from mirrored PPU register {address:04X}");
        }

        match address & 7 {
            2 => self.read_status(time, backend),
            4 => {
                let value = self.oam[usize::from(self.regs.oam_addr)];
                // Attribute bytes have no storage for bits 2-4
                if self.regs.oam_addr & 3 == 2 { value & 0xE3 } else { value }
            }
            7 => {
                self.render_until(time, backend);
                let value = backend.read_vram(self.regs.vram_address & 0x3FFF);
                self.increment_vram_address();
                value
            }
            _ => 0,
        }
    }

    /// Writes one of the eight memory-mapped registers at `time`.
    pub fn write<B: PpuBackend>(
        &mut self,
        time: CpuTime,
        address: u16,
        value: u8,
        backend: &mut B,
    ) {
        if address > 0x2007 {
            log::debug!("Wrote to mirrored PPU register {address:04X}");
        }

        let reg = address & 7;
        if reg == 0 {
            self.write_control(time, value, backend);
            return;
        }

        // Every other register's effects are visible mid-scanline
        self.render_until(time, backend);

        match reg {
            1 => self.regs.mask = value,
            2 => {}
            3 => self.regs.oam_addr = value,
            4 => {
                self.oam[usize::from(self.regs.oam_addr)] = value;
                self.regs.oam_addr = self.regs.oam_addr.wrapping_add(1);
            }
            5 => match self.regs.advance_write_toggle() {
                WriteToggle::First => {
                    self.regs.fine_x_scroll = value & 7;
                    self.regs.temp_vram_address =
                        (self.regs.temp_vram_address & !0x001F) | u16::from(value >> 3);
                }
                WriteToggle::Second => {
                    self.regs.temp_vram_address = (self.regs.temp_vram_address & !0x73E0)
                        | (u16::from(value & 0xF8) << 2)
                        | (u16::from(value & 0x07) << 12);
                }
            },
            6 => match self.regs.advance_write_toggle() {
                WriteToggle::First => {
                    self.regs.temp_vram_address = (self.regs.temp_vram_address & !0xFF00)
                        | ((u16::from(value) << 8) & 0x3F00);
                }
                WriteToggle::Second => {
                    let rising = !self.regs.vram_address & 0x1000;
                    let new_address = (self.regs.temp_vram_address & !0x00FF) | u16::from(value);
                    self.regs.temp_vram_address = new_address;
                    self.regs.vram_address = new_address;

                    // Mapper IRQ counters clock on the A12 line rising
                    if new_address & rising != 0 {
                        backend.a12_clocked(time);
                    }
                }
            },
            7 => {
                if backend.write_vram(self.regs.vram_address & 0x3FFF, value) {
                    self.render.palette_dirty = true;
                }
                self.increment_vram_address();
            }
            _ => unreachable!("reg is address & 7 with 0 handled above"),
        }
    }

    fn write_control<B: PpuBackend>(&mut self, time: CpuTime, value: u8, backend: &mut B) {
        // Catch up only when the change affects what is currently being fetched:
        // nametable select relative to temp bits 10-11, or sprite/background
        // pattern table and sprite size bits
        let nametable_changed = ((self.regs.temp_vram_address >> 10) as u8 ^ value) & 3 != 0;
        let fetch_bits_changed = (self.regs.control ^ value) & 0x38 != 0;
        if nametable_changed || fetch_bits_changed {
            self.render_until(time, backend);
        }

        // An NMI enable toggle near the end of the frame interacts with the VBlank
        // flag timing; bring status bookkeeping up to the cycle before this write
        if time >= NEAR_FRAME_END && (self.regs.control ^ value) & 0x80 != 0 {
            self.render_until(time, backend);
            self.advance_status(time - 1 + CpuTime::from(self.clock.correction >> 1), backend);
        }

        self.regs.temp_vram_address =
            (self.regs.temp_vram_address & !0x0C00) | (u16::from(value & 3) << 10);
        self.regs.control = value;
    }

    fn increment_vram_address(&mut self) {
        self.regs.vram_address =
            self.regs.vram_address.wrapping_add(self.regs.vram_address_increment()) & 0x7FFF;
    }

    /// Prevents `render_until` from doing any work until the next `begin_frame`.
    /// Used while loading snapshots so state fixups don't trigger partial renders.
    pub fn suspend_rendering(&mut self) {
        self.clock.suspend();
    }

    /// Length of the current frame in CPU cycles (29780 or 29781). Only final once
    /// rendering has advanced past the odd/even decision point.
    #[must_use]
    pub fn frame_length(&self) -> CpuTime {
        self.clock.frame_length
    }

    /// CPU time of the next scheduled rendering activity. Callers that poll can skip
    /// `render_until` calls before this time.
    #[must_use]
    pub fn next_wake_time(&self) -> CpuTime {
        self.clock.next_wake
    }

    /// The frame pixel buffer: [`SCREEN_HEIGHT`] rows of [`FRAME_BUFFER_WIDTH`] bytes,
    /// with the visible 256 pixels at columns `8..264` of each row. Valid between
    /// `end_frame` and the next `begin_frame`.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        &self.render.frame
    }

    /// Enables or disables pixel output for subsequent frames (frame skip). Sprite 0
    /// hit timing stays exact either way via a bounded offscreen probe strip.
    pub fn set_frame_output_enabled(&mut self, enabled: bool) {
        self.render.frame_output_enabled = enabled;
    }

    #[must_use]
    pub fn save_state(&self) -> Snapshot {
        Snapshot {
            clock: self.clock.clone(),
            registers: self.regs.clone(),
            oam: self.oam,
            schedule: self.schedule.clone(),
            sprite_hit: self.sprite_hit,
            palette_dirty: self.render.palette_dirty,
        }
    }

    pub fn load_state(&mut self, snapshot: &Snapshot) {
        self.clock = snapshot.clock.clone();
        self.regs = snapshot.registers.clone();
        self.oam = snapshot.oam;
        self.schedule = snapshot.schedule.clone();
        self.sprite_hit = snapshot.sprite_hit;
        self.render.palette_dirty = snapshot.palette_dirty;
        self.render.palette_captured = false;

        self.suspend_rendering();
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RecordingBackend;
    use crate::registers::VBLANK_FLAG;
    use test_log::test;

    fn new_ppu() -> Ppu {
        let mut ppu = Ppu::new();
        ppu.begin_frame();
        ppu
    }

    #[test]
    fn vblank_flag_reads_set_at_power_up() {
        let mut ppu = Ppu::new();
        let mut backend = RecordingBackend::new();

        let value = ppu.read(0, 0x2002, &mut backend);
        assert_ne!(value & VBLANK_FLAG, 0);
    }

    #[test]
    fn control_write_round_trips_nametable_bits() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        for value in [0x00, 0x01, 0x02, 0x03, 0x91, 0xFF] {
            ppu.write(100, 0x2000, value, &mut backend);
            assert_eq!(
                (ppu.regs.temp_vram_address >> 10) & 3,
                u16::from(value & 3),
                "control write {value:02X}"
            );
        }
    }

    #[test]
    fn control_write_skips_catch_up_when_fetch_state_is_unaffected() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        // NMI enable alone, early in the frame, touches neither nametable nor
        // pattern bits: no rendering should be forced
        ppu.write(15_000, 0x2000, 0x80, &mut backend);
        assert!(backend.render_calls.is_empty());

        // Changing a pattern table bit forces a catch-up
        ppu.write(15_001, 0x2000, 0x90, &mut backend);
        assert!(!backend.render_calls.is_empty());
    }

    #[test]
    fn mask_write_always_catches_up() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(15_000, 0x2001, 0x00, &mut backend);
        assert!(!backend.render_calls.is_empty());
    }

    #[test]
    fn oam_data_read_masks_attribute_bytes() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.oam[0x41] = 0xFF;
        ppu.oam[0x42] = 0xFF;

        ppu.write(100, 0x2003, 0x41, &mut backend);
        assert_eq!(ppu.read(101, 0x2004, &mut backend), 0xFF);

        ppu.write(102, 0x2003, 0x42, &mut backend);
        assert_eq!(ppu.read(103, 0x2004, &mut backend), 0xE3);
    }

    #[test]
    fn oam_data_write_increments_pointer_with_wrap() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(100, 0x2003, 0xFF, &mut backend);
        ppu.write(101, 0x2004, 0xAB, &mut backend);
        ppu.write(102, 0x2004, 0xCD, &mut backend);

        assert_eq!(ppu.oam[0xFF], 0xAB);
        assert_eq!(ppu.oam[0x00], 0xCD);
        assert_eq!(ppu.regs.oam_addr, 1);
    }

    #[test]
    fn oam_data_read_does_not_increment_pointer() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(100, 0x2003, 0x10, &mut backend);
        ppu.read(101, 0x2004, &mut backend);
        assert_eq!(ppu.regs.oam_addr, 0x10);
    }

    #[test]
    fn scroll_writes_fill_temp_address_fields() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(100, 0x2005, 0x7D, &mut backend);
        assert_eq!(ppu.regs.fine_x_scroll, 5);
        assert_eq!(ppu.regs.temp_vram_address & 0x1F, 0x0F);

        ppu.write(101, 0x2005, 0x5E, &mut backend);
        // coarse Y = 0x0B in bits 5-9, fine Y = 6 in bits 12-14
        assert_eq!((ppu.regs.temp_vram_address >> 5) & 0x1F, 0x0B);
        assert_eq!(ppu.regs.temp_vram_address >> 12, 6);
    }

    #[test]
    fn address_writes_load_temp_then_copy_to_working() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(100, 0x2006, 0xFF, &mut backend);
        // High byte is masked into the 14-bit space
        assert_eq!(ppu.regs.temp_vram_address & 0xFF00, 0x3F00);
        assert_eq!(ppu.regs.vram_address, 0);

        ppu.write(101, 0x2006, 0x21, &mut backend);
        assert_eq!(ppu.regs.temp_vram_address, 0x3F21);
        assert_eq!(ppu.regs.vram_address, 0x3F21);
    }

    #[test]
    fn status_read_resets_shared_write_parity() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        // Scroll x2 leaves the latch back at first; one address write advances it
        ppu.write(100, 0x2005, 0x10, &mut backend);
        ppu.write(101, 0x2005, 0x20, &mut backend);
        ppu.write(102, 0x2006, 0x2C, &mut backend);
        assert_eq!(ppu.regs.write_toggle, WriteToggle::Second);

        ppu.read(103, 0x2002, &mut backend);
        assert_eq!(ppu.regs.write_toggle, WriteToggle::First);

        // The next scroll write acts as a first write: fine X, not coarse Y
        ppu.write(104, 0x2005, 0x07, &mut backend);
        assert_eq!(ppu.regs.fine_x_scroll, 7);
    }

    #[test]
    fn a12_hook_fires_only_on_rising_edge() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        // 0 -> 1: fires
        ppu.write(100, 0x2006, 0x10, &mut backend);
        ppu.write(101, 0x2006, 0x00, &mut backend);
        assert_eq!(backend.a12_times, vec![101]);

        // 1 -> 1: no edge
        ppu.write(102, 0x2006, 0x1F, &mut backend);
        ppu.write(103, 0x2006, 0x80, &mut backend);
        assert_eq!(backend.a12_times, vec![101]);

        // 1 -> 0: no edge
        ppu.write(104, 0x2006, 0x20, &mut backend);
        ppu.write(105, 0x2006, 0x00, &mut backend);
        assert_eq!(backend.a12_times, vec![101]);

        // 0 -> 1 again: fires
        ppu.write(106, 0x2006, 0x10, &mut backend);
        ppu.write(107, 0x2006, 0x00, &mut backend);
        assert_eq!(backend.a12_times, vec![101, 107]);
    }

    #[test]
    fn data_register_uses_control_increment_mode() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();
        backend.vram[0x2000] = 0x55;
        backend.vram[0x2001] = 0x66;

        ppu.write(100, 0x2006, 0x20, &mut backend);
        ppu.write(101, 0x2006, 0x00, &mut backend);

        assert_eq!(ppu.read(102, 0x2007, &mut backend), 0x55);
        assert_eq!(ppu.read(103, 0x2007, &mut backend), 0x66);
        assert_eq!(ppu.regs.vram_address, 0x2002);

        // Increment-by-32 mode
        ppu.write(104, 0x2000, 0x04, &mut backend);
        ppu.write(105, 0x2007, 0x77, &mut backend);
        assert_eq!(backend.vram[0x2002], 0x77);
        assert_eq!(ppu.regs.vram_address, 0x2022);
    }

    #[test]
    fn palette_write_marks_palette_dirty() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.regs.mask = 0x18;
        ppu.render_until(10_000, &mut backend);
        assert!(!ppu.render.palette_dirty);

        ppu.write(10_100, 0x2006, 0x3F, &mut backend);
        ppu.write(10_101, 0x2006, 0x00, &mut backend);
        ppu.write(10_102, 0x2007, 0x30, &mut backend);
        assert!(ppu.render.palette_dirty);

        // Non-palette writes don't
        ppu.write(10_103, 0x2006, 0x20, &mut backend);
        ppu.write(10_104, 0x2006, 0x00, &mut backend);
        ppu.write(10_105, 0x2007, 0x30, &mut backend);
        assert!(ppu.render.palette_dirty);
        ppu.render.palette_dirty = false;
        ppu.write(10_106, 0x2007, 0x31, &mut backend);
        assert!(!ppu.render.palette_dirty);
    }

    #[test]
    fn mirrored_addresses_hit_the_same_registers() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(100, 0x2ABB, 0x41, &mut backend);
        assert_eq!(ppu.regs.oam_addr, 0x41);

        ppu.oam[0x41] = 0x99;
        assert_eq!(ppu.read(101, 0x3FFC, &mut backend), 0x99);
    }

    #[test]
    fn end_frame_adjusts_vram_address_when_bg_enabled() {
        let mut backend = RecordingBackend::new();

        let mut ppu = new_ppu();
        ppu.regs.mask = 0x08;
        let frame_length = ppu.frame_length();
        // Render past the frame-start scroll reload before planting the address
        ppu.render_until(frame_length, &mut backend);
        ppu.regs.vram_address = 0x2010;
        ppu.end_frame(frame_length, &mut backend);
        assert_eq!(ppu.regs.vram_address, 0x2012);

        // Low byte 0xFE takes the nametable-flip branch
        let mut ppu = new_ppu();
        ppu.regs.mask = 0x08;
        let frame_length = ppu.frame_length();
        ppu.render_until(frame_length, &mut backend);
        ppu.regs.vram_address = 0x20FE;
        ppu.end_frame(frame_length, &mut backend);
        assert_eq!(ppu.regs.vram_address, 0x24E0);

        // Background disabled: untouched
        let mut ppu = new_ppu();
        let frame_length = ppu.frame_length();
        ppu.regs.vram_address = 0x2010;
        ppu.end_frame(frame_length, &mut backend);
        assert_eq!(ppu.regs.vram_address, 0x2010);
    }

    #[test]
    fn end_frame_flips_parity() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        assert!(!ppu.clock.odd_frame);
        let frame_length = ppu.frame_length();
        ppu.end_frame(frame_length, &mut backend);
        assert!(ppu.clock.odd_frame);
    }

    #[test]
    fn reset_restores_power_up_register_state() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(100, 0x2000, 0xFF, &mut backend);
        ppu.write(101, 0x2001, 0xFF, &mut backend);
        ppu.write(102, 0x2005, 0x12, &mut backend);
        ppu.oam[0] = 0x34;

        ppu.reset(false);
        assert_eq!(ppu.regs.control, 0);
        assert_eq!(ppu.regs.mask, 0);
        assert_eq!(ppu.regs.status, VBLANK_FLAG);
        assert_eq!(ppu.regs.write_toggle, WriteToggle::First);
        assert_eq!(ppu.next_wake_time(), TIME_NEVER);
        // Partial reset keeps OAM
        assert_eq!(ppu.oam[0], 0x34);

        ppu.reset(true);
        assert_eq!(ppu.oam[0], 0);
    }

    #[test]
    fn snapshot_round_trips_and_suspends_rendering() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        ppu.write(100, 0x2000, 0x91, &mut backend);
        ppu.write(101, 0x2001, 0x18, &mut backend);
        ppu.write(102, 0x2003, 0x20, &mut backend);
        ppu.write(103, 0x2004, 0x77, &mut backend);
        ppu.write(104, 0x2005, 0x3C, &mut backend);
        ppu.render_until(12_000, &mut backend);

        let snapshot = ppu.save_state();
        let encoded = bincode::encode_to_vec(&snapshot, bincode::config::standard()).unwrap();
        let (decoded, _) = bincode::decode_from_slice::<Snapshot, _>(
            &encoded,
            bincode::config::standard(),
        )
        .unwrap();

        let mut restored = Ppu::new();
        restored.load_state(&decoded);

        assert_eq!(restored.regs.control, ppu.regs.control);
        assert_eq!(restored.regs.mask, ppu.regs.mask);
        assert_eq!(restored.regs.temp_vram_address, ppu.regs.temp_vram_address);
        assert_eq!(restored.regs.fine_x_scroll, ppu.regs.fine_x_scroll);
        assert_eq!(restored.regs.write_toggle, ppu.regs.write_toggle);
        assert_eq!(restored.oam, ppu.oam);
        assert_eq!(restored.frame_length(), ppu.frame_length());
        assert_eq!(restored.clock.correction, ppu.clock.correction);
        assert_eq!(restored.clock.scanline_count, ppu.clock.scanline_count);
        assert_eq!(restored.next_wake_time(), TIME_NEVER);

        // Suspended: no renderer activity until the next begin_frame
        let calls = backend.render_calls.len();
        restored.render_until(25_000, &mut backend);
        assert_eq!(backend.render_calls.len(), calls);
    }

    #[test]
    fn full_frame_scenario_sets_vblank_and_schedules_nmi() {
        let mut ppu = new_ppu();
        let mut backend = RecordingBackend::new();

        assert_eq!(ppu.begin_frame(), TIME_NEVER);

        ppu.write(0, 0x2000, 0x80, &mut backend);
        ppu.write(0, 0x2001, 0x18, &mut backend);

        ppu.render_until(29_780, &mut backend);
        let frame_length = ppu.frame_length();
        ppu.end_frame(frame_length, &mut backend);

        assert_ne!(ppu.regs.status & VBLANK_FLAG, 0);

        // This frame carried a correction of 1, so the NMI lands two cycles into
        // the next frame; a correction of 2 would move it one cycle earlier
        assert_eq!(ppu.clock.correction, 1);
        assert_eq!(ppu.begin_frame(), 2);
    }
}
