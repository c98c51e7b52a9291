//! Backend interface: the rendering/VRAM side of the PPU
//!
//! The timing core never draws pixels or touches VRAM itself. Everything that depends
//! on pattern tables, nametables, or palette RAM goes through this trait, and the
//! implementor can assume calls arrive in increasing time order within a frame.

use crate::registers::Registers;
use crate::timing::CpuTime;
use bincode::{Decode, Encode};

pub const OAM_LEN: usize = 256;

/// Where the renderer first drew sprite 0 over an opaque background pixel.
///
/// `scanline` is the 0-based visible scanline, `pixel` the column within it; the hit
/// registers `scanline * 341 + pixel` PPU ticks after the earliest possible hit point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct SpriteZeroHit {
    pub scanline: u16,
    pub pixel: u16,
}

/// One batched scanline rendering request.
///
/// `pixels` holds `count` rows of `pitch` bytes each, one byte per pixel. The visible
/// 256 pixels start 8 bytes into each row; the padding on both sides gives sprite
/// drawing room to overdraw without bounds checks.
#[derive(Debug)]
pub struct RenderArgs<'a> {
    pub scanline: u16,
    pub count: u16,
    pub pixels: &'a mut [u8],
    pub pitch: usize,
}

pub trait PpuBackend {
    /// Draws `args.count` scanlines starting at `args.scanline`, advancing the
    /// working VRAM address as the hardware would. Returns the position of the first
    /// sprite 0 hit if one occurred on a scanline drawn by this call.
    fn render_scanlines(
        &mut self,
        registers: &mut Registers,
        oam: &[u8; OAM_LEN],
        args: RenderArgs<'_>,
    ) -> Option<SpriteZeroHit>;

    /// Applies `count` scanlines' worth of end-of-line address updates without drawing.
    fn run_hblank(&mut self, registers: &mut Registers, count: u16);

    /// Snapshots palette RAM into the host color format, honoring the mask register's
    /// greyscale and emphasis bits. Must be idempotent when nothing changed.
    fn capture_palette(&mut self, registers: &Registers);

    /// Data register read; `address` is already masked to the 14-bit VRAM space.
    fn read_vram(&mut self, address: u16) -> u8;

    /// Data register write; returns true if the write landed in palette RAM.
    fn write_vram(&mut self, address: u16, value: u8) -> bool;

    /// VRAM address bit 12 rose during an address register write. Mapper IRQ
    /// counters watch this line.
    fn a12_clocked(&mut self, time: CpuTime);
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RenderCall {
    pub(crate) scanline: u16,
    pub(crate) count: u16,
    pub(crate) pixels_len: usize,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct RecordingBackend {
    pub(crate) vram: Box<[u8; 0x4000]>,
    pub(crate) render_calls: Vec<RenderCall>,
    pub(crate) hblank_steps: Vec<u16>,
    pub(crate) palette_captures: Vec<(bool, bool, bool, bool)>,
    pub(crate) a12_times: Vec<CpuTime>,
    /// When set, every render call scribbles this into the working VRAM address.
    pub(crate) render_vram_address: Option<u16>,
    /// Scripted sprite 0 hit, reported by the render call that draws its scanline.
    pub(crate) sprite_hit: Option<SpriteZeroHit>,
}

#[cfg(test)]
impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self {
            vram: Box::new([0; 0x4000]),
            render_calls: Vec::new(),
            hblank_steps: Vec::new(),
            palette_captures: Vec::new(),
            a12_times: Vec::new(),
            render_vram_address: None,
            sprite_hit: None,
        }
    }
}

#[cfg(test)]
impl PpuBackend for RecordingBackend {
    fn render_scanlines(
        &mut self,
        registers: &mut Registers,
        _oam: &[u8; OAM_LEN],
        args: RenderArgs<'_>,
    ) -> Option<SpriteZeroHit> {
        self.render_calls.push(RenderCall {
            scanline: args.scanline,
            count: args.count,
            pixels_len: args.pixels.len(),
        });

        // Tag each row with its scanline number so tests can check buffer placement
        for (row, chunk) in
            args.pixels.chunks_exact_mut(args.pitch).take(usize::from(args.count)).enumerate()
        {
            chunk.fill((usize::from(args.scanline) + row) as u8);
        }

        if let Some(address) = self.render_vram_address {
            registers.set_vram_address(address);
        }

        self.sprite_hit.filter(|hit| {
            (args.scanline..args.scanline + args.count).contains(&hit.scanline)
        })
    }

    fn run_hblank(&mut self, _registers: &mut Registers, count: u16) {
        self.hblank_steps.push(count);
    }

    fn capture_palette(&mut self, registers: &Registers) {
        self.palette_captures.push((
            registers.greyscale(),
            registers.emphasize_red(),
            registers.emphasize_green(),
            registers.emphasize_blue(),
        ));
    }

    fn read_vram(&mut self, address: u16) -> u8 {
        self.vram[usize::from(address)]
    }

    fn write_vram(&mut self, address: u16, value: u8) -> bool {
        self.vram[usize::from(address)] = value;
        address >= 0x3F00
    }

    fn a12_clocked(&mut self, time: CpuTime) {
        self.a12_times.push(time);
    }
}
