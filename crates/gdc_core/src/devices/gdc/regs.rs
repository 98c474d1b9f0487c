/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    devices::gdc::regs.rs

    The GDC register file.

    Holds display geometry, cursor and zoom settings, the drawing address
    registers and parameter RAM. The setters here take raw parameter bytes and
    apply the documented bit layouts; they never touch the FIFO or timing.

*/

use modular_bitfield::prelude::*;
use serde_derive::{Deserialize, Serialize};
use strum_macros::Display;

pub const EAD_MASK: u32 = 0x3FFFF;
pub const PRAM_SIZE: usize = 16;
pub const SYNC_PARAM_COUNT: usize = 8;

pub const DEFAULT_ACTIVE_WORDS: u16 = 40;
pub const DEFAULT_ACTIVE_LINES: u16 = 400;
pub const DEFAULT_HSYNC_WIDTH: u8 = 4;
pub const DEFAULT_HFRONT_PORCH: u8 = 4;
pub const DEFAULT_HBACK_PORCH: u8 = 8;
pub const DEFAULT_VSYNC_WIDTH: u8 = 8;
pub const DEFAULT_VFRONT_PORCH: u8 = 7;
pub const DEFAULT_VBACK_PORCH: u8 = 25;
pub const DEFAULT_LINES_PER_ROW: u8 = 16;
pub const DEFAULT_BLINK_RATE: u8 = 12;

pub const FIGS_DEFAULT_DC: u16 = 0;
pub const FIGS_DEFAULT_D: u16 = 8;
pub const FIGS_DEFAULT_D2: u16 = 8;
pub const FIGS_DEFAULT_D1: u16 = 0xFFFF;
pub const FIGS_DEFAULT_DM: u16 = 0xFFFF;

#[bitfield]
#[derive(Copy, Clone)]
pub struct SyncModeByte {
    pub s: bool,
    pub g: bool,
    pub d: bool,
    pub i: bool,
    pub f: bool,
    pub c: bool,
    #[skip]
    unused: B2,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct FigsByte {
    pub dir: B3,
    pub l:   bool,
    pub gc:  bool,
    pub a:   bool,
    pub r:   bool,
    pub sl:  bool,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct PartitionFlags {
    pub len_hi: B6,
    pub image:  bool,
    pub wide:   bool,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct CcharRowByte {
    pub lines_per_row: B5,
    #[skip]
    unused: B2,
    pub cursor_display: bool,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct CcharTopByte {
    pub top: B5,
    pub steady: bool,
    pub blink_lo: B2,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct CcharBottomByte {
    pub blink_hi: B3,
    pub bottom: B5,
}

#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    Mixed,
    Graphics,
    Character,
    Invalid,
}

impl From<u8> for DisplayMode {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => DisplayMode::Mixed,
            1 => DisplayMode::Graphics,
            2 => DisplayMode::Character,
            _ => DisplayMode::Invalid,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum InterlaceMode {
    #[default]
    Off,
    RepeatField,
    Interlaced,
    Invalid,
}

impl InterlaceMode {
    pub fn from_bits(i: bool, s: bool) -> Self {
        match (i, s) {
            (false, false) => InterlaceMode::Off,
            (true, false) => InterlaceMode::RepeatField,
            (true, true) => InterlaceMode::Interlaced,
            (false, true) => InterlaceMode::Invalid,
        }
    }

    /// Output rows produced per source line.
    pub fn line_multiplier(&self) -> u32 {
        match self {
            InterlaceMode::Interlaced => 2,
            _ => 1,
        }
    }
}

/// Read-modify-write operation applied when the GDC writes display memory.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum WriteMode {
    #[default]
    Replace,
    Complement,
    Reset,
    Set,
}

impl From<u8> for WriteMode {
    fn from(bits: u8) -> Self {
        match bits & 0x03 {
            0 => WriteMode::Replace,
            1 => WriteMode::Complement,
            2 => WriteMode::Reset,
            _ => WriteMode::Set,
        }
    }
}

impl WriteMode {
    #[inline]
    pub fn apply(&self, old: u16, data: u16, mask: u16) -> u16 {
        match self {
            WriteMode::Replace => (data & mask) | (old & !mask),
            WriteMode::Complement => old ^ (data & mask),
            WriteMode::Reset => old & !(data & mask),
            WriteMode::Set => old | (data & mask),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransferType {
    #[default]
    Word,
    LowByte,
    HighByte,
}

impl TransferType {
    /// Decode bits 4..3 of a WDAT/RDAT/DMAR/DMAW opcode.
    pub fn from_opcode(opcode: u8) -> Self {
        match (opcode >> 3) & 0x03 {
            0 => TransferType::Word,
            2 => TransferType::LowByte,
            3 => TransferType::HighByte,
            _ => {
                log::warn!("Invalid transfer type in opcode {:02X}, using word transfer", opcode);
                TransferType::Word
            }
        }
    }

    /// Bytes per transfer unit.
    pub fn unit_size(&self) -> u8 {
        match self {
            TransferType::Word => 2,
            _ => 1,
        }
    }
}

/// Figure drawing parameters, as loaded by FIGS.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FigureParams {
    pub sl: bool,
    pub r: bool,
    pub a: bool,
    pub gc: bool,
    pub l: bool,
    pub dir: u8,
    pub dc: u16,
    pub gd: bool,
    pub d: u16,
    pub d2: u16,
    pub d1: u16,
    pub dm: u16,
}

impl Default for FigureParams {
    fn default() -> Self {
        Self {
            sl: false,
            r: false,
            a: false,
            gc: false,
            l: false,
            dir: 0,
            dc: FIGS_DEFAULT_DC,
            gd: false,
            d: FIGS_DEFAULT_D,
            d2: FIGS_DEFAULT_D2,
            d1: FIGS_DEFAULT_D1,
            dm: FIGS_DEFAULT_DM,
        }
    }
}

impl FigureParams {
    /// Restore defaults, keeping the figure flags and direction.
    pub fn reset_values(&mut self) {
        self.dc = FIGS_DEFAULT_DC;
        self.gd = false;
        self.d = FIGS_DEFAULT_D;
        self.d2 = FIGS_DEFAULT_D2;
        self.d1 = FIGS_DEFAULT_D1;
        self.dm = FIGS_DEFAULT_DM;
    }
}

/// A display partition decoded from parameter RAM.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub start: u32,
    pub length: u16,
    pub image: bool,
    pub wide: bool,
}

impl Partition {
    /// Number of scanlines covered.
    #[inline]
    pub fn span(&self) -> u32 {
        self.length as u32 + 1
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisterFile {
    pub mode: DisplayMode,
    pub interlace: InterlaceMode,
    pub dram_refresh: bool,
    pub draw_on_retrace: bool,
    pub display_enabled: bool,
    pub vsync_master: bool,

    pub active_words: u16,
    pub pitch: u16,
    pub hsync_width: u8,
    pub hfront_porch: u8,
    pub hback_porch: u8,
    pub vsync_width: u8,
    pub vfront_porch: u8,
    pub vback_porch: u8,
    pub active_lines: u16,

    pub cursor_enabled: bool,
    pub cursor_steady: bool,
    pub blink_rate: u8,
    pub cursor_top: u8,
    pub cursor_bottom: u8,
    pub lines_per_row: u8,

    pub zoom_display: u8,
    pub zoom_gchr: u8,

    pub ead: u32,
    pub dad: u8,
    pub mask: u16,
    pub lpen_address: u32,

    pub pram: [u8; PRAM_SIZE],
    pub figs: FigureParams,
    pub write_mode: WriteMode,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Mixed,
            interlace: InterlaceMode::Off,
            dram_refresh: false,
            draw_on_retrace: false,
            display_enabled: false,
            vsync_master: true,

            active_words: DEFAULT_ACTIVE_WORDS,
            pitch: DEFAULT_ACTIVE_WORDS,
            hsync_width: DEFAULT_HSYNC_WIDTH,
            hfront_porch: DEFAULT_HFRONT_PORCH,
            hback_porch: DEFAULT_HBACK_PORCH,
            vsync_width: DEFAULT_VSYNC_WIDTH,
            vfront_porch: DEFAULT_VFRONT_PORCH,
            vback_porch: DEFAULT_VBACK_PORCH,
            active_lines: DEFAULT_ACTIVE_LINES,

            cursor_enabled: false,
            cursor_steady: false,
            blink_rate: DEFAULT_BLINK_RATE,
            cursor_top: 0,
            cursor_bottom: DEFAULT_LINES_PER_ROW - 1,
            lines_per_row: DEFAULT_LINES_PER_ROW,

            zoom_display: 1,
            zoom_gchr: 1,

            ead: 0,
            dad: 0,
            mask: 0,
            lpen_address: 0,

            pram: [0; PRAM_SIZE],
            figs: FigureParams::default(),
            write_mode: WriteMode::Replace,
        }
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register effects of RESET. Geometry is left alone.
    pub fn reset(&mut self) {
        self.display_enabled = false;
        self.ead = 0;
        self.dad = 0;
        self.mask = 0;
        self.lpen_address = 0;
        self.zoom_display = 1;
        self.zoom_gchr = 1;
        self.cursor_enabled = false;
        self.figs = FigureParams::default();
        self.write_mode = WriteMode::Replace;
        self.pitch = self.active_words;
    }

    pub fn apply_sync(&mut self, p: &[u8; SYNC_PARAM_COUNT]) {
        let mode = SyncModeByte::from_bytes([p[0]]);
        self.mode = DisplayMode::from((mode.c() as u8) << 1 | mode.g() as u8);
        self.interlace = InterlaceMode::from_bits(mode.i(), mode.s());
        self.dram_refresh = mode.d();
        self.draw_on_retrace = mode.f();

        self.active_words = p[1] as u16 + 2;
        self.hsync_width = (p[2] & 0x1F) + 1;
        self.vsync_width = (p[2] >> 5) | ((p[3] & 0x03) << 3);
        self.hfront_porch = (p[3] >> 2) + 1;
        self.hback_porch = (p[4] & 0x3F) + 1;
        self.vfront_porch = p[5] & 0x3F;
        self.active_lines = p[6] as u16 | ((p[7] & 0x03) as u16) << 8;
        self.vback_porch = p[7] >> 2;
        self.pitch = self.active_words;

        log::debug!(
            "SYNC: mode {} interlace {} aw {} hs {} hfp {} hbp {} al {} vs {} vfp {} vbp {}",
            self.mode,
            self.interlace,
            self.active_words,
            self.hsync_width,
            self.hfront_porch,
            self.hback_porch,
            self.active_lines,
            self.vsync_width,
            self.vfront_porch,
            self.vback_porch
        );
    }

    pub fn apply_cchar(&mut self, p: &[u8; 3]) {
        let row = CcharRowByte::from_bytes([p[0]]);
        let top = CcharTopByte::from_bytes([p[1]]);
        let bottom = CcharBottomByte::from_bytes([p[2]]);

        self.cursor_enabled = row.cursor_display();
        self.lines_per_row = row.lines_per_row() + 1;
        self.cursor_steady = top.steady();
        self.cursor_top = top.top();
        self.cursor_bottom = bottom.bottom();
        self.blink_rate = bottom.blink_hi() << 2 | top.blink_lo();

        log::debug!(
            "CCHAR: cursor {} steady {} lines/row {} top {} bottom {} blink rate {}",
            self.cursor_enabled,
            self.cursor_steady,
            self.lines_per_row,
            self.cursor_top,
            self.cursor_bottom,
            self.blink_rate
        );
    }

    pub fn apply_zoom(&mut self, byte: u8) {
        self.zoom_display = (byte >> 4) + 1;
        self.zoom_gchr = (byte & 0x0F) + 1;
    }

    /// CURS with three or four parameter bytes.
    pub fn apply_curs(&mut self, p: &[u8]) {
        if p.len() < 3 {
            return;
        }
        self.ead = (p[0] as u32 | (p[1] as u32) << 8 | ((p[2] & 0x03) as u32) << 16) & EAD_MASK;
        self.dad = match p.get(3) {
            Some(b) => b >> 4,
            None => p[2] >> 4,
        };
        self.mask = 1 << self.dad;
    }

    pub fn apply_mask(&mut self, lo: u8, hi: u8) {
        self.mask = lo as u16 | (hi as u16) << 8;
    }

    pub fn apply_pitch(&mut self, byte: u8) {
        self.pitch = byte as u16;
    }

    /// FIGS with one to eleven parameter bytes. Values not supplied take their defaults.
    pub fn apply_figs(&mut self, p: &[u8]) {
        let Some(&first) = p.first()
        else {
            return;
        };
        let flags = FigsByte::from_bytes([first]);
        self.figs.sl = flags.sl();
        self.figs.r = flags.r();
        self.figs.a = flags.a();
        self.figs.gc = flags.gc();
        self.figs.l = flags.l();
        self.figs.dir = flags.dir();
        self.figs.reset_values();

        let value = |idx: usize| -> Option<u16> {
            let lo = *p.get(1 + idx * 2)?;
            let hi = p.get(2 + idx * 2).copied().unwrap_or(0);
            Some(lo as u16 | ((hi & 0x3F) as u16) << 8)
        };
        if let Some(dc) = value(0) {
            self.figs.dc = dc;
            self.figs.gd = p.get(2).map(|hi| hi & 0x40 != 0).unwrap_or(false);
        }
        if let Some(d) = value(1) {
            self.figs.d = d;
        }
        if let Some(d2) = value(2) {
            self.figs.d2 = d2;
        }
        if let Some(d1) = value(3) {
            self.figs.d1 = d1;
        }
        if let Some(dm) = value(4) {
            self.figs.dm = dm;
        }
    }

    /// Write one byte of parameter RAM. Offsets past the end are ignored.
    pub fn write_pram(&mut self, offset: u8, byte: u8) -> bool {
        match self.pram.get_mut(offset as usize) {
            Some(slot) => {
                *slot = byte;
                true
            }
            None => false,
        }
    }

    /// Number of partitions described by parameter RAM in the current mode.
    pub fn partition_count(&self) -> usize {
        match self.mode {
            DisplayMode::Character => 4,
            _ => 2,
        }
    }

    pub fn get_display_partition(&self, index: usize) -> Partition {
        let base = (index & 0x03) * 4;
        let b = &self.pram[base..base + 4];
        let flags = PartitionFlags::from_bytes([b[3]]);
        Partition {
            start: b[0] as u32 | (b[1] as u32) << 8 | ((b[2] & 0x03) as u32) << 16,
            length: (b[2] >> 4) as u16 | (flags.len_hi() as u16) << 4,
            image: flags.image(),
            wide: flags.wide(),
        }
    }

    /// Whether a partition is displayed as character cells in the current mode.
    pub fn partition_is_text(&self, partition: &Partition) -> bool {
        match self.mode {
            DisplayMode::Character => true,
            DisplayMode::Graphics => false,
            DisplayMode::Mixed | DisplayMode::Invalid => !partition.image,
        }
    }

    /// The 16-bit drawing pattern held in PRAM bytes 8 and 9.
    pub fn pattern(&self) -> u16 {
        self.pram[8] as u16 | (self.pram[9] as u16) << 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYNC_VECTOR: [u8; 8] = [0x02, 0x4E, 0x27, 0x0E, 0x28, 0x06, 0x68, 0x01];

    #[test]
    fn sync_decodes_documented_layout() {
        let mut regs = RegisterFile::new();
        regs.apply_sync(&SYNC_VECTOR);

        assert_eq!(regs.mode, DisplayMode::Graphics);
        assert_eq!(regs.interlace, InterlaceMode::Off);
        assert_eq!(regs.active_words, 80);
        assert_eq!(regs.hsync_width, 8);
        assert_eq!(regs.vsync_width, 17);
        assert_eq!(regs.hfront_porch, 4);
        assert_eq!(regs.hback_porch, 41);
        assert_eq!(regs.vfront_porch, 6);
        assert_eq!(regs.active_lines, 360);
        assert_eq!(regs.vback_porch, 0);
        assert_eq!(regs.pitch, 80);
    }

    #[test]
    fn sync_mode_byte_selects_character_interlaced() {
        let mut regs = RegisterFile::new();
        let mut p = SYNC_VECTOR;
        p[0] = 0b0010_1001;
        regs.apply_sync(&p);
        assert_eq!(regs.mode, DisplayMode::Character);
        assert_eq!(regs.interlace, InterlaceMode::Interlaced);
    }

    #[test]
    fn cchar_decodes_cursor_and_blink() {
        let mut regs = RegisterFile::new();
        // cursor on, 16 lines/row; blink lo 0b10, steady, top 3; bottom 14, blink hi 0b001
        regs.apply_cchar(&[0x8F, 0b1010_0011, (14 << 3) | 0b001]);
        assert!(regs.cursor_enabled);
        assert_eq!(regs.lines_per_row, 16);
        assert!(regs.cursor_steady);
        assert_eq!(regs.cursor_top, 3);
        assert_eq!(regs.cursor_bottom, 14);
        assert_eq!(regs.blink_rate, 0b00110);
    }

    #[test]
    fn curs_three_and_four_bytes() {
        let mut regs = RegisterFile::new();
        regs.apply_curs(&[0x34, 0x12, 0x03, 0x50]);
        assert_eq!(regs.ead, 0x03_1234);
        assert_eq!(regs.dad, 5);
        assert_eq!(regs.mask, 1 << 5);

        regs.apply_curs(&[0x00, 0x10, 0xA7]);
        assert_eq!(regs.ead, 0x03_1000);
        assert_eq!(regs.dad, 0xA);
        assert_eq!(regs.mask, 1 << 0xA);
    }

    #[test]
    fn zoom_nibbles_are_plus_one() {
        let mut regs = RegisterFile::new();
        regs.apply_zoom(0x31);
        assert_eq!(regs.zoom_display, 4);
        assert_eq!(regs.zoom_gchr, 2);
    }

    #[test]
    fn figs_partial_parameters_keep_defaults() {
        let mut regs = RegisterFile::new();
        regs.figs.d = 99;
        regs.apply_figs(&[0x0A, 0x05, 0x40]);
        assert!(regs.figs.l);
        assert_eq!(regs.figs.dir, 2);
        assert_eq!(regs.figs.dc, 5);
        assert!(regs.figs.gd);
        assert_eq!(regs.figs.d, FIGS_DEFAULT_D);
        assert_eq!(regs.figs.d1, FIGS_DEFAULT_D1);
    }

    #[test]
    fn partition_decodes_from_pram() {
        let mut regs = RegisterFile::new();
        for (i, b) in [0x00, 0x20, 0x51, 0xC3].iter().enumerate() {
            regs.write_pram(4 + i as u8, *b);
        }
        let p = regs.get_display_partition(1);
        assert_eq!(p.start, 0x1_2000);
        assert_eq!(p.length, 0x35);
        assert!(p.image);
        assert!(p.wide);
        assert_eq!(p.span(), 0x36);
    }

    #[test]
    fn pram_ignores_writes_past_end() {
        let mut regs = RegisterFile::new();
        assert!(regs.write_pram(15, 0xAA));
        assert!(!regs.write_pram(16, 0xBB));
        assert_eq!(regs.pram[15], 0xAA);
    }

    #[test]
    fn write_modes_follow_mask() {
        let old = 0b1100_1100_1100_1100;
        let data = 0xFFFF;
        let mask = 0x00F0;
        assert_eq!(WriteMode::Replace.apply(old, data, mask), 0b1100_1100_1111_1100);
        assert_eq!(WriteMode::Complement.apply(old, data, mask), 0b1100_1100_0011_1100);
        assert_eq!(WriteMode::Reset.apply(old, data, mask), 0b1100_1100_0000_1100);
        assert_eq!(WriteMode::Set.apply(old, data, mask), 0b1100_1100_1111_1100);
    }
}
