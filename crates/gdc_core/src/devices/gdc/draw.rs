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

    devices::gdc::draw.rs

    Display memory operations: data transfers, figure drawing and graphics
    characters.

    All drawing moves through two primitives. A word step moves EAD by one
    word in the drawing direction. A dot step rotates the mask by one dot and
    carries into EAD when the dot crosses a word boundary.

*/

use super::{
    fifo::FifoDirection,
    regs::{TransferType, EAD_MASK},
    Gdc,
};
use crate::device_traits::vram::DisplayMemory;

pub const DIR_DX: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];
pub const DIR_DY: [i32; 8] = [1, 1, 0, -1, -1, -1, 0, 1];

/// Rotate the dot mask one position left. Returns the new mask and whether a dot crossed into
/// the next word.
#[inline]
pub fn rotate_left16(mask: u16) -> (u16, bool) {
    (mask.rotate_left(1), mask & 0x8000 != 0)
}

/// Rotate the dot mask one position right. Returns the new mask and whether a dot crossed into
/// the previous word.
#[inline]
pub fn rotate_right16(mask: u16) -> (u16, bool) {
    (mask.rotate_right(1), mask & 0x0001 != 0)
}

#[inline]
fn offset_ead(ead: u32, delta: i64) -> u32 {
    (ead as i64 + delta).rem_euclid(EAD_MASK as i64 + 1) as u32
}

/// Move EAD by one word in the given direction.
pub fn word_step(ead: u32, pitch: u16, dir: u8) -> u32 {
    let d = (dir & 7) as usize;
    offset_ead(ead, DIR_DX[d] as i64 + DIR_DY[d] as i64 * pitch as i64)
}

/// Move the dot position (EAD, mask) by one dot in the given direction.
pub fn dot_step(ead: u32, mask: u16, pitch: u16, dir: u8) -> (u32, u16) {
    let d = (dir & 7) as usize;
    let (mask, carry) = match DIR_DX[d] {
        1 => rotate_left16(mask),
        -1 => rotate_right16(mask),
        _ => (mask, false),
    };
    let dx = if carry { DIR_DX[d] as i64 } else { 0 };
    (offset_ead(ead, dx + DIR_DY[d] as i64 * pitch as i64), mask)
}

/// Sign extend a 14-bit figure parameter.
#[inline]
fn sign_extend14(value: u16) -> i32 {
    ((value as i32) << 18) >> 18
}

impl Gdc {
    fn write_masked(&mut self, vram: &mut dyn DisplayMemory, data: u16, mask: u16) {
        let address = self.regs.ead;
        let old = vram.read_word(address);
        vram.write_word(address, self.regs.write_mode.apply(old, data, mask));
    }

    fn plot_dot(&mut self, vram: &mut dyn DisplayMemory, lit: bool) {
        let data = if lit { 0xFFFF } else { 0x0000 };
        let mask = self.regs.mask;
        self.write_masked(vram, data, mask);
    }

    fn step_dot(&mut self, dir: u8) {
        let (ead, mask) = dot_step(self.regs.ead, self.regs.mask, self.regs.pitch, dir);
        self.regs.ead = ead;
        self.regs.mask = mask;
    }

    fn step_word(&mut self) {
        self.regs.ead = word_step(self.regs.ead, self.regs.pitch, self.regs.figs.dir);
    }

    /// Write one WDAT transfer unit DC+1 times.
    pub(super) fn wdat(&mut self, transfer: TransferType, params: &[u8], vram: &mut dyn DisplayMemory) {
        let Some(&lo) = params.first()
        else {
            return;
        };
        let (data, mask) = match transfer {
            TransferType::Word => {
                let hi = params.get(1).copied().unwrap_or(0);
                (lo as u16 | (hi as u16) << 8, self.regs.mask)
            }
            TransferType::LowByte => (lo as u16, self.regs.mask & 0x00FF),
            TransferType::HighByte => ((lo as u16) << 8, self.regs.mask & 0xFF00),
        };

        for _ in 0..=self.regs.figs.dc as u32 {
            self.write_masked(vram, data, mask);
            self.step_word();
        }
        self.regs.figs.dc = 0;
    }

    /// Read DC+1 transfer units into the FIFO.
    pub(super) fn rdat(&mut self, transfer: TransferType, vram: &dyn DisplayMemory) {
        self.fifo.set_direction(FifoDirection::Read);
        let count = self.regs.figs.dc as u32 + 1;
        let unit = transfer.unit_size() as usize;

        for done in 0..count {
            if self.fifo.len() + unit > self.fifo_capacity() {
                log::warn!("GDC: RDAT stopped with FIFO full, {} units unread", count - done);
                break;
            }
            let word = vram.read_word(self.regs.ead);
            match transfer {
                TransferType::Word => {
                    self.fifo.enqueue(word as u8, false);
                    self.fifo.enqueue((word >> 8) as u8, false);
                }
                TransferType::LowByte => {
                    self.fifo.enqueue(word as u8, false);
                }
                TransferType::HighByte => {
                    self.fifo.enqueue((word >> 8) as u8, false);
                }
            }
            self.step_word();
        }
        self.regs.figs.dc = 0;
    }

    fn fifo_capacity(&self) -> usize {
        super::fifo::GDC_FIFO_DEPTH
    }

    /// Return EAD and the dot mask through the FIFO.
    pub(super) fn curd(&mut self) {
        self.fifo.set_direction(FifoDirection::Read);
        let ead = self.regs.ead;
        let mask = self.regs.mask;
        for byte in [ead as u8, (ead >> 8) as u8, ((ead >> 16) & 0x03) as u8, mask as u8, (mask >> 8) as u8] {
            self.fifo.enqueue(byte, false);
        }
    }

    /// Return the light pen address through the FIFO.
    pub(super) fn lprd(&mut self) {
        self.fifo.set_direction(FifoDirection::Read);
        let lpen = self.regs.lpen_address;
        for byte in [lpen as u8, (lpen >> 8) as u8, ((lpen >> 16) & 0x03) as u8] {
            self.fifo.enqueue(byte, false);
        }
        self.lpen_detect = false;
    }

    pub(super) fn figd(&mut self, vram: &mut dyn DisplayMemory) {
        let figs = self.regs.figs;

        if figs.a {
            log::warn!("GDC: FIGD arc drawing is not implemented");
        }
        else if figs.sl {
            log::warn!("GDC: FIGD slanted figure is not implemented");
        }
        else if figs.l {
            self.draw_line(vram);
        }
        else if figs.r {
            self.draw_rectangle(vram);
        }
        else {
            let lit = self.regs.pattern() & 1 != 0;
            self.plot_dot(vram, lit);
        }
    }

    fn draw_line(&mut self, vram: &mut dyn DisplayMemory) {
        let figs = self.regs.figs;
        let dir = figs.dir & 7;
        let (straight, diagonal) = if dir & 1 == 0 {
            (dir, (dir + 1) & 7)
        }
        else {
            ((dir + 1) & 7, dir)
        };
        let d1 = sign_extend14(figs.d1);
        let d2 = sign_extend14(figs.d2);
        let mut d = sign_extend14(figs.d);
        let pattern = self.regs.pattern();

        self.plot_dot(vram, pattern & 1 != 0);
        for i in 1..=figs.dc as u32 {
            if d < 0 {
                self.step_dot(straight);
                d += d1;
            }
            else {
                self.step_dot(diagonal);
                d += d2;
            }
            self.plot_dot(vram, (pattern >> (i & 0x0F)) & 1 != 0);
        }
    }

    fn draw_rectangle(&mut self, vram: &mut dyn DisplayMemory) {
        let figs = self.regs.figs;
        let sides = [figs.d & 0x3FFF, figs.d2 & 0x3FFF];
        let pattern = self.regs.pattern();
        let mut dir = figs.dir & 7;
        let mut dot = 0u32;

        for side in 0..4 {
            for _ in 0..sides[side & 1] {
                self.plot_dot(vram, (pattern >> (dot & 0x0F)) & 1 != 0);
                self.step_dot(dir);
                dot += 1;
            }
            dir = (dir + 2) & 7;
        }
    }

    /// Draw the 8x8 pattern in PRAM 8..15, last byte first, at EAD.
    pub(super) fn gchrd(&mut self, vram: &mut dyn DisplayMemory) {
        let figs = self.regs.figs;
        if figs.sl {
            log::warn!("GDC: GCHRD slanted character is not implemented, drawing upright");
        }
        let zoom = self.regs.zoom_gchr.max(1);
        let dir = figs.dir & 7;
        let row_dir = (dir + 2) & 7;
        let (start_ead, start_mask) = (self.regs.ead, self.regs.mask);

        for row in 0..8 {
            let bits = self.regs.pram[15 - row];
            for _ in 0..zoom {
                let (row_ead, row_mask) = (self.regs.ead, self.regs.mask);
                for col in 0..8 {
                    let lit = (bits >> col) & 1 != 0;
                    for _ in 0..zoom {
                        self.plot_dot(vram, lit);
                        self.step_dot(dir);
                    }
                }
                self.regs.ead = row_ead;
                self.regs.mask = row_mask;
                self.step_dot(row_dir);
            }
        }

        self.regs.ead = start_ead;
        self.regs.mask = start_mask;
        for _ in 0..8 * zoom as u32 {
            self.step_dot(row_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GdcConfig, devices::vram::VideoRam};

    const PITCH: u16 = 4;

    fn send(gdc: &mut Gdc, vram: &mut dyn DisplayMemory, cmd: u8, params: &[u8]) {
        gdc.write_command(cmd, Some(&mut *vram));
        for &p in params {
            gdc.write_parameter(p, Some(&mut *vram));
        }
    }

    fn setup() -> (Gdc, VideoRam) {
        let mut gdc = Gdc::new(GdcConfig::default());
        let mut vram = VideoRam::new(0x400);
        send(&mut gdc, &mut vram, 0x47, &[PITCH as u8]);
        (gdc, vram)
    }

    #[test]
    fn rotate_helpers_carry_at_word_edges() {
        assert_eq!(rotate_left16(0x0001), (0x0002, false));
        assert_eq!(rotate_left16(0x8000), (0x0001, true));
        assert_eq!(rotate_right16(0x0002), (0x0001, false));
        assert_eq!(rotate_right16(0x0001), (0x8000, true));
    }

    #[test]
    fn word_step_each_direction() {
        let ead = 0x100;
        let expected = [0x104, 0x105, 0x101, 0x0FD, 0x0FC, 0x0FB, 0x0FF, 0x103];
        for dir in 0..8u8 {
            assert_eq!(word_step(ead, PITCH, dir), expected[dir as usize], "dir {}", dir);
        }
    }

    #[test]
    fn dot_step_each_direction_mid_word() {
        let expected_ead = [0x104, 0x104, 0x100, 0x0FC, 0x0FC, 0x0FC, 0x100, 0x104];
        let expected_mask = [0x0100, 0x0200, 0x0200, 0x0200, 0x0100, 0x0080, 0x0080, 0x0080];
        for dir in 0..8u8 {
            let (ead, mask) = dot_step(0x100, 0x0100, PITCH, dir);
            assert_eq!(ead, expected_ead[dir as usize], "dir {}", dir);
            assert_eq!(mask, expected_mask[dir as usize], "dir {}", dir);
        }
    }

    #[test]
    fn dot_step_each_direction_at_word_edges() {
        // Leftmost and rightmost dots carry EAD when moving out of the word.
        for dir in 0..8u8 {
            let (ead, _) = dot_step(0x100, 0x8000, PITCH, dir);
            let dx = if DIR_DX[dir as usize] == 1 { 1 } else { 0 };
            assert_eq!(ead as i64, 0x100 + dx + DIR_DY[dir as usize] as i64 * PITCH as i64, "dir {}", dir);

            let (ead, _) = dot_step(0x100, 0x0001, PITCH, dir);
            let dx = if DIR_DX[dir as usize] == -1 { -1 } else { 0 };
            assert_eq!(ead as i64, 0x100 + dx + DIR_DY[dir as usize] as i64 * PITCH as i64, "dir {}", dir);
        }
    }

    #[test]
    fn ead_wraps_at_eighteen_bits() {
        assert_eq!(word_step(0x3FFFF, PITCH, 2), 0);
        assert_eq!(word_step(0x00000, PITCH, 6), 0x3FFFF);
        assert_eq!(dot_step(0x3FFFF, 0x8000, PITCH, 2), (0, 0x0001));
    }

    #[test]
    fn sign_extension_of_figure_values() {
        assert_eq!(sign_extend14(0x3FFD), -3);
        assert_eq!(sign_extend14(0xFFFF), -1);
        assert_eq!(sign_extend14(0x1FFF), 0x1FFF);
    }

    #[test]
    fn wdat_repeats_dc_times_then_once() {
        let (mut gdc, mut vram) = setup();
        send(&mut gdc, &mut vram, 0x49, &[0x10, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x4A, &[0xFF, 0xFF]);
        send(&mut gdc, &mut vram, 0x4C, &[0x02, 0x02, 0x00]);
        send(&mut gdc, &mut vram, 0x20, &[0x34, 0x12, 0x78, 0x56]);

        assert_eq!(vram.read_word(0x10), 0x1234);
        assert_eq!(vram.read_word(0x11), 0x1234);
        assert_eq!(vram.read_word(0x12), 0x1234);
        assert_eq!(vram.read_word(0x13), 0x5678);
        assert_eq!(vram.read_word(0x14), 0x0000);
        assert_eq!(gdc.regs().ead, 0x14);
        assert_eq!(gdc.regs().figs.dc, 0);
    }

    #[test]
    fn wdat_byte_transfers_use_half_mask() {
        let (mut gdc, mut vram) = setup();
        vram.write_word(0x20, 0x0F0F);
        send(&mut gdc, &mut vram, 0x49, &[0x20, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x4A, &[0xFF, 0xFF]);
        // low byte, set
        send(&mut gdc, &mut vram, 0x33, &[0xF0]);
        assert_eq!(vram.read_word(0x20), 0x0FFF);

        // high byte, reset
        send(&mut gdc, &mut vram, 0x49, &[0x20, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x4A, &[0xFF, 0xFF]);
        send(&mut gdc, &mut vram, 0x3A, &[0x0F]);
        assert_eq!(vram.read_word(0x20), 0x00FF);
    }

    #[test]
    fn wdat_complement_honors_mask() {
        let (mut gdc, mut vram) = setup();
        vram.write_word(0x08, 0xAAAA);
        send(&mut gdc, &mut vram, 0x49, &[0x08, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x4A, &[0xFF, 0x00]);
        send(&mut gdc, &mut vram, 0x21, &[0xFF, 0xFF]);
        assert_eq!(vram.read_word(0x08), 0xAA55);
    }

    #[test]
    fn rdat_and_curd_read_back_through_fifo() {
        let (mut gdc, mut vram) = setup();
        vram.write_word(0x30, 0xBEEF);
        vram.write_word(0x31, 0xCAFE);
        send(&mut gdc, &mut vram, 0x49, &[0x30, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x4C, &[0x02, 0x01, 0x00]);
        send(&mut gdc, &mut vram, 0xA0, &[]);

        assert!(gdc.status().data_ready());
        let bytes: Vec<u8> = (0..4).map(|_| gdc.port_read(1)).collect();
        assert_eq!(bytes, vec![0xEF, 0xBE, 0xFE, 0xCA]);
        assert!(gdc.status().fifo_empty());
        assert!(!gdc.status().data_ready());

        send(&mut gdc, &mut vram, 0x49, &[0x34, 0x12, 0x03, 0x50]);
        send(&mut gdc, &mut vram, 0xE0, &[]);
        let bytes: Vec<u8> = (0..5).map(|_| gdc.port_read(1)).collect();
        assert_eq!(bytes, vec![0x34, 0x12, 0x03, 0x20, 0x00]);
    }

    #[test]
    fn rdat_stops_when_fifo_is_full() {
        let (mut gdc, mut vram) = setup();
        for i in 0..32 {
            vram.write_word(i, 0x0101 * i as u16);
        }
        send(&mut gdc, &mut vram, 0x49, &[0x00, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x4C, &[0x02, 20, 0x00]);
        send(&mut gdc, &mut vram, 0xA0, &[]);

        assert_eq!(gdc.fifo_len(), 16);
        assert!(gdc.status().fifo_full());
        assert_eq!(gdc.regs().ead, 8);
        assert_eq!(gdc.regs().figs.dc, 0);
        let bytes: Vec<u8> = (0..16).map(|_| gdc.port_read(1)).collect();
        assert_eq!(&bytes[14..], &[0x07, 0x07]);
    }

    #[test]
    fn command_write_discards_unread_data() {
        let (mut gdc, mut vram) = setup();
        send(&mut gdc, &mut vram, 0xE0, &[]);
        assert_eq!(gdc.fifo_len(), 5);
        send(&mut gdc, &mut vram, 0x4A, &[0x01]);
        assert_eq!(gdc.fifo_direction(), FifoDirection::Write);
        assert_eq!(gdc.fifo_len(), 1);
    }

    #[test]
    fn figd_horizontal_line() {
        let (mut gdc, mut vram) = setup();
        send(&mut gdc, &mut vram, 0x78, &[0xFF, 0xFF]);
        send(&mut gdc, &mut vram, 0x49, &[0x08, 0x00, 0x00]);
        // L, dir 2, DC 3, D -3, D2 -6, D1 0
        send(&mut gdc, &mut vram, 0x4C, &[0x0A, 0x03, 0x00, 0xFD, 0x3F, 0xFA, 0x3F, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x6C, &[]);
        assert_eq!(vram.read_word(0x08), 0x000F);
        assert_eq!(gdc.regs().mask, 0x0008);
        assert!(!gdc.status().drawing());
    }

    #[test]
    fn figd_diagonal_line() {
        let (mut gdc, mut vram) = setup();
        send(&mut gdc, &mut vram, 0x78, &[0xFF, 0xFF]);
        send(&mut gdc, &mut vram, 0x49, &[0x00, 0x00, 0x00]);
        // L, dir 1, DC 2, D 2, D2 0, D1 4
        send(&mut gdc, &mut vram, 0x4C, &[0x09, 0x02, 0x00, 0x02, 0x00, 0x00, 0x00, 0x04, 0x00]);
        send(&mut gdc, &mut vram, 0x6C, &[]);
        assert_eq!(vram.read_word(0), 0x0001);
        assert_eq!(vram.read_word(PITCH as u32), 0x0002);
        assert_eq!(vram.read_word(2 * PITCH as u32), 0x0004);
    }

    #[test]
    fn figd_rectangle_closes() {
        let (mut gdc, mut vram) = setup();
        send(&mut gdc, &mut vram, 0x78, &[0xFF, 0xFF]);
        send(&mut gdc, &mut vram, 0x49, &[0x08, 0x00, 0x00]);
        // R, dir 2, DC 3, D 2, D2 1
        send(&mut gdc, &mut vram, 0x4C, &[0x42, 0x03, 0x00, 0x02, 0x00, 0x01, 0x00]);
        send(&mut gdc, &mut vram, 0x6C, &[]);
        assert_eq!(vram.read_word(0x08), 0x0007);
        assert_eq!(vram.read_word(0x04), 0x0007);
        assert_eq!(gdc.regs().ead, 0x08);
        assert_eq!(gdc.regs().mask, 0x0001);
    }

    #[test]
    fn gchrd_draws_pattern_and_moves_one_cell() {
        let (mut gdc, mut vram) = setup();
        let mut pattern = [0u8; 8];
        pattern[0] = 0xFF;
        pattern[7] = 0x81;
        send(&mut gdc, &mut vram, 0x78, &pattern);
        send(&mut gdc, &mut vram, 0x49, &[40, 0x00, 0x00]);
        send(&mut gdc, &mut vram, 0x4C, &[0x12]);
        send(&mut gdc, &mut vram, 0x68, &[]);

        assert_eq!(vram.read_word(40), 0x0081);
        assert_eq!(vram.read_word(36), 0x0000);
        assert_eq!(vram.read_word(12), 0x00FF);
        assert_eq!(gdc.regs().ead, 8);
        assert_eq!(gdc.regs().mask, 0x0001);
    }
}
