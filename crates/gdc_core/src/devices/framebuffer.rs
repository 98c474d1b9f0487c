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

    devices::framebuffer.rs

    An indexed-color frame buffer that implements DisplayPixelSink.

    Text cells are expanded through a character ROM of 16 rows per glyph, MSB
    leftmost. Graphics cells are expanded LSB leftmost, matching the dot address
    order of the GDC. Pixels are 0 (off), 1 (on) or 2 (highlighted).

*/

use crate::device_traits::display::{CellKind, CellVideo, DisplayCell, DisplayPixelSink};
use gdc_common::VideoDimensions;

pub const GLYPH_ROWS: usize = 16;
pub const PIXEL_OFF: u8 = 0;
pub const PIXEL_ON: u8 = 1;
pub const PIXEL_HIGHLIGHT: u8 = 2;

pub struct MonoFrameBuffer {
    dims: VideoDimensions,
    buf: Vec<u8>,
    char_rom: Vec<u8>,
}

impl MonoFrameBuffer {
    pub fn new(dims: VideoDimensions, char_rom: &[u8]) -> Self {
        Self {
            dims,
            buf: vec![PIXEL_OFF; dims.area()],
            char_rom: char_rom.to_vec(),
        }
    }

    pub fn dimensions(&self) -> VideoDimensions {
        self.dims
    }

    pub fn buf(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.fill(PIXEL_OFF);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if self.dims.contains(x, y) {
            Some(self.buf[(y * self.dims.w + x) as usize])
        }
        else {
            None
        }
    }

    /// Return one row of a glyph. Glyphs missing from the ROM read as blank.
    fn glyph_row(&self, glyph: u8, row: u8) -> u8 {
        let offset = glyph as usize * GLYPH_ROWS + (row as usize & (GLYPH_ROWS - 1));
        self.char_rom.get(offset).copied().unwrap_or(0)
    }

    #[inline]
    fn plot(&mut self, x: u32, y: u32, color: u8) {
        if self.dims.contains(x, y) {
            let idx = (y * self.dims.w + x) as usize;
            self.buf[idx] = color;
        }
    }
}

impl DisplayPixelSink for MonoFrameBuffer {
    fn display_pixels(&mut self, cell: &DisplayCell) {
        let video = cell.attr.video();
        let on_color = if cell.attr.hlgt { PIXEL_HIGHLIGHT } else { PIXEL_ON };
        let zoom = cell.zoom.max(1) as u32;

        let glyph_row = match cell.kind {
            CellKind::Text => self.glyph_row(cell.code as u8, cell.linecount),
            CellKind::Graphics => 0,
        };

        for dot in 0..cell.width as u32 {
            let bit = match cell.kind {
                CellKind::Text => dot < 8 && (glyph_row & (0x80 >> dot)) != 0,
                CellKind::Graphics => dot < 16 && (cell.code >> dot) & 1 != 0,
            };
            let lit = match video {
                CellVideo::Blank => false,
                CellVideo::Lit => true,
                CellVideo::Reversed => !bit,
                CellVideo::Normal => bit,
            };
            let color = if lit { on_color } else { PIXEL_OFF };
            for z in 0..zoom {
                self.plot(cell.x + dot * zoom + z, cell.y, color);
            }
        }
    }
}
